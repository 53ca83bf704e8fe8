//! Backend commands queued from UI to backend worker.

use ticket_core::PendingSubmission;

pub enum BackendCommand {
    /// Encode the avatar, store the ticket and navigate on success.
    Submit(PendingSubmission),
    LoadTicket,
    ClearTicket,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::LoadTicket => "load_ticket",
            Self::ClearTicket => "clear_ticket",
        }
    }
}
