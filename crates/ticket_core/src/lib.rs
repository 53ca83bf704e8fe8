//! Form controller and ticket renderer for the conference ticket generator.
//!
//! The controller owns the draft, validates each field as it changes and, on
//! submit, encodes the avatar and writes one record to a [`KeyValueStore`]
//! before asking the [`Navigator`] for the confirmation route. The renderer
//! reads that record back and derives what the confirmation view shows.

pub mod avatar;
pub mod capture;
pub mod config;
pub mod form;
pub mod preview;
pub mod ticket;
pub mod validation;

pub use avatar::{decode_data_url, encode_data_url, AvatarFile, AvatarReadError, AvatarSource};
pub use capture::{UploadZoneEffect, UploadZoneState, UploadZoneTarget};
pub use config::{
    load_settings, normalize_database_url, resolve_database_url, EventDetails, Settings,
    SettingsError,
};
pub use form::{
    FormController, PendingSubmission, SubmissionDraft, SubmitError, SubmitOutcome,
    SubmitRejection,
};
pub use preview::{PreviewHandle, PreviewRegistry};
pub use storage::KeyValueStore;
pub use ticket::{AvatarSrc, DisplayName, TicketRenderer, TicketView};

/// Route changes requested by the form. Implemented by whatever owns the
/// current view.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate_to(&self, path: &str) {
        self(path)
    }
}
