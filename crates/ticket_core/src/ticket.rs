//! Confirmation view model. Everything here is derived from the stored record
//! and never written back.

use shared::domain::{
    PersistedTicket, DATA_URL_IMAGE_PREFIX, DEFAULT_AVATAR_PATH, TICKET_STORAGE_KEY,
};
use storage::KeyValueStore;
use tracing::warn;

use crate::config::EventDetails;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayName {
    pub first_name: String,
    pub last_name: String,
}

impl DisplayName {
    pub fn full(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// First token is the first name, second (if any) the last name. Tokens past
/// the second are not shown.
pub fn derive_display_name(full_name: &str) -> DisplayName {
    let mut tokens = full_name.split_whitespace();
    DisplayName {
        first_name: tokens.next().unwrap_or_default().to_string(),
        last_name: tokens.next().unwrap_or_default().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSrc {
    Embedded(String),
    Default,
}

impl AvatarSrc {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Embedded(url) => url,
            Self::Default => DEFAULT_AVATAR_PATH,
        }
    }
}

pub fn resolve_avatar_src(avatar: &str) -> AvatarSrc {
    if avatar.starts_with(DATA_URL_IMAGE_PREFIX) {
        AvatarSrc::Embedded(avatar.to_string())
    } else {
        AvatarSrc::Default
    }
}

/// Absent or unparseable input yields an all-empty ticket.
pub fn parse_ticket(raw: Option<&str>) -> PersistedTicket {
    let Some(raw) = raw else {
        return PersistedTicket::default();
    };
    PersistedTicket::from_json(raw).unwrap_or_else(|err| {
        warn!(error = %err, "stored ticket is malformed; showing empty ticket");
        PersistedTicket::default()
    })
}

pub async fn load_ticket(store: &dyn KeyValueStore) -> PersistedTicket {
    match store.get_item(TICKET_STORAGE_KEY).await {
        Ok(raw) => parse_ticket(raw.as_deref()),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "could not read stored ticket");
            PersistedTicket::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketView {
    pub name: DisplayName,
    pub email: String,
    pub github_username: String,
    pub avatar: AvatarSrc,
    pub event: EventDetails,
}

impl TicketView {
    pub fn from_ticket(ticket: &PersistedTicket, event: &EventDetails) -> Self {
        Self {
            name: derive_display_name(&ticket.full_name),
            email: ticket.email.clone(),
            github_username: ticket.github_username.clone(),
            avatar: resolve_avatar_src(&ticket.avatar),
            event: event.clone(),
        }
    }

    pub fn headline(&self) -> String {
        format!(
            "Congrats, {} {}! Your ticket is ready.",
            self.name.first_name, self.name.last_name
        )
    }

    pub fn email_notice(&self) -> String {
        format!(
            "We've emailed your ticket to {} and will send updates in the run up to the event.",
            self.email
        )
    }

    pub fn event_line(&self) -> String {
        self.event.schedule_line()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TicketRenderer {
    event: EventDetails,
}

impl TicketRenderer {
    pub fn new(event: EventDetails) -> Self {
        Self { event }
    }

    pub fn render(&self, ticket: &PersistedTicket) -> TicketView {
        TicketView::from_ticket(ticket, &self.event)
    }

    pub async fn load(&self, store: &dyn KeyValueStore) -> TicketView {
        self.render(&load_ticket(store).await)
    }
}
