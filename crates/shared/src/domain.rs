use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::UnknownFieldError;

/// Key of the single record written by the form and read by the ticket view.
pub const TICKET_STORAGE_KEY: &str = "ticketData";

pub const FORM_ROUTE: &str = "/";
pub const CONFIRMATION_ROUTE: &str = "/success";

/// Substituted whenever no embedded avatar image is available.
pub const DEFAULT_AVATAR_PATH: &str = "/assets/images/image-avatar.jpg";

/// Prefix shared by every embedded (data URL) avatar image.
pub const DATA_URL_IMAGE_PREFIX: &str = "data:image";

pub const MAX_AVATAR_BYTES: u64 = 500 * 1024;
pub const ALLOWED_AVATAR_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    FullName,
    Email,
    GithubUsername,
}

impl TextField {
    pub const ALL: [TextField; 3] = [Self::FullName, Self::Email, Self::GithubUsername];

    pub fn as_str(self) -> &'static str {
        FieldName::from(self).as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    FullName,
    Email,
    GithubUsername,
    Avatar,
}

impl FieldName {
    pub const ALL: [FieldName; 4] = [
        Self::FullName,
        Self::Email,
        Self::GithubUsername,
        Self::Avatar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::GithubUsername => "githubUsername",
            Self::Avatar => "avatar",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TextField> for FieldName {
    fn from(value: TextField) -> Self {
        match value {
            TextField::FullName => Self::FullName,
            TextField::Email => Self::Email,
            TextField::GithubUsername => Self::GithubUsername,
        }
    }
}

impl FromStr for FieldName {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownFieldError(s.to_string()))
    }
}

impl FromStr for TextField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownFieldError(s.to_string()))
    }
}

/// Per-field error text. An empty string means the field is currently valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub full_name: String,
    pub email: String,
    pub github_username: String,
    pub avatar: String,
}

impl FieldErrors {
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::FullName => &self.full_name,
            FieldName::Email => &self.email,
            FieldName::GithubUsername => &self.github_username,
            FieldName::Avatar => &self.avatar,
        }
    }

    pub fn set(&mut self, field: FieldName, message: impl Into<String>) {
        let slot = match field {
            FieldName::FullName => &mut self.full_name,
            FieldName::Email => &mut self.email,
            FieldName::GithubUsername => &mut self.github_username,
            FieldName::Avatar => &mut self.avatar,
        };
        *slot = message.into();
    }

    pub fn is_clean(&self) -> bool {
        FieldName::ALL
            .into_iter()
            .all(|field| self.get(field).is_empty())
    }

    pub fn failing_fields(&self) -> Vec<FieldName> {
        FieldName::ALL
            .into_iter()
            .filter(|field| !self.get(*field).is_empty())
            .collect()
    }
}

/// The stored record. Every field reads leniently: a missing or non-string
/// value becomes an empty string rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTicket {
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub github_username: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub avatar: String,
}

impl PersistedTicket {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn has_embedded_avatar(&self) -> bool {
        self.avatar.starts_with(DATA_URL_IMAGE_PREFIX)
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => text,
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_match_wire_keys() {
        assert_eq!(FieldName::GithubUsername.as_str(), "githubUsername");
        assert_eq!("fullName".parse::<FieldName>().expect("field"), FieldName::FullName);
        assert_eq!("email".parse::<TextField>().expect("field"), TextField::Email);
        assert!("avatar".parse::<TextField>().is_err());
        assert!("nickname".parse::<FieldName>().is_err());
    }

    #[test]
    fn field_errors_report_clean_only_when_every_slot_is_empty() {
        let mut errors = FieldErrors::default();
        assert!(errors.is_clean());

        errors.set(FieldName::Email, "Please enter a valid email address");
        assert!(!errors.is_clean());
        assert_eq!(errors.failing_fields(), vec![FieldName::Email]);

        errors.set(FieldName::Email, "");
        assert!(errors.is_clean());
    }

    #[test]
    fn persisted_ticket_uses_camel_case_keys() {
        let ticket = PersistedTicket {
            full_name: "Ada Lovelace".into(),
            email: "ada@x.com".into(),
            github_username: "@ada".into(),
            avatar: DEFAULT_AVATAR_PATH.into(),
        };
        let json = ticket.to_json().expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["fullName"], "Ada Lovelace");
        assert_eq!(value["githubUsername"], "@ada");
        assert_eq!(PersistedTicket::from_json(&json).expect("parse"), ticket);
    }

    #[test]
    fn persisted_ticket_tolerates_missing_and_mistyped_fields() {
        let ticket = PersistedTicket::from_json(r#"{"fullName":"Ada","avatar":{},"email":null}"#)
            .expect("lenient parse");
        assert_eq!(ticket.full_name, "Ada");
        assert_eq!(ticket.email, "");
        assert_eq!(ticket.github_username, "");
        assert_eq!(ticket.avatar, "");
        assert!(!ticket.has_embedded_avatar());
    }
}
