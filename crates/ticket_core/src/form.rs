//! The form controller: draft state, per-field errors, preview lifecycle and
//! the submit pipeline.

use shared::domain::{
    FieldErrors, FieldName, PersistedTicket, TextField, CONFIRMATION_ROUTE, DEFAULT_AVATAR_PATH,
    MAX_AVATAR_BYTES, TICKET_STORAGE_KEY,
};
use storage::KeyValueStore;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    avatar::{AvatarFile, AvatarReadError},
    capture::{upload_zone_click, UploadZoneEffect, UploadZoneState, UploadZoneTarget},
    preview::{PreviewHandle, PreviewRegistry},
    validation::{self, AVATAR_TOO_LARGE, AVATAR_UNREADABLE},
    Navigator,
};

pub const SAVE_FAILED_STATUS: &str = "We couldn't save your ticket. Please try again.";

#[derive(Debug, Clone, Default)]
pub struct SubmissionDraft {
    pub full_name: String,
    pub email: String,
    pub github_username: String,
    pub avatar: Option<AvatarFile>,
}

impl SubmissionDraft {
    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::FullName => &self.full_name,
            TextField::Email => &self.email,
            TextField::GithubUsername => &self.github_username,
        }
    }

    fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::FullName => &mut self.full_name,
            TextField::Email => &mut self.email,
            TextField::GithubUsername => &mut self.github_username,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("failed to read avatar '{name}': {source}")]
    AvatarUnreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("avatar '{name}' is now larger than {limit} bytes")]
    AvatarTooLarge { name: String, limit: u64 },
    #[error("failed to serialize ticket: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to store ticket: {0:#}")]
    Store(anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Fields whose errors were non-empty after revalidation.
    Invalid(Vec<FieldName>),
    /// A previous submission has not completed yet.
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Stored(PersistedTicket),
    Rejected(SubmitRejection),
    Failed(String),
}

/// A validated snapshot of the draft, ready to be encoded and stored.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    full_name: String,
    email: String,
    github_username: String,
    avatar: Option<AvatarFile>,
}

impl PendingSubmission {
    /// Reads the avatar fully and builds the record to persist. Absent avatars
    /// become the default avatar path. The size limit is enforced again on
    /// the bytes actually read.
    pub async fn encode(&self) -> Result<PersistedTicket, SubmitError> {
        let avatar = match &self.avatar {
            Some(file) => file
                .to_data_url(MAX_AVATAR_BYTES)
                .await
                .map_err(|err| match err {
                    AvatarReadError::Io(source) => SubmitError::AvatarUnreadable {
                        name: file.name().to_string(),
                        source,
                    },
                    AvatarReadError::TooLarge { limit } => SubmitError::AvatarTooLarge {
                        name: file.name().to_string(),
                        limit,
                    },
                })?,
            None => DEFAULT_AVATAR_PATH.to_string(),
        };

        Ok(PersistedTicket {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            github_username: self.github_username.clone(),
            avatar,
        })
    }

    /// Encodes, writes the record, and only then requests the confirmation
    /// route. Any failure leaves the store untouched and skips navigation.
    pub async fn commit(
        self,
        store: &dyn KeyValueStore,
        navigator: &dyn Navigator,
    ) -> Result<PersistedTicket, SubmitError> {
        let ticket = self.encode().await?;
        let serialized = ticket.to_json()?;
        store
            .set_item(TICKET_STORAGE_KEY, &serialized)
            .await
            .map_err(SubmitError::Store)?;
        info!(
            embedded_avatar = ticket.has_embedded_avatar(),
            bytes = serialized.len(),
            "stored ticket"
        );
        navigator.navigate_to(CONFIRMATION_ROUTE);
        Ok(ticket)
    }
}

#[derive(Debug)]
pub struct FormController {
    draft: SubmissionDraft,
    errors: FieldErrors,
    previews: PreviewRegistry,
    preview: Option<PreviewHandle>,
    avatar_required: bool,
    in_flight: bool,
    drag_hover: bool,
    status: Option<String>,
}

impl FormController {
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            draft: SubmissionDraft::default(),
            errors: FieldErrors::default(),
            previews,
            preview: None,
            avatar_required: true,
            in_flight: false,
            drag_hover: false,
            status: None,
        }
    }

    pub fn with_avatar_required(mut self, required: bool) -> Self {
        self.avatar_required = required;
        self
    }

    pub fn draft(&self) -> &SubmissionDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: FieldName) -> &str {
        self.errors.get(field)
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(PreviewHandle::url)
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_drag_hovering(&self) -> bool {
        self.drag_hover
    }

    pub fn set_drag_hover(&mut self, hovering: bool) {
        self.drag_hover = hovering;
    }

    pub fn update_field(&mut self, field: TextField, value: impl Into<String>) {
        let value = value.into();
        let message = validation::validate_text_field(field, &value);
        debug!(
            field = field.as_str(),
            valid = message.is_empty(),
            "form field updated"
        );
        *self.draft.text_mut(field) = value;
        self.errors.set(field.into(), message);
    }

    /// Replaces the avatar. The previous preview is revoked before the next
    /// one is created.
    pub fn set_avatar(&mut self, file: Option<AvatarFile>) {
        self.preview = None;
        self.errors.set(
            FieldName::Avatar,
            validation::validate_avatar(file.as_ref(), self.avatar_required),
        );
        self.preview = file.as_ref().map(|file| self.previews.create(file));
        if let Some(file) = &file {
            debug!(
                file = file.name(),
                mime = file.mime_type(),
                size = file.size_bytes(),
                "avatar selected"
            );
        }
        self.draft.avatar = file;
    }

    /// A drop replaces the avatar only when it actually carried a file.
    pub fn accept_drop(&mut self, file: Option<AvatarFile>) {
        self.drag_hover = false;
        if let Some(file) = file {
            self.set_avatar(Some(file));
        }
    }

    pub fn zone_state(&self) -> UploadZoneState {
        if self.preview.is_some() {
            UploadZoneState::Previewing
        } else {
            UploadZoneState::Empty
        }
    }

    /// Applies `ClearAvatar` itself; `OpenPicker` is left to the caller, which
    /// owns the native dialog.
    pub fn handle_zone_click(&mut self, target: UploadZoneTarget) -> UploadZoneEffect {
        let effect = upload_zone_click(self.zone_state(), target);
        if effect == UploadZoneEffect::ClearAvatar {
            self.set_avatar(None);
        }
        effect
    }

    /// Recomputes every field error from the current draft, discarding stale
    /// ones. Returns whether the form is valid.
    pub fn validate_all(&mut self) -> bool {
        for field in TextField::ALL {
            let message = validation::validate_text_field(field, self.draft.text(field));
            self.errors.set(field.into(), message);
        }
        self.errors.set(
            FieldName::Avatar,
            validation::validate_avatar(self.draft.avatar.as_ref(), self.avatar_required),
        );
        self.errors.is_clean()
    }

    /// Validates and, if clean, marks the form busy and snapshots the draft.
    /// Every successful call must be paired with [`Self::complete_submission`].
    pub fn prepare_submission(&mut self) -> Result<PendingSubmission, SubmitRejection> {
        if self.in_flight {
            return Err(SubmitRejection::Busy);
        }
        self.status = None;
        if !self.validate_all() {
            let failing = self.errors.failing_fields();
            debug!(?failing, "submission rejected by validation");
            return Err(SubmitRejection::Invalid(failing));
        }
        self.in_flight = true;
        Ok(PendingSubmission {
            full_name: self.draft.full_name.clone(),
            email: self.draft.email.clone(),
            github_username: self.draft.github_username.clone(),
            avatar: self.draft.avatar.clone(),
        })
    }

    pub fn complete_submission(&mut self, result: &Result<PersistedTicket, SubmitError>) {
        self.in_flight = false;
        match result {
            Ok(_) => self.status = None,
            Err(err @ SubmitError::AvatarUnreadable { .. }) => {
                warn!(error = %err, "avatar could not be encoded");
                self.errors.set(FieldName::Avatar, AVATAR_UNREADABLE);
            }
            Err(err @ SubmitError::AvatarTooLarge { .. }) => {
                warn!(error = %err, "avatar grew past the size limit");
                self.errors.set(FieldName::Avatar, AVATAR_TOO_LARGE);
            }
            Err(err) => {
                error!(error = %err, "ticket submission failed");
                self.status = Some(SAVE_FAILED_STATUS.to_string());
            }
        }
    }

    pub async fn submit(
        &mut self,
        store: &dyn KeyValueStore,
        navigator: &dyn Navigator,
    ) -> SubmitOutcome {
        let pending = match self.prepare_submission() {
            Ok(pending) => pending,
            Err(rejection) => return SubmitOutcome::Rejected(rejection),
        };
        let result = pending.commit(store, navigator).await;
        self.complete_submission(&result);
        match result {
            Ok(ticket) => SubmitOutcome::Stored(ticket),
            Err(err) => SubmitOutcome::Failed(err.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
