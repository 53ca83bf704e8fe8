//! Temporary preview references for the selected avatar.
//!
//! A [`PreviewHandle`] is the only way to obtain a live preview URL, and
//! dropping it revokes the URL, so every acquisition has exactly one release.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use uuid::Uuid;

use crate::avatar::{AvatarFile, AvatarSource};

const PREVIEW_URL_PREFIX: &str = "blob:conf-ticket/";

#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<Mutex<HashMap<String, AvatarSource>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, file: &AvatarFile) -> PreviewHandle {
        let url = format!("{PREVIEW_URL_PREFIX}{}", Uuid::new_v4());
        self.entries().insert(url.clone(), file.source().clone());
        tracing::debug!(url = %url, file = file.name(), "created avatar preview");
        PreviewHandle {
            url,
            registry: self.clone(),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<AvatarSource> {
        self.entries().get(url).cloned()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.entries().contains_key(url)
    }

    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    fn revoke(&self, url: &str) {
        if self.entries().remove(url).is_some() {
            tracing::debug!(url, "revoked avatar preview");
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, AvatarSource>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct PreviewHandle {
    url: String,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> AvatarFile {
        AvatarFile::from_bytes("me.png", "image/png", vec![1, 2, 3])
    }

    #[test]
    fn handle_is_resolvable_until_dropped() {
        let registry = PreviewRegistry::new();
        let handle = registry.create(&png());
        let url = handle.url().to_string();

        assert!(url.starts_with(PREVIEW_URL_PREFIX));
        assert!(registry.is_live(&url));
        assert!(matches!(
            registry.resolve(&url),
            Some(AvatarSource::Bytes(bytes)) if bytes[..] == [1, 2, 3]
        ));

        drop(handle);
        assert!(!registry.is_live(&url));
        assert!(registry.resolve(&url).is_none());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn each_acquisition_gets_a_distinct_url() {
        let registry = PreviewRegistry::new();
        let first = registry.create(&png());
        let second = registry.create(&png());
        assert_ne!(first.url(), second.url());
        assert_eq!(registry.live_count(), 2);

        drop(first);
        assert_eq!(registry.live_count(), 1);
        assert!(registry.is_live(second.url()));
    }
}
