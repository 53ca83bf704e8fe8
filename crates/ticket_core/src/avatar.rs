//! Avatar files captured by the picker or a drop, and their embedded
//! (`data:` URL) encoding.

use std::{
    io::{self, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use tokio::io::AsyncReadExt;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum AvatarReadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("avatar is larger than {limit} bytes")]
    TooLarge { limit: u64 },
}

#[derive(Debug, Clone)]
pub enum AvatarSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl AvatarSource {
    /// Reads at most `limit + 1` bytes, so a result longer than `limit`
    /// means the source is over the limit without buffering all of it.
    pub async fn read_capped(&self, limit: u64) -> io::Result<Vec<u8>> {
        match self {
            Self::Path(path) => {
                let file = tokio::fs::File::open(path).await?;
                let mut bytes = Vec::new();
                file.take(limit.saturating_add(1))
                    .read_to_end(&mut bytes)
                    .await?;
                Ok(bytes)
            }
            Self::Bytes(bytes) => Ok(capped_slice(bytes, limit).to_vec()),
        }
    }

    /// Blocking variant of [`Self::read_capped`] for callers that already
    /// live off the async runtime, such as a UI thread decoding a preview.
    pub fn read_capped_blocking(&self, limit: u64) -> io::Result<Vec<u8>> {
        match self {
            Self::Path(path) => {
                let file = std::fs::File::open(path)?;
                let mut bytes = Vec::new();
                file.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
                Ok(bytes)
            }
            Self::Bytes(bytes) => Ok(capped_slice(bytes, limit).to_vec()),
        }
    }
}

fn capped_slice(bytes: &[u8], limit: u64) -> &[u8] {
    let end = usize::try_from(limit.saturating_add(1))
        .map_or(bytes.len(), |cap| cap.min(bytes.len()));
    &bytes[..end]
}

/// A single selected file with its declared MIME type and byte size.
#[derive(Debug, Clone)]
pub struct AvatarFile {
    name: String,
    mime_type: String,
    size_bytes: u64,
    source: AvatarSource,
}

impl AvatarFile {
    /// Declared type comes from the extension, size from filesystem metadata.
    pub fn from_path(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("avatar")
            .to_string();
        Ok(Self {
            name,
            mime_type: guess_mime_type(&path),
            size_bytes: metadata.len(),
            source: AvatarSource::Path(path),
        })
    }

    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            source: AvatarSource::Bytes(bytes),
        }
    }

    /// Overrides the guessed type with one declared by the drop surface.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        if !mime_type.trim().is_empty() {
            self.mime_type = mime_type;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn source(&self) -> &AvatarSource {
        &self.source
    }

    /// Reads the current contents, refusing anything over `limit` bytes.
    /// The size seen at selection time is not trusted since the file may have
    /// changed since.
    pub async fn to_data_url(&self, limit: u64) -> Result<String, AvatarReadError> {
        let bytes = self.source.read_capped(limit).await?;
        if bytes.len() as u64 > limit {
            return Err(AvatarReadError::TooLarge { limit });
        }
        Ok(encode_data_url(&self.mime_type, &bytes))
    }
}

pub fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME_TYPE)
        .to_string()
}

pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    let mime_type = if mime_type.trim().is_empty() {
        FALLBACK_MIME_TYPE
    } else {
        mime_type
    };
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Splits a base64 `data:` URL into its MIME type and payload.
pub fn decode_data_url(url: &str) -> Option<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime_type.to_string(), bytes))
}
