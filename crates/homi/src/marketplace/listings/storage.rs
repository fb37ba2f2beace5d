use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MediaStorageError {
    #[error("media store rejected '{name}': {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("media store unavailable: {0}")]
    Unavailable(String),
}

/// Blob storage collaborator for listing media. Implementations must never
/// overwrite an existing entry; the pipeline builds collision-resistant
/// names on top of this guarantee.
pub trait MediaStorage: Send + Sync {
    /// Store the bytes under `suggested_name` and return the public URL
    /// path the stored blob is reachable at.
    fn store(&self, bytes: &[u8], suggested_name: &str) -> Result<String, MediaStorageError>;
}

/// Filesystem-backed media store serving files below a public URL prefix.
#[derive(Debug, Clone)]
pub struct FsMediaStorage {
    root: PathBuf,
    public_prefix: String,
}

impl FsMediaStorage {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }
}

impl MediaStorage for FsMediaStorage {
    fn store(&self, bytes: &[u8], suggested_name: &str) -> Result<String, MediaStorageError> {
        fs::create_dir_all(&self.root)
            .map_err(|err| MediaStorageError::Unavailable(err.to_string()))?;

        let name = sanitize_file_name(suggested_name);
        let path = self.root.join(&name);
        // create_new keeps the no-overwrite guarantee.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| MediaStorageError::Write {
                name: name.clone(),
                source,
            })?;
        file.write_all(bytes)
            .map_err(|source| MediaStorageError::Write {
                name: name.clone(),
                source,
            })?;

        Ok(format!(
            "{}/{}",
            self.public_prefix.trim_end_matches('/'),
            name
        ))
    }
}

/// Reduce an uploaded file name to a safe slug: ASCII alphanumerics, dots,
/// dashes, and underscores survive; everything else collapses to a dash.
pub fn sanitize_file_name(raw: &str) -> String {
    let mut slug = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}
