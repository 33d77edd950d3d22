//! Input-side data structures (media handles, probe results).

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Caller-supplied input file: a display name plus its byte content.
///
/// Immutable once created. Cloning shares the underlying bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaHandle {
    name: String,
    bytes: Arc<[u8]>,
}

impl MediaHandle {
    /// Create a handle from a name and in-memory content.
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk into a handle named after its file name.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// Original file name as selected by the user.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercase extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

impl fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaHandle")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Duration discovered for one input.
///
/// A probe result only exists for a strictly positive, finite duration;
/// "not yet determined" is expressed by the absence of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// User-facing name of the probed input.
    pub source_name: String,
    /// Duration in seconds.
    pub duration_seconds: f64,
}

impl ProbeResult {
    /// Create a probe result, rejecting zero, negative, and non-finite durations.
    pub fn new(source_name: impl Into<String>, duration_seconds: f64) -> Option<Self> {
        if duration_seconds.is_finite() && duration_seconds > 0.0 {
            Some(Self {
                source_name: source_name.into(),
                duration_seconds,
            })
        } else {
            None
        }
    }
}
