//! JSON document archive
//!
//! A [`Document`] wraps a top-level JSON object and offers total, typed
//! accessors: a getter never fails, it falls back to the caller's default
//! when a key is missing or holds a value of another JSON type. Loading is
//! best-effort as well: only failing to open or read the file is reported,
//! malformed content yields an empty document.

use serde_json::{Map, Value};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while reading or writing a document
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("couldn't open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("top-level JSON value is not an object")]
    NotAnObject,
}

impl ArchiveError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Scalar types that can be read from a JSON value
pub trait JsonScalar: Sized {
    /// Whether the value has the JSON type this scalar is stored as
    fn matches(value: &Value) -> bool;

    /// Best-effort conversion; anything unrepresentable becomes the zero value
    fn coerce(value: &Value) -> Self;
}

impl JsonScalar for i32 {
    fn matches(value: &Value) -> bool {
        value.is_number()
    }

    fn coerce(value: &Value) -> Self {
        match value.as_f64() {
            Some(n) if n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64 => {
                n as i32
            }
            _ => 0,
        }
    }
}

impl JsonScalar for f64 {
    fn matches(value: &Value) -> bool {
        value.is_number()
    }

    fn coerce(value: &Value) -> Self {
        value.as_f64().unwrap_or(0.0)
    }
}

impl JsonScalar for bool {
    fn matches(value: &Value) -> bool {
        value.is_boolean()
    }

    fn coerce(value: &Value) -> Self {
        value.as_bool().unwrap_or(false)
    }
}

impl JsonScalar for String {
    fn matches(value: &Value) -> bool {
        value.is_string()
    }

    fn coerce(value: &Value) -> Self {
        value.as_str().map(str::to_owned).unwrap_or_default()
    }
}

/// A JSON object document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document, rejecting malformed JSON and non-object roots
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArchiveError> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(root) => Ok(Document { root }),
            _ => Err(ArchiveError::NotAnObject),
        }
    }

    /// Load a document from `path`
    ///
    /// Only open and read failures are errors. Content that does not parse
    /// as a JSON object produces an empty document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Couldn't open load file");
            ArchiveError::io(path, e)
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::io(path, e))?;

        match Self::from_slice(&bytes) {
            Ok(document) => {
                debug!(path = %path.display(), keys = document.len(), "Loaded document");
                Ok(document)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable document content");
                Ok(Self::new())
            }
        }
    }

    /// Save the document to `path`, truncating any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArchiveError> {
        let path = path.as_ref();
        let mut file = File::create(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Couldn't open save file");
            ArchiveError::io(path, e)
        })?;

        let mut bytes = serde_json::to_vec_pretty(&self.root)?;
        bytes.push(b'\n');
        file.write_all(&bytes)
            .map_err(|e| ArchiveError::io(path, e))?;

        debug!(path = %path.display(), keys = self.len(), "Saved document");
        Ok(())
    }

    /// Read a scalar, falling back to `default` on a missing key or type mismatch
    pub fn get<T: JsonScalar>(&self, key: &str, default: T) -> T {
        match self.root.get(key) {
            Some(value) if T::matches(value) => T::coerce(value),
            _ => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.get(key, default)
    }

    pub fn get_double(&self, key: &str, default: f64) -> f64 {
        self.get(key, default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key, default)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get(key, default.to_owned())
    }

    /// Read an array, coercing every element to `T`
    ///
    /// Returns `None` when the key is missing or does not hold an array.
    pub fn get_array<T: JsonScalar>(&self, key: &str) -> Option<Vec<T>> {
        match self.root.get(key) {
            Some(Value::Array(items)) => Some(items.iter().map(T::coerce).collect()),
            _ => None,
        }
    }

    /// Store a value under `key`, replacing any previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.root.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }
}

impl From<Map<String, Value>> for Document {
    fn from(root: Map<String, Value>) -> Self {
        Document { root }
    }
}
