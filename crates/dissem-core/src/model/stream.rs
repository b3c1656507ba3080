//! Request context and MIME-typed output streams.

use std::collections::BTreeMap;
use std::io::{self, Read};

/// Caller identity and environment attributes for one request.
///
/// The context is passed through to the authorization collaborator without
/// interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    subject: Option<String>,
    attributes: BTreeMap<String, String>,
}

impl RequestContext {
    /// Creates a context with no authenticated subject.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates a context for an authenticated subject.
    #[must_use]
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an environment attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns the authenticated subject, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the environment attributes.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// Binary content tagged with its MIME type.
///
/// # Example
///
/// ```
/// use dissem_core::model::MimeTypedStream;
///
/// let stream = MimeTypedStream::from_bytes("text/plain", b"hello".to_vec());
/// assert_eq!(stream.mime_type(), "text/plain");
/// assert_eq!(stream.into_bytes().expect("read"), b"hello");
/// ```
pub struct MimeTypedStream {
    mime_type: String,
    content: Box<dyn Read + Send>,
}

impl MimeTypedStream {
    /// Wraps a reader.
    #[must_use]
    pub fn new(mime_type: impl Into<String>, content: impl Read + Send + 'static) -> Self {
        Self {
            mime_type: mime_type.into(),
            content: Box::new(content),
        }
    }

    /// Wraps an in-memory buffer.
    #[must_use]
    pub fn from_bytes(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(mime_type, io::Cursor::new(bytes))
    }

    /// Returns the MIME type.
    #[must_use]
    pub const fn mime_type(&self) -> &str {
        self.mime_type.as_str()
    }

    /// Consumes the stream, returning the MIME type and the reader.
    #[must_use]
    pub fn into_parts(self) -> (String, Box<dyn Read + Send>) {
        (self.mime_type, self.content)
    }

    /// Reads the whole stream into memory.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by the underlying reader.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.content.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

impl std::fmt::Debug for MimeTypedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MimeTypedStream")
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}
