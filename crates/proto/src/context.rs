//! Request correlation-id propagation over gRPC metadata.
//!
//! Every outbound call carries an `x-request-id` header used purely for
//! cross-service latency and trace correlation. It carries no authority and
//! must never affect protocol outcomes: a missing or malformed header is
//! replaced by a freshly generated id, never rejected.

use std::fmt;

use tonic::metadata::MetadataMap;
use uuid::Uuid;

/// Metadata header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Maximum accepted length of an incoming request id.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation context for a request, threaded through every outbound call a
/// service makes while handling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Opaque correlation identifier.
    pub request_id: String,
}

impl RequestContext {
    /// Generates a fresh context with a random request id.
    ///
    /// Used at the edge of the system, or when an inbound request carried no
    /// usable id.
    pub fn new() -> Self {
        Self { request_id: Uuid::new_v4().to_string() }
    }

    /// Wraps an existing correlation id.
    pub fn with_id(request_id: impl Into<String>) -> Self {
        Self { request_id: request_id.into() }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.request_id)
    }
}

/// Parse error for request-id extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Header value is not valid ASCII.
    InvalidAscii,
    /// Header value is empty, too long, or contains non-printable characters.
    InvalidFormat,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidAscii => write!(f, "x-request-id header contains non-ASCII"),
            ParseError::InvalidFormat => write!(f, "x-request-id header has invalid format"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Extract the correlation id from gRPC metadata.
///
/// Returns `None` if the header is missing, `Err` if it is present but
/// unusable.
pub fn extract_from_metadata(metadata: &MetadataMap) -> Result<Option<RequestContext>, ParseError> {
    let value = match metadata.get(REQUEST_ID_HEADER) {
        Some(value) => value.to_str().map_err(|_| ParseError::InvalidAscii)?,
        None => return Ok(None),
    };

    if value.is_empty()
        || value.len() > MAX_REQUEST_ID_LEN
        || !value.chars().all(|c| c.is_ascii_graphic())
    {
        return Err(ParseError::InvalidFormat);
    }

    Ok(Some(RequestContext::with_id(value)))
}

/// Inject the correlation id into gRPC metadata.
pub fn inject_into_metadata(metadata: &mut MetadataMap, context: &RequestContext) {
    if let Ok(value) = context.request_id.parse() {
        metadata.insert(REQUEST_ID_HEADER, value);
    }
}

/// Extract the correlation id, or generate a fresh one.
///
/// Malformed headers are logged and replaced; they never fail the request.
pub fn extract_or_generate(metadata: &MetadataMap) -> RequestContext {
    match extract_from_metadata(metadata) {
        Ok(Some(ctx)) => ctx,
        Ok(None) => RequestContext::new(),
        Err(e) => {
            tracing::warn!("malformed x-request-id header: {}, generating new id", e);
            RequestContext::new()
        },
    }
}
