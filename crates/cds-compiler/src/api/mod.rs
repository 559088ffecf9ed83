//! HTTP clients.

mod explorer;

pub use explorer::{normalize_address, AbiExplorerClient};

use crate::error::{CdsError, CdsResult};

/// Maximum size kept from an error response body (8 KB).
const MAX_ERROR_BODY_SIZE: usize = 8 * 1024;

/// Reads a response body, aborting as soon as it exceeds `max_size` bytes.
///
/// `Content-Length` is checked first; the body is then streamed so that a
/// chunked response cannot bypass the limit.
///
/// # Errors
///
/// Returns [`CdsError::Api`] if the body is larger than `max_size`, or
/// [`CdsError::Http`] if reading fails.
pub(crate) async fn read_response_bounded(
    mut response: reqwest::Response,
    max_size: usize,
) -> CdsResult<Vec<u8>> {
    let status = response.status().as_u16();
    if let Some(content_length) = response.content_length() {
        if content_length > max_size as u64 {
            return Err(CdsError::api(
                status,
                format!(
                    "response too large: Content-Length {content_length} bytes exceeds limit of {max_size} bytes"
                ),
            ));
        }
    }

    let mut body = Vec::with_capacity(max_size.min(64 * 1024));
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > max_size {
            return Err(CdsError::api(
                status,
                format!("response too large: exceeded limit of {max_size} bytes during streaming"),
            ));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Truncates an error body to [`MAX_ERROR_BODY_SIZE`] on a char boundary.
pub(crate) fn truncate_error_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY_SIZE {
        return body;
    }
    let mut end = MAX_ERROR_BODY_SIZE;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated, total: {} bytes]", &body[..end], body.len())
}
