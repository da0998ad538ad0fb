//! Payload decoding.
//!
//! Publishers serve `.xml.gz` locations that are sometimes gzip and sometimes
//! plain XML, so compression is detected from the bytes rather than trusted
//! from the name or headers.

use flate2::read::MultiGzDecoder;
use std::borrow::Cow;
use std::io::Read;
use tracing::debug;

/// Gunzip `body`, or hand it back untouched when it is not a complete gzip
/// stream (missing magic, bad header, truncated member or trailer).
pub fn gunzip_or_raw(body: &[u8]) -> Cow<'_, [u8]> {
    let mut decoded = Vec::new();
    match MultiGzDecoder::new(body).read_to_end(&mut decoded) {
        Ok(_) => {
            debug!(
                compressed = body.len(),
                decompressed = decoded.len(),
                "Decompressed gzip payload"
            );
            Cow::Owned(decoded)
        }
        Err(e) => {
            debug!(error = %e, bytes = body.len(), "Payload is not gzip; using raw bytes");
            Cow::Borrowed(body)
        }
    }
}
