//! Character encoding detection and decoding of the source export.
//!
//! ERP exports arrive as UTF-8, UTF-8 with BOM or a legacy single-byte encoding
//! depending on the machine that produced them. A byte order mark wins; otherwise
//! the encoding is guessed from the content.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use tracing::{info, warn};

use crate::bail;
use crate::error::{ErrorKind, SyncResult};

/// Returns the most probable encoding of `bytes`.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

/// Resolves an encoding label such as `utf-8` or `latin1`.
pub fn encoding_for_label(label: &str) -> SyncResult<&'static Encoding> {
    match Encoding::for_label(label.trim().as_bytes()) {
        Some(encoding) => Ok(encoding),
        None => bail!(
            ErrorKind::ConfigError,
            "Unknown source encoding label",
            detail = label.to_string()
        ),
    }
}

/// Decodes `bytes` to text using `encoding`, or a detected encoding when `None`.
///
/// A leading byte order mark is stripped. Malformed sequences are replaced with
/// U+FFFD and reported as a warning rather than failing the load.
pub fn decode(bytes: &[u8], encoding: Option<&'static Encoding>) -> String {
    let encoding = match encoding {
        Some(encoding) => encoding,
        None => {
            let detected = detect_encoding(bytes);
            info!(encoding = detected.name(), "detected source encoding");
            detected
        }
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            encoding = used.name(),
            "source file contains malformed sequences, replaced with U+FFFD"
        );
    }

    text.into_owned()
}
