use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use thiserror::Error;

/// Separates the data-URI header from the payload.
const BASE64_MARKER: &str = ";base64,";

/// Longest extension we derive from a MIME subtype.
const MAX_EXTENSION_LEN: usize = 16;

/// Standard alphabet, padding optional. Some WebView encoders drop the trailing `=`.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The message carries only the input length, never bytes or offsets from the payload.
    #[error("invalid base64 payload ({input_len} bytes of input)")]
    InvalidBase64 {
        input_len: usize,
        #[source]
        source: base64::DecodeError,
    },
}

impl DecodeError {
    pub fn input_len(&self) -> usize {
        match self {
            DecodeError::InvalidBase64 { input_len, .. } => *input_len,
        }
    }

    /// Short name of the failure, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::InvalidBase64 { source, .. } => match source {
                base64::DecodeError::InvalidByte(..) => "invalid_byte",
                base64::DecodeError::InvalidLength(_) => "invalid_length",
                base64::DecodeError::InvalidLastSymbol(..) => "invalid_last_symbol",
                base64::DecodeError::InvalidPadding => "invalid_padding",
            },
        }
    }
}

/// Raw bytes recovered from a base64 string or data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub bytes: Vec<u8>,
    /// MIME type from the data-URI header, lower-cased, without parameters.
    pub mime_type: Option<String>,
    /// Extension inferred from `mime_type`.
    pub extension: Option<String>,
}

impl DecodedPayload {
    pub fn extension_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.extension.as_deref().unwrap_or(fallback)
    }

    /// Extension guessed from the leading magic bytes.
    pub fn sniffed_extension(&self) -> Option<&'static str> {
        infer::get(&self.bytes).map(|kind| kind.extension())
    }
}

/// Decodes a data URI (`data:<mime>;base64,<payload>`) or a bare base64 string.
///
/// Bare input has no MIME type, so `extension` is `None` and the caller picks a
/// fallback. Nothing is returned unless the whole payload decodes.
pub fn decode(input: &str) -> Result<DecodedPayload, DecodeError> {
    let (mime_type, payload) = split_data_uri(input);

    let bytes = decode_base64(payload).map_err(|source| DecodeError::InvalidBase64 {
        input_len: input.len(),
        source,
    })?;

    let extension = mime_type.as_deref().and_then(extension_for_mime);

    Ok(DecodedPayload {
        bytes,
        mime_type,
        extension,
    })
}

/// Returns the MIME type of a data-URI header (if any) and the base64 payload.
/// The payload follows the last marker, so a header can never swallow part of it.
pub fn split_data_uri(input: &str) -> (Option<String>, &str) {
    match input.rsplit_once(BASE64_MARKER) {
        Some((header, payload)) => {
            let mime = header.strip_prefix("data:").and_then(normalize_mime);
            (mime, payload)
        }
        None => (None, input),
    }
}

fn normalize_mime(header: &str) -> Option<String> {
    let mime = header.split(';').next().unwrap_or("").trim();
    if mime.is_empty() {
        None
    } else {
        Some(mime.to_ascii_lowercase())
    }
}

/// Maps a MIME type to a file extension: the subtype after `/`.
///
/// Suffixes (`svg+xml`) are cut at `+`, only ASCII alphanumerics and `-` survive.
/// `octet-stream` names no format, so it yields `None` like a missing MIME type.
pub fn extension_for_mime(mime: &str) -> Option<String> {
    let (_, subtype) = mime.split_once('/')?;
    let subtype = subtype.split('+').next().unwrap_or("");
    if subtype.eq_ignore_ascii_case("octet-stream") {
        return None;
    }

    let extension: String = subtype
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .take(MAX_EXTENSION_LEN)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if extension.is_empty() {
        None
    } else {
        Some(extension)
    }
}

fn decode_base64(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        LENIENT.decode(compact)
    } else {
        LENIENT.decode(payload)
    }
}
