//! Data URL encoding: raw bytes ⇄ `data:<mime>;base64,<payload>`.
//!
//! The same string serves as the image preview and as the source of the
//! payload sent to the model, which wants the bare base64 part.

use crate::error::SolverError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Encode file bytes as a self-describing data URL.
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), b64.len());
    format!("data:{mime_type};base64,{b64}")
}

/// Return the payload of a data URL, i.e. everything after the first comma.
pub fn strip_data_url_prefix(data_url: &str) -> Result<&str, SolverError> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| SolverError::InvalidDataUrl("missing ',' separator".into()))?;
    if !header.starts_with("data:") {
        return Err(SolverError::InvalidDataUrl(format!(
            "expected 'data:' scheme, got '{}'",
            header.chars().take(16).collect::<String>()
        )));
    }
    Ok(payload)
}

/// MIME type declared in a data URL header.
pub fn data_url_mime(data_url: &str) -> Option<&str> {
    let header = data_url.split_once(',')?.0.strip_prefix("data:")?;
    header.split(';').next().filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_round_trip() {
        let url = to_data_url("image/png", b"\x89PNG");
        assert_eq!(url, "data:image/png;base64,iVBORw==");
        let payload = strip_data_url_prefix(&url).unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), b"\x89PNG");
        assert_eq!(data_url_mime(&url), Some("image/png"));
    }

    #[test]
    fn strip_rejects_plain_text() {
        assert!(matches!(
            strip_data_url_prefix("no comma here"),
            Err(SolverError::InvalidDataUrl(_))
        ));
        assert!(strip_data_url_prefix("http://x,y").is_err());
    }

    #[test]
    fn pdf_prefix_is_stripped() {
        let url = "data:application/pdf;base64,JVBERi0=";
        assert_eq!(strip_data_url_prefix(url).unwrap(), "JVBERi0=");
        assert_eq!(data_url_mime(url), Some("application/pdf"));
    }
}
