//! Ingestion: turn a path, URL or pasted bytes into an [`UploadedFile`].
//!
//! Every source funnels into [`ingest_bytes`], which decides the MIME type,
//! rejects anything that is not an image or a PDF, and builds the data URL.
//! Read failures are returned as errors instead of being dropped.

use crate::error::SolverError;
use crate::model::UploadedFile;
use crate::pipeline::encode::to_data_url;
use std::path::Path;
use tracing::{debug, info, warn};

/// Advisory upload size. Larger files are accepted with a warning.
pub const SIZE_HINT_BYTES: usize = 5 * 1024 * 1024;

/// Where a file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestSource {
    /// Chosen with a file picker or given as a path argument.
    Picker,
    /// Dropped onto the application by a host.
    Drop,
    /// Pasted from the clipboard. Images only.
    Paste,
    /// Downloaded from an HTTP(S) URL.
    Url,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// `true` for the MIME types the solver accepts.
pub fn is_supported_mime(mime: &str) -> bool {
    mime.starts_with("image/") || mime == "application/pdf"
}

/// Read a local file and ingest it.
pub async fn ingest_path(
    path: impl AsRef<Path>,
    source: IngestSource,
) -> Result<UploadedFile, SolverError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SolverError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => SolverError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => SolverError::FileReadFailed {
            name: path.display().to_string(),
            reason: e.to_string(),
        },
    })?;

    let name = file_name_of(path);
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    ingest_bytes(&name, None, &bytes, source)
}

/// Download a URL and ingest the body.
pub async fn ingest_url(url: &str, timeout_secs: u64) -> Result<UploadedFile, SolverError> {
    info!("Downloading problem file from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SolverError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            SolverError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            SolverError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(SolverError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let declared = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SolverError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let name = extract_filename(url);
    ingest_bytes(&name, declared.as_deref(), &bytes, IngestSource::Url)
}

/// Validate and encode in-memory file content.
///
/// `declared_mime` is what the source claimed (a browser `File.type`, an
/// HTTP `Content-Type`). Content sniffing wins over it.
pub fn ingest_bytes(
    name: &str,
    declared_mime: Option<&str>,
    bytes: &[u8],
    source: IngestSource,
) -> Result<UploadedFile, SolverError> {
    if bytes.is_empty() {
        return Err(SolverError::EmptyFile {
            name: name.to_string(),
        });
    }

    let mime = detect_mime(name, declared_mime, bytes).ok_or_else(|| {
        SolverError::UnsupportedFileType {
            name: name.to_string(),
            mime: declared_mime.unwrap_or("unknown").to_string(),
        }
    })?;

    if !is_supported_mime(&mime) || (source == IngestSource::Paste && !mime.starts_with("image/"))
    {
        return Err(SolverError::UnsupportedFileType {
            name: name.to_string(),
            mime,
        });
    }

    if bytes.len() > SIZE_HINT_BYTES {
        warn!(
            "'{}' is {:.1} MB, above the recommended {} MB",
            name,
            bytes.len() as f64 / (1024.0 * 1024.0),
            SIZE_HINT_BYTES / (1024 * 1024)
        );
    }

    info!("Ingested '{}' ({}, {} bytes, {:?})", name, mime, bytes.len(), source);

    let mut file = UploadedFile {
        name: name.to_string(),
        encoded_data: to_data_url(&mime, bytes),
        mime_type: mime,
        preview_url: String::new(),
    };
    if file.is_image() {
        file.preview_url = file.encoded_data.clone();
    }
    Ok(file)
}

/// Decide the MIME type from magic bytes, the declared type, then the
/// extension. Returns `None` when nothing matches.
pub fn detect_mime(name: &str, declared: Option<&str>, bytes: &[u8]) -> Option<String> {
    if bytes.starts_with(b"%PDF") {
        return Some("application/pdf".to_string());
    }
    if let Ok(format) = image::guess_format(bytes) {
        return Some(format.to_mime_type().to_string());
    }
    if let Some(declared) = declared.map(str::trim).filter(|d| !d.is_empty()) {
        return Some(declared.to_lowercase());
    }
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime.to_string())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract a reasonable filename from the URL.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/p.png"));
        assert!(is_url("http://example.com/p.pdf"));
        assert!(!is_url("/tmp/p.png"));
        assert!(!is_url(""));
    }

    #[test]
    fn jpeg_preview_equals_payload() {
        let f = ingest_bytes("de.jpg", Some("image/jpeg"), JPEG_MAGIC, IngestSource::Picker)
            .unwrap();
        assert_eq!(f.mime_type, "image/jpeg");
        assert!(f.encoded_data.starts_with("data:image/jpeg;base64,"));
        assert_eq!(f.preview_url, f.encoded_data);
    }

    #[test]
    fn pdf_has_no_preview() {
        let f = ingest_bytes("de.pdf", None, b"%PDF-1.7\n...", IngestSource::Drop).unwrap();
        assert_eq!(f.mime_type, "application/pdf");
        assert!(f.preview_url.is_empty());
        assert!(f.is_pdf());
    }

    #[test]
    fn sniffing_beats_wrong_extension() {
        assert_eq!(
            detect_mime("scan.pdf", None, PNG_MAGIC).as_deref(),
            Some("image/png")
        );
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(
            detect_mime("photo.JPEG", None, b"????").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(detect_mime("notes.txt", None, b"hello"), None);
    }

    #[test]
    fn text_files_are_rejected() {
        let err = ingest_bytes("notes.txt", Some("text/plain"), b"hi", IngestSource::Picker)
            .unwrap_err();
        assert!(matches!(err, SolverError::UnsupportedFileType { .. }));
    }

    #[test]
    fn paste_accepts_images_only() {
        assert!(ingest_bytes("clip", None, PNG_MAGIC, IngestSource::Paste).is_ok());
        let err = ingest_bytes("clip", None, b"%PDF-1.4", IngestSource::Paste).unwrap_err();
        assert!(matches!(err, SolverError::UnsupportedFileType { .. }));
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(matches!(
            ingest_bytes("a.png", None, b"", IngestSource::Picker),
            Err(SolverError::EmptyFile { .. })
        ));
    }

    #[test]
    fn oversize_is_only_advisory() {
        let mut big = PNG_MAGIC.to_vec();
        big.resize(SIZE_HINT_BYTES + 1, 0);
        assert!(ingest_bytes("big.png", None, &big, IngestSource::Picker).is_ok());
    }

    #[tokio::test]
    async fn missing_path_is_reported() {
        let err = ingest_path("/definitely/not/here.png", IngestSource::Picker)
            .await
            .unwrap_err();
        assert!(matches!(err, SolverError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bai1.png");
        std::fs::write(&path, PNG_MAGIC).unwrap();
        let f = ingest_path(&path, IngestSource::Picker).await.unwrap();
        assert_eq!(f.name, "bai1.png");
        assert_eq!(f.mime_type, "image/png");
    }

    #[test]
    fn url_filename() {
        assert_eq!(extract_filename("https://x.org/problems/a.pdf"), "a.pdf");
        assert_eq!(extract_filename("https://x.org/"), "downloaded");
    }
}
