//! Export artifacts built from a [`SolutionResult`].
//!
//! Each export is pure over the result: it builds the full file in memory and
//! hands it back as an [`Artifact`]. Saving is a separate step
//! ([`write_artifact`]) so a failed write never leaves a half-built file and
//! export failures stay out of the session lifecycle.

use crate::error::{ExportError, ExportKind};
use crate::model::{Language, SolutionResult};
use crate::present::{bold_spans, Span};
use docx_rs::{
    AlignmentType, BreakType, Docx, LineSpacing, Paragraph, Run, RunFonts, Style, StyleType,
};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const TEST_ARCHIVE_NAME: &str = "test_cases.zip";
pub const TEST_ARCHIVE_DIR: &str = "test_cases";
pub const REPORT_NAME: &str = "Giai_bai_tap_report.docx";
pub const REPORT_TITLE: &str = "Báo cáo lời giải bài toán";

const CODE_FONT: &str = "Consolas";
/// Half-points, so 10 pt.
const CODE_SIZE: usize = 20;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A named file ready to be saved or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

// ── Code ────────────────────────────────────────────────────────────────────

/// `solution.cpp` or `solution.py` holding the code as-is.
pub fn export_code(result: &SolutionResult, language: Language) -> Artifact {
    Artifact {
        file_name: format!("solution.{}", language.extension()),
        mime_type: "text/plain",
        bytes: result.raw_code.as_bytes().to_vec(),
    }
}

// ── Test archive ────────────────────────────────────────────────────────────

/// Entry names for test case `index` (1-based).
fn test_entry_names(index: usize) -> (String, String) {
    (
        format!("{}/test{:02}.inp", TEST_ARCHIVE_DIR, index),
        format!("{}/test{:02}.out", TEST_ARCHIVE_DIR, index),
    )
}

/// Zip every test case as an `.inp`/`.out` pair, in order.
pub fn export_test_archive(result: &SolutionResult) -> Result<Artifact, ExportError> {
    let failed = |e: zip::result::ZipError| ExportError::BuildFailed {
        kind: ExportKind::TestArchive,
        detail: e.to_string(),
    };
    let io_failed = |e: std::io::Error| ExportError::BuildFailed {
        kind: ExportKind::TestArchive,
        detail: e.to_string(),
    };

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (i, tc) in result.test_cases.iter().enumerate() {
        let (inp, out) = test_entry_names(i + 1);
        writer.start_file(inp, options).map_err(failed)?;
        writer.write_all(tc.input.as_bytes()).map_err(io_failed)?;
        writer.start_file(out, options).map_err(failed)?;
        writer.write_all(tc.output.as_bytes()).map_err(io_failed)?;
    }

    let bytes = writer.finish().map_err(failed)?.into_inner();
    debug!(
        "Built {} with {} test cases ({} bytes)",
        TEST_ARCHIVE_NAME,
        result.test_cases.len(),
        bytes.len()
    );
    Ok(Artifact {
        file_name: TEST_ARCHIVE_NAME.to_string(),
        mime_type: "application/zip",
        bytes,
    })
}

// ── Report ──────────────────────────────────────────────────────────────────

/// Document content before it is laid out as Word XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportBlock {
    Title(String),
    Heading { level: u8, text: String },
    Paragraph(Vec<Span>),
    /// Starts a new page; the next block opens it.
    PageBreak,
    CodeLine(String),
}

/// Lay out the report: title, explanation, then the code on its own page.
pub fn report_blocks(result: &SolutionResult, language: Language) -> Vec<ReportBlock> {
    let mut blocks = vec![ReportBlock::Title(REPORT_TITLE.to_string())];

    for raw in result.markdown.split('\n') {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let heading = [("### ", 3u8), ("## ", 2), ("# ", 1)]
            .into_iter()
            .find_map(|(prefix, level)| {
                line.strip_prefix(prefix).map(|text| ReportBlock::Heading {
                    level,
                    text: text.to_string(),
                })
            });
        blocks.push(heading.unwrap_or_else(|| ReportBlock::Paragraph(bold_spans(line))));
    }

    blocks.push(ReportBlock::PageBreak);
    blocks.push(ReportBlock::Heading {
        level: 2,
        text: format!("Mã nguồn ({})", language.display_name()),
    });
    blocks.extend(
        result
            .raw_code
            .split('\n')
            .map(|line| ReportBlock::CodeLine(line.trim_end_matches('\r').to_string())),
    );
    blocks
}

fn heading_style(level: u8) -> &'static str {
    match level {
        1 => "Heading1",
        2 => "Heading2",
        _ => "Heading3",
    }
}

/// Paragraph spacing `(before, after)` in twips.
///
/// `opens_page` is set for the block right after a page break, which gets
/// the wider section spacing.
pub fn block_spacing(block: &ReportBlock, opens_page: bool) -> Option<(u32, u32)> {
    match block {
        ReportBlock::Title(_) => Some((0, 300)),
        ReportBlock::Heading { .. } if opens_page => Some((400, 200)),
        ReportBlock::Heading { level: 1 | 2, .. } => Some((240, 120)),
        ReportBlock::Heading { .. } => Some((200, 100)),
        ReportBlock::Paragraph(_) => Some((0, 100)),
        ReportBlock::PageBreak | ReportBlock::CodeLine(_) => None,
    }
}

fn render_docx(blocks: &[ReportBlock]) -> Docx {
    let mut docx = Docx::new()
        .add_style(
            Style::new("Heading1", StyleType::Paragraph)
                .name("Heading 1")
                .size(32)
                .bold(),
        )
        .add_style(
            Style::new("Heading2", StyleType::Paragraph)
                .name("Heading 2")
                .size(28)
                .bold(),
        )
        .add_style(
            Style::new("Heading3", StyleType::Paragraph)
                .name("Heading 3")
                .size(24)
                .bold(),
        );

    let mut opens_page = false;
    for block in blocks {
        let paragraph = match block {
            ReportBlock::Title(text) => Paragraph::new()
                .style("Heading1")
                .align(AlignmentType::Center)
                .add_run(Run::new().add_text(text.as_str())),
            ReportBlock::Heading { level, text } => Paragraph::new()
                .style(heading_style(*level))
                .add_run(Run::new().add_text(text.as_str())),
            ReportBlock::Paragraph(spans) => {
                spans
                    .iter()
                    .filter(|span| !span.text.is_empty())
                    .fold(Paragraph::new(), |p, span| {
                        let run = Run::new().add_text(span.text.as_str());
                        p.add_run(if span.bold { run.bold() } else { run })
                    })
            }
            ReportBlock::PageBreak => {
                Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
            }
            ReportBlock::CodeLine(line) => Paragraph::new().add_run(
                Run::new()
                    .add_text(line.as_str())
                    .size(CODE_SIZE)
                    .fonts(RunFonts::new().ascii(CODE_FONT).hi_ansi(CODE_FONT)),
            ),
        };
        let paragraph = match block_spacing(block, opens_page) {
            Some((before, after)) => {
                paragraph.line_spacing(LineSpacing::new().before(before).after(after))
            }
            None => paragraph,
        };
        opens_page = matches!(block, ReportBlock::PageBreak);
        docx = docx.add_paragraph(paragraph);
    }
    docx
}

/// Build the Word report.
pub fn export_report(
    result: &SolutionResult,
    language: Language,
) -> Result<Artifact, ExportError> {
    let blocks = report_blocks(result, language);
    let mut buf = Cursor::new(Vec::new());
    render_docx(&blocks)
        .build()
        .pack(&mut buf)
        .map_err(|e| ExportError::BuildFailed {
            kind: ExportKind::Report,
            detail: e.to_string(),
        })?;
    let bytes = buf.into_inner();
    debug!("Built {} from {} blocks ({} bytes)", REPORT_NAME, blocks.len(), bytes.len());
    Ok(Artifact {
        file_name: REPORT_NAME.to_string(),
        mime_type: DOCX_MIME,
        bytes,
    })
}

// ── Saving ──────────────────────────────────────────────────────────────────

/// Save an artifact into `dir`, replacing any file of the same name.
///
/// Writes to a temporary file in `dir` first and renames it into place, so
/// the target is either the old file or the complete new one.
pub fn write_artifact(artifact: &Artifact, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
    let dir = dir.as_ref();
    let target = dir.join(&artifact.file_name);
    let write_failed = |source: std::io::Error| ExportError::WriteFailed {
        path: target.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_failed)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(&artifact.bytes).map_err(write_failed)?;
    tmp.flush().map_err(write_failed)?;
    tmp.persist(&target).map_err(|e| write_failed(e.error))?;

    info!("Saved {} ({} bytes)", target.display(), artifact.bytes.len());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TestCase;
    use std::io::Read;
    use zip::ZipArchive;

    fn sample() -> SolutionResult {
        SolutionResult {
            markdown: "# Phân tích\n\nDùng **quy hoạch động**.\n  ## Độ phức tạp  \nO(n)".into(),
            raw_code: "int main() {\n    return 0;\n}".into(),
            test_cases: vec![
                TestCase { input: "1 2".into(), output: "3".into() },
                TestCase { input: "5 5".into(), output: "10".into() },
            ],
        }
    }

    fn entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut s = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn code_export_uses_language_extension() {
        let r = sample();
        let cpp = export_code(&r, Language::Cpp);
        assert_eq!(cpp.file_name, "solution.cpp");
        assert_eq!(cpp.bytes, r.raw_code.as_bytes());
        assert_eq!(export_code(&r, Language::Python).file_name, "solution.py");
        assert_eq!(export_code(&r, Language::Cpp), cpp);
    }

    #[test]
    fn archive_holds_numbered_pairs_in_order() {
        let artifact = export_test_archive(&sample()).unwrap();
        assert_eq!(artifact.file_name, "test_cases.zip");

        let mut archive = ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
        assert_eq!(archive.len(), 4);
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "test_cases/test01.inp",
                "test_cases/test01.out",
                "test_cases/test02.inp",
                "test_cases/test02.out",
            ]
        );
        assert_eq!(entry(&mut archive, "test_cases/test02.inp"), "5 5");
        assert_eq!(entry(&mut archive, "test_cases/test02.out"), "10");
    }

    #[test]
    fn archive_pads_to_two_digits_and_beyond() {
        let r = SolutionResult {
            test_cases: (0..100)
                .map(|i| TestCase { input: i.to_string(), output: String::new() })
                .collect(),
            ..Default::default()
        };
        let artifact = export_test_archive(&r).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
        assert_eq!(archive.len(), 200);
        assert_eq!(entry(&mut archive, "test_cases/test09.inp"), "8");
        assert_eq!(entry(&mut archive, "test_cases/test100.inp"), "99");
    }

    #[test]
    fn empty_archive_is_valid() {
        let artifact = export_test_archive(&SolutionResult::default()).unwrap();
        let archive = ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn report_layout() {
        let blocks = report_blocks(&sample(), Language::Cpp);
        assert_eq!(blocks[0], ReportBlock::Title(REPORT_TITLE.into()));
        assert_eq!(
            blocks[1],
            ReportBlock::Heading { level: 1, text: "Phân tích".into() }
        );
        let ReportBlock::Paragraph(spans) = &blocks[2] else {
            panic!("expected paragraph, got {:?}", blocks[2]);
        };
        assert!(spans[1].bold);
        assert_eq!(spans[1].text, "quy hoạch động");
        assert_eq!(
            blocks[3],
            ReportBlock::Heading { level: 2, text: "Độ phức tạp".into() }
        );
        assert_eq!(blocks[5], ReportBlock::PageBreak);
        assert_eq!(
            blocks[6],
            ReportBlock::Heading { level: 2, text: "Mã nguồn (C++)".into() }
        );
        assert_eq!(blocks.len(), 7 + 3);
        assert_eq!(blocks[8], ReportBlock::CodeLine("    return 0;".into()));
    }

    #[test]
    fn spacing_follows_block_kind() {
        let heading = |level| ReportBlock::Heading { level, text: "x".into() };
        assert_eq!(block_spacing(&ReportBlock::Title("t".into()), false), Some((0, 300)));
        assert_eq!(block_spacing(&heading(1), false), Some((240, 120)));
        assert_eq!(block_spacing(&heading(2), false), Some((240, 120)));
        assert_eq!(block_spacing(&heading(3), false), Some((200, 100)));
        assert_eq!(block_spacing(&heading(2), true), Some((400, 200)));
        assert_eq!(block_spacing(&ReportBlock::Paragraph(vec![]), false), Some((0, 100)));
        assert_eq!(block_spacing(&ReportBlock::CodeLine("x".into()), false), None);
        assert_eq!(block_spacing(&ReportBlock::PageBreak, false), None);
    }

    #[test]
    fn report_is_a_docx_package() {
        let artifact = export_report(&sample(), Language::Python).unwrap();
        assert_eq!(artifact.file_name, REPORT_NAME);

        let mut archive = ZipArchive::new(Cursor::new(artifact.bytes)).unwrap();
        let xml = entry(&mut archive, "word/document.xml");
        assert!(xml.contains(REPORT_TITLE));
        assert!(xml.contains("Mã nguồn (Python)"));
        assert!(xml.contains("Consolas"));
        assert!(xml.contains("return 0;"));
        assert!(xml.contains(r#"w:before="400""#));
        assert!(xml.contains(r#"w:after="300""#));
    }

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = Artifact {
            file_name: "solution.py".into(),
            mime_type: "text/plain",
            bytes: b"old".to_vec(),
        };
        let path = write_artifact(&first, dir.path()).unwrap();
        let second = Artifact { bytes: b"new".to_vec(), ..first };
        assert_eq!(write_artifact(&second, dir.path()).unwrap(), path);
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
