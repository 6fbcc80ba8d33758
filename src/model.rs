//! Data model shared by ingestion, the session and the exporters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One ingested problem statement.
///
/// `encoded_data` is the full data URL (`data:<mime>;base64,<payload>`).
/// `preview_url` is the same string for images and empty for everything
/// else, so a viewer can render it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub encoded_data: String,
    pub preview_url: String,
}

impl UploadedFile {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }
}

/// Target language for the generated solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Cpp,
    Python,
}

impl Language {
    /// Every selectable language, in display order.
    pub const ALL: [Language; 2] = [Language::Cpp, Language::Python];

    /// Name used in prompts and headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Cpp => "C++",
            Language::Python => "Python",
        }
    }

    /// File extension for the exported source file.
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Python => "py",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            "py" | "python" => Ok(Language::Python),
            other => Err(format!("unknown language '{other}' (expected cpp or python)")),
        }
    }
}

/// One generated test: stdin content and the expected stdout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    pub output: String,
}

/// The canonical result every view and exporter consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionResult {
    /// Problem analysis and algorithm explanation, lightweight Markdown.
    pub markdown: String,
    /// Source code with no surrounding fences.
    pub raw_code: String,
    /// Test cases in the order the model produced them.
    pub test_cases: Vec<TestCase>,
}
