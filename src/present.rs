//! Display model for a [`SolutionResult`].
//!
//! The explanation uses a tiny Markdown subset: `#`, `##`, `###` headings
//! and `**bold**` runs. Anything richer is shown as plain text. Frontends
//! (the CLI's ANSI renderer, a GUI) draw the [`Block`]s they get here.

use crate::model::SolutionResult;

/// Shown in the test view when the model returned no test cases.
pub const NO_TEST_CASES_MESSAGE: &str = "Không tìm thấy bộ test case nào.";

/// A run of text, bold or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

/// One rendered line of the explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(Vec<Span>),
}

/// Split a line on `**`; odd segments are bold.
pub fn bold_spans(line: &str) -> Vec<Span> {
    line.split("**")
        .enumerate()
        .map(|(i, part)| Span {
            text: part.to_string(),
            bold: i % 2 == 1,
        })
        .collect()
}

/// Render the explanation line by line.
///
/// A line starting with `###`, `##` or `#` becomes a heading with the first
/// occurrence of the marker removed. Every other line is a paragraph,
/// including blank ones, so vertical spacing survives.
pub fn render_markdown(text: &str) -> Vec<Block> {
    text.split('\n')
        .map(|line| {
            for (marker, level) in [("###", 3u8), ("##", 2), ("#", 1)] {
                if line.starts_with(marker) {
                    return Block::Heading {
                        level,
                        text: line.replacen(marker, "", 1),
                    };
                }
            }
            Block::Paragraph(bold_spans(line))
        })
        .collect()
}

/// One numbered test case as it appears in the test view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseCard<'a> {
    pub number: usize,
    pub title: String,
    pub input: &'a str,
    pub output: &'a str,
}

/// Number the test cases from 1, in order.
pub fn test_case_cards(result: &SolutionResult) -> Vec<TestCaseCard<'_>> {
    result
        .test_cases
        .iter()
        .enumerate()
        .map(|(i, tc)| TestCaseCard {
            number: i + 1,
            title: format!("Test Case #{}", i + 1),
            input: &tc.input,
            output: &tc.output,
        })
        .collect()
}

/// Label of the test tab, e.g. `Bộ Test (20)`.
pub fn tests_tab_label(result: &SolutionResult) -> String {
    format!("Bộ Test ({})", result.test_cases.len())
}
