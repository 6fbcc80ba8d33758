//! Instruction text and response schema for the solve request.
//!
//! Both live here so the adapter in [`crate::solve`] only wires them into a
//! request. Unit tests inspect them directly without a live model.
//!
//! Callers can replace the instruction via
//! [`crate::config::SolverConfig::instruction`]; the schema is fixed because
//! the response parser depends on it.

use crate::model::Language;
use serde_json::{json, Value};

/// Build the instruction block for one solve request.
pub fn solve_instruction(language: Language, test_case_count: usize) -> String {
    format!(
        r#"Bạn là một chuyên gia lập trình thi đấu và giáo viên tin học giỏi.
Nhiệm vụ của bạn là giải bài tập tin học có trong file đính kèm.

Yêu cầu cụ thể:
1. Phân tích đề bài ngắn gọn.
2. Trình bày thuật toán hoặc ý tưởng giải quyết.
3. Viết code hoàn chỉnh, tối ưu bằng ngôn ngữ {lang}. Code phải CHÍNH XÁC, không chứa markdown, không chứa chú thích thừa bên ngoài hàm.
4. Tạo ra chính xác {n} bộ test case (Input và Output tương ứng) để kiểm tra tính đúng đắn của chương trình. Các test case phải bao gồm các trường hợp biên (edge cases), trường hợp nhỏ và trường hợp lớn.

Hãy trả về kết quả dưới dạng JSON tuân thủ schema được cung cấp."#,
        lang = language.display_name(),
        n = test_case_count,
    )
}

/// The declared response shape, in Gemini's OpenAPI-subset schema dialect.
pub fn response_schema(language: Language, test_case_count: usize) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "explanation": {
                "type": "STRING",
                "description": "Phân tích đề bài và giải thích thuật toán (định dạng Markdown)"
            },
            "sourceCode": {
                "type": "STRING",
                "description": format!(
                    "Mã nguồn hoàn chỉnh bằng {}. Chỉ chứa code, không chứa markdown blocks (như ```{}).",
                    language.display_name(),
                    language.extension()
                )
            },
            "testCases": {
                "type": "ARRAY",
                "description": format!("Danh sách {test_case_count} bộ test case"),
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "input": { "type": "STRING", "description": "Dữ liệu đầu vào (Input)" },
                        "output": { "type": "STRING", "description": "Kết quả mong đợi (Output)" }
                    },
                    "required": ["input", "output"]
                }
            }
        },
        "required": ["explanation", "sourceCode", "testCases"]
    })
}
