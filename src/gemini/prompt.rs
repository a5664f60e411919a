use crate::model::{AppConfig, QuestionType};
use serde_json::{json, Value};

pub const SYSTEM_INSTRUCTION: &str = r#"Bạn là một chuyên gia sư phạm Toán học, chuyên soạn đề theo bộ sách giáo khoa "Kết nối tri thức với cuộc sống" (Việt Nam).

QUY TẮC ĐỊNH DẠNG (BẮT BUỘC TUÂN THỦ):
1. Trả về định dạng JSON thuần túy. KHÔNG trả về markdown code blocks (như ```json).
2. Cú pháp Toán học (QUAN TRỌNG: ESCAPE BACKSLASH):
   - Mọi công thức toán, biến số (x, y...), số mũ, căn thức, phân số phải viết bằng mã LaTeX bên trong thẻ <math>...</math>.
   - VÌ ĐÂY LÀ JSON, BẠN PHẢI DÙNG HAI DẤU GẠCH CHÉO NGƯỢC (DOUBLE BACKSLASH) CHO CÁC LỆNH LATEX.
   - Sai: "\frac{1}{2}" (JSON hiểu là ký tự Form Feed).
   - Đúng: "\\frac{1}{2}" (JSON hiểu là chuỗi "\frac{1}{2}").
   - Tương tự: "\\sqrt", "\\alpha", "\\beta", "\\infty"...
   - Ví dụ: "Tính <math>A = 2^{3} + \\frac{1}{2}</math>"
3. Nội dung:
   - Bám sát chương trình sách giáo khoa "Kết nối tri thức".
   - Số liệu "đẹp", dễ tính toán."#;

/// Output contract for question generation: an array of question objects.
pub fn question_schema() -> Value {
    let types: Vec<&str> = QuestionType::ALL.iter().map(QuestionType::code).collect();
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "content": {
                    "type": "STRING",
                    "description": "Nội dung câu hỏi với LaTeX trong thẻ <math>"
                },
                "type": { "type": "STRING", "enum": types },
                "difficulty": {
                    "type": "STRING",
                    "description": "Mức độ khó của câu hỏi: Nhận biết, Thông hiểu, Vận dụng, hoặc Vận dụng cao"
                },
                "options": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "id": { "type": "STRING" },
                            "content": {
                                "type": "STRING",
                                "description": "Nội dung đáp án với LaTeX trong thẻ <math>"
                            }
                        }
                    }
                },
                "correctOptionId": { "type": "STRING" },
                "shortAnswer": { "type": "STRING" },
                "explanation": {
                    "type": "STRING",
                    "description": "Lời giải chi tiết với LaTeX trong thẻ <math>"
                }
            },
            "required": ["content", "type", "explanation", "difficulty"]
        }
    })
}

pub fn topics_schema() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

pub fn questions_prompt(config: &AppConfig) -> String {
    let types: Vec<&str> = config.question_types.iter().map(QuestionType::code).collect();
    format!(
        r#"Hãy tạo {} câu hỏi Toán Lớp {}.
Bài học: {}.
Tập trung vào các chủ đề kiến thức sau: {}.
Độ khó tổng thể: {}.
Loại câu hỏi ưu tiên: {}.

Yêu cầu chi tiết:
1. Xác định mức độ khó cụ thể cho từng câu hỏi (Nhận biết, Thông hiểu, Vận dụng, Vận dụng cao) và trả về trong trường "difficulty".
2. Nếu là Trắc nghiệm (MCQ): Cần 4 đáp án (A, B, C, D).
3. Nếu là Đúng/Sai: 2 đáp án.

Hãy đảm bảo trường "content" chứa câu hỏi, "options" chứa các lựa chọn (nếu có), "correctOptionId" là id của đáp án đúng, và "explanation" là lời giải chi tiết (cũng áp dụng quy tắc thẻ <math> chứa LaTeX với double backslash)."#,
        config.quantity,
        config.grade,
        config.lesson,
        config.topics.join(", "),
        config.difficulty.prompt_phrase(),
        types.join(", "),
    )
}

pub fn image_prompt(quantity: u32) -> String {
    format!(
        r#"1. Phân tích nội dung Toán học trong bức ảnh này (đề bài, công thức, dạng toán).
2. Tạo ra {} câu hỏi TƯƠNG TỰ về dạng toán và độ khó như trong ảnh (Remix đề bài). Thay đổi số liệu để tạo bài tập mới.
3. Xác định mức độ khó (Nhận biết/Thông hiểu/Vận dụng/Vận dụng cao) cho từng câu.
4. Định dạng đầu ra JSON tuân thủ chính xác schema và quy tắc LaTeX (double backslash)."#,
        quantity
    )
}

pub fn theory_prompt(grade: &str, lesson: &str) -> String {
    format!(
        r#"Tóm tắt lý thuyết trọng tâm cho bài học: "{}" (Toán lớp {} - Sách Kết nối tri thức).

Yêu cầu định dạng:
1. Trình bày ngắn gọn, súc tích dưới dạng HTML đơn giản (sử dụng <h3>, <ul>, <li>, <b>).
2. CÁC CÔNG THỨC TOÁN HỌC PHẢI DÙNG THẺ <math> CHỨA LATEX.
3. QUAN TRỌNG: Latex phải dùng DOUBLE BACKSLASH (\\) để escape. Ví dụ: <math>y = x^{{2}} + \\frac{{1}}{{2}}</math>.
4. Tập trung vào công thức, định nghĩa và tính chất quan trọng nhất để học sinh ôn tập.
5. Không bao gồm phần bài tập ví dụ."#,
        lesson, grade
    )
}

pub fn topics_prompt(grade: &str, lesson: &str) -> String {
    format!(
        r#"Tôi là giáo viên Toán đang dạy bộ sách "Kết nối tri thức với cuộc sống".
Lớp: {}.
Bài học: {}.

Hãy liệt kê 4-6 dạng toán hoặc chủ đề kiến thức trọng tâm nhất của bài học này để tôi soạn đề kiểm tra.
Chỉ trả về danh sách tên chủ đề, ngắn gọn, súc tích."#,
        grade, lesson
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;

    #[test]
    fn schema_enumerates_all_types_and_requires_explanation() {
        let schema = question_schema();
        let kinds = schema["items"]["properties"]["type"]["enum"].as_array().unwrap();
        assert_eq!(kinds.len(), 4);
        assert!(kinds.iter().any(|k| k == "TRUE_FALSE"));

        let required = schema["items"]["required"].as_array().unwrap();
        assert!(required.iter().any(|r| r == "explanation"));
        assert!(!required.iter().any(|r| r == "options"));
    }

    #[test]
    fn questions_prompt_lists_the_request() {
        let config = AppConfig {
            lesson: String::from("Bài 15. Hàm số"),
            topics: vec![String::from("Tập xác định"), String::from("Đồ thị")],
            difficulty: Difficulty::Application,
            question_types: vec![QuestionType::Mcq, QuestionType::Essay],
            quantity: 12,
            ..AppConfig::default()
        };
        let prompt = questions_prompt(&config);
        assert!(prompt.starts_with("Hãy tạo 12 câu hỏi Toán Lớp 11."));
        assert!(prompt.contains("Tập xác định, Đồ thị"));
        assert!(prompt.contains("Mức độ Vận dụng (Khá)"));
        assert!(prompt.contains("MCQ, ESSAY"));
    }

    #[test]
    fn theory_prompt_keeps_literal_braces() {
        let prompt = theory_prompt("10", "Bài 16. Hàm số bậc hai");
        assert!(prompt.contains(r"<math>y = x^{2} + \\frac{1}{2}</math>"));
    }

    #[test]
    fn instruction_demands_tagged_escaped_latex() {
        assert!(SYSTEM_INSTRUCTION.contains("<math>...</math>"));
        assert!(SYSTEM_INSTRUCTION.contains(r#""\\frac{1}{2}""#));
    }
}
