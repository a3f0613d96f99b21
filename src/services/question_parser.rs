//! LLM 响应解析
//!
//! 把模型返回的文本转换为经过校验的 [`Question`]：
//! 去掉 Markdown 代码块 → JSON 解析 → 字段检查 → 题目约束校验

use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{QuestionError, QuestionResult};
use crate::models::Question;
use crate::utils::logging::truncate_text;

/// 模型返回的原始题目结构
///
/// 所有字段都是可选的，缺失与空字符串在 [`parse_question_response`] 中统一报错。
#[derive(Debug, Deserialize)]
struct QuestionPayload {
    #[serde(rename = "question", alias = "prompt")]
    prompt: Option<String>,
    options: Option<Vec<String>>,
    #[serde(rename = "answer", alias = "correctAnswer", alias = "correct_answer")]
    correct_answer: Option<String>,
    explanation: Option<String>,
}

/// 去掉包裹在外层的 Markdown 代码块（```json ... ```）
pub fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    match Regex::new(r"(?s)^```\w*\s*\n?(.*?)\n?\s*```$") {
        Ok(re) => match re.captures(trimmed).and_then(|c| c.get(1)) {
            Some(inner) if !inner.as_str().trim().is_empty() => inner.as_str().trim().to_string(),
            _ => trimmed.to_string(),
        },
        Err(_) => trimmed.to_string(),
    }
}

/// 解析模型响应为题目
///
/// # 参数
/// - `raw`: 模型返回的原始文本
///
/// # 返回
/// 返回校验通过的题目；格式问题返回 `MalformedPayload`，约束问题返回 `InvalidQuestion`
pub fn parse_question_response(raw: &str) -> QuestionResult<Question> {
    let json_str = strip_code_fence(raw);

    let value: JsonValue = serde_json::from_str(&json_str).map_err(|e| {
        debug!("无法解析的响应: {}", truncate_text(&json_str, 200));
        QuestionError::malformed(format!("响应不是合法的 JSON: {}", e))
    })?;

    match &value {
        JsonValue::Object(_) => {}
        JsonValue::Array(_) => {
            return Err(QuestionError::malformed("期望单个题目对象，实际为数组"));
        }
        other => {
            return Err(QuestionError::malformed(format!(
                "期望单个题目对象，实际为: {}",
                truncate_text(&other.to_string(), 50)
            )));
        }
    }

    let payload: QuestionPayload = serde_json::from_value(value)
        .map_err(|e| QuestionError::malformed(format!("题目字段类型错误: {}", e)))?;

    let prompt = require_text(payload.prompt, "question")?;
    let options = payload
        .options
        .filter(|o| !o.is_empty())
        .ok_or_else(|| QuestionError::malformed("缺少字段: options"))?;
    let correct_answer = require_text(payload.correct_answer, "answer")?;
    let explanation = require_text(payload.explanation, "explanation")?;

    Question::new(prompt, options, correct_answer, explanation)
}

fn require_text(field: Option<String>, name: &str) -> QuestionResult<String> {
    field
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| QuestionError::malformed(format!("缺少字段: {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "question": "She ___ to the party last night.",
        "options": ["went", "has gone", "goes"],
        "answer": "went",
        "explanation": "Se usa el pasado simple con 'last night'."
    }"#;

    #[test]
    fn test_parse_plain_json() {
        let q = parse_question_response(VALID).unwrap();
        assert_eq!(q.prompt(), "She ___ to the party last night.");
        assert_eq!(q.correct_answer(), "went");
        assert_eq!(q.options().len(), 3);
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", VALID);
        let q = parse_question_response(&fenced).unwrap();
        assert_eq!(q.correct_answer(), "went");

        let bare_fence = format!("```\n{}\n```", VALID);
        assert!(parse_question_response(&bare_fence).is_ok());
    }

    #[test]
    fn test_strip_code_fence_leaves_plain_text() {
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_aliases_accepted() {
        let raw = r#"{
            "prompt": "They ___ happy.",
            "options": ["were", "was"],
            "correctAnswer": "were",
            "explanation": "Plural."
        }"#;
        let q = parse_question_response(raw).unwrap();
        assert_eq!(q.correct_answer(), "were");
    }

    #[test]
    fn test_not_json() {
        let err = parse_question_response("Lo siento, no puedo ayudar.").unwrap_err();
        assert!(matches!(err, QuestionError::MalformedPayload(_)));
    }

    #[test]
    fn test_array_rejected() {
        let raw = format!("[{}]", VALID);
        let err = parse_question_response(&raw).unwrap_err();
        assert!(matches!(err, QuestionError::MalformedPayload(_)));
    }

    #[test]
    fn test_missing_or_empty_fields() {
        let missing = r#"{"question": "A ___.", "options": ["a", "b"], "answer": "a"}"#;
        let err = parse_question_response(missing).unwrap_err();
        assert!(matches!(err, QuestionError::MalformedPayload(ref m) if m.contains("explanation")));

        let empty = r#"{"question": "", "options": ["a", "b"], "answer": "a", "explanation": "x"}"#;
        assert!(matches!(
            parse_question_response(empty),
            Err(QuestionError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_wrong_field_type() {
        let raw = r#"{"question": "A ___.", "options": "a, b", "answer": "a", "explanation": "x"}"#;
        assert!(matches!(
            parse_question_response(raw),
            Err(QuestionError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_answer_not_in_options() {
        let raw = r#"{"question": "A ___.", "options": ["a", "b"], "answer": "c", "explanation": "x"}"#;
        assert!(matches!(
            parse_question_response(raw),
            Err(QuestionError::InvalidQuestion(_))
        ));
    }
}
