use regex::Regex;
use serde::Serialize;

use crate::error::{QuestionError, QuestionResult};

/// 选项数量下限
pub const MIN_OPTIONS: usize = 2;
/// 选项数量上限
pub const MAX_OPTIONS: usize = 3;

/// 空格标记：三个及以上连续下划线
const BLANK_PATTERN: &str = r"_{3,}";

/// 选择题
///
/// 只能通过 [`Question::new`] 创建，创建后不可修改。
/// 约束：
/// - `prompt` 恰好包含一个空格标记（`___`）
/// - `options` 有 2~3 个互不相同的非空选项
/// - `correct_answer` 是 `options` 之一
/// - `explanation` 非空
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_answer: String,
    explanation: String,
}

impl Question {
    /// 创建并校验题目
    ///
    /// 所有字段会先去除首尾空白。
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        explanation: impl Into<String>,
    ) -> QuestionResult<Self> {
        let prompt = prompt.into().trim().to_string();
        let options: Vec<String> = options.into_iter().map(|o| o.trim().to_string()).collect();
        let correct_answer = correct_answer.into().trim().to_string();
        let explanation = explanation.into().trim().to_string();

        let blank_re = Regex::new(BLANK_PATTERN).map_err(|e| QuestionError::invalid(e.to_string()))?;
        let blanks = blank_re.find_iter(&prompt).count();
        if blanks != 1 {
            return Err(QuestionError::invalid(format!(
                "题干必须恰好包含一个空格标记，实际: {}",
                blanks
            )));
        }

        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
            return Err(QuestionError::invalid(format!(
                "选项数量必须在 [{}, {}] 之间，实际: {}",
                MIN_OPTIONS,
                MAX_OPTIONS,
                options.len()
            )));
        }

        if options.iter().any(|o| o.is_empty()) {
            return Err(QuestionError::invalid("存在空选项"));
        }

        for (i, option) in options.iter().enumerate() {
            if options[..i].contains(option) {
                return Err(QuestionError::invalid(format!("选项重复: {}", option)));
            }
        }

        if !options.contains(&correct_answer) {
            return Err(QuestionError::invalid(format!(
                "正确答案 '{}' 不在选项 {:?} 中",
                correct_answer, options
            )));
        }

        if explanation.is_empty() {
            return Err(QuestionError::invalid("解析为空"));
        }

        Ok(Self {
            prompt,
            options,
            correct_answer,
            explanation,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.correct_answer
    }

    /// 判定答案但不改变任何会话状态
    pub fn check(&self, selected: &str) -> AnswerFeedback {
        AnswerFeedback {
            selected: selected.to_string(),
            is_correct: self.is_correct(selected),
            correct_answer: self.correct_answer.clone(),
            explanation: self.explanation.clone(),
        }
    }
}

/// 答题反馈
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub selected: String,
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}
