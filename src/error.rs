use thiserror::Error;

/// 题目获取错误
///
/// 覆盖一次 `fetch_question` 可能失败的全部原因。
/// 控制器不区分具体类型，只记录 `to_string()` 作为 `last_error`。
#[derive(Debug, Error)]
pub enum QuestionError {
    /// 网络 / 传输层失败
    #[error("题目生成服务不可用: {0}")]
    SourceUnavailable(String),

    /// 响应无法解析为预期结构
    #[error("题目响应格式错误: {0}")]
    MalformedPayload(String),

    /// 可以解析，但违反题目约束
    #[error("题目内容不合法: {0}")]
    InvalidQuestion(String),
}

/// 题目错误类型标签（仅用于日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionErrorKind {
    SourceUnavailable,
    MalformedPayload,
    InvalidQuestion,
}

impl QuestionError {
    pub fn kind(&self) -> QuestionErrorKind {
        match self {
            QuestionError::SourceUnavailable(_) => QuestionErrorKind::SourceUnavailable,
            QuestionError::MalformedPayload(_) => QuestionErrorKind::MalformedPayload,
            QuestionError::InvalidQuestion(_) => QuestionErrorKind::InvalidQuestion,
        }
    }

    // ========== 便捷构造函数 ==========

    /// 创建服务不可用错误
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        QuestionError::SourceUnavailable(msg.into())
    }

    /// 创建响应格式错误
    pub fn malformed(msg: impl Into<String>) -> Self {
        QuestionError::MalformedPayload(msg.into())
    }

    /// 创建题目约束错误
    pub fn invalid(msg: impl Into<String>) -> Self {
        QuestionError::InvalidQuestion(msg.into())
    }
}

impl From<async_openai::error::OpenAIError> for QuestionError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        QuestionError::SourceUnavailable(err.to_string())
    }
}

/// 题目获取结果类型
pub type QuestionResult<T> = Result<T, QuestionError>;
