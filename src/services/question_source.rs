//! 题目来源抽象
//!
//! 控制器只依赖这个契约：无参数、异步、每次调用相互独立。

use async_trait::async_trait;

use crate::error::QuestionResult;
use crate::models::Question;

/// 题目来源
///
/// 任何失败（网络、格式、约束）都以 [`crate::error::QuestionError`] 返回，
/// 调用方不需要区分具体原因。
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch_question(&self) -> QuestionResult<Question>;
}
