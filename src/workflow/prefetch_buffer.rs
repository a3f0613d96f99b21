//! 预取缓冲区
//!
//! 最多持有一道"下一题"，在用户作答当前题时后台获取。

use tracing::{debug, warn};

use crate::error::QuestionError;
use crate::models::Question;

/// 预取缓冲区
///
/// - `take()` 只在提交答案时调用
/// - 只有补货完成（`complete_refill`）或初始双题获取（`store`）会写入
/// - 同一时刻最多一个补货请求在途
#[derive(Debug, Clone, Default)]
pub struct PrefetchBuffer {
    slot: Option<Question>,
    refill_in_flight: bool,
}

impl PrefetchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn peek(&self) -> Option<&Question> {
        self.slot.as_ref()
    }

    pub fn refill_in_flight(&self) -> bool {
        self.refill_in_flight
    }

    /// 取出缓冲的题目，缓冲区变为空
    pub fn take(&mut self) -> Option<Question> {
        self.slot.take()
    }

    /// 直接放入一道题（初始双题获取的第二题）
    pub fn store(&mut self, question: Question) {
        self.slot = Some(question);
    }

    /// 标记一次补货开始
    ///
    /// 已有补货在途时返回 `false`，调用方不应再发起请求。
    pub fn begin_refill(&mut self) -> bool {
        if self.refill_in_flight {
            debug!("补货请求已在途，跳过");
            return false;
        }
        self.refill_in_flight = true;
        true
    }

    /// 补货完成：成功则覆盖缓冲，失败则清空并记录日志
    pub fn complete_refill(&mut self, result: Result<Question, QuestionError>) {
        self.refill_in_flight = false;
        match result {
            Ok(question) => {
                debug!("✓ 预取完成，下一题已就绪");
                self.slot = Some(question);
            }
            Err(e) => {
                warn!("⚠️ 后台预取失败，下一题将在提交时重新获取: {}", e);
                self.slot = None;
            }
        }
    }

    /// 清空缓冲区并忘记在途补货
    pub fn clear(&mut self) {
        self.slot = None;
        self.refill_in_flight = false;
    }
}
