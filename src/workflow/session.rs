//! 会话状态
//!
//! 封装"当前第几题、得了几分、处于哪个阶段"这一信息

use std::fmt::Display;

use crate::models::Question;
use crate::workflow::prefetch_buffer::PrefetchBuffer;

/// 控制器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 正在并发获取前两道题
    Initializing,
    /// 可以作答
    Ready,
    /// 缓冲为空，正在前台获取下一题（界面应显示等待）
    AwaitingRecoveryFetch,
    /// 本次会话失败，只能 restart
    Failed,
}

impl Phase {
    /// 是否处于需要等待前台请求的阶段
    pub fn is_waiting(&self) -> bool {
        matches!(self, Phase::Initializing | Phase::AwaitingRecoveryFetch)
    }
}

/// 会话代数
///
/// 每次 restart 递增，后台请求带着发起时的代数，过期结果直接丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 会话状态
///
/// 由 [`crate::workflow::QuizMachine`] 独占，所有修改都经过状态转移函数。
#[derive(Debug, Clone)]
pub struct SessionState {
    pub(crate) current_question: Option<Question>,
    pub(crate) buffer: PrefetchBuffer,
    pub(crate) question_index: u32,
    pub(crate) score: u32,
    pub(crate) phase: Phase,
    pub(crate) last_error: Option<String>,
    pub(crate) generation: Generation,
}

impl SessionState {
    pub fn new(generation: Generation) -> Self {
        Self {
            current_question: None,
            buffer: PrefetchBuffer::new(),
            question_index: 1,
            score: 0,
            phase: Phase::Initializing,
            last_error: None,
            generation,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    pub fn buffered_question(&self) -> Option<&Question> {
        self.buffer.peek()
    }

    pub fn buffer(&self) -> &PrefetchBuffer {
        &self.buffer
    }

    pub fn question_index(&self) -> u32 {
        self.question_index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_question: self.current_question.clone(),
            buffered_question: self.buffer.peek().cloned(),
            question_index: self.question_index,
            score: self.score,
            phase: self.phase,
            last_error: self.last_error.clone(),
            generation: self.generation,
        }
    }
}

/// 会话只读快照（供展示层读取）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub current_question: Option<Question>,
    pub buffered_question: Option<Question>,
    pub question_index: u32,
    pub score: u32,
    pub phase: Phase,
    pub last_error: Option<String>,
    pub generation: Generation,
}

impl Display for SessionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话 {} 题目#{} 得分#{} 阶段#{:?} 缓冲#{}]",
            self.generation,
            self.question_index,
            self.score,
            self.phase,
            if self.buffered_question.is_some() { "有" } else { "空" }
        )
    }
}
