//! 测验状态机 - 流程层
//!
//! 核心职责：纯状态转移函数 `handle(event) -> effects`
//!
//! 状态流转：
//! 1. Initializing → 并发获取两题 → Ready / Failed
//! 2. Ready → 提交答案 → 缓冲有题：Ready（后台补货）；缓冲为空：AwaitingRecoveryFetch
//! 3. AwaitingRecoveryFetch → 获取成功：Ready（后台补货）；失败：Failed
//! 4. 任意阶段 → restart → Initializing（新一代会话）
//!
//! 本模块不做任何 IO，需要发起的请求以 [`Effect`] 返回给调用方执行。

use tracing::{debug, error, info, warn};

use crate::error::QuestionError;
use crate::models::Question;
use crate::workflow::session::{Generation, Phase, SessionSnapshot, SessionState};

/// 单题请求的用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPurpose {
    /// 前台恢复请求，控制器会等待它
    Recovery,
    /// 后台补货，结果只影响缓冲区
    Refill,
}

/// 需要执行的副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// 并发获取两道题（第一道为当前题，第二道进入缓冲）
    FetchInitialPair { generation: Generation },
    /// 获取一道题
    FetchQuestion {
        generation: Generation,
        purpose: FetchPurpose,
    },
}

/// 状态机输入事件
#[derive(Debug)]
pub enum QuizEvent {
    Start,
    Restart,
    SubmitAnswer(String),
    InitialPairFetched {
        generation: Generation,
        result: Result<(Question, Question), QuestionError>,
    },
    QuestionFetched {
        generation: Generation,
        purpose: FetchPurpose,
        result: Result<Question, QuestionError>,
    },
}

/// 测验状态机
///
/// - 独占 [`SessionState`]
/// - 不持有任何资源，不发起请求
/// - 过期代数的请求结果一律丢弃
#[derive(Debug, Clone)]
pub struct QuizMachine {
    state: SessionState,
    started: bool,
}

impl QuizMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::new(Generation::default()),
            started: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// 处理一个事件，返回需要执行的副作用
    pub fn handle(&mut self, event: QuizEvent) -> Vec<Effect> {
        let effects = match event {
            QuizEvent::Start => self.on_start(),
            QuizEvent::Restart => self.on_restart(),
            QuizEvent::SubmitAnswer(selected) => self.on_submit(&selected),
            QuizEvent::InitialPairFetched { generation, result } => {
                self.on_initial_pair(generation, result)
            }
            QuizEvent::QuestionFetched {
                generation,
                purpose,
                result,
            } => self.on_question_fetched(generation, purpose, result),
        };

        debug_assert!(self.state.score <= self.state.question_index);
        effects
    }

    fn on_start(&mut self) -> Vec<Effect> {
        if self.started {
            debug!("会话 {} 已启动，忽略 start", self.state.generation);
            return Vec::new();
        }

        self.started = true;
        info!("🚀 会话 {} 开始，获取前两道题...", self.state.generation);
        vec![Effect::FetchInitialPair {
            generation: self.state.generation,
        }]
    }

    fn on_restart(&mut self) -> Vec<Effect> {
        let generation = self.state.generation.next();
        self.state = SessionState::new(generation);
        self.started = true;

        info!("🔄 重新开始，会话 {}", generation);
        vec![Effect::FetchInitialPair { generation }]
    }

    fn on_submit(&mut self, selected: &str) -> Vec<Effect> {
        if self.state.phase != Phase::Ready {
            debug!("阶段 {:?} 不接受答案，忽略", self.state.phase);
            return Vec::new();
        }

        let Some(current) = self.state.current_question.as_ref() else {
            warn!("⚠️ Ready 阶段没有当前题，忽略答案");
            return Vec::new();
        };

        if current.is_correct(selected) {
            self.state.score += 1;
        }

        match self.state.buffer.take() {
            // 快速路径：直接换上缓冲题
            Some(next) => {
                self.state.current_question = Some(next);
                self.state.question_index += 1;
                debug!("⚡ 使用预取题目，进入第 {} 题", self.state.question_index);
                self.refill_effect().into_iter().collect()
            }
            // 恢复路径：缓冲为空，前台获取
            None => {
                info!("⏳ 预取题目未就绪，前台获取下一题");
                self.state.phase = Phase::AwaitingRecoveryFetch;
                vec![Effect::FetchQuestion {
                    generation: self.state.generation,
                    purpose: FetchPurpose::Recovery,
                }]
            }
        }
    }

    fn on_initial_pair(
        &mut self,
        generation: Generation,
        result: Result<(Question, Question), QuestionError>,
    ) -> Vec<Effect> {
        if generation != self.state.generation || self.state.phase != Phase::Initializing {
            debug!("丢弃过期的初始题目 (会话 {})", generation);
            return Vec::new();
        }

        match result {
            Ok((first, second)) => {
                self.state.current_question = Some(first);
                self.state.buffer.store(second);
                self.state.question_index = 1;
                self.state.score = 0;
                self.state.last_error = None;
                self.state.phase = Phase::Ready;
                info!("✓ 会话 {} 就绪", generation);
            }
            Err(e) => self.fail(e),
        }

        Vec::new()
    }

    fn on_question_fetched(
        &mut self,
        generation: Generation,
        purpose: FetchPurpose,
        result: Result<Question, QuestionError>,
    ) -> Vec<Effect> {
        if generation != self.state.generation {
            debug!("丢弃过期的 {:?} 结果 (会话 {})", purpose, generation);
            return Vec::new();
        }

        match purpose {
            FetchPurpose::Refill => {
                self.state.buffer.complete_refill(result);
                Vec::new()
            }
            FetchPurpose::Recovery => {
                if self.state.phase != Phase::AwaitingRecoveryFetch {
                    debug!("阶段 {:?} 未等待恢复请求，丢弃结果", self.state.phase);
                    return Vec::new();
                }

                match result {
                    Ok(question) => {
                        self.state.current_question = Some(question);
                        self.state.question_index += 1;
                        self.state.phase = Phase::Ready;
                        info!("✓ 恢复成功，进入第 {} 题", self.state.question_index);

                        if self.state.buffer.is_empty() {
                            self.refill_effect().into_iter().collect()
                        } else {
                            Vec::new()
                        }
                    }
                    Err(e) => {
                        self.fail(e);
                        Vec::new()
                    }
                }
            }
        }
    }

    fn refill_effect(&mut self) -> Option<Effect> {
        self.state
            .buffer
            .begin_refill()
            .then_some(Effect::FetchQuestion {
                generation: self.state.generation,
                purpose: FetchPurpose::Refill,
            })
    }

    fn fail(&mut self, e: QuestionError) {
        error!("❌ 获取题目失败 ({:?}): {}", e.kind(), e);
        self.state.current_question = None;
        self.state.last_error = Some(e.to_string());
        self.state.phase = Phase::Failed;
    }
}

impl Default for QuizMachine {
    fn default() -> Self {
        Self::new()
    }
}
