//! 测验控制器 - 编排层
//!
//! ## 职责
//!
//! 把纯状态机 [`QuizMachine`] 接到真实的异步世界：
//!
//! 1. **执行副作用**：每个 [`Effect`] 通过 `tokio::spawn` 变成一个带代数标记的任务
//! 2. **回收结果**：任务完成后把事件发回 mpsc 通道，由控制器串行交给状态机
//! 3. **前台等待**：初始化和恢复请求期间一直等待，直到阶段离开等待态
//! 4. **发布快照**：每次状态转移后通过 watch 通道发布 [`SessionSnapshot`]
//!
//! ## 设计特点
//!
//! - 后台补货不取消；restart 后到达的旧结果由状态机按代数丢弃
//! - 缓冲区只在提交答案时读取，提交前先吸收已完成的补货

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::services::QuestionSource;
use crate::workflow::{Effect, QuizEvent, QuizMachine, SessionSnapshot};

/// 测验控制器
pub struct QuizController {
    machine: QuizMachine,
    source: Arc<dyn QuestionSource>,
    completions_tx: mpsc::UnboundedSender<QuizEvent>,
    completions_rx: mpsc::UnboundedReceiver<QuizEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl QuizController {
    /// 创建新的控制器（尚未开始获取题目）
    pub fn new(source: Arc<dyn QuestionSource>) -> Self {
        let machine = QuizMachine::new();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(machine.snapshot());

        Self {
            machine,
            source,
            completions_tx,
            completions_rx,
            snapshot_tx,
        }
    }

    /// 当前会话快照
    pub fn snapshot(&self) -> SessionSnapshot {
        self.machine.snapshot()
    }

    /// 订阅会话快照（用于渲染等待提示）
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// 开始会话
    ///
    /// 幂等：已经开始过则不做任何事。返回时阶段为 `Ready` 或 `Failed`。
    pub async fn start(&mut self) {
        self.dispatch(QuizEvent::Start);
        self.settle().await;
    }

    /// 提交答案
    ///
    /// 只在 `Ready` 阶段生效。缓冲有题时立即返回；
    /// 缓冲为空时等待恢复请求完成。
    pub async fn submit_answer(&mut self, selected: &str) {
        self.sync_background();
        self.dispatch(QuizEvent::SubmitAnswer(selected.to_string()));
        self.settle().await;
    }

    /// 重新开始（任意阶段可用）
    pub async fn restart(&mut self) {
        self.dispatch(QuizEvent::Restart);
        self.settle().await;
    }

    /// 吸收已经完成的后台结果，不等待
    ///
    /// # 返回
    /// 返回处理的事件数量
    pub fn sync_background(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.completions_rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// 等待在途的补货请求完成（没有在途请求则立即返回）
    pub async fn wait_for_refill(&mut self) {
        self.sync_background();
        while self.machine.state().buffer().refill_in_flight() {
            match self.completions_rx.recv().await {
                Some(event) => self.dispatch(event),
                None => break,
            }
        }
    }

    /// 等待阶段离开 Initializing / AwaitingRecoveryFetch
    async fn settle(&mut self) {
        while self.machine.state().phase().is_waiting() && self.machine.is_started() {
            match self.completions_rx.recv().await {
                Some(event) => self.dispatch(event),
                None => break,
            }
        }
    }

    fn dispatch(&mut self, event: QuizEvent) {
        let effects = self.machine.handle(event);
        self.snapshot_tx.send_replace(self.machine.snapshot());

        for effect in effects {
            self.spawn_effect(effect);
        }
    }

    fn spawn_effect(&self, effect: Effect) {
        let source = Arc::clone(&self.source);
        let tx = self.completions_tx.clone();

        match effect {
            Effect::FetchInitialPair { generation } => {
                debug!("发起初始双题请求 (会话 {})", generation);
                tokio::spawn(async move {
                    let result =
                        futures::future::try_join(source.fetch_question(), source.fetch_question())
                            .await;
                    // 控制器已销毁时接收端关闭，结果无人需要
                    let _ = tx.send(QuizEvent::InitialPairFetched { generation, result });
                });
            }
            Effect::FetchQuestion {
                generation,
                purpose,
            } => {
                debug!("发起 {:?} 请求 (会话 {})", purpose, generation);
                tokio::spawn(async move {
                    let result = source.fetch_question().await;
                    let _ = tx.send(QuizEvent::QuestionFetched {
                        generation,
                        purpose,
                        result,
                    });
                });
            }
        }
    }
}
