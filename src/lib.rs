//! # Grammar Quiz
//!
//! 一个由 LLM 实时出题的英语语法选择题应用
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 模型层（Models）
//! - `models/` - 不可变的 `Question` 及其约束校验
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单道题
//! - `QuestionSource` - 题目来源契约
//! - `LlmService` - 通过 OpenAI 兼容接口生成题目
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 纯状态机，不做任何 IO
//! - `QuizMachine` - 状态转移（事件 → 副作用）
//! - `PrefetchBuffer` - 最多一道的预取缓冲
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/quiz_controller` - 异步驱动，执行副作用并回收结果
//! - `orchestrator/app` - 终端答题界面
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{QuestionError, QuestionResult};
pub use models::{AnswerFeedback, Question};
pub use orchestrator::{App, QuizController};
pub use services::{LlmService, QuestionSource};
pub use workflow::{Generation, Phase, QuizEvent, QuizMachine, SessionSnapshot};
