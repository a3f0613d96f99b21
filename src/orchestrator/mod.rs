//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层把纯状态机接到异步运行时和终端上，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `quiz_controller` - 测验控制器
//! - 持有状态机和题目来源
//! - 把副作用变成带代数标记的 tokio 任务
//! - 前台等待初始化 / 恢复请求
//! - 通过 watch 通道发布会话快照
//!
//! ### `app` - 终端答题界面
//! - 显示题目、读取选择、展示反馈
//! - 决定何时调用 `submit_answer`（答对自动、答错手动）
//!
//! ## 层次关系
//!
//! ```text
//! app (终端交互)
//!     ↓
//! quiz_controller (异步驱动)
//!     ↓
//! workflow::QuizMachine (纯状态转移)
//!     ↓
//! services (能力层：QuestionSource / LlmService)
//! ```

pub mod app;
pub mod quiz_controller;

pub use app::App;
pub use quiz_controller::QuizController;
