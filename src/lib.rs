//! # Code Question Flow
//!
//! 一个用于代码理解问答的 Rust 客户端：提交仓库、作答生成的
//! 理解题、在诚信监测下批量提交答案，并异步等待批改结果。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 远程接口层（Api）
//! - `api/` - 定义 QuestionBackend 能力接口，持有 HTTP 客户端
//! - `HttpBackend` - 唯一的网络出口，提供全部远程操作
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，互相独立
//! - `IdentityGate` - 登录身份解析与登出
//! - `IntegrityRecorder` - 粘贴/焦点/用时遥测
//! - `AnswerDraftStore` - 按仓库缓存作答草稿
//! - `GradePoller` - 有限次数的评分轮询
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - submit → questions → submitted 的状态机
//! - `Stage` / `SubmitPhase` / `GradeState` - 唯一权威的阶段值
//! - `WorkflowController` - 每个事件一个迁移函数
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 组装各层，驱动一次完整的终端会话
//!
//! ## 模块结构

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use api::{HttpBackend, QuestionBackend};
pub use config::Config;
pub use error::{AppError, AppResult, WorkflowError};
pub use models::{Grade, GradeReport, Identity, Question, Submission};
pub use orchestrator::App;
pub use services::{AnswerDraftStore, GradePoller, IdentityGate, IntegrityRecorder};
pub use workflow::{GradeState, Stage, SubmitPhase, WorkflowController};
