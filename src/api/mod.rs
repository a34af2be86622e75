//! API 模块
//!
//! 负责所有与题目服务端的交互

pub mod backend;
pub mod http_client;

pub use backend::QuestionBackend;
pub use http_client::HttpBackend;
