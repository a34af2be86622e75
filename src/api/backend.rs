//! 远程操作接口
//!
//! 仓库校验、题目生成、答案批改都是服务端的不透明能力，
//! 这里只约定请求/响应形状，不关心实现方式。

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{AnswerReceipt, AnswerSubmission, Grade, Identity, Submission};

/// 题目后端能力
///
/// 职责：
/// - 提供工作流所消费的全部远程操作
/// - 每个调用要么成功返回响应体，要么返回可展示的错误
/// - 不持有任何工作流状态
#[async_trait]
pub trait QuestionBackend: Send + Sync {
    /// 查询当前登录身份
    async fn fetch_identity(&self) -> AppResult<Identity>;

    /// 请求服务端失效当前会话
    async fn logout(&self) -> AppResult<()>;

    /// 校验仓库可访问性
    async fn verify_repo(&self, repo_url: &str) -> AppResult<()>;

    /// 为仓库生成题目集
    async fn create_submission(&self, repo_url: &str) -> AppResult<Submission>;

    /// 批量提交答案（全部受理或整体失败，不支持部分提交）
    async fn submit_answers(&self, answers: &[AnswerSubmission]) -> AppResult<Vec<AnswerReceipt>>;

    /// 查询某次提交当前已完成的评分
    async fn fetch_grades(&self, submission_id: &str) -> AppResult<Vec<Grade>>;

    /// CSV 导出下载链接（讲师专用的静态链接，不参与轮询）
    fn csv_export_url(&self) -> String;

    /// GitHub 登录入口链接
    fn auth_url(&self) -> String;
}
