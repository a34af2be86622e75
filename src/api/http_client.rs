//! HTTP 后端实现
//!
//! 通过 reqwest 调用题目服务端。会话凭证走 Cookie，
//! 与浏览器端 `credentials: include` 的行为一致。

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::api::backend::QuestionBackend;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{AnswerReceipt, AnswerSubmission, Grade, Identity, Submission};

/// 错误响应体形状：`{"error": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// 批量答案响应的外层包装
#[derive(Debug, Deserialize)]
struct AnswerBatchResponse {
    answers: Vec<AnswerReceipt>,
}

/// 评分响应的外层包装
#[derive(Debug, Deserialize)]
struct GradesResponse {
    grades: Vec<Grade>,
}

/// 题目服务端 HTTP 客户端
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    /// 创建新的 HTTP 后端
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(AppError::from)?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// 解析响应：2xx 反序列化 JSON，非 2xx 提取 `error` 字段作为消息
    async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .or_else(|| status.canonical_reason().map(|r| r.to_string()));
            return Err(AppError::api_bad_response(
                endpoint,
                Some(status.as_u16()),
                message,
            ));
        }
        let value = response.json::<T>().await?;
        Ok(value)
    }
}

#[async_trait::async_trait]
impl QuestionBackend for HttpBackend {
    async fn fetch_identity(&self) -> AppResult<Identity> {
        let endpoint = self.endpoint("auth/me");
        debug!("查询登录身份: {}", endpoint);
        let response = self.client.get(&endpoint).send().await?;
        Self::read_json(&endpoint, response).await
    }

    async fn logout(&self) -> AppResult<()> {
        let endpoint = self.endpoint("auth/logout");
        let response = self.client.post(&endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::api_bad_response(
                &endpoint,
                Some(status.as_u16()),
                status.canonical_reason().map(|r| r.to_string()),
            ));
        }
        Ok(())
    }

    async fn verify_repo(&self, repo_url: &str) -> AppResult<()> {
        let endpoint = self.endpoint("repos/verify");
        debug!("校验仓库: {}", repo_url);
        let response = self
            .client
            .post(&endpoint)
            .json(&json!({ "repo_url": repo_url }))
            .send()
            .await?;
        // 响应体里的 owner/name 对工作流没有用处，只关心是否通过
        let _: serde_json::Value = Self::read_json(&endpoint, response).await?;
        Ok(())
    }

    async fn create_submission(&self, repo_url: &str) -> AppResult<Submission> {
        let endpoint = self.endpoint("submissions");
        debug!("请求生成题目: {}", repo_url);
        let response = self
            .client
            .post(&endpoint)
            .json(&json!({ "repo_url": repo_url }))
            .send()
            .await?;
        Self::read_json(&endpoint, response).await
    }

    async fn submit_answers(&self, answers: &[AnswerSubmission]) -> AppResult<Vec<AnswerReceipt>> {
        let endpoint = self.endpoint("answers");
        debug!("批量提交 {} 条答案", answers.len());
        let response = self
            .client
            .post(&endpoint)
            .json(&json!({ "answers": answers }))
            .send()
            .await?;
        let batch: AnswerBatchResponse = Self::read_json(&endpoint, response).await?;
        Ok(batch.answers)
    }

    async fn fetch_grades(&self, submission_id: &str) -> AppResult<Vec<Grade>> {
        let endpoint = self.endpoint(&format!("submissions/{}/grades", submission_id));
        let response = self.client.get(&endpoint).send().await?;
        let grades: GradesResponse = Self::read_json(&endpoint, response).await?;
        Ok(grades.grades)
    }

    fn csv_export_url(&self) -> String {
        self.endpoint("exports/submissions.csv")
    }

    fn auth_url(&self) -> String {
        self.endpoint("auth/github")
    }
}
