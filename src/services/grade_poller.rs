//! 评分轮询 - 业务能力层
//!
//! 答案批量提交后，评分由服务端异步完成。本模块以固定延迟、
//! 有限次数轮询评分接口，直到数量到齐或尝试耗尽。
//!
//! 取消语义：每个轮询任务出生时记下当时的纪元号；工作流重置或
//! 开始新提交都会递增共享纪元，旧任务在每次醒来时复核纪元，
//! 不匹配立即退出，过期结果也会在应用阶段被丢弃。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::QuestionBackend;
use crate::config::Config;
use crate::models::Grade;

/// 一次轮询的终态
#[derive(Debug, Clone)]
pub enum PollResult {
    /// 评分到齐，携带完整评分集
    Complete(Vec<Grade>),
    /// 尝试耗尽，批改仍在进行中——这是非结果信号，不是错误
    StillGrading,
    /// 所属提交已被放弃
    Cancelled,
}

/// 一次轮询的完整产出，供工作流校验新鲜度后应用
#[derive(Debug, Clone)]
pub struct GradePollOutcome {
    pub submission_id: String,
    pub epoch: u64,
    pub result: PollResult,
}

/// 评分轮询器（可克隆的策略 + 后端句柄）
#[derive(Clone)]
pub struct GradePoller {
    backend: Arc<dyn QuestionBackend>,
    initial_delay: Duration,
    retry_delay: Duration,
    max_attempts: u32,
}

impl GradePoller {
    /// 创建新的评分轮询器
    pub fn new(backend: Arc<dyn QuestionBackend>, config: &Config) -> Self {
        Self {
            backend,
            initial_delay: Duration::from_millis(config.poll_initial_delay_ms),
            retry_delay: Duration::from_millis(config.poll_retry_delay_ms),
            max_attempts: config.poll_max_attempts,
        }
    }

    /// 为一次提交派生一个一次性轮询任务
    pub fn job(
        &self,
        submission_id: impl Into<String>,
        expected_count: usize,
        live_epoch: Arc<AtomicU64>,
    ) -> GradePollJob {
        let epoch = live_epoch.load(Ordering::SeqCst);
        GradePollJob {
            poller: self.clone(),
            submission_id: submission_id.into(),
            expected_count,
            live_epoch,
            epoch,
        }
    }
}

/// 一次性的评分轮询任务，不可重启
pub struct GradePollJob {
    poller: GradePoller,
    submission_id: String,
    expected_count: usize,
    live_epoch: Arc<AtomicU64>,
    epoch: u64,
}

impl GradePollJob {
    /// 任务所属的提交 ID
    pub fn submission_id(&self) -> &str {
        &self.submission_id
    }

    /// 运行到终态
    pub async fn run(self) -> GradePollOutcome {
        let GradePollJob {
            poller,
            submission_id,
            expected_count,
            live_epoch,
            epoch,
        } = self;

        info!(
            "⏳ 等待批改: 提交 {} 预计 {} 条评分",
            submission_id, expected_count
        );
        sleep(poller.initial_delay).await;

        for attempt in 1..=poller.max_attempts {
            // 每次醒来先复核纪元，提交被放弃就立即退出
            if live_epoch.load(Ordering::SeqCst) != epoch {
                debug!("轮询任务已过期，停止: 提交 {}", submission_id);
                return GradePollOutcome {
                    submission_id,
                    epoch,
                    result: PollResult::Cancelled,
                };
            }

            match poller.backend.fetch_grades(&submission_id).await {
                Ok(grades) if grades.len() >= expected_count => {
                    info!(
                        "✓ 评分到齐: {} 条 (第 {} 次查询)",
                        grades.len(),
                        attempt
                    );
                    return GradePollOutcome {
                        submission_id,
                        epoch,
                        result: PollResult::Complete(grades),
                    };
                }
                Ok(grades) => {
                    debug!(
                        "评分未齐: {}/{} (第 {}/{} 次查询)",
                        grades.len(),
                        expected_count,
                        attempt,
                        poller.max_attempts
                    );
                }
                // 瞬时查询失败与结果未齐同等对待：等一轮再试
                Err(e) => {
                    debug!("评分查询失败，稍后重试: {}", e);
                }
            }

            if attempt < poller.max_attempts {
                sleep(poller.retry_delay).await;
            }
        }

        warn!(
            "⚠️ 评分轮询尝试耗尽 ({} 次)，批改仍在进行中: 提交 {}",
            poller.max_attempts, submission_id
        );
        GradePollOutcome {
            submission_id,
            epoch,
            result: PollResult::StillGrading,
        }
    }
}
