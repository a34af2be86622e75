//! 工作流控制器 - 流程层
//!
//! 核心职责：驱动 submit → questions → submitted 的阶段迁移
//!
//! 流程顺序：
//! 1. 本地校验仓库地址 → 远程校验 → 远程生成题目
//! 2. 作答阶段：草稿编辑 + 诚信遥测 + 草稿落盘
//! 3. 批量提交答案 → 派生评分轮询任务
//!
//! 每个事件对应一个迁移函数；远程失败都在调用处捕获并转换为
//! 本地错误，阶段绝不静默切换，草稿只在提交成功后清除。

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::api::QuestionBackend;
use crate::config::Config;
use crate::error::{AppResult, WorkflowError};
use crate::models::{AnswerSubmission, Submission};
use crate::services::{
    AnswerDraftStore, DraftRecord, GradePollJob, GradePollOutcome, GradePoller, IntegrityRecorder,
    PollResult,
};
use crate::utils::logging::truncate_text;
use crate::workflow::stage::{GradeState, Stage, SubmitPhase};

/// 合法仓库地址：https://github.com/<owner>/<repo>，允许末尾斜杠
fn repo_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https://github\.com/[^/]+/[^/]+/?$").expect("仓库地址正则应当合法")
    })
}

/// 工作流控制器
///
/// - 持有唯一权威的阶段值和全部作答状态
/// - 不持有任何网络资源（只通过 QuestionBackend 发起调用）
/// - 同一时刻最多一次仓库提交、一次答案提交在途
pub struct WorkflowController {
    backend: Arc<dyn QuestionBackend>,
    draft_store: AnswerDraftStore,
    poller: GradePoller,

    stage: Stage,
    submit_phase: SubmitPhase,
    submitting_answers: bool,

    repo_url: String,
    submission: Option<Submission>,
    answers: HashMap<String, String>,
    invalid_answers: HashSet<String>,
    integrity: IntegrityRecorder,
    grade_state: GradeState,

    /// 轮询纪元：重置或开始新提交时递增，旧轮询任务随之作废
    poll_epoch: Arc<AtomicU64>,
}

impl WorkflowController {
    /// 创建新的工作流控制器
    pub fn new(backend: Arc<dyn QuestionBackend>, config: &Config) -> Self {
        Self {
            poller: GradePoller::new(backend.clone(), config),
            backend,
            draft_store: AnswerDraftStore::new(config.draft_dir.clone()),
            stage: Stage::Submit,
            submit_phase: SubmitPhase::Idle,
            submitting_answers: false,
            repo_url: String::new(),
            submission: None,
            answers: HashMap::new(),
            invalid_answers: HashSet::new(),
            integrity: IntegrityRecorder::new(),
            grade_state: GradeState::Idle,
            poll_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    // ========== 状态只读访问 ==========

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn submit_phase(&self) -> SubmitPhase {
        self.submit_phase
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    /// 某道题当前的草稿文本
    pub fn answer(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    pub fn answers(&self) -> &HashMap<String, String> {
        &self.answers
    }

    /// 被标记为"未作答"的题目 ID
    pub fn invalid_answers(&self) -> &HashSet<String> {
        &self.invalid_answers
    }

    pub fn integrity(&self) -> &IntegrityRecorder {
        &self.integrity
    }

    pub fn grade_state(&self) -> &GradeState {
        &self.grade_state
    }

    // ========== submit → questions ==========

    /// 提交仓库地址：校验 → 生成题目 → 进入作答阶段
    ///
    /// 失败时阶段不变、不留半成品状态，子阶段总是回到 Idle。
    pub async fn start_submission(&mut self, repo_url: &str) -> AppResult<()> {
        if self.submit_phase != SubmitPhase::Idle || self.submitting_answers {
            return Err(WorkflowError::SubmissionInFlight.into());
        }

        // 本地校验不合法时不发起任何远程调用
        if !repo_url_pattern().is_match(repo_url) {
            return Err(WorkflowError::InvalidRepoUrl {
                url: repo_url.to_string(),
            }
            .into());
        }

        self.submit_phase = SubmitPhase::Verifying;
        info!("🔍 正在校验仓库: {}", repo_url);

        if let Err(e) = self.backend.verify_repo(repo_url).await {
            self.submit_phase = SubmitPhase::Idle;
            return Err(WorkflowError::VerificationFailed {
                message: e.to_string(),
            }
            .into());
        }

        self.submit_phase = SubmitPhase::Generating;
        info!("📝 正在生成题目...");

        let submission = match self.backend.create_submission(repo_url).await {
            Ok(submission) => submission,
            Err(e) => {
                self.submit_phase = SubmitPhase::Idle;
                return Err(WorkflowError::GenerationFailed {
                    message: e.to_string(),
                }
                .into());
            }
        };

        info!(
            "✓ 题目已生成: {} 道 (提交 {})",
            submission.questions.len(),
            submission.submission_id
        );

        // 放弃旧提交的一切轮询，再播种本次作答状态
        self.poll_epoch.fetch_add(1, Ordering::SeqCst);
        self.answers = submission
            .question_ids()
            .map(|id| (id.to_string(), String::new()))
            .collect();
        self.integrity.seed(submission.question_ids());
        self.invalid_answers.clear();
        self.grade_state = GradeState::Idle;
        self.repo_url = repo_url.to_string();
        self.submission = Some(submission);
        self.stage = Stage::Questions;
        self.submit_phase = SubmitPhase::Idle;

        self.restore_drafts();
        Ok(())
    }

    // ========== questions 阶段事件 ==========

    /// 覆写某道题的草稿，并清除其"未作答"标记
    pub fn edit_answer(&mut self, question_id: &str, text: impl Into<String>) {
        if self.stage != Stage::Questions {
            return;
        }
        let Some(draft) = self.answers.get_mut(question_id) else {
            return;
        };
        *draft = text.into();
        self.invalid_answers.remove(question_id);
        self.persist_drafts();
    }

    /// 记录一次粘贴尝试（仅遥测，拒绝粘贴由界面层负责）
    pub fn record_paste(&mut self, question_id: &str) {
        if self.stage == Stage::Questions {
            self.integrity.record_paste(question_id);
        }
    }

    /// 题目获得焦点：启动该题计时器（重复事件为空操作）
    pub fn question_focused(&mut self, question_id: &str) {
        if self.stage == Stage::Questions {
            self.integrity.question_focused(question_id);
        }
    }

    /// 题目失去焦点：停止计时并把用时落入草稿缓存
    pub fn question_blurred(&mut self, question_id: &str) {
        if self.stage == Stage::Questions {
            self.integrity.question_blurred(question_id);
            self.persist_drafts();
        }
    }

    /// 窗口失去焦点
    ///
    /// 与 document_hidden 共用同一个全局计数器。一次切换标签页
    /// 可能同时触发两个事件而被计两次，这里保留原有口径。
    pub fn window_blurred(&mut self) {
        self.integrity.focus_lost();
    }

    /// 页面变为不可见
    pub fn document_hidden(&mut self) {
        self.integrity.focus_lost();
    }

    // ========== questions → submitted ==========

    /// 批量提交答案
    ///
    /// 成功后进入 submitted 阶段并返回评分轮询任务，由调用方驱动；
    /// 任何失败都停留在 questions 阶段，草稿原样保留。
    pub async fn submit_answers(&mut self) -> AppResult<GradePollJob> {
        if self.stage != Stage::Questions {
            return Err(WorkflowError::NoActiveSubmission.into());
        }
        if self.submitting_answers {
            return Err(WorkflowError::SubmissionInFlight.into());
        }
        let Some(submission) = self.submission.clone() else {
            return Err(WorkflowError::NoActiveSubmission.into());
        };

        // 先做本地完整性检查，缺答案就不碰网络
        let empty_ids: Vec<String> = submission
            .questions
            .iter()
            .filter(|q| {
                self.answers
                    .get(&q.id)
                    .map(|a| a.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(|q| q.id.clone())
            .collect();

        if !empty_ids.is_empty() {
            warn!("⚠️ 还有 {} 道题未作答，取消提交", empty_ids.len());
            self.invalid_answers = empty_ids.iter().cloned().collect();
            return Err(WorkflowError::IncompleteAnswers {
                question_ids: empty_ids,
            }
            .into());
        }

        // 把仍在计时的题目折算到提交瞬间，存储的计时器状态保持原样
        let now = Instant::now();
        let records: Vec<AnswerSubmission> = submission
            .questions
            .iter()
            .map(|q| AnswerSubmission {
                submission_id: submission.submission_id.clone(),
                question_id: q.id.clone(),
                answer_text: self.answers.get(&q.id).cloned().unwrap_or_default(),
                time_spent_ms: self.integrity.effective_time_spent_ms(&q.id, now),
                paste_attempts: self.integrity.paste_attempts(&q.id),
                focus_loss_count: self.integrity.focus_loss_count(),
                typing_stats: None,
            })
            .collect();

        self.submitting_answers = true;
        info!("📤 正在提交 {} 条答案...", records.len());
        let result = self.backend.submit_answers(&records).await;
        self.submitting_answers = false;

        match result {
            Err(e) => {
                // 草稿与阶段原样保留，不丢任何已填内容
                warn!("❌ 答案提交失败: {}", e);
                Err(WorkflowError::AnswerSubmissionFailed {
                    message: e.to_string(),
                }
                .into())
            }
            Ok(receipts) => {
                info!("✓ 答案已受理: {} 条回执", receipts.len());
                self.draft_store.clear(&self.repo_url);
                self.stage = Stage::Submitted;
                self.grade_state = GradeState::Polling;
                Ok(self.poller.job(
                    submission.submission_id.clone(),
                    submission.questions.len(),
                    self.poll_epoch.clone(),
                ))
            }
        }
    }

    /// 应用评分轮询产出
    ///
    /// 只有纪元、提交 ID、阶段三者都还匹配时才生效；
    /// 过期轮询对当前状态没有任何可观察影响。
    pub fn apply_poll_outcome(&mut self, outcome: GradePollOutcome) {
        let fresh = outcome.epoch == self.poll_epoch.load(Ordering::SeqCst)
            && self.stage == Stage::Submitted
            && self
                .submission
                .as_ref()
                .map(|s| s.submission_id == outcome.submission_id)
                .unwrap_or(false);

        if !fresh {
            debug!("忽略过期的评分轮询结果: 提交 {}", outcome.submission_id);
            return;
        }

        match outcome.result {
            PollResult::Complete(grades) => {
                self.grade_state = GradeState::Ready(grades);
            }
            PollResult::StillGrading => {
                self.grade_state = GradeState::StillGrading;
            }
            PollResult::Cancelled => {}
        }
    }

    // ========== 任意阶段 → submit ==========

    /// 重置工作流：回到初始阶段，清空提交、草稿与遥测
    pub fn reset(&mut self) {
        self.poll_epoch.fetch_add(1, Ordering::SeqCst);
        if !self.repo_url.is_empty() {
            self.draft_store.clear(&self.repo_url);
        }
        self.repo_url.clear();
        self.submission = None;
        self.answers.clear();
        self.invalid_answers.clear();
        self.integrity.clear();
        self.grade_state = GradeState::Idle;
        self.stage = Stage::Submit;
        self.submit_phase = SubmitPhase::Idle;
        self.submitting_answers = false;
    }

    // ========== 草稿落盘 / 恢复 ==========

    /// 把当前草稿与已累计用时写入缓存（尽力而为）
    fn persist_drafts(&self) {
        let Some(submission) = &self.submission else {
            return;
        };
        let record = DraftRecord {
            answers: self.answers.clone(),
            time_spent: submission
                .question_ids()
                .map(|id| (id.to_string(), self.integrity.time_spent_ms(id)))
                .collect(),
            saved_at: None,
        };
        if let Err(e) = self.draft_store.save(&self.repo_url, &record) {
            warn!("⚠️ 草稿保存失败: {}", e);
        }
    }

    /// 进入作答阶段时合并缓存里的旧草稿
    ///
    /// 只接受本次题目集里存在的 ID，空字符串不覆盖已播种的值。
    fn restore_drafts(&mut self) {
        let Some(record) = self.draft_store.load(&self.repo_url) else {
            return;
        };

        let mut restored = 0usize;
        for (question_id, text) in &record.answers {
            if text.is_empty() {
                continue;
            }
            if let Some(draft) = self.answers.get_mut(question_id) {
                *draft = text.clone();
                restored += 1;
            }
        }
        self.integrity.merge_time_spent(&record.time_spent);

        if restored > 0 {
            info!(
                "📂 已恢复 {} 条草稿: {}",
                restored,
                truncate_text(&self.repo_url, 60)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_url_pattern() {
        let pattern = repo_url_pattern();
        assert!(pattern.is_match("https://github.com/acme/widgets"));
        assert!(pattern.is_match("https://github.com/acme/widgets/"));
        assert!(pattern.is_match("https://github.com/a-b/c.d"));

        assert!(!pattern.is_match("http://github.com/acme/widgets"));
        assert!(!pattern.is_match("https://gitlab.com/acme/widgets"));
        assert!(!pattern.is_match("https://github.com/acme"));
        assert!(!pattern.is_match("https://github.com/acme/widgets/tree/main"));
        assert!(!pattern.is_match("github.com/acme/widgets"));
        assert!(!pattern.is_match(""));
    }
}
