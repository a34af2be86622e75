//! 诚信遥测 - 业务能力层
//!
//! 只负责记录作答过程中的粘贴尝试、焦点丢失和每题用时，
//! 不发起任何远程调用，不关心流程顺序。

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 单道题的遥测状态
///
/// 草稿文本、计时器、粘贴计数按题目 ID 收拢在同一个值里，
/// 避免多个平行 map 的键集漂移。
#[derive(Debug, Clone, Default)]
pub struct QuestionTelemetry {
    /// 粘贴尝试次数
    pub paste_attempts: u32,
    /// 已累计的作答时长（只增不减，仅在关闭计时区间时更新）
    pub time_spent: Duration,
    /// 正在计时的起点；None 表示计时器未运行
    active_since: Option<Instant>,
}

/// 诚信遥测记录器
///
/// 职责：
/// - 按题目 ID 维护粘贴计数与作答计时
/// - 维护全局的焦点丢失计数（所有题目共享）
/// - 计时器的启动/停止对重复事件幂等
#[derive(Debug, Default)]
pub struct IntegrityRecorder {
    questions: HashMap<String, QuestionTelemetry>,
    focus_loss_count: u32,
}

impl IntegrityRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按题目 ID 列表重新播种：每题清零，全局焦点计数归零
    pub fn seed<I, S>(&mut self, question_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.questions = question_ids
            .into_iter()
            .map(|id| (id.into(), QuestionTelemetry::default()))
            .collect();
        self.focus_loss_count = 0;
    }

    /// 清空全部遥测状态
    pub fn clear(&mut self) {
        self.questions.clear();
        self.focus_loss_count = 0;
    }

    /// 记录一次粘贴尝试（仅计数，拦截动作由界面层负责）
    pub fn record_paste(&mut self, question_id: &str) {
        if let Some(telemetry) = self.questions.get_mut(question_id) {
            telemetry.paste_attempts += 1;
        }
    }

    /// 题目获得焦点：启动计时器
    pub fn question_focused(&mut self, question_id: &str) {
        self.focus_at(question_id, Instant::now());
    }

    /// 在指定时刻启动计时器；已在运行则保持不变
    pub fn focus_at(&mut self, question_id: &str, now: Instant) {
        if let Some(telemetry) = self.questions.get_mut(question_id) {
            if telemetry.active_since.is_none() {
                telemetry.active_since = Some(now);
            }
        }
    }

    /// 题目失去焦点：停止计时器并累计时长
    pub fn question_blurred(&mut self, question_id: &str) {
        self.blur_at(question_id, Instant::now());
    }

    /// 在指定时刻停止计时器；未在运行则什么都不做
    pub fn blur_at(&mut self, question_id: &str, now: Instant) {
        if let Some(telemetry) = self.questions.get_mut(question_id) {
            if let Some(start) = telemetry.active_since.take() {
                telemetry.time_spent += now.saturating_duration_since(start);
            }
        }
    }

    /// 记录一次全局焦点丢失
    pub fn focus_lost(&mut self) {
        self.focus_loss_count += 1;
    }

    pub fn focus_loss_count(&self) -> u32 {
        self.focus_loss_count
    }

    pub fn paste_attempts(&self, question_id: &str) -> u32 {
        self.questions
            .get(question_id)
            .map(|t| t.paste_attempts)
            .unwrap_or(0)
    }

    /// 已累计的作答时长（不含正在运行的计时区间）
    pub fn time_spent_ms(&self, question_id: &str) -> u64 {
        self.questions
            .get(question_id)
            .map(|t| t.time_spent.as_millis() as u64)
            .unwrap_or(0)
    }

    /// 计时器是否正在运行
    pub fn is_timing(&self, question_id: &str) -> bool {
        self.questions
            .get(question_id)
            .map(|t| t.active_since.is_some())
            .unwrap_or(false)
    }

    /// 有效作答时长快照（毫秒）
    ///
    /// 把正在运行的计时区间折算到指定时刻，但不改动存储的计时器状态，
    /// 因此对同一时刻重复调用得到相同的值。
    pub fn effective_time_spent_ms(&self, question_id: &str, now: Instant) -> u64 {
        match self.questions.get(question_id) {
            Some(telemetry) => {
                let mut total = telemetry.time_spent;
                if let Some(start) = telemetry.active_since {
                    total += now.saturating_duration_since(start);
                }
                total.as_millis() as u64
            }
            None => 0,
        }
    }

    /// 把缓存里恢复出的用时并入当前状态
    ///
    /// 只接受已播种的题目 ID；时长只增不减，取两者较大值。
    pub fn merge_time_spent(&mut self, loaded: &HashMap<String, u64>) {
        for (question_id, &ms) in loaded {
            if let Some(telemetry) = self.questions.get_mut(question_id) {
                let restored = Duration::from_millis(ms);
                if restored > telemetry.time_spent {
                    telemetry.time_spent = restored;
                }
            }
        }
    }

    /// 当前跟踪的题目数量
    pub fn tracked_count(&self) -> usize {
        self.questions.len()
    }

    /// 是否正在跟踪该题目
    pub fn tracks(&self, question_id: &str) -> bool {
        self.questions.contains_key(question_id)
    }
}
