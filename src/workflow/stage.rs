//! 工作流阶段定义
//!
//! 阶段值是唯一权威：哪些实体可变、哪些事件有效全部由它决定，
//! 让"在已提交阶段改答案"这类非法状态根本无法表达。

use crate::models::Grade;

/// 工作流主阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// 初始阶段：等待提交仓库地址
    Submit,
    /// 作答阶段：题目已生成，草稿与遥测可变
    Questions,
    /// 终态（对本次提交而言）：答案已被受理
    Submitted,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Submit => "submit",
            Stage::Questions => "questions",
            Stage::Submitted => "submitted",
        }
    }
}

/// 仓库提交的子阶段
///
/// 独立于主阶段：一次尝试结束（无论成败）子阶段都回到 Idle。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    /// 正在远程校验仓库
    Verifying,
    /// 正在远程生成题目
    Generating,
}

/// 评分获取状态
#[derive(Debug, Clone)]
pub enum GradeState {
    /// 尚未提交答案
    Idle,
    /// 轮询进行中
    Polling,
    /// 全部评分已到齐
    Ready(Vec<Grade>),
    /// 轮询尝试耗尽，批改仍在服务端进行
    StillGrading,
}

impl GradeState {
    /// 已到齐的评分（其他状态下为 None）
    pub fn grades(&self) -> Option<&[Grade]> {
        match self {
            GradeState::Ready(grades) => Some(grades),
            _ => None,
        }
    }
}
