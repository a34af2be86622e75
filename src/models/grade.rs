use serde::{Deserialize, Serialize};

/// 单条答案的评分结果
///
/// 批改异步完成后到达，一旦收到即不可变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub answer_id: String,
    /// 得分，0..=5
    pub score: u8,
    /// 评语
    pub rationale: String,
    /// 批改置信度，0.0..=1.0
    pub confidence: f64,
}

/// 按得分百分比划分的等级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreLevel {
    Excellent,
    Good,
    NeedsImprovement,
    Insufficient,
}

impl ScoreLevel {
    /// 从得分百分比判定等级
    pub fn from_percent(percent: u32) -> Self {
        if percent >= 80 {
            ScoreLevel::Excellent
        } else if percent >= 60 {
            ScoreLevel::Good
        } else if percent >= 40 {
            ScoreLevel::NeedsImprovement
        } else {
            ScoreLevel::Insufficient
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreLevel::Excellent => "Excellent",
            ScoreLevel::Good => "Good",
            ScoreLevel::NeedsImprovement => "Needs Improvement",
            ScoreLevel::Insufficient => "Insufficient",
        }
    }
}

/// 展示用的成绩汇总
///
/// 仅在全部评分到齐后计算一次，不进入任何持久化状态。
#[derive(Debug, Clone)]
pub struct GradeReport {
    pub total_score: u32,
    pub max_score: u32,
    /// 得分百分比（四舍五入）
    pub percent: u32,
    /// 平均批改置信度百分比（四舍五入）
    pub average_confidence_percent: u32,
    pub level: ScoreLevel,
}

impl GradeReport {
    /// 从完整的评分列表汇总，列表为空时返回 None
    pub fn from_grades(grades: &[Grade]) -> Option<Self> {
        if grades.is_empty() {
            return None;
        }

        let total_score: u32 = grades.iter().map(|g| u32::from(g.score)).sum();
        let max_score = grades.len() as u32 * 5;
        let percent = ((total_score as f64 / max_score as f64) * 100.0).round() as u32;
        let average_confidence_percent = ((grades.iter().map(|g| g.confidence).sum::<f64>()
            / grades.len() as f64)
            * 100.0)
            .round() as u32;

        Some(Self {
            total_score,
            max_score,
            percent,
            average_confidence_percent,
            level: ScoreLevel::from_percent(percent),
        })
    }
}
