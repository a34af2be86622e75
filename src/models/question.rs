use serde::{Deserialize, Serialize};

/// 单道理解题
///
/// 锚定到仓库中一段具体代码；生成后不可变，归属于当前的 Submission。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// 题目唯一 ID
    pub id: String,
    /// 题干
    pub text: String,
    /// 代码摘录所在文件
    pub file_path: String,
    pub line_start: u32,
    pub line_end: u32,
    /// 代码摘录
    pub excerpt: String,
}

impl Question {
    /// 代码位置标注，如 `src/lib.rs:10-24`
    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.line_start, self.line_end)
    }
}

/// 一次题目生成的结果：服务端 ID + 有序题目列表
///
/// 同一时刻最多存在一个活跃的 Submission；重置或重新提交仓库时被丢弃。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: String,
    pub status: String,
    pub questions: Vec<Question>,
}

impl Submission {
    /// 返回全部题目 ID（保持服务端给出的顺序）
    pub fn question_ids(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|q| q.id.as_str())
    }
}

/// 单条答案提交记录
///
/// 批量提交时每道题一条，携带作答文本和诚信遥测快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub submission_id: String,
    pub question_id: String,
    pub answer_text: String,
    /// 有效作答时长快照（毫秒）
    pub time_spent_ms: u64,
    pub paste_attempts: u32,
    /// 全局焦点丢失次数（所有题目共享同一个值）
    pub focus_loss_count: u32,
    /// 预留的打字统计位，当前始终为空
    pub typing_stats: Option<serde_json::Value>,
}

/// 服务端对单条答案的受理回执
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerReceipt {
    pub answer_id: String,
    #[serde(default)]
    pub grade_id: Option<String>,
    #[serde(default)]
    pub score: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_location() {
        let question = Question {
            id: "q-1".to_string(),
            text: "这个函数做了什么？".to_string(),
            file_path: "src/example.py".to_string(),
            line_start: 1,
            line_end: 12,
            excerpt: "def example():\n    return 'hello'\n".to_string(),
        };
        assert_eq!(question.location(), "src/example.py:1-12");
    }

    #[test]
    fn test_answer_submission_serializes_null_typing_stats() {
        let record = AnswerSubmission {
            submission_id: "s-1".to_string(),
            question_id: "q-1".to_string(),
            answer_text: "解释".to_string(),
            time_spent_ms: 1200,
            paste_attempts: 0,
            focus_loss_count: 2,
            typing_stats: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["typing_stats"], serde_json::Value::Null);
        assert_eq!(json["focus_loss_count"], 2);
    }
}
