//! 答案草稿缓存 - 业务能力层
//!
//! 按仓库 URL 持久化作答中的草稿与用时，防止中断丢失进度。
//! 这是一个尽力而为的本地缓存，绝不充当权威数据源：
//! 缺失和损坏都按"没有缓存"处理。

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// 单个仓库的草稿记录
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftRecord {
    /// 题目 ID → 草稿文本
    #[serde(default)]
    pub answers: HashMap<String, String>,
    /// 题目 ID → 已累计用时（毫秒）
    #[serde(default)]
    pub time_spent: HashMap<String, u64>,
    /// 最近一次保存时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

/// 答案草稿缓存
///
/// 职责：
/// - 以仓库 URL 为键，一个键一个 JSON 文件
/// - 保存是同步且幂等的
/// - 解析失败的条目当作不存在，并清除脏文件
pub struct AnswerDraftStore {
    dir: PathBuf,
}

impl AnswerDraftStore {
    /// 创建新的草稿缓存
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 保存草稿记录
    pub fn save(&self, key: &str, record: &DraftRecord) -> AppResult<()> {
        let path = self.entry_path(key);
        let mut stamped = record.clone();
        stamped.saved_at = Some(chrono::Local::now().to_rfc3339());

        fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::store_write_failed(self.dir.display().to_string(), e))?;
        let content = serde_json::to_string(&stamped)?;
        fs::write(&path, content)
            .map_err(|e| AppError::store_write_failed(path.display().to_string(), e))?;

        debug!("💾 草稿已保存: {}", path.display());
        Ok(())
    }

    /// 读取草稿记录
    ///
    /// 文件不存在返回 None；内容无法解析时清除该条目并返回 None。
    pub fn load(&self, key: &str) -> Option<DraftRecord> {
        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;

        match serde_json::from_str::<DraftRecord>(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("⚠️ 草稿缓存损坏，已清除: {} ({})", path.display(), e);
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// 清除某个仓库的草稿条目
    pub fn clear(&self, key: &str) {
        let path = self.entry_path(key);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("⚠️ 清除草稿失败: {} ({})", path.display(), e);
            }
        }
    }

    /// 仓库 URL → 缓存文件路径
    ///
    /// 文件名做有损的字符替换即可，碰撞在尽力而为的缓存里可以接受。
    fn entry_path(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        self.dir.join(format!("{}.json", sanitized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 每个测试用独立的临时目录，避免互相污染
    fn temp_store(tag: &str) -> AnswerDraftStore {
        let dir = std::env::temp_dir().join(format!(
            "code_question_flow_drafts_{}_{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        AnswerDraftStore::new(dir)
    }

    fn sample_record() -> DraftRecord {
        let mut answers = HashMap::new();
        answers.insert("q-1".to_string(), "第一题答案".to_string());
        let mut time_spent = HashMap::new();
        time_spent.insert("q-1".to_string(), 1500u64);
        DraftRecord {
            answers,
            time_spent,
            saved_at: None,
        }
    }

    #[test]
    fn test_save_then_load_round() {
        let store = temp_store("round");
        let key = "https://github.com/acme/widgets";

        store.save(key, &sample_record()).expect("保存草稿应该成功");
        let loaded = store.load(key).expect("应该能读回草稿");

        assert_eq!(loaded.answers.get("q-1").map(String::as_str), Some("第一题答案"));
        assert_eq!(loaded.time_spent.get("q-1"), Some(&1500));
        assert!(loaded.saved_at.is_some());
    }

    #[test]
    fn test_load_missing_entry() {
        let store = temp_store("missing");
        assert!(store.load("https://github.com/acme/none").is_none());
    }

    #[test]
    fn test_corrupt_entry_is_purged() {
        let store = temp_store("corrupt");
        let key = "https://github.com/acme/widgets";

        store.save(key, &sample_record()).unwrap();
        let path = store.entry_path(key);
        fs::write(&path, "{ not valid json").unwrap();

        assert!(store.load(key).is_none());
        // 脏文件已被清除
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_removes_entry() {
        let store = temp_store("clear");
        let key = "https://github.com/acme/widgets";

        store.save(key, &sample_record()).unwrap();
        store.clear(key);
        assert!(store.load(key).is_none());

        // 清除不存在的条目不应惊扰调用方
        store.clear(key);
    }

    #[test]
    fn test_keys_map_to_distinct_files() {
        let store = temp_store("keys");
        let a = store.entry_path("https://github.com/acme/widgets");
        let b = store.entry_path("https://github.com/acme/gadgets");
        assert_ne!(a, b);
    }
}
