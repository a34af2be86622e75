use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端 API 基础地址
    pub api_base_url: String,
    /// 草稿缓存目录
    pub draft_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 评分轮询配置 ---
    /// 提交后首次查询评分前的等待时间（毫秒）
    pub poll_initial_delay_ms: u64,
    /// 两次评分查询之间的等待时间（毫秒）
    pub poll_retry_delay_ms: u64,
    /// 评分查询最大尝试次数
    pub poll_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/cqbot".to_string(),
            draft_dir: "answer_drafts".to_string(),
            verbose_logging: false,
            poll_initial_delay_ms: 3000,
            poll_retry_delay_ms: 2000,
            poll_max_attempts: 60,
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// 从 TOML 配置文件加载
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(ConfigError::FileReadFailed {
                path: path.to_string(),
                source: Box::new(e),
            })
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            AppError::Config(ConfigError::TomlParseFailed {
                path: path.to_string(),
                source: Box::new(e),
            })
        })?;
        Ok(config)
    }

    /// 加载配置：存在 config.toml 则以其为基础，再应用环境变量覆盖
    pub fn load() -> Self {
        let base = if std::path::Path::new("config.toml").exists() {
            match Self::from_file("config.toml") {
                Ok(config) => config,
                Err(e) => {
                    warn!("⚠️ config.toml 加载失败，使用默认配置: {}", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        base.apply_env()
    }

    fn apply_env(self) -> Self {
        Self {
            api_base_url: std::env::var("CQBOT_API_BASE_URL").unwrap_or(self.api_base_url),
            draft_dir: std::env::var("CQBOT_DRAFT_DIR").unwrap_or(self.draft_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.verbose_logging),
            poll_initial_delay_ms: std::env::var("POLL_INITIAL_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.poll_initial_delay_ms),
            poll_retry_delay_ms: std::env::var("POLL_RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.poll_retry_delay_ms),
            poll_max_attempts: std::env::var("POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.poll_max_attempts),
        }
    }
}
