//! 身份门卫 - 业务能力层
//!
//! 启动时一次性解析"当前用户是谁"，之后只在显式登出时改变。
//! 解析失败一律落到未登录，绝不向调用方抛错，也不自动重试。

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::QuestionBackend;
use crate::models::Identity;

/// 登录门卫状态
#[derive(Debug, Clone)]
pub enum AuthState {
    /// 身份查询尚未返回，此时不提供任何提交入口
    Loading,
    Authenticated(Identity),
    Unauthenticated,
}

/// 身份门卫
pub struct IdentityGate {
    backend: Arc<dyn QuestionBackend>,
    state: AuthState,
}

impl IdentityGate {
    pub fn new(backend: Arc<dyn QuestionBackend>) -> Self {
        Self {
            backend,
            state: AuthState::Loading,
        }
    }

    /// 解析当前登录身份
    ///
    /// 网络失败与服务端明确的未登录响应同样处理为 Unauthenticated。
    pub async fn resolve(&mut self) -> &AuthState {
        self.state = match self.backend.fetch_identity().await {
            Ok(identity) if identity.authenticated => {
                info!(
                    "✓ 已登录: {}",
                    identity.login.as_deref().unwrap_or("<unknown>")
                );
                AuthState::Authenticated(identity)
            }
            Ok(_) => AuthState::Unauthenticated,
            Err(e) => {
                warn!("⚠️ 身份查询失败，按未登录处理: {}", e);
                AuthState::Unauthenticated
            }
        };
        &self.state
    }

    /// 登出
    ///
    /// 先请求服务端失效会话，无论成败都把本地状态置为未登录。
    pub async fn logout(&mut self) {
        if let Err(e) = self.backend.logout().await {
            warn!("⚠️ 远程登出失败，本地状态照常清除: {}", e);
        }
        self.state = AuthState::Unauthenticated;
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// 当前身份（未登录时为 None）
    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            AuthState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// 是否持有讲师权限
    pub fn is_instructor(&self) -> bool {
        self.identity().map(|i| i.is_instructor).unwrap_or(false)
    }
}
