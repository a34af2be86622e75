use serde::{Deserialize, Serialize};

/// 当前登录身份
///
/// 由 `GET auth/me` 一次性产出，之后对系统其余部分只读；
/// 仅在显式登出时重新求值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub authenticated: bool,
    /// GitHub 登录名（未登录时为空）
    #[serde(default, rename = "github_login")]
    pub login: Option<String>,
    /// 是否持有讲师权限
    #[serde(default, rename = "is_instructor")]
    pub is_instructor: bool,
}

impl Identity {
    /// 未登录身份
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            login: None,
            is_instructor: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_wire_shape() {
        let identity: Identity = serde_json::from_str(
            r#"{"authenticated": true, "github_login": "octocat", "is_instructor": true}"#,
        )
        .unwrap();
        assert!(identity.authenticated);
        assert_eq!(identity.login.as_deref(), Some("octocat"));
        assert!(identity.is_instructor);
    }

    #[test]
    fn test_deserialize_minimal_response() {
        // 未登录响应只携带 authenticated 字段
        let identity: Identity = serde_json::from_str(r#"{"authenticated": false}"#).unwrap();
        assert!(!identity.authenticated);
        assert!(identity.login.is_none());
        assert!(!identity.is_instructor);
    }
}
