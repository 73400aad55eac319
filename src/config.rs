use crate::models::ZeroOverpayPolicy;
use crate::service::QuantityParsePolicy;
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub report: ReportConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 抽取后端 (REST API) 连接配置
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// 服务账号, 为空时不自动登录
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// 报告口径
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub zero_overpay: ZeroOverpayPolicy,
    pub unparsable_quantity: QuantityParsePolicy,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 允许访问报告接口的角色
    pub allowed_roles: Vec<String>,
    /// 入站 token 的 HS256 签名密钥, 与签发方共享
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 30,
            email: None,
            password: None,
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allowed_roles: vec!["admin".to_string(), "user".to_string()],
            jwt_secret: String::new(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("allowed_roles", &self.allowed_roles)
            .field("jwt_secret", &"***")
            .finish()
    }
}

impl AppConfig {
    /// 分层加载: 默认值 -> config/default.toml (可选) -> APP__ 前缀环境变量
    ///
    /// 例: `APP__BACKEND__BASE_URL`, `APP__REPORT__ZERO_OVERPAY=financial`,
    /// `APP__AUTH__ALLOWED_ROLES=admin,auditor`, `APP__AUTH__JWT_SECRET=...`
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.allowed_roles")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            backend: BackendConfig {
                base_url: std::env::var("BACKEND_URL").unwrap_or(defaults.backend.base_url),
                timeout_secs: defaults.backend.timeout_secs,
                email: std::env::var("BACKEND_EMAIL").ok(),
                password: std::env::var("BACKEND_PASSWORD").ok(),
            },
            report: defaults.report,
            auth: AuthConfig {
                jwt_secret: std::env::var("JWT_SECRET").unwrap_or_default(),
                ..defaults.auth
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_preserve_current_report_behavior() {
        let config = AppConfig::default();
        assert_eq!(config.report.zero_overpay, ZeroOverpayPolicy::Inconsistency);
        assert_eq!(config.report.unparsable_quantity, QuantityParsePolicy::Propagate);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.allowed_roles, vec!["admin", "user"]);
        assert!(config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn debug_output_masks_secrets() {
        let config = AppConfig {
            backend: BackendConfig {
                password: Some("hunter2".to_string()),
                ..BackendConfig::default()
            },
            auth: AuthConfig {
                jwt_secret: "s3cr3t-signing-key".to_string(),
                ..AuthConfig::default()
            },
            ..AppConfig::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("s3cr3t-signing-key"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[report]\nzero_overpay = \"financial\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.report.zero_overpay, ZeroOverpayPolicy::Financial);
        assert_eq!(config.backend.base_url, "http://localhost:5000/api");
    }
}
