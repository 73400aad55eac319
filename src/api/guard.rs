use super::AppState;
use crate::error::{AppError, AppResult};
use crate::models::Session;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use std::sync::Arc;

/// 路由守卫: 校验 bearer token 的签名, 有效期和角色
#[derive(Clone)]
pub struct RouteGuard {
    decoding_key: DecodingKey,
    validation: Validation,
    allowed_roles: Arc<Vec<String>>,
}

impl RouteGuard {
    /// 签名密钥为空时拒绝启动
    pub fn new(secret: &str, allowed_roles: Vec<String>) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "auth.jwt_secret must be set".to_string(),
            )));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            allowed_roles: Arc::new(allowed_roles),
        })
    }

    /// 缺失/签名不符/过期 -> 401, 角色不在白名单 -> 403
    pub fn authorize(&self, header: Option<&str>) -> AppResult<Session> {
        let header =
            header.ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("invalid Authorization format".into()))?;

        let session = Session::verify(token.trim(), &self.decoding_key, &self.validation)?;
        if !session.has_role(&self.allowed_roles) {
            return Err(AppError::Forbidden(format!(
                "role {} is not allowed",
                session.role.as_deref().unwrap_or("<none>")
            )));
        }
        Ok(session)
    }
}

/// 守卫中间件, 通过后把 `Session` 放入 request extensions
pub async fn require_role(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let session = state.guard.authorize(header)?;

    tracing::debug!(
        "request authorized for {} ({})",
        session.user.as_deref().unwrap_or("-"),
        session.role.as_deref().unwrap_or("-")
    );
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
