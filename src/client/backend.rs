use super::session_store::SessionStore;
use crate::config::BackendConfig;
use crate::error::{AppError, AppResult};
use crate::models::Session;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// `/auth` 与 `/auth/refresh` 的响应
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

struct Inner {
    http: Client,
    base_url: String,
    sessions: SessionStore,
}

/// 抽取后端 REST 客户端
///
/// 请求自动带上 bearer token; 遇到 403 刷新一次 token 后重试一次。
/// refresh cookie 由 reqwest 的 cookie store 保存。
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<Inner>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> AppResult<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                sessions: SessionStore::new(),
            }),
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.sessions.current().is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// 登录并保存会话
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        let request = self
            .inner
            .http
            .post(self.url("auth"))
            .json(&LoginRequest { email, password });
        let session = fetch_session(request).await?;
        info!(
            "logged in to backend as {} (role: {})",
            session.user.as_deref().unwrap_or("-"),
            session.role.as_deref().unwrap_or("-")
        );
        self.inner.sessions.set(session.clone());
        Ok(session)
    }

    /// 刷新 access token, 并发调用共享同一次请求
    pub async fn refresh(&self) -> AppResult<Session> {
        let request = self.inner.http.get(self.url("auth/refresh"));
        self.inner
            .sessions
            .refresh_with(move || fetch_session(request))
            .await
    }

    /// 注销; 无论后端是否成功, 本地会话都会清空
    pub async fn logout(&self) -> AppResult<()> {
        let token = self.inner.sessions.access_token();
        let request = with_bearer(self.inner.http.post(self.url("auth/logout")), token.as_deref());
        let result = request.send().await;
        self.inner.sessions.clear();
        check_status(result?).await?;
        info!("logged out from backend");
        Ok(())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let url = self.url(path);
        let response = self.send(|| self.inner.http.get(&url)).await?;
        Ok(response.json().await?)
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path);
        let response = self.send(|| self.inner.http.post(&url).json(body)).await?;
        Ok(response.json().await?)
    }

    pub async fn patch_json<T, B>(&self, path: &str, body: &B) -> AppResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path);
        let response = self.send(|| self.inner.http.patch(&url).json(body)).await?;
        Ok(response.json().await?)
    }

    pub async fn get_bytes(&self, path: &str) -> AppResult<Vec<u8>> {
        let url = self.url(path);
        let response = self.send(|| self.inner.http.get(&url)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// 发送带 token 的请求, 403 时刷新并重试一次
    ///
    /// 等待期间 token 已被其它请求换新时直接用新 token 重试。
    async fn send<F>(&self, build: F) -> AppResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let token = self.inner.sessions.access_token();
        let response = with_bearer(build(), token.as_deref()).send().await?;
        if response.status() != StatusCode::FORBIDDEN {
            return check_status(response).await;
        }

        let current = self.inner.sessions.access_token();
        let retry_token = match current {
            Some(current) if token.as_deref() != Some(current.as_str()) => {
                debug!("access token already rotated, retrying");
                current
            }
            _ => {
                info!("backend returned 403, refreshing access token");
                self.refresh().await?.access_token
            }
        };

        let response = with_bearer(build(), Some(retry_token.as_str())).send().await?;
        check_status(response).await
    }
}

fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn fetch_session(request: RequestBuilder) -> AppResult<Session> {
    let response = check_status(request.send().await?).await?;
    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| AppError::InvalidResponse(format!("token response: {}", e)))?;
    Session::from_token(&body.access_token)
}

/// 非 2xx 状态映射为 AppError
async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    warn!("backend responded {}: {}", status, text);
    Err(match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(text),
        StatusCode::FORBIDDEN => AppError::Forbidden(text),
        StatusCode::NOT_FOUND => AppError::NotFound(text),
        _ => AppError::Backend {
            status: status.as_u16(),
            message: text,
        },
    })
}
