use crate::error::{AppError, AppResult};
use crate::models::Session;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

type SharedRefresh = Shared<BoxFuture<'static, Result<Session, String>>>;

/// 当前会话 + 进行中的刷新
///
/// 并发的 403 共用同一个刷新 future, 不会重复刷新。
#[derive(Clone, Default)]
pub struct SessionStore {
    session: Arc<RwLock<Option<Session>>>,
    inflight: Arc<Mutex<Option<SharedRefresh>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current().map(|s| s.access_token)
    }

    pub fn set(&self, session: Session) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn clear(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// 刷新 token; 已有刷新在进行时直接等待它的结果
    ///
    /// 刷新失败会清空会话。
    pub async fn refresh_with<F, Fut>(&self, refresh: F) -> AppResult<Session>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Session>> + Send + 'static,
    {
        let shared = {
            let mut slot = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let store = self.clone();
                    let fut = refresh();
                    let pending = async move {
                        let outcome = fut.await;
                        match &outcome {
                            Ok(session) => store.set(session.clone()),
                            Err(e) => {
                                tracing::warn!("access token refresh failed: {}", e);
                                store.clear();
                            }
                        }
                        store
                            .inflight
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .take();
                        outcome.map_err(|e| e.to_string())
                    }
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        shared.await.map_err(AppError::Session)
    }
}
