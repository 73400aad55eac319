use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    id: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    #[serde(rename = "UserInfo", default)]
    user_info: UserInfo,
    #[serde(default)]
    exp: Option<i64>,
}

/// 登录会话: access token 及其解码出的身份信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub access_token: String,
    pub user: Option<String>,
    pub role: Option<String>,
    pub id: Value,
    /// 过期时间 (unix 秒)
    pub token_expiry: Option<i64>,
}

impl Session {
    /// 解码后端签发给服务账号的 token (不校验签名, 只用于读取身份和过期时间)
    pub fn from_token(token: &str) -> Result<Self, AppError> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| AppError::Session("malformed access token".to_string()))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AppError::Session(format!("invalid token payload: {}", e)))?;
        let claims: Claims = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Session(format!("invalid token claims: {}", e)))?;

        Ok(Self::from_claims(token, claims))
    }

    /// 校验入站 token 的签名和有效期
    pub fn verify(token: &str, key: &DecodingKey, validation: &Validation) -> Result<Self, AppError> {
        let data = jsonwebtoken::decode::<Claims>(token, key, validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "token expired".to_string(),
                ErrorKind::InvalidSignature => "invalid token signature".to_string(),
                _ => format!("invalid token: {}", e),
            };
            AppError::Unauthorized(reason)
        })?;
        Ok(Self::from_claims(token, data.claims))
    }

    fn from_claims(token: &str, claims: Claims) -> Self {
        Self {
            access_token: token.to_string(),
            user: claims.user_info.email,
            role: claims.user_info.role,
            id: claims.user_info.id,
            token_expiry: claims.exp,
        }
    }

    pub fn has_role(&self, allowed: &[String]) -> bool {
        self.role
            .as_deref()
            .is_some_and(|role| allowed.iter().any(|r| r == role))
    }
}

/// 测试用: 生成未签名的 token
#[cfg(test)]
pub(crate) fn unsigned_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}
