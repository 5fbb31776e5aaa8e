use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::models::credentials::{Credentials, OtpPurpose, RegisterPayload};
use crate::models::tokens::TokenPair;
use crate::models::user::{AccountSnapshot, ProfileSet, RoleProfile, User};

use super::errors::ApiError;
use super::service::{AuthApi, LoginSuccess};

/// Live HTTP implementation of [`AuthApi`] against the platform's auth
/// service.
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Pulls the platform's error envelope (`{status, success, message,
    /// code}`) out of a rejection body so the caller can show the server's
    /// own message.
    async fn rejection(res: reqwest::Response) -> ApiError {
        let status = res.status();
        let message = res
            .json::<ErrorEnvelope>()
            .await
            .ok()
            .map(|envelope| envelope.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));

        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { message }
        } else {
            ApiError::Rejected {
                status: status.as_u16(),
                message,
            }
        }
    }
}

fn network(err: reqwest::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

fn decode(err: reqwest::Error) -> ApiError {
    ApiError::Decode(err.to_string())
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    user: User,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    user: User,
    #[serde(default)]
    profiles: Vec<RoleProfile>,
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginSuccess, ApiError> {
        let body = match credentials {
            Credentials::EmailPassword { email, password } => {
                json!({ "email": email, "password": password })
            }
            Credentials::PhoneOtp { phone_number, code } => {
                json!({ "phoneNumber": phone_number, "otp": code })
            }
        };

        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&body)
            .send()
            .await
            .map_err(network)?;

        if !res.status().is_success() {
            return Err(Self::rejection(res).await);
        }

        let payload: LoginResponse = res.json().await.map_err(decode)?;
        Ok(LoginSuccess {
            tokens: TokenPair {
                access_token: payload.access_token,
                refresh_token: payload.refresh_token,
            },
            user: payload.user,
        })
    }

    async fn register(&self, payload: &RegisterPayload) -> Result<LoginSuccess, ApiError> {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(payload)
            .send()
            .await
            .map_err(network)?;

        if !res.status().is_success() {
            return Err(Self::rejection(res).await);
        }

        let payload: LoginResponse = res.json().await.map_err(decode)?;
        Ok(LoginSuccess {
            tokens: TokenPair {
                access_token: payload.access_token,
                refresh_token: payload.refresh_token,
            },
            user: payload.user,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        // Deliberately no bearer header: the refresh exchange must never be
        // routed back through the 401-retry path.
        let res = self
            .client
            .post(self.url("/auth/refresh-token"))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(network)?;

        if !res.status().is_success() {
            return Err(Self::rejection(res).await);
        }

        res.json::<TokenPair>().await.map_err(decode)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), ApiError> {
        let res = self
            .client
            .post(self.url("/auth/logout"))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(network)?;

        if !res.status().is_success() {
            return Err(Self::rejection(res).await);
        }
        Ok(())
    }

    async fn me(&self, access_token: &str) -> Result<AccountSnapshot, ApiError> {
        let res = self
            .client
            .get(self.url("/auth/me"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(network)?;

        if !res.status().is_success() {
            return Err(Self::rejection(res).await);
        }

        let payload: MeResponse = res.json().await.map_err(decode)?;
        Ok(AccountSnapshot {
            user: payload.user,
            profiles: ProfileSet::from(payload.profiles),
        })
    }

    async fn send_otp(&self, phone_number: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        let res = self
            .client
            .post(self.url("/auth/send-otp"))
            .json(&json!({ "phoneNumber": phone_number, "purpose": purpose.as_str() }))
            .send()
            .await
            .map_err(network)?;

        if !res.status().is_success() {
            return Err(Self::rejection(res).await);
        }
        Ok(())
    }

    async fn verify_otp(&self, phone_number: &str, code: &str) -> Result<(), ApiError> {
        let res = self
            .client
            .post(self.url("/auth/verify-otp"))
            .json(&json!({ "phoneNumber": phone_number, "otp": code }))
            .send()
            .await
            .map_err(network)?;

        if !res.status().is_success() {
            return Err(Self::rejection(res).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use uuid::Uuid;

    fn api(server: &MockServer) -> HttpAuthApi {
        HttpAuthApi::new(Client::new(), server.base_url())
    }

    fn user_json(id: Uuid) -> serde_json::Value {
        json!({
            "id": id.to_string(),
            "email": "dana@example.com",
            "firstName": "Dana",
            "lastName": "Okafor",
            "roles": ["parent", "teacher"],
        })
    }

    #[tokio::test]
    async fn login_parses_camel_case_payload() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/login")
                    .json_body(json!({ "email": "dana@example.com", "password": "hunter2" }));
                then.status(200).json_body(json!({
                    "accessToken": "at-1",
                    "refreshToken": "rt-1",
                    "user": user_json(id),
                }));
            })
            .await;

        let success = api(&server)
            .login(&Credentials::EmailPassword {
                email: "dana@example.com".into(),
                password: "hunter2".into(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(success.tokens.access_token, "at-1");
        assert_eq!(success.tokens.refresh_token, "rt-1");
        assert_eq!(success.user.id, id);
        assert_eq!(
            success.user.roles,
            vec![crate::models::user::RoleTag::Parent, crate::models::user::RoleTag::Teacher]
        );
    }

    #[tokio::test]
    async fn login_rejection_surfaces_envelope_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(401).json_body(json!({
                    "status": "error",
                    "success": false,
                    "message": "Invalid credentials",
                    "code": null,
                }));
            })
            .await;

        let err = api(&server)
            .login(&Credentials::EmailPassword {
                email: "dana@example.com".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();

        match err {
            ApiError::Unauthorized { message } => assert_eq!(message, "Invalid credentials"),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn rejection_without_envelope_gets_generic_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(503).body("upstream unavailable");
            })
            .await;

        let err = api(&server)
            .login(&Credentials::PhoneOtp {
                phone_number: "+15550100".into(),
                code: "123456".into(),
            })
            .await
            .unwrap_err();

        match err {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "request failed with status 503");
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn me_sends_bearer_token_and_parses_profiles() {
        let server = MockServer::start_async().await;
        let id = Uuid::new_v4();
        let profile_id = Uuid::new_v4();
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/auth/me")
                    .header("authorization", "Bearer at-7");
                then.status(200).json_body(json!({
                    "user": user_json(id),
                    "profiles": [{ "id": profile_id.to_string(), "role": "teacher" }],
                }));
            })
            .await;

        let snapshot = api(&server).me("at-7").await.unwrap();

        mock.assert_async().await;
        assert!(snapshot
            .profiles
            .contains(crate::models::user::RoleTag::Teacher));
        assert!(!snapshot
            .profiles
            .contains(crate::models::user::RoleTag::Parent));
    }

    #[tokio::test]
    async fn refresh_rotates_pair_without_bearer_header() {
        let server = MockServer::start_async().await;
        let trap = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/refresh-token")
                    .header_exists("authorization");
                then.status(500);
            })
            .await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/refresh-token")
                    .json_body(json!({ "refreshToken": "rt-1" }));
                then.status(200).json_body(json!({
                    "accessToken": "at-2",
                    "refreshToken": "rt-2",
                }));
            })
            .await;

        let pair = api(&server).refresh("rt-1").await.unwrap();

        trap.assert_hits_async(0).await;
        mock.assert_async().await;
        assert_eq!(pair.access_token, "at-2");
        assert_eq!(pair.refresh_token, "rt-2");
    }

    #[tokio::test]
    async fn expired_refresh_token_is_unauthorized() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/refresh-token");
                then.status(401).json_body(json!({
                    "status": "error",
                    "success": false,
                    "message": "Refresh token expired",
                }));
            })
            .await;

        let err = api(&server).refresh("rt-stale").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn send_otp_posts_purpose() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/send-otp")
                    .json_body(json!({ "phoneNumber": "+15550100", "purpose": "login" }));
                then.status(200).json_body(json!({
                    "status": "success",
                    "success": true,
                    "message": "Code sent",
                }));
            })
            .await;

        api(&server)
            .send_otp("+15550100", OtpPurpose::Login)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_network_error() {
        let api = HttpAuthApi::new(Client::new(), "http://127.0.0.1:9");
        let err = api.refresh("rt-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
