use serde::{Deserialize, Serialize};

use super::user::RoleTag;

/// Login input. The service accepts either an email/password pair or a
/// phone number plus the one-time code previously dispatched to it.
#[derive(Debug, Clone)]
pub enum Credentials {
    EmailPassword { email: String, password: String },
    PhoneOtp { phone_number: String, code: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    Verify,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Login => "login",
            OtpPurpose::Verify => "verify",
        }
    }
}

/// Registration assigns exactly one role tag at creation time. Additional
/// roles are linked later, server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: RoleTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}
