use serde::{Deserialize, Serialize};

/// The access/refresh credential pair. Both values are opaque to the client;
/// the pair is replaced wholesale on every successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
