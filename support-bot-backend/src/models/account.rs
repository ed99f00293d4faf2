use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feature flag an account needs before it can manage support bots
pub const SUPPORT_BOT_FEATURE: &str = "support_bot";

/// A tenant of the support platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub email: String,
    pub admin: bool,
}

/// Bearer token issued to a user of one account
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub account_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Tenant and acting user for a single request.
///
/// Every bot admin operation receives one of these explicitly; nothing reads
/// the current account from global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub account_id: i64,
    pub user_id: i64,
}

impl From<&AuthSession> for RequestContext {
    fn from(session: &AuthSession) -> Self {
        Self {
            account_id: session.account_id,
            user_id: session.user_id,
        }
    }
}
