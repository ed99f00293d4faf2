use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner kinds an attachment can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachableType {
    Portal,
    Bot,
}

impl AttachableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachableType::Portal => "Portal",
            AttachableType::Bot => "Bot",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Portal" => Some(AttachableType::Portal),
            "Bot" => Some(AttachableType::Bot),
            _ => None,
        }
    }
}

/// Uploaded file owned by an account, optionally attached to a portal or bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub account_id: i64,
    pub attachable_type: Option<String>,
    pub attachable_id: Option<i64>,
    pub content_file_name: String,
    pub content_url: String,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    pub fn attachable_type_enum(&self) -> Option<AttachableType> {
        self.attachable_type.as_deref().and_then(AttachableType::from_str)
    }
}
