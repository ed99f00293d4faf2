//! Freshbots provisioning API
//!
//! Freshbots creates, trains and hosts the actual bots. This side only tells
//! it about new bots and changed settings, and keeps the `botHsh` token it
//! hands back for later calls.

mod client;
mod mock;

pub use client::FreshbotsClient;
pub use mock::{MockProvisioningClient, ProvisioningCall, ProvisioningCallKind};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::models::Bot;

/// Status Freshbots answers with when a bot was created
pub const BOT_CREATION_SUCCESS_STATUS: u16 = 201;

/// Status Freshbots answers with when a bot was updated
pub const BOT_UPDATION_SUCCESS_STATUS: u16 = 200;

#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("provisioning request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provisioning service unavailable: {0}")]
    Unavailable(String),
}

/// Raw answer of the provisioning service
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningResponse {
    pub status: u16,
    pub body: Value,
}

impl ProvisioningResponse {
    /// Bot token at `content.botHsh`
    pub fn bot_hash(&self) -> Option<&str> {
        self.body
            .get("content")
            .and_then(|c| c.get("botHsh"))
            .and_then(|h| h.as_str())
            .filter(|h| !h.is_empty())
    }

    pub fn created(bot_hash: &str) -> Self {
        Self {
            status: BOT_CREATION_SUCCESS_STATUS,
            body: serde_json::json!({ "content": { "botHsh": bot_hash } }),
        }
    }

    pub fn updated() -> Self {
        Self {
            status: BOT_UPDATION_SUCCESS_STATUS,
            body: serde_json::json!({ "content": {} }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarPayload {
    pub is_default: bool,
    pub avatar_id: Option<i64>,
    pub avatar_url: Option<String>,
}

/// Bot definition sent on create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotPayload {
    pub external_id: String,
    pub name: String,
    pub header: Option<String>,
    pub theme_colour: Option<String>,
    pub widget_size: Option<String>,
    pub avatar: AvatarPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_hsh: Option<String>,
}

impl BotPayload {
    /// `avatar_url` is the custom avatar image, when the bot uses one
    pub fn new(bot: &Bot, avatar_url: Option<String>) -> Self {
        let settings = &bot.additional_settings;
        let is_default = settings.uses_default_avatar();
        Self {
            external_id: bot.external_id.clone(),
            name: bot.name.clone(),
            header: bot.template_data.header.clone(),
            theme_colour: bot.template_data.theme_colour.clone(),
            widget_size: bot.template_data.widget_size.clone(),
            avatar: AvatarPayload {
                is_default,
                avatar_id: settings.avatar_id,
                avatar_url: if is_default { None } else { avatar_url },
            },
            bot_hsh: settings.bot_hash.clone(),
        }
    }
}

#[async_trait]
pub trait ProvisioningClient: Send + Sync {
    async fn create_bot(
        &self,
        account_id: i64,
        payload: &BotPayload,
    ) -> Result<ProvisioningResponse, ProvisioningError>;

    async fn update_bot(
        &self,
        account_id: i64,
        payload: &BotPayload,
    ) -> Result<ProvisioningResponse, ProvisioningError>;
}
