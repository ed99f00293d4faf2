//! HTTP client for the Freshbots bot API

use async_trait::async_trait;
use serde_json::Value;

use crate::config::FreshbotsConfig;
use super::{BotPayload, ProvisioningClient, ProvisioningError, ProvisioningResponse};

pub struct FreshbotsClient {
    base_url: String,
    api_token: Option<String>,
    http_client: reqwest::Client,
}

impl FreshbotsClient {
    pub fn new(config: &FreshbotsConfig) -> Result<Self, ProvisioningError> {
        let http_client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            http_client,
        })
    }

    /// Send a request and hand back the status with whatever body came back.
    ///
    /// Non-2xx answers are not errors here; the caller compares the status.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        account_id: i64,
    ) -> Result<ProvisioningResponse, ProvisioningError> {
        let mut request = request.header("X-Account-Id", account_id.to_string());
        if let Some(ref token) = self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        log::debug!("[Freshbots] account {} got status {}", account_id, status);
        Ok(ProvisioningResponse { status, body })
    }
}

#[async_trait]
impl ProvisioningClient for FreshbotsClient {
    async fn create_bot(
        &self,
        account_id: i64,
        payload: &BotPayload,
    ) -> Result<ProvisioningResponse, ProvisioningError> {
        log::info!("[Freshbots] Creating bot {} for account {}", payload.external_id, account_id);
        let request = self
            .http_client
            .post(format!("{}/api/v1/bots", self.base_url))
            .json(payload);
        self.send(request, account_id).await
    }

    async fn update_bot(
        &self,
        account_id: i64,
        payload: &BotPayload,
    ) -> Result<ProvisioningResponse, ProvisioningError> {
        let bot_ref = payload.bot_hsh.as_deref().unwrap_or(&payload.external_id);
        log::info!("[Freshbots] Updating bot {} for account {}", bot_ref, account_id);
        let request = self
            .http_client
            .put(format!("{}/api/v1/bots/{}", self.base_url, bot_ref))
            .json(payload);
        self.send(request, account_id).await
    }
}
