use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{BotPayload, ProvisioningClient, ProvisioningError, ProvisioningResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningCallKind {
    Create,
    Update,
}

/// One request the mock received
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningCall {
    pub kind: ProvisioningCallKind,
    pub account_id: i64,
    pub payload: BotPayload,
}

/// Provisioning client for tests - replays queued responses in order and
/// records every payload it was sent.
#[derive(Clone, Default)]
pub struct MockProvisioningClient {
    responses: Arc<Mutex<VecDeque<Result<ProvisioningResponse, ProvisioningError>>>>,
    calls: Arc<Mutex<Vec<ProvisioningCall>>>,
}

impl MockProvisioningClient {
    pub fn new(responses: Vec<Result<ProvisioningResponse, ProvisioningError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push_response(&self, response: Result<ProvisioningResponse, ProvisioningError>) {
        self.lock_responses().push_back(response);
    }

    pub fn calls(&self) -> Vec<ProvisioningCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_responses(
        &self,
    ) -> std::sync::MutexGuard<'_, VecDeque<Result<ProvisioningResponse, ProvisioningError>>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(
        &self,
        kind: ProvisioningCallKind,
        account_id: i64,
        payload: &BotPayload,
    ) -> Result<ProvisioningResponse, ProvisioningError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ProvisioningCall {
                kind,
                account_id,
                payload: payload.clone(),
            });
        self.lock_responses()
            .pop_front()
            .unwrap_or_else(|| Err(ProvisioningError::Unavailable("mock exhausted".to_string())))
    }
}

#[async_trait]
impl ProvisioningClient for MockProvisioningClient {
    async fn create_bot(
        &self,
        account_id: i64,
        payload: &BotPayload,
    ) -> Result<ProvisioningResponse, ProvisioningError> {
        self.record(ProvisioningCallKind::Create, account_id, payload)
    }

    async fn update_bot(
        &self,
        account_id: i64,
        payload: &BotPayload,
    ) -> Result<ProvisioningResponse, ProvisioningError> {
        self.record(ProvisioningCallKind::Update, account_id, payload)
    }
}
