//! Shared test fakes.

use std::{collections::VecDeque, sync::Mutex};

use reqwest::StatusCode;
use tokio::sync::Semaphore;

use crate::{error::ApiError, http::HttpClient};

/// [`HttpClient`] fake returning queued responses and recording every
/// requested URL.
pub(crate) struct FakeHttpClient {
    responses: Mutex<VecDeque<Result<Vec<u8>, ApiError>>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
}

impl FakeHttpClient {
    pub(crate) fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// A client whose requests record their URL and then block until
    /// [`release`](Self::release) lets them finish, so a test can hold one
    /// request outstanding while another caller races it.
    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    /// Lets `requests` blocked requests proceed. No-op for ungated clients.
    pub(crate) fn release(&self, requests: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(requests);
        }
    }

    pub(crate) fn push_json(&self, body: &str) {
        self.responses
            .lock()
            .expect("Mutex should not be poisoned")
            .push_back(Ok(body.as_bytes().to_vec()));
    }

    pub(crate) fn push_error(&self) {
        self.responses
            .lock()
            .expect("Mutex should not be poisoned")
            .push_back(Err(ApiError::ResponseContent {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "fake server error".to_string(),
            }));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("Mutex should not be poisoned").clone()
    }
}

#[async_trait::async_trait]
impl HttpClient for FakeHttpClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.calls
            .lock()
            .expect("Mutex should not be poisoned")
            .push(url.to_string());

        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("Semaphore should not be closed");
            // Consume the permit so each release() lets exactly one request through.
            permit.forget();
        }

        self.responses
            .lock()
            .expect("Mutex should not be poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ApiError::ResponseContent {
                    status: StatusCode::NOT_FOUND,
                    message: "no response queued".to_string(),
                })
            })
    }
}
