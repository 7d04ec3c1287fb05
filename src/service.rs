//! Client for the UDPipe REST service (`models` and `process` methods).

use std::time::Duration;

use indexmap::IndexMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse {
    /// Model name → components it supports (`tokenizer`, `tagger`, `parser`).
    pub models: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub default_model: Option<String>,
}

impl ModelsResponse {
    pub fn names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }
}

/// Form fields of a `process` call. An optional component field that is
/// present but empty enables the component with its default options.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessRequest {
    pub model: String,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    pub model: String,
    #[serde(default)]
    pub acknowledgements: Vec<String>,
    pub result: String,
}

#[derive(Clone)]
pub struct UdpipeClient {
    client: Client,
    base_url: String,
}

impl UdpipeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn models(&self) -> Result<ModelsResponse, AppError> {
        let url = format!("{}/models", self.base_url);
        let response = self.client.get(&url).send().await;
        Self::read_json(&url, response).await
    }

    pub async fn process(&self, request: &ProcessRequest) -> Result<ProcessResponse, AppError> {
        let url = format!("{}/process", self.base_url);
        let response = self.client.post(&url).form(request).send().await;
        Self::read_json(&url, response).await
    }

    async fn read_json<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Result<reqwest::Response>,
    ) -> Result<T, AppError> {
        let response = response.map_err(|e| AppError::Service(format!("{url}: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Service(format!("{url}: {e}")))?;

        if !status.is_success() {
            // The service reports errors as plain text.
            return Err(AppError::Service(format!("{status}: {}", body.trim())));
        }
        serde_json::from_str(&body)
            .map_err(|e| AppError::Service(format!("{url}: invalid response: {e}")))
    }
}
