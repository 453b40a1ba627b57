//! Analytics-reporting data source.
//!
//! Posts a report request to a JSON reporting endpoint and returns the
//! decoded response. Reporting APIs are read-only, so feeding is rejected.
//!
//! Configuration: `endpoint` (required), `token` (bearer, optional),
//! `view_id` (optional, injected into every request that lacks one).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{required_str, DataSource};
use crate::core::Params;

/// Provider kind name
pub const KIND: &str = "analytics";

/// Analytics reporting client
pub struct AnalyticsDataSource {
    endpoint: String,
    token: Option<String>,
    view_id: Option<String>,
    client: reqwest::Client,
}

impl AnalyticsDataSource {
    pub fn new(endpoint: String, token: Option<String>, view_id: Option<String>) -> Self {
        Self {
            endpoint,
            token,
            view_id,
            client: reqwest::Client::new(),
        }
    }

    /// Build from a configuration section
    pub fn from_params(params: &Params) -> Result<Self> {
        let endpoint = required_str(params, "endpoint", KIND)?.to_string();
        let optional = |key: &str| params.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Self::new(endpoint, optional("token"), optional("view_id")))
    }

    /// Request body sent for a crawl: the `request` parameter plus `viewId`
    fn report_request(&self, params: &Params) -> Result<Value> {
        let mut request = params
            .get("request")
            .cloned()
            .context("analytics data source requires a 'request' parameter")?;

        if let (Some(view_id), Value::Object(body)) = (&self.view_id, &mut request) {
            body.entry("viewId")
                .or_insert_with(|| Value::String(view_id.clone()));
        }

        Ok(request)
    }
}

#[async_trait]
impl DataSource for AnalyticsDataSource {
    fn kind(&self) -> &str {
        KIND
    }

    async fn crawl(&self, params: Params) -> Result<Value> {
        let body = self.report_request(&params)?;
        debug!(endpoint = %self.endpoint, "Requesting report");

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .context("Failed to send report request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Analytics error ({}): {}", status, text);
        }

        response
            .json()
            .await
            .context("Failed to parse analytics response")
    }

    async fn feed(&self, _params: Params) -> Result<Value> {
        anyhow::bail!("The analytics data source does not support feeding")
    }
}
