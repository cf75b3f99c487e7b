//! HTTP client for the moodcartd API.

use anyhow::{anyhow, Context, Result};
use moodcart_common::{
    AnalyticsReport, ChatTurn, FeedbackRequest, FeedbackResponse, HealthResponse,
    RecommendRequest, RecommendResponse,
};
use std::time::Duration;

/// Default daemon address, matching the daemon's default bind.
pub const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:7910";

pub struct DaemonClient {
    http: reqwest::Client,
    base_url: String,
}

impl DaemonClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                // Generous budget: one recommend call may walk the whole
                // chain, including two completion round-trips.
                .timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn recommend(
        &self,
        query: &str,
        history: Vec<ChatTurn>,
    ) -> Result<RecommendResponse> {
        let request = RecommendRequest {
            query: query.to_string(),
            history,
        };
        self.post("/v1/recommend", &request).await
    }

    pub async fn feedback(&self, request: &FeedbackRequest) -> Result<FeedbackResponse> {
        self.post("/v1/feedback", request).await
    }

    pub async fn stats(&self) -> Result<AnalyticsReport> {
        self.get("/v1/stats").await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get("/v1/health").await
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: serde::Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| connection_error(&self.base_url, e))?;
        Self::decode(path, response).await
    }

    async fn get<Resp: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Resp> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|e| connection_error(&self.base_url, e))?;
        Self::decode(path, response).await
    }

    async fn decode<Resp: serde::de::DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<Resp> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("daemon returned {} for {}: {}", status, path, body));
        }
        response
            .json()
            .await
            .with_context(|| format!("unexpected response shape from {}", path))
    }
}

fn connection_error(base_url: &str, e: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "Cannot reach the moodcart daemon at {}: {}\n\n\
         Is moodcartd running? Start it with:\n  moodcartd",
        base_url,
        e
    )
}
