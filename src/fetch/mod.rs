// src/fetch/mod.rs

use reqwest::{Client, StatusCode};
use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{IngestError, Result};

pub mod payload;

pub use payload::{Answer, AnswerValue, FormsResponse, RawSubmission};

/// Supplies the raw submissions payload for one refresh cycle.
pub trait SubmissionSource {
    fn fetch(&self) -> impl Future<Output = Result<FormsResponse>> + Send;
}

/// Forms API client with a per-request timeout and bounded retry.
#[derive(Clone)]
pub struct FormsClient {
    client: Client,
    cfg: ApiConfig,
}

impl FormsClient {
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(cfg.timeout()).build()?;
        Ok(Self {
            client,
            cfg: cfg.clone(),
        })
    }

    /// Credentials are checked here, so a client without them can exist
    /// for runs that only read the persisted table.
    fn url(&self) -> Result<Url> {
        let (form_id, api_key) = self.cfg.credentials()?;
        submissions_url(&self.cfg.base_url, form_id, api_key, self.cfg.limit)
    }

    async fn get_once(&self, url: &Url) -> Result<FormsResponse> {
        let body = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl SubmissionSource for FormsClient {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self) -> Result<FormsResponse> {
        let url = self.url()?;
        let mut attempts = 0;
        let resp = loop {
            match self.get_once(&url).await {
                Ok(r) => break r,
                Err(IngestError::Transport(e))
                    if attempts < self.cfg.max_retries && is_transient(&e) =>
                {
                    attempts += 1;
                    let backoff = self.cfg.initial_backoff_ms * 2u64.pow(attempts - 1);
                    warn!(attempt = attempts, delay_ms = backoff, error = %e, "retrying forms API");
                    sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    error!(error = %e, "forms API fetch failed");
                    return Err(e);
                }
            }
        };

        info!(
            submissions = resp.content.len(),
            limit_left = ?resp.limit_left,
            "fetched submissions"
        );
        Ok(resp)
    }
}

fn is_transient(e: &reqwest::Error) -> bool {
    if e.is_timeout() || e.is_connect() {
        return true;
    }
    match e.status() {
        Some(s) => s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error(),
        None => e.is_request(),
    }
}

pub fn submissions_url(base: &str, form_id: &str, api_key: &str, limit: u32) -> Result<Url> {
    let base = Url::parse(base).map_err(|e| IngestError::Config(format!("base_url: {}", e)))?;
    let mut url = base
        .join(&format!("form/{}/submissions", form_id))
        .map_err(|e| IngestError::Config(format!("form id {}: {}", form_id, e)))?;
    url.query_pairs_mut()
        .append_pair("apiKey", api_key)
        .append_pair("limit", &limit.to_string());
    debug!(url = %redacted(&url), "built submissions URL");
    Ok(url)
}

/// Copy of `url` with the API key masked, for logging.
pub fn redacted(url: &Url) -> Url {
    let mut out = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "apiKey" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}
