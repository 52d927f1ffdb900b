use std::time::Duration;

use async_trait::async_trait;
use clipdb_core::{AppConfig, Platform};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ScraperError;
use crate::remote::RemoteScraper;
use crate::types::{ActorInput, ApiResponse, JobHandle, RemoteStatus, RunData, RunStatus};

/// Actor id (`owner~name` or opaque id) used per platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorIds {
    pub tiktok: String,
    pub instagram: String,
    pub youtube: String,
}

impl ActorIds {
    #[must_use]
    pub fn for_platform(&self, platform: Platform) -> &str {
        match platform {
            Platform::TikTok => &self.tiktok,
            Platform::Instagram => &self.instagram,
            Platform::YouTube => &self.youtube,
        }
    }
}

impl Default for ActorIds {
    fn default() -> Self {
        Self {
            tiktok: "clockworks~tiktok-scraper".to_string(),
            instagram: "apify~instagram-scraper".to_string(),
            youtube: "streamers~youtube-scraper".to_string(),
        }
    }
}

/// HTTP client for the Apify v2 REST API.
///
/// Runs are started with `POST /acts/{actor}/runs`, inspected with
/// `GET /actor-runs/{id}`, and read back through the run's default dataset at
/// `GET /actor-runs/{id}/dataset/items`. Every request carries the API token as
/// a bearer header.
pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: String,
    actors: ActorIds,
}

impl ApifyClient {
    /// Creates a client against `base_url` (no trailing slash required).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        token: &str,
        base_url: &str,
        actors: ActorIds,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            actors,
        })
    }

    /// Builds a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &config.apify_api_token,
            &config.apify_base_url,
            ActorIds {
                tiktok: config.tiktok_actor.clone(),
                instagram: config.instagram_actor.clone(),
                youtube: config.youtube_actor.clone(),
            },
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
        )
    }

    fn runs_url(&self, platform: Platform) -> String {
        format!(
            "{}/acts/{}/runs",
            self.base_url,
            self.actors.for_platform(platform)
        )
    }

    fn run_url(&self, remote_id: &str) -> String {
        format!("{}/actor-runs/{remote_id}", self.base_url)
    }

    fn dataset_url(&self, remote_id: &str) -> String {
        format!(
            "{}/actor-runs/{remote_id}/dataset/items?format=json&clean=true",
            self.base_url
        )
    }

    async fn error_for_status(response: Response) -> Result<Response, ScraperError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ScraperError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_json<T: DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, ScraperError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ScraperError::Deserialize {
            context: context.to_string(),
            source,
        })
    }
}

/// Apify answers with 404 or 409 while a finished run's dataset is still
/// being materialised, and sometimes with a 200/400 whose body says so.
fn is_not_ready_body(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("not ready")
        || lower.contains("not yet available")
        || lower.contains("dataset was not found")
}

#[async_trait]
impl RemoteScraper for ApifyClient {
    async fn launch(&self, input: &ActorInput) -> Result<JobHandle, ScraperError> {
        let platform = input.platform();
        let url = self.runs_url(platform);
        tracing::debug!(%platform, url = %url, "launching remote run");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;
        let response = Self::error_for_status(response).await?;
        let run: ApiResponse<RunData> = Self::parse_json(response, "actor run").await?;

        Ok(JobHandle {
            status: RemoteStatus::from_remote(&run.data.status),
            remote_id: run.data.id,
        })
    }

    async fn get_status(&self, remote_id: &str) -> Result<RunStatus, ScraperError> {
        let response = self
            .client
            .get(self.run_url(remote_id))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = Self::error_for_status(response).await?;
        let run: ApiResponse<RunData> = Self::parse_json(response, "actor run").await?;
        Ok(RunStatus::from(run.data))
    }

    async fn get_dataset_items(&self, remote_id: &str) -> Result<Vec<Value>, ScraperError> {
        let response = self
            .client
            .get(self.dataset_url(remote_id))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::CONFLICT {
            let message = response.text().await.unwrap_or_default();
            return Err(ScraperError::NotReady {
                remote_id: remote_id.to_string(),
                message: format!("HTTP {}: {message}", status.as_u16()),
            });
        }

        let body = response.text().await?;
        if !status.is_success() {
            if is_not_ready_body(&body) {
                return Err(ScraperError::NotReady {
                    remote_id: remote_id.to_string(),
                    message: body,
                });
            }
            return Err(ScraperError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(Value::Object(obj)) => {
                // Some proxies wrap the list as `{ "data": { "items": [...] } }`.
                let nested = obj
                    .get("data")
                    .and_then(|d| d.get("items"))
                    .and_then(Value::as_array);
                match nested {
                    Some(items) => Ok(items.clone()),
                    None if is_not_ready_body(&body) => Err(ScraperError::NotReady {
                        remote_id: remote_id.to_string(),
                        message: body,
                    }),
                    None => Err(ScraperError::Api {
                        status: status.as_u16(),
                        message: format!("unexpected dataset payload: {body}"),
                    }),
                }
            }
            Ok(_) => Err(ScraperError::Api {
                status: status.as_u16(),
                message: format!("unexpected dataset payload: {body}"),
            }),
            Err(source) => Err(ScraperError::Deserialize {
                context: format!("dataset items for run {remote_id}"),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
