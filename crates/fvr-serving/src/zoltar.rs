//! Zoltar REST adapter for [`ServingSystem`].
//!
//! Lookup walks project → model → forecast by following the absolute
//! resource URLs Zoltar returns, then downloads `{forecast}/data/`.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use fvr_config::settings::ZoltarSettings;
use fvr_normalize::PredictionDoc;

use crate::system::{Credentials, ServingError, ServingSystem};

pub const DEFAULT_HOST: &str = "https://zoltardata.com";
pub const DEFAULT_PROJECT: &str = "COVID-19 Forecasts";

pub struct ZoltarClient {
    http: reqwest::Client,
    host: String,
    project: String,
    token: RwLock<Option<String>>,
}

impl ZoltarClient {
    pub fn new(project: String) -> Self {
        Self::new_with_base_url(project, DEFAULT_HOST.to_string())
    }

    pub fn new_with_base_url(project: String, host: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            host,
            project,
            token: RwLock::new(None),
        }
    }

    pub fn from_settings(settings: &ZoltarSettings) -> Self {
        Self::new_with_base_url(settings.project.clone(), settings.host.clone())
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/{}", self.host.trim_end_matches('/'), tail.trim_start_matches('/'))
    }

    async fn authorized_get(&self, url: &str) -> Result<RequestBuilder, ServingError> {
        let token = self.token.read().await;
        let Some(token) = token.as_deref() else {
            return Err(ServingError::Auth(
                "download attempted before authenticate".to_string(),
            ));
        };
        Ok(self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, format!("JWT {token}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, ServingError> {
        let req = self.authorized_get(url).await?;
        let resp = req
            .send()
            .await
            .map_err(|e| ServingError::Transport(format!("zoltar {what} request failed: {e}")))?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(ServingError::not_found(what)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ServingError::Auth(format!(
                    "zoltar rejected token ({}) for {what}",
                    resp.status().as_u16()
                )))
            }
            s => {
                let message = resp.text().await.unwrap_or_default();
                return Err(ServingError::Api {
                    status: s.as_u16(),
                    message: message.chars().take(200).collect(),
                });
            }
        }

        resp.json::<T>()
            .await
            .map_err(|e| ServingError::Decode(format!("zoltar {what} json decode failed: {e}")))
    }

    async fn find_forecast_url(&self, dataset: &str, time_key: &str) -> Result<String, ServingError> {
        let projects: Vec<ZProject> = self.get_json(&self.url("api/projects/"), "projects").await?;
        let project = projects
            .into_iter()
            .find(|p| p.name == self.project)
            .ok_or_else(|| ServingError::not_found(format!("project '{}'", self.project)))?;

        let models: Vec<ZModel> = self
            .get_json(&join(&project.url, "models/"), "models")
            .await?;
        let model = models
            .into_iter()
            .find(|m| m.abbreviation == dataset)
            .ok_or_else(|| ServingError::not_found(format!("model '{dataset}'")))?;

        let forecasts: Vec<ZForecast> = self
            .get_json(&join(&model.url, "forecasts/"), "forecasts")
            .await?;
        // Several issues may exist for one time zero; the newest is live.
        let forecast = forecasts
            .into_iter()
            .filter(|f| f.time_zero.timezero_date == time_key)
            .max_by(|a, b| a.issued_at.cmp(&b.issued_at))
            .ok_or_else(|| {
                ServingError::not_found(format!("forecast of '{dataset}' for {time_key}"))
            })?;

        debug!(dataset, time_key, forecast = %forecast.url, "zoltar forecast located");
        Ok(forecast.url)
    }
}

fn join(resource_url: &str, tail: &str) -> String {
    format!("{}/{}", resource_url.trim_end_matches('/'), tail)
}

#[async_trait::async_trait]
impl ServingSystem for ZoltarClient {
    fn source_name(&self) -> &'static str {
        "zoltar"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<(), ServingError> {
        let resp = self
            .http
            .post(self.url("api-token-auth/"))
            .json(&serde_json::json!({
                "username": credentials.username,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(|e| ServingError::Transport(format!("zoltar auth request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ServingError::Auth(format!(
                "zoltar token request rejected status={}",
                status.as_u16()
            )));
        }
        let body: ZToken = resp
            .json()
            .await
            .map_err(|e| ServingError::Decode(format!("zoltar token json decode failed: {e}")))?;

        *self.token.write().await = Some(body.token);
        Ok(())
    }

    async fn download(&self, dataset: &str, time_key: &str) -> Result<PredictionDoc, ServingError> {
        let forecast_url = self.find_forecast_url(dataset, time_key).await?;
        self.get_json(&join(&forecast_url, "data/"), "forecast data")
            .await
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ZToken {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ZProject {
    url: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ZModel {
    url: String,
    abbreviation: String,
}

#[derive(Debug, Deserialize)]
struct ZForecast {
    url: String,
    #[serde(alias = "timezero")]
    time_zero: ZTimeZero,
    #[serde(default, alias = "issue_date")]
    issued_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZTimeZero {
    timezero_date: String,
}
