//! HTTP client for one board.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::KonnectedConfig;
use crate::error::KonnectedError;
use crate::protocol::{Command, PinState, Status};

const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the pooled client shared by every board.
pub(crate) fn pooled(config: &KonnectedConfig) -> Result<reqwest::Client, KonnectedError> {
    Ok(reqwest::Client::builder()
        .pool_max_idle_per_host(config.max_idle_connections)
        .pool_idle_timeout(IDLE_TIMEOUT)
        .timeout(config.timeout())
        .build()?)
}

#[derive(Debug, Clone)]
pub(crate) struct BoardClient {
    http: reqwest::Client,
    base: String,
}

impl BoardClient {
    /// `address` is `host` or `host:port`.
    pub(crate) fn new(http: reqwest::Client, address: &str) -> Self {
        Self {
            http,
            base: format!("http://{address}"),
        }
    }

    pub(crate) async fn status(&self) -> Result<Status, KonnectedError> {
        self.get("status").await
    }

    pub(crate) async fn pins(&self) -> Result<Vec<PinState>, KonnectedError> {
        self.get("device").await
    }

    pub(crate) async fn actuate(&self, command: &Command) -> Result<(), KonnectedError> {
        self.http
            .put(format!("{}/device", self.base))
            .json(command)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, KonnectedError> {
        let url = format!("{}/{path}", self.base);
        tracing::debug!(url = %url, "konnected request");
        Ok(self.http.get(url).send().await?.error_for_status()?.json().await?)
    }
}
