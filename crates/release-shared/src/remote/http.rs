//! `reqwest`-backed implementation of [`TaskServiceClient`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{RemoteError, RemoteResult};

use super::{TaskCommand, TaskCommandResponse, TaskServiceClient};

/// Wraps a single `reqwest::Client` configured with the fixed 15s timeout
/// named in spec §4.2/§4.5. Connections and bodies are released on every
/// exit path by virtue of `reqwest` owning them for the call's duration
/// (spec §5 "resource scoping").
#[derive(Debug, Clone)]
pub struct HttpTaskServiceClient {
    client: Client,
}

impl HttpTaskServiceClient {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with a fixed timeout");
        Self { client }
    }
}

impl Default for HttpTaskServiceClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

#[async_trait]
impl TaskServiceClient for HttpTaskServiceClient {
    async fn check_status(&self, base_url: &str) -> RemoteResult<()> {
        let url = format!("{base_url}/status");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_request_error(&url, e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status {
                url,
                status: resp.status().as_u16(),
            })
        }
    }

    async fn send_command(
        &self,
        base_url: &str,
        command: TaskCommand,
    ) -> RemoteResult<TaskCommandResponse> {
        let url = format!("{base_url}/tasks");
        let resp = self
            .client
            .post(&url)
            .json(&command)
            .send()
            .await
            .map_err(|e| classify_request_error(&url, e))?;

        if !resp.status().is_success() {
            return Err(RemoteError::Status {
                url,
                status: resp.status().as_u16(),
            });
        }

        resp.json::<TaskCommandResponse>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

fn classify_request_error(url: &str, e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout {
            url: url.to_string(),
            timeout_ms: 15_000,
        }
    } else {
        RemoteError::Http(e.to_string())
    }
}
