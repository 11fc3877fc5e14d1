use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// Placeholder identity sent with every request
pub const USER_ID: &str = "test";

#[derive(Serialize)]
struct AskRequest<'a> {
    user_id: &'a str,
    input: &'a str,
    use_memory: bool,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one user input and return the raw response body.
    pub async fn ask(&self, input: &str) -> Result<String> {
        let request = AskRequest {
            user_id: USER_ID,
            input,
            use_memory: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("chat request failed with status: {}", status));
        }

        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "chat response received");
        Ok(body)
    }
}
