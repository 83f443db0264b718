//! Minimal Pub/Sub REST client: topic lookup and publish.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::BrokerError;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct PublishRequest<'a> {
    messages: [PubsubMessage<'a>; 1],
}

#[derive(Serialize)]
struct PubsubMessage<'a> {
    data: String,
    attributes: &'a BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

/// REST client bound to a single project.
pub struct PubSubClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    access_token: Option<String>,
}

impl PubSubClient {
    pub fn new(
        endpoint: &str,
        project_id: &str,
        access_token: Option<String>,
    ) -> Result<Self, BrokerError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BrokerError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            access_token,
        })
    }

    fn topic_url(&self, topic_id: &str) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}",
            self.endpoint, self.project_id, topic_id
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn connection_error(&self, e: &reqwest::Error) -> BrokerError {
        BrokerError::ConnectionFailed {
            endpoint: self.endpoint.clone(),
            cause: e.to_string(),
        }
    }

    /// Whether `topic_id` exists in the project.
    pub async fn topic_exists(&self, topic_id: &str) -> Result<bool, BrokerError> {
        let response = self
            .authorize(self.http.get(self.topic_url(topic_id)))
            .send()
            .await
            .map_err(|e| self.connection_error(&e))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(BrokerError::ConnectionFailed {
                    endpoint: self.endpoint.clone(),
                    cause: format!(
                        "could not check if topic exists: status {status}, body: {body}"
                    ),
                })
            }
        }
    }

    /// Publish `data` to `topic_id` and wait for the server-assigned id.
    pub async fn publish(
        &self,
        topic_id: &str,
        data: &[u8],
        attributes: &BTreeMap<String, String>,
    ) -> Result<String, BrokerError> {
        let publish_failed = |cause: String| BrokerError::PublishFailed {
            topic: topic_id.to_string(),
            cause,
        };

        let body = PublishRequest {
            messages: [PubsubMessage {
                data: base64::engine::general_purpose::STANDARD.encode(data),
                attributes,
            }],
        };

        let response = self
            .authorize(self.http.post(format!("{}:publish", self.topic_url(topic_id))))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.connection_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(publish_failed(format!("status {status}, body: {body}")));
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| publish_failed(e.to_string()))?;

        parsed
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| publish_failed("no message id returned".to_string()))
    }
}
