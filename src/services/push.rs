//! Push notifications through Firebase Cloud Messaging

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::PushConfig;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct PushSender {
    http: Client,
    enabled: bool,
    endpoint: String,
    server_key: String,
}

impl PushSender {
    pub fn new(config: &PushConfig) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            http,
            enabled: config.enabled,
            endpoint: config.fcm_endpoint.clone(),
            server_key: config.fcm_server_key.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Deliver one message; failures are logged and swallowed
    pub async fn send(&self, token: &str, title: &str, body: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let payload = json!({
            "to": token,
            "notification": { "title": title, "body": body },
            "data": data,
        });

        let result = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Push notification delivered");
            }
            Ok(response) => {
                warn!(status = response.status().as_u16(), "Push notification rejected");
            }
            Err(e) => {
                warn!(error = %e, "Push notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String, enabled: bool) -> PushConfig {
        PushConfig {
            enabled,
            fcm_server_key: "server-key".to_string(),
            fcm_endpoint: endpoint,
        }
    }

    #[tokio::test]
    async fn test_push_uses_server_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fcm/send"))
            .and(header("Authorization", "key=server-key"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sender = PushSender::new(&config(format!("{}/fcm/send", server.uri()), true)).unwrap();
        sender.send("device", "Hi", "Body", &json!({})).await;
    }

    #[tokio::test]
    async fn test_disabled_push_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let sender = PushSender::new(&config(format!("{}/fcm/send", server.uri()), false)).unwrap();
        sender.send("device", "Hi", "Body", &json!({})).await;
    }

    #[tokio::test]
    async fn test_push_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sender = PushSender::new(&config(format!("{}/fcm/send", server.uri()), true)).unwrap();
        sender.send("device", "Hi", "Body", &json!({})).await;
    }
}
