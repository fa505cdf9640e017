//! Notification transports
//!
//! A transport is resolved once, at config load, from the connection URL of
//! a notifier. The scheme selects the service:
//!
//! | URL                          | Transport                          |
//! |------------------------------|------------------------------------|
//! | `generic://host/path`        | HTTPS webhook                      |
//! | `generic+https://host/path`  | HTTPS webhook                      |
//! | `generic+http://host/path`   | plain HTTP webhook                 |
//! | `logger://`                  | message logged at info level       |

use crate::NotifyError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Content type of webhook messages unless overridden by the `content-type` query parameter
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers rendered messages to a notification service
#[async_trait]
pub trait Sender: Send + Sync {
    /// Short name of the service, for logging
    fn service(&self) -> &'static str;

    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// Posts messages as request body to an HTTP endpoint
#[derive(Debug, Clone)]
pub struct WebhookSender {
    client: Client,
    endpoint: Url,
    content_type: String,
}

impl WebhookSender {
    pub fn new(endpoint: Url, content_type: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            content_type: content_type.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

#[async_trait]
impl Sender for WebhookSender {
    fn service(&self) -> &'static str {
        "generic"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, self.content_type.as_str())
            .body(message.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Emits messages through the application log
#[derive(Debug, Clone, Default)]
pub struct LogSender;

#[async_trait]
impl Sender for LogSender {
    fn service(&self) -> &'static str {
        "logger"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        tracing::info!("{}", message);
        Ok(())
    }
}

/// Resolves the transport of a notifier from its connection URL
///
/// # Returns
///
/// * `Ok(Arc<dyn Sender>)` - The resolved transport
/// * `Err(String)` - Why the URL could not be resolved
pub fn locate_sender(url: &str) -> Result<Arc<dyn Sender>, String> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| "missing service scheme".to_string())?;

    match scheme.to_ascii_lowercase().as_str() {
        "logger" => Ok(Arc::new(LogSender)),
        "generic" | "generic+https" => Ok(Arc::new(webhook("https", rest)?)),
        "generic+http" => Ok(Arc::new(webhook("http", rest)?)),
        other => Err(format!("unknown service '{}'", other)),
    }
}

fn webhook(scheme: &str, rest: &str) -> Result<WebhookSender, String> {
    let mut endpoint =
        Url::parse(&format!("{}://{}", scheme, rest)).map_err(|e| e.to_string())?;

    let mut content_type = DEFAULT_CONTENT_TYPE.to_string();
    let mut remaining = Vec::new();
    for (key, value) in endpoint.query_pairs() {
        if key.eq_ignore_ascii_case("content-type") {
            content_type = value.into_owned();
        } else {
            remaining.push((key.into_owned(), value.into_owned()));
        }
    }

    if remaining.is_empty() {
        endpoint.set_query(None);
    } else {
        endpoint.query_pairs_mut().clear().extend_pairs(remaining);
    }

    WebhookSender::new(endpoint, content_type).map_err(|e| e.to_string())
}
