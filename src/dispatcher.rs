use anyhow::{Context, Result};
use async_trait::async_trait;
use hyper::ext::ReasonPhrase;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};

use crate::routes;

/// Identifies the demo client to the control endpoint
pub const CLIENT_USER_AGENT: &str = "insecure-flippy-demo/6.6.6";

/// Where the outcome of a command is shown
///
/// Mirrors what a browser page offers: a full reload, or a blocking alert.
#[async_trait]
pub trait Page: Send {
    /// Re-render the page, discarding any local state
    async fn reload(&mut self);

    /// Show a message the user has to acknowledge
    fn alert(&mut self, message: &str);
}

/// What happened after the server answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reloaded,
    Alerted { status: StatusCode, message: String },
}

/// Request built for a single command, used once and thrown away
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

impl CommandRequest {
    /// The command is substituted into the path as-is, without validation
    pub fn new(command: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        Self {
            method: Method::POST,
            path: format!("{}{}", routes::CONTROL_PREFIX, command),
            headers,
        }
    }
}

/// Reason phrase the server sent on the status line
///
/// hyper only records the phrase when it differs from the canonical one, so
/// the canonical reason fills in otherwise.
pub fn status_text(response: &Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Text shown to the user when a command is not answered with 201
pub fn alert_message(status: StatusCode, status_text: &str) -> String {
    format!("Got {} {}", status.as_u16(), status_text)
        .trim_end()
        .to_string()
}

/// Sends control commands and reacts to the response status
///
/// Only `201 Created` counts as success. Nothing is retried, deduplicated or
/// timed out; concurrent calls are independent of each other.
#[derive(Clone)]
pub struct CommandDispatcher {
    client: Client,
    base_url: String,
}

impl CommandDispatcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `command` to the control endpoint, then reload `page` on 201 or
    /// alert it otherwise
    ///
    /// # Errors
    /// Returns an error when no response arrives at all. The page is neither
    /// reloaded nor alerted in that case.
    pub async fn send_command(&self, command: &str, page: &mut dyn Page) -> Result<Outcome> {
        let request = CommandRequest::new(command);
        let url = format!("{}{}", self.base_url, request.path);

        tracing::info!("POST {}", url);

        let response = self
            .client
            .request(request.method, &url)
            .headers(request.headers)
            .send()
            .await
            .inspect_err(|e| tracing::error!("Command {} was not delivered: {}", command, e))
            .with_context(|| format!("Failed to send command {} to {}", command, url))?;

        let status = response.status();
        if status == StatusCode::CREATED {
            tracing::debug!("Command {} accepted, reloading", command);
            page.reload().await;
            return Ok(Outcome::Reloaded);
        }

        let message = alert_message(status, &status_text(&response));
        tracing::warn!("Command {} rejected: {}", command, message);
        page.alert(&message);

        Ok(Outcome::Alerted { status, message })
    }
}
