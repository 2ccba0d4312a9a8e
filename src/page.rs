use async_trait::async_trait;
use reqwest::Client;

use crate::dispatcher::Page;
use crate::routes;

/// Page rendered in a terminal: a reload re-fetches the app view and prints it
pub struct TerminalPage {
    client: Client,
    base_url: String,
}

impl TerminalPage {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self) -> reqwest::Result<String> {
        self.client
            .get(format!("{}{}", self.base_url, routes::APP))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl Page for TerminalPage {
    async fn reload(&mut self) {
        match self.fetch().await {
            Ok(body) => println!("{}", body),
            Err(e) => tracing::warn!("Reload failed: {}", e),
        }
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}
