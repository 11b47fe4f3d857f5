use crate::core::welcome::{CardRequest, ImageCompositor, WelcomeError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Talks to the image compositing service over HTTP.
///
/// `POST {base_url}/render` with a JSON body; the response body is the PNG.
pub struct HttpImageCompositor {
    client: Client,
    base_url: String,
}

impl HttpImageCompositor {
    pub fn new(base_url: impl Into<String>) -> Result<Self, WelcomeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WelcomeError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn render_url(&self) -> String {
        format!("{}/render", self.base_url)
    }
}

#[async_trait]
impl ImageCompositor for HttpImageCompositor {
    async fn render(&self, request: &CardRequest) -> Result<Vec<u8>, WelcomeError> {
        let payload = json!({
            "user_id": request.user_id.to_string(),
            "display_name": request.display_name,
            "avatar_url": request.avatar_url,
            "template": request.template,
        });

        let response = self
            .client
            .post(self.render_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| WelcomeError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WelcomeError::Render(format!("{} - {}", status, text)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WelcomeError::Http(e.to_string()))?;

        if bytes.is_empty() {
            return Err(WelcomeError::Render("empty image".to_string()));
        }

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_url_tolerates_trailing_slash() {
        let compositor = HttpImageCompositor::new("http://localhost:8080/").unwrap();
        assert_eq!(compositor.render_url(), "http://localhost:8080/render");
    }
}
