use anyhow::Context;
use serde::Deserialize;

const UNREACHABLE_MESSAGE: &str = "Unable to contact server. Try again.";

/// HTTP client for the farsight proxy. Errors are pre-rendered into
/// user-facing strings so the session can surface them as messages.
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    reply: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub gateway_reachable: bool,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ModelEntry {
    pub name: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        // No timeout here either; the proxy itself waits indefinitely on the
        // gateway.
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build proxy http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn chat(&self, message: &str) -> Result<String, String> {
        let res = self
            .http
            .post(self.url("/chat"))
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await
            .map_err(|_| UNREACHABLE_MESSAGE.to_string())?;
        Self::reply_from(res).await
    }

    pub async fn image(&self, image: Vec<u8>, message: Option<&str>) -> Result<String, String> {
        let part = reqwest::multipart::Part::bytes(image).file_name("attachment");
        let mut form = reqwest::multipart::Form::new().part("image", part);
        if let Some(message) = message {
            form = form.text("message", message.to_string());
        }

        let res = self
            .http
            .post(self.url("/image"))
            .multipart(form)
            .send()
            .await
            .map_err(|_| UNREACHABLE_MESSAGE.to_string())?;
        Self::reply_from(res).await
    }

    pub async fn health(&self) -> Option<HealthReport> {
        let res = self.http.get(self.url("/health")).send().await.ok()?;
        res.json().await.ok()
    }

    async fn reply_from(res: reqwest::Response) -> Result<String, String> {
        let status = res.status();
        if !status.is_success() {
            let error = res.json::<ErrorBody>().await.ok().and_then(|b| b.error);
            return Err(error.unwrap_or_else(|| format!("Server error: {}", status.as_u16())));
        }

        let reply = res.json::<ReplyBody>().await.ok().and_then(|b| b.reply);
        Ok(reply.unwrap_or_else(|| "No response".to_string()))
    }
}
