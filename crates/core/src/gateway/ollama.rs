use crate::config::Settings;
use crate::gateway::{GatewayError, ModelDescriptor, ModelGateway};
use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct OllamaGateway {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

impl OllamaGateway {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        // No request timeout: a generation can take minutes on CPU-only
        // hosts, and callers wait for the full response.
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build gateway http client")?;

        Ok(Self {
            http,
            base_url: settings.gateway_base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch_model_list(&self, path: &str) -> Option<Vec<ModelDescriptor>> {
        let res = match self.http.get(self.url(path)).send().await {
            Ok(res) => res,
            Err(err) => {
                tracing::debug!(path, error = %err, "model listing request failed");
                return None;
            }
        };

        if !res.status().is_success() {
            tracing::debug!(path, status = %res.status(), "model listing returned non-success");
            return None;
        }

        let body = res.json::<Value>().await.ok()?;
        models_from_body(&body)
    }
}

#[async_trait::async_trait]
impl ModelGateway for OllamaGateway {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<Value, GatewayError> {
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let res = self
            .http
            .post(self.url("/api/generate"))
            .json(&req)
            .send()
            .await
            .map_err(GatewayError::Network)?;

        let status = res.status();
        let text = res.text().await.map_err(GatewayError::Network)?;
        if !status.is_success() {
            return Err(GatewayError::Upstream { status, body: text });
        }

        serde_json::from_str::<Value>(&text).map_err(|_| GatewayError::Decode { body: text })
    }

    async fn list_models(&self) -> Option<Vec<ModelDescriptor>> {
        // /api/tags is the documented listing endpoint; /api/models is kept
        // as a fallback for older gateway builds. Failures are swallowed:
        // this feeds a liveness probe, not a correctness check.
        if let Some(models) = self.fetch_model_list("/api/tags").await {
            return Some(models);
        }
        self.fetch_model_list("/api/models").await
    }
}

// A body qualifies as a model list only if it carries a `models` array.
// Entries without a name are skipped rather than failing the whole list.
fn models_from_body(body: &Value) -> Option<Vec<ModelDescriptor>> {
    let entries = body.get("models")?.as_array()?;
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            continue;
        };
        out.push(ModelDescriptor {
            name: name.to_string(),
            size: entry.get("size").and_then(Value::as_u64),
        });
    }
    Some(out)
}
