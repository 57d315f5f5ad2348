pub mod error;
pub mod ollama;
pub mod reply;

pub use error::GatewayError;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[async_trait::async_trait]
pub trait ModelGateway: Send + Sync {
    fn name(&self) -> &'static str;

    /// Single non-streaming generation call. Blocks until the upstream
    /// delivers the full response envelope; no retries, no partial delivery.
    async fn generate(&self, prompt: &str) -> Result<serde_json::Value, GatewayError>;

    /// Best-effort model listing. `None` means the gateway could not be
    /// reached or did not return a recognizable model list; callers treat
    /// that as "no models known" rather than an error.
    async fn list_models(&self) -> Option<Vec<ModelDescriptor>>;
}
