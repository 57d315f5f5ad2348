use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use farsight_core::config::Settings;
use farsight_core::gateway::ollama::OllamaGateway;
use farsight_core::gateway::{reply, GatewayError, ModelDescriptor, ModelGateway};
use farsight_core::prompt;

const EMPTY_IMAGE_REPLY: &str = "No interpretation received.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env();
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let gateway = OllamaGateway::from_settings(&settings)?;
    let state = AppState {
        gateway: Arc::new(gateway),
    };

    let app = router(state, &settings)?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(
        %addr,
        gateway = %settings.gateway_base_url,
        model = %settings.model,
        "proxy listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState, settings: &Settings) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(settings.allowed_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/chat", post(chat))
        // Uploads are unbounded at this layer; whatever arrives is base64'd
        // and forwarded to the gateway as-is.
        .route("/image", post(image).layer(DefaultBodyLimit::disable()))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[derive(Clone)]
struct AppState {
    gateway: Arc<dyn ModelGateway>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(error: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: error.to_string(),
            details: None,
        }),
    )
}

fn gateway_fault(error: &'static str, err: GatewayError) -> ApiError {
    let err = anyhow::Error::new(err);
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "upstream gateway call failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: error.to_string(),
            details: Some(format!("{err:#}")),
        }),
    )
}

async fn chat(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<ChatResponse>, ApiError> {
    // Validation happens before any gateway traffic.
    let Some(message) = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
    else {
        return Err(bad_request("Missing message string"));
    };

    let prompt = prompt::chat_prompt(message);
    let envelope = state
        .gateway
        .generate(&prompt)
        .await
        .map_err(|e| gateway_fault("server_error", e))?;

    Ok(Json(ChatResponse {
        reply: reply::normalize_reply(&envelope),
    }))
}

async fn image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let mut image_bytes: Option<Vec<u8>> = None;
    let mut message: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("Malformed multipart body"))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| bad_request("Malformed multipart body"))?;
                image_bytes = Some(bytes.to_vec());
            }
            Some("message") => {
                message = field
                    .text()
                    .await
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    let Some(image_bytes) = image_bytes else {
        return Err(bad_request("No image uploaded"));
    };

    analyze_image(&state, &image_bytes, message.as_deref()).await
}

async fn analyze_image(
    state: &AppState,
    image_bytes: &[u8],
    message: Option<&str>,
) -> Result<Json<ChatResponse>, ApiError> {
    let encoded = BASE64.encode(image_bytes);
    let prompt = prompt::image_prompt(message, &encoded);

    let envelope = state
        .gateway
        .generate(&prompt)
        .await
        .map_err(|e| gateway_fault("image_error", e))?;

    let mut reply = reply::normalize_reply(&envelope);
    if reply.trim().is_empty() {
        reply = EMPTY_IMAGE_REPLY.to_string();
    }

    Ok(Json(ChatResponse { reply }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    ok: bool,
    gateway_reachable: bool,
    models: Vec<ModelDescriptor>,
}

// Liveness probe, not a correctness probe: an unreachable gateway still
// answers 200 with gatewayReachable=false.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let models = state.gateway.list_models().await;
    Json(HealthResponse {
        ok: true,
        gateway_reachable: models.is_some(),
        models: models.unwrap_or_default(),
    })
}
