use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{Request, Response, StatusCode};
use axum::routing::{get, post};
use opentelemetry::KeyValue;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{MakeSpan, OnResponse, TraceLayer},
};
use tracing::Span;

mod analysis;
mod config;
mod error;
mod formatter;
mod llm;
mod pipeline;
mod routes;
mod telemetry;
mod workspace;

use config::Config;
use telemetry::{init_telemetry, metrics::HTTP_REQUEST_DURATION, metrics::HTTP_REQUESTS_TOTAL};
use workspace::WorkspaceClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm_client: Arc<llm::LlmClient>,
    pub workspace: Arc<WorkspaceClient>,
}

#[derive(Clone)]
struct HttpMakeSpan;

impl<B> MakeSpan<B> for HttpMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method().as_str();
        let path = request.uri().path();

        tracing::info_span!(
            "HTTP request",
            otel.name = %format!("{} {}", method, path),
            http.method = %method,
            http.route = %path,
            http.target = %request.uri(),
            http.scheme = "http",
            http.flavor = ?request.version(),
            http.user_agent = request.headers()
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
            http.response.status_code = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
        )
    }
}

#[derive(Clone)]
struct HttpOnResponse;

impl<B> OnResponse<B> for HttpOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status().as_u16();

        span.record("http.response.status_code", status as i64);

        if status >= 500 {
            span.record("otel.status_code", "ERROR");
        } else {
            span.record("otel.status_code", "OK");
        }

        let latency_ms = latency.as_secs_f64() * 1000.0;
        let status_class = format!("{}xx", status / 100);

        HTTP_REQUESTS_TOTAL.add(
            1,
            &[
                KeyValue::new("http.status_code", status.to_string()),
                KeyValue::new("http.status_class", status_class.clone()),
            ],
        );

        HTTP_REQUEST_DURATION.record(
            latency_ms,
            &[
                KeyValue::new("http.status_code", status.to_string()),
                KeyValue::new("http.status_class", status_class),
            ],
        );

        tracing::info!(
            http.response.status_code = status,
            latency_ms = latency_ms,
            "finished processing request"
        );
    }
}

fn build_llm_client(config: &Config) -> anyhow::Result<llm::LlmClient> {
    let primary: Arc<dyn llm::Provider> = match config.llm_provider.as_str() {
        "anthropic" => {
            let key = config
                .anthropic_api_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("ANTHROPIC_API_KEY must be set"))?;
            Arc::new(llm::anthropic::AnthropicProvider::new(key))
        }
        "google" => {
            let key = config
                .google_api_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("GOOGLE_API_KEY must be set"))?;
            Arc::new(llm::openai::OpenAIProvider::new_google(key))
        }
        "ollama" => Arc::new(llm::openai::OpenAIProvider::new_ollama(
            &config.ollama_base_url,
        )),
        _ => {
            let key = config
                .openai_api_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY must be set"))?;
            Arc::new(llm::openai::OpenAIProvider::new(key))
        }
    };

    let fallback: Option<Arc<dyn llm::Provider>> = match config.fallback_provider.as_str() {
        "anthropic" => config
            .anthropic_api_key
            .as_deref()
            .map(|key| Arc::new(llm::anthropic::AnthropicProvider::new(key)) as _),
        "openai" => config
            .openai_api_key
            .as_deref()
            .map(|key| Arc::new(llm::openai::OpenAIProvider::new(key)) as _),
        "google" => config
            .google_api_key
            .as_deref()
            .map(|key| Arc::new(llm::openai::OpenAIProvider::new_google(key)) as _),
        "ollama" => Some(Arc::new(llm::openai::OpenAIProvider::new_ollama(
            &config.ollama_base_url,
        )) as _),
        _ => None,
    };

    Ok(llm::LlmClient {
        primary,
        fallback,
        primary_provider: config.llm_provider.clone(),
        fallback_provider: config.fallback_provider.clone(),
        fallback_model: config.fallback_model.clone(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    let telemetry_guard = init_telemetry(&config)?;

    tracing::info!(
        port = config.port,
        environment = %config.environment,
        "Starting intake-analyst"
    );

    let llm_client = Arc::new(build_llm_client(&config)?);

    tracing::info!(
        primary_provider = %config.llm_provider,
        fallback_provider = %config.fallback_provider,
        "LLM client initialized"
    );

    let workspace = Arc::new(WorkspaceClient::new(
        &config.workspace_token,
        &config.workspace_base_url,
        &config.workspace_api_version,
    ));

    let state = AppState {
        config: config.clone(),
        llm_client,
        workspace,
    };

    let app = Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/analyses", post(routes::analyses::create_analysis))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(HttpMakeSpan)
                .on_response(HttpOnResponse),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(300),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    telemetry_guard.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
