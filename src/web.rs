use crate::{
    config::{Config, Overrides},
    errors::ScrapeError,
    forvo::{AudioSourceList, Forvo},
};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    forvo: Forvo,
    config: Arc<Config>,
}

pub fn router(forvo: Forvo, config: Arc<Config>) -> Router {
    let shared_state = Arc::new(SharedState { forvo, config });

    // path is ignored, every GET is an audio source lookup
    Router::new()
        .fallback(get(audio_sources))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => log::warn!("received Ctrl+C, shutting down"),
        _ = terminate => log::warn!("received SIGTERM, shutting down"),
    }
}

async fn start_app(forvo: Forvo, config: Arc<Config>) -> anyhow::Result<()> {
    let addr = format!("127.0.0.1:{}", config.port);
    let app = router(forvo, config);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");

    // a client hanging up mid-response only ends its own connection task
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn start_daemon(forvo: Forvo, config: Arc<Config>) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async { start_app(forvo, config).await })
}

#[derive(Debug)]
struct HttpError(ScrapeError);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        log::error!("{self:?}");

        let status = if self.0.is_upstream() {
            axum::http::StatusCode::BAD_GATEWAY
        } else {
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<ScrapeError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LookupParams {
    pub term: Option<String>,

    /// Older dictionary clients send `expression` instead of `term`
    pub expression: Option<String>,

    pub reading: Option<String>,

    /// Overrides the configured site language for this request only
    pub language: Option<String>,

    /// Any non-empty value returns every stage separately
    pub debug: Option<String>,
}

impl LookupParams {
    /// Repeated keys keep their first non-empty value, unknown keys are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut params = Self::default();

        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }

            let slot = match key.as_str() {
                "term" => &mut params.term,
                "expression" => &mut params.expression,
                "reading" => &mut params.reading,
                "language" => &mut params.language,
                "debug" => &mut params.debug,
                _ => continue,
            };
            slot.get_or_insert(value);
        }

        params
    }

    pub fn term(&self) -> String {
        match self.term.as_deref() {
            Some(term) if !term.is_empty() => term.to_string(),
            _ => self.expression.clone().unwrap_or_default(),
        }
    }

    pub fn reading(&self) -> String {
        self.reading.clone().unwrap_or_default()
    }

    pub fn is_debug(&self) -> bool {
        self.debug.as_deref().is_some_and(|d| !d.is_empty())
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            language: self.language.clone(),
            ..Default::default()
        }
    }
}

fn json_response<T: Serialize>(body: &T) -> Result<Response, HttpError> {
    let payload = serde_json::to_vec(body).map_err(anyhow::Error::from)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_LENGTH, payload.len().to_string()),
        ],
        payload,
    )
        .into_response())
}

async fn audio_sources(
    State(state): State<Arc<SharedState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, HttpError> {
    let params = LookupParams::from_pairs(pairs);
    log::debug!("params: {params:?}");

    let term = params.term();
    let reading = params.reading();
    let config = state.config.with_overrides(&params.overrides());
    let forvo = state.forvo.clone();

    tokio::task::block_in_place(move || {
        if params.is_debug() {
            let report = forvo.debug_report(&term, &reading, &config)?;
            return json_response(&report);
        }

        let sources = forvo.resolve(&term, &reading, &config)?;
        log::info!("{term:?}/{reading:?}: {} audio sources", sources.len());

        json_response(&AudioSourceList::from(sources))
    })
}
