#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("query parameter `n` is required and must be an integer")]
    InvalidCount,

    #[error(transparent)]
    Upstream(#[from] crate::stories::BestStoriesError),
}

#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, message) = match &self {
            ApiError::InvalidCount => (
                axum::http::StatusCode::BAD_REQUEST,
                "invalid_request",
                self.to_string(),
            ),
            ApiError::Upstream(e) => {
                tracing::error!(error =? e, "An error occurred while fetching best stories");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        axum::response::IntoResponse::into_response((
            status,
            axum::Json(ErrorResponse { error, message }),
        ))
    }
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct BestStoriesParams {
    n: Option<String>,
}

impl BestStoriesParams {
    /// Negative counts ask for nothing and are clamped to zero.
    fn count(&self) -> Result<usize, ApiError> {
        let n = self
            .n
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .ok_or(ApiError::InvalidCount)?;

        Ok(usize::try_from(n).unwrap_or(0))
    }
}

pub(crate) fn router(best_stories: crate::stories::BestStories) -> axum::Router {
    // The subscribers filter at INFO, the tower-http defaults are DEBUG.
    let trace_layer = tower_http::trace::TraceLayer::new_for_http()
        .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_response(tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO));

    axum::Router::new()
        .route(
            "/api/hackernews/beststories",
            axum::routing::get(get_best_stories),
        )
        .layer(trace_layer)
        .with_state(best_stories)
}

async fn get_best_stories(
    axum::extract::State(best_stories): axum::extract::State<crate::stories::BestStories>,
    axum::extract::Query(params): axum::extract::Query<BestStoriesParams>,
) -> Result<axum::Json<Vec<crate::stories::BestStory>>, ApiError> {
    let n = params.count()?;
    Ok(axum::Json(best_stories.get_best_stories(n).await?))
}
