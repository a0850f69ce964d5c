//! Dashboard route handlers.
//!
//! The HTML page at `/` drives everything through form posts; the JSON API
//! under `/api` exposes the same operations. State is shared via
//! `Arc<DashboardState>`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::form::{Action, ActionForm};
use super::page::{self, PageView};
use crate::estimator;
use crate::store::SharedStore;
use crate::types::{Club, LeagueError, NewClub, Projection, StatusMessage};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub store: SharedStore,
}

impl DashboardState {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// What a form action produced, before the page is re-rendered.
#[derive(Debug, Default)]
struct Outcome {
    message: Option<StatusMessage>,
    projections: Option<Vec<Projection>>,
}

/// GET /
pub async fn get_page(State(state): State<AppState>) -> Html<String> {
    render_page(&state, Outcome::default()).await
}

/// POST /
pub async fn post_action(State(state): State<AppState>, Form(form): Form<ActionForm>) -> Html<String> {
    let outcome = match form.action() {
        Action::AddClub(club) => add_club(&state, club).await,
        Action::DeleteClub(id) => delete_club(&state, id).await,
        Action::CalculateProbability => calculate(&state).await,
        Action::None => {
            debug!(action = ?form.action, "Ignoring form post without a known action");
            Outcome::default()
        }
    };
    render_page(&state, outcome).await
}

async fn add_club(state: &AppState, club: NewClub) -> Outcome {
    let message = match state.store.add(club).await {
        Ok(_) => StatusMessage::success("Club added successfully"),
        Err(e) => {
            log_failure(&e, "add_club");
            StatusMessage::from(&e)
        }
    };
    Outcome {
        message: Some(message),
        projections: None,
    }
}

async fn delete_club(state: &AppState, id: i64) -> Outcome {
    if id <= 0 {
        debug!(id, "Ignoring delete of non-positive id");
        return Outcome::default();
    }
    // An unknown id is a no-op and still reported as deleted.
    let message = match state.store.remove(id).await {
        Ok(_) => StatusMessage::success("Club deleted successfully"),
        Err(e) => {
            log_failure(&e, "delete_club");
            StatusMessage::from(&e)
        }
    };
    Outcome {
        message: Some(message),
        projections: None,
    }
}

async fn calculate(state: &AppState) -> Outcome {
    let result = match state.store.list().await {
        Ok(clubs) => estimator::estimate(&clubs),
        Err(e) => Err(e),
    };
    match result {
        Ok(projections) => Outcome {
            message: Some(StatusMessage::success("Probabilities calculated successfully")),
            projections: Some(projections),
        },
        Err(e) => {
            log_failure(&e, "calculate_probability");
            Outcome {
                message: Some(StatusMessage::from(&e)),
                projections: None,
            }
        }
    }
}

async fn render_page(state: &AppState, outcome: Outcome) -> Html<String> {
    let mut message = outcome.message;
    let clubs = match state.store.list().await {
        Ok(clubs) => clubs,
        Err(e) => {
            error!(error = %e, "Failed to list clubs for page");
            message = Some(StatusMessage::from(&e));
            Vec::new()
        }
    };

    Html(page::render(&PageView {
        clubs: &clubs,
        projections: outcome.projections.as_deref(),
        message: message.as_ref(),
    }))
}

fn log_failure(err: &LeagueError, action: &str) {
    match err {
        LeagueError::Storage(_) => error!(action, error = %err, "Store operation failed"),
        _ => warn!(action, reason = %err, "Request rejected"),
    }
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// JSON error body with a status matching the error kind.
#[derive(Debug)]
pub struct ApiError(pub LeagueError);

impl From<LeagueError> for ApiError {
    fn from(err: LeagueError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LeagueError::DuplicateName(_) => StatusCode::CONFLICT,
            LeagueError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// GET /api/clubs
pub async fn list_clubs(State(state): State<AppState>) -> Result<Json<Vec<Club>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

/// POST /api/clubs
pub async fn create_club(
    State(state): State<AppState>,
    Json(club): Json<NewClub>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state.store.add(club).await.map_err(|e| {
        log_failure(&e, "create_club");
        e
    })?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// DELETE /api/clubs/:id
pub async fn remove_club(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let removed = state.store.remove(id).await?;
    Ok(Json(RemovedResponse { removed }))
}

/// GET /api/projections
pub async fn get_projections(State(state): State<AppState>) -> Result<Json<Vec<Projection>>, ApiError> {
    let clubs = state.store.list().await?;
    Ok(Json(estimator::estimate(&clubs)?))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, MockClubStore};

    fn memory_state() -> AppState {
        Arc::new(DashboardState::new(Arc::new(MemoryStore::new())))
    }

    fn form(action: &str) -> ActionForm {
        ActionForm {
            action: Some(action.to_string()),
            ..Default::default()
        }
    }

    fn add_form(name: &str, mp: &str, w: &str, l: &str, d: &str) -> ActionForm {
        ActionForm {
            action: Some("add_club".into()),
            name: Some(name.into()),
            matches_played: Some(mp.into()),
            wins: Some(w.into()),
            losses: Some(l.into()),
            draws: Some(d.into()),
            ..Default::default()
        }
    }

    fn storage_error() -> LeagueError {
        LeagueError::Storage(sqlx::Error::PoolClosed)
    }

    #[tokio::test]
    async fn test_add_club_success_message() {
        let state = memory_state();
        let Html(html) = post_action(State(state.clone()), Form(add_form("Arsenal", "10", "7", "1", "2"))).await;
        assert!(html.contains("message success\">Club added successfully"));
        assert!(html.contains("Arsenal"));
        assert_eq!(state.store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_club_validation_message() {
        let state = memory_state();
        let Html(html) = post_action(State(state.clone()), Form(add_form("Arsenal", "3", "2", "2", "0"))).await;
        assert!(html.contains("message error\">Wins + losses + draws (4) cannot exceed matches played (3)"));
        assert!(state.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_duplicate_message_escaped() {
        let state = memory_state();
        post_action(State(state.clone()), Form(add_form("O'Neill FC", "0", "0", "0", "0"))).await;
        let Html(html) = post_action(State(state), Form(add_form("o'neill fc", "0", "0", "0", "0"))).await;
        assert!(html.contains("Club name &#039;o&#039;neill fc&#039; already exists"));
    }

    #[tokio::test]
    async fn test_delete_non_positive_id_is_silent() {
        let state = memory_state();
        state.store.add(NewClub::new("Keep", 1, 1, 0, 0)).await.unwrap();
        let mut f = form("delete_club");
        f.id = Some("0".into());
        let Html(html) = post_action(State(state.clone()), Form(f)).await;
        assert!(!html.contains("class=\"message"));
        assert_eq!(state.store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_reports_success() {
        let state = memory_state();
        state.store.add(NewClub::new("Keep", 1, 1, 0, 0)).await.unwrap();
        let mut f = form("delete_club");
        f.id = Some("77".into());
        let Html(html) = post_action(State(state.clone()), Form(f)).await;
        assert!(html.contains("Club deleted successfully"));
        assert_eq!(state.store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_calculate_requires_two_clubs() {
        let state = memory_state();
        state.store.add(NewClub::new("Only", 5, 3, 1, 1)).await.unwrap();
        let Html(html) = post_action(State(state), Form(form("calculate_probability"))).await;
        assert!(html.contains("message error\">At least 2 clubs are required"));
        assert!(!html.contains("<th>Title Probability</th>"));
    }

    #[tokio::test]
    async fn test_calculate_renders_projections() {
        let state = memory_state();
        state.store.add(NewClub::new("A", 38, 32, 3, 3)).await.unwrap();
        state.store.add(NewClub::new("B", 20, 10, 5, 5)).await.unwrap();
        let Html(html) = post_action(State(state), Form(form("calculate_probability"))).await;
        assert!(html.contains("Probabilities calculated successfully"));
        assert!(html.contains("<span>61.49%</span>"));
        assert!(html.contains("Most likely champion: <strong>A</strong>"));
    }

    #[tokio::test]
    async fn test_unknown_action_renders_plain_page() {
        let state = memory_state();
        let Html(html) = post_action(State(state), Form(form("nope"))).await;
        assert!(!html.contains("class=\"message"));
        assert!(html.contains("No clubs yet"));
    }

    #[tokio::test]
    async fn test_storage_failure_on_page() {
        let mut mock = MockClubStore::new();
        mock.expect_list().returning(|| Err(storage_error()));
        let state = Arc::new(DashboardState::new(Arc::new(mock)));
        let Html(html) = get_page(State(state)).await;
        assert!(html.contains("message error\">Storage error"));
    }

    #[tokio::test]
    async fn test_storage_failure_on_add_is_reported() {
        let mut mock = MockClubStore::new();
        mock.expect_add().times(1).returning(|_| Err(storage_error()));
        mock.expect_list().returning(|| Ok(Vec::new()));
        let state = Arc::new(DashboardState::new(Arc::new(mock)));
        let Html(html) = post_action(State(state), Form(add_form("X", "1", "1", "0", "0"))).await;
        assert!(html.contains("message error\">Storage error"));
    }

    #[tokio::test]
    async fn test_api_error_status_codes() {
        let resp = ApiError(LeagueError::EmptyName).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = ApiError(LeagueError::DuplicateName("A".into())).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = ApiError(LeagueError::InsufficientData { required: 2, available: 0 }).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = ApiError(storage_error()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_get_projections_handler() {
        let state = memory_state();
        state.store.add(NewClub::new("A", 10, 5, 5, 0)).await.unwrap();
        state.store.add(NewClub::new("B", 10, 5, 5, 0)).await.unwrap();
        let Json(projections) = get_projections(State(state)).await.unwrap();
        assert_eq!(projections.len(), 2);
        assert!(projections.iter().all(|p| (p.champion_probability - 50.0).abs() < 1e-9));
    }
}
