//! HTTP API endpoints for room administration.
//!
//! Used by moderators and tooling to load questions and inspect rooms.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;
use crate::types::{QuestionId, QuestionInput, RoomId};

#[derive(Debug, Clone, Serialize)]
pub struct QuestionAdded {
    pub ok: bool,
    pub id: QuestionId,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub ok: bool,
    pub code: String,
    pub msg: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rooms/{room_id}", get(room_summary))
        .route("/api/rooms/{room_id}/questions", post(add_question))
        .route("/api/rooms/{room_id}/leaderboard", get(leaderboard))
}

/// Add a question to a room's pool, creating the room if needed.
///
/// POST /api/rooms/{room_id}/questions
pub async fn add_question(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(input): Json<QuestionInput>,
) -> Response {
    let room_id = RoomId::from(room_id);
    match state.add_question(&room_id, input).await {
        Ok(question) => Json(QuestionAdded {
            ok: true,
            id: question.id,
        })
        .into_response(),
        Err(e) => {
            tracing::warn!("Rejected question for room {}: {}", room_id, e);
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError {
                    ok: false,
                    code: e.code().to_string(),
                    msg: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/rooms/{room_id}
pub async fn room_summary(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Response {
    match state.room_summary(&RoomId::from(room_id)).await {
        Some(summary) => Json(summary).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /api/rooms/{room_id}/leaderboard
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Response {
    match state.leaderboard(&RoomId::from(room_id)).await {
        Some(entries) => Json(entries).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        routes().with_state(state)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_question(room: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/api/rooms/{}/questions", room))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_question_creates_room() {
        let state = Arc::new(AppState::new());

        let response = app(state.clone())
            .oneshot(post_question(
                "quiz",
                r#"{"text":"Capital of France?","choices":["Paris","Rome"],"correct_index":0}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert!(json["id"].as_str().is_some());

        let summary = state.room_summary(&RoomId::from("quiz")).await.unwrap();
        assert_eq!(summary.pool_size, 1);
    }

    #[tokio::test]
    async fn test_add_invalid_question() {
        let state = Arc::new(AppState::new());

        let response = app(state.clone())
            .oneshot(post_question(
                "quiz",
                r#"{"text":"Pick","choices":["only"],"correct_index":0}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "INVALID_QUESTION");

        let response = app(state)
            .oneshot(post_question(
                "quiz",
                r#"{"text":"Pick","choices":["a","b"],"correct_index":2}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        let state = Arc::new(AppState::new());

        let response = app(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/rooms/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/api/rooms/missing/leaderboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_summary_and_leaderboard() {
        let state = Arc::new(AppState::new());
        let room_id = RoomId::from("quiz");
        state.join(&room_id, "Alice".to_string(), false).await;

        let response = app(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/api/rooms/quiz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["participant_count"], 1);
        assert_eq!(json["game_started"], false);

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/api/rooms/quiz/leaderboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json[0]["name"], "Alice");
        assert_eq!(json[0]["score"], 0);
    }
}
