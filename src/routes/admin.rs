use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::post,
};
use axum_valid::Valid;

use crate::{
    dto::admin::{ActionResponse, VoteRequest},
    error::AppError,
    services::admin_service,
    state::{SharedState, game::HostAction},
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Host controls, guarded by the admin token.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/game/pause", post(pause_game))
        .route("/admin/game/skip", post(skip_round))
        .route("/admin/game/quit", post(quit_game))
        .route("/admin/game/vote", post(cast_vote))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Toggle the pause.
#[utoipa::path(
    post,
    path = "/admin/game/pause",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Pause toggle queued", body = ActionResponse))
)]
pub async fn pause_game(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::host_action(&state, HostAction::Pause)?))
}

/// End the current round, or start a new match from the podium.
#[utoipa::path(
    post,
    path = "/admin/game/skip",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Skip queued", body = ActionResponse))
)]
pub async fn skip_round(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::host_action(&state, HostAction::Skip)?))
}

/// Stop the show and shut the server down.
#[utoipa::path(
    post,
    path = "/admin/game/quit",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Quit queued", body = ActionResponse))
)]
pub async fn quit_game(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::host_action(&state, HostAction::Quit)?))
}

/// Cast a vote on behalf of a player.
#[utoipa::path(
    post,
    path = "/admin/game/vote",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote queued", body = ActionResponse),
        (status = 400, description = "Malformed player seat"),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn cast_vote(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<VoteRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::cast_vote(&state, request)?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    match state.sse().admin_token() {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin SSE stream not initialised yet".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::FromRequest, http::StatusCode, response::IntoResponse};

    use super::*;

    fn vote_body(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/admin/game/vote")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn malformed_seat_is_rejected_before_the_handler() {
        let request = vote_body(r#"{"player":"SEAT_1","choice":"silicon"}"#);
        match Valid::<Json<VoteRequest>>::from_request(request, &()).await {
            Ok(_) => panic!("seat name should have been rejected"),
            Err(rejection) => {
                assert_eq!(rejection.into_response().status(), StatusCode::BAD_REQUEST)
            }
        }
    }

    #[tokio::test]
    async fn well_formed_vote_reaches_the_handler() {
        let request = vote_body(r#"{"player":"PLAYER_2","choice":"soul"}"#);
        let Ok(Valid(Json(vote))) = Valid::<Json<VoteRequest>>::from_request(request, &()).await
        else {
            panic!("vote should have been accepted");
        };
        assert_eq!(vote.player_index(), Some(1));
    }
}
