use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Silicon or Soul.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::public::get_state,
        crate::routes::public::get_players,
        crate::routes::sse::public_stream,
        crate::routes::sse::admin_stream,
        crate::routes::admin::pause_game,
        crate::routes::admin::skip_round,
        crate::routes::admin::quit_game,
        crate::routes::admin::cast_vote,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::GameSnapshot,
            crate::dto::common::PlayerSnapshot,
            crate::dto::common::TrackSnapshot,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::public::PlayersResponse,
            crate::dto::admin::ActionResponse,
            crate::dto::admin::VoteRequest,
            crate::dto::ws::ControllerInbound,
            crate::dto::ws::ControllerOutbound,
            crate::dto::ws::ControllerCommand,
            crate::dto::ws::VoteChoice,
            crate::dto::sse::AdminHandshake,
            crate::dto::sse::MusicEvent,
            crate::dto::sse::MusicAction,
            crate::dto::sse::CueEvent,
            crate::dto::sse::VoteLockedEvent,
            crate::dto::sse::RoundRevealedEvent,
            crate::dto::sse::ControllerPresenceEvent,
            crate::services::audio_service::Cue,
            crate::state::game::Category,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Read-only match state"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "admin", description = "Host controls"),
        (name = "controllers", description = "WebSocket operations for vote controllers"),
    )
)]
pub struct ApiDoc;
