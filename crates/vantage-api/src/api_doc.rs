//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use vantage_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vantage Video Access Gateway",
        version = "0.1.0",
        description = "Turns camera clip requests into playable HLS URLs and relays rewritten playlists."
    ),
    paths(
        handlers::playback::playback,
        handlers::playlist::master_playlist,
        handlers::playlist::media_playlist,
    ),
    components(schemas(
        models::PlayableUrl,
        models::RequestPurpose,
        models::ResolutionSpec,
        error::ErrorResponse,
    )),
    tags(
        (name = "playback", description = "Playback URL issuance"),
        (name = "playlists", description = "HLS playlist relay")
    )
)]
pub struct ApiDoc;
