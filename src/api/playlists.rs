use crate::error::{AppError, Result};
use crate::services::{GenerationProgress, PlaylistGenerator};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::{stream::Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{convert::Infallible, sync::Arc};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

pub struct AppState {
    pub generator: Arc<PlaylistGenerator>,
    pub default_playlist_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct GeneratePlaylistRequest {
    pub prompt: String,
    pub target_size: Option<usize>,
    pub avoid_explicit: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct GeneratePlaylistResponse {
    pub track_ids: Vec<Uuid>,
    pub title: String,
    pub description: String,
    pub strategy: String,
}

pub fn playlist_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/playlists/generate", post(generate_playlist))
        .route("/playlists/generate/stream", post(generate_playlist_sse))
        .route("/health", get(health))
}

async fn generate_playlist(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GeneratePlaylistRequest>,
) -> Result<Json<GeneratePlaylistResponse>> {
    let target_size = request.target_size.unwrap_or(state.default_playlist_size);
    if target_size == 0 || target_size > 500 {
        return Err(AppError::Validation(
            "target_size must be between 1 and 500".to_string(),
        ));
    }

    let result = state
        .generator
        .generate(&request.prompt, target_size, request.avoid_explicit)
        .await?;

    Ok(Json(GeneratePlaylistResponse {
        track_ids: result.track_ids,
        title: result.title,
        description: result.description,
        strategy: result.strategy,
    }))
}

/// SSE endpoint for the direct-generation path with step-by-step progress
/// events.
async fn generate_playlist_sse(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GeneratePlaylistRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let target_size = request.target_size.unwrap_or(state.default_playlist_size);
    if target_size == 0 || target_size > 500 {
        return Err(AppError::Validation(
            "target_size must be between 1 and 500".to_string(),
        ));
    }

    let generator = state.generator.clone();
    let prompt = request.prompt.clone();

    let (progress_tx, progress_rx) = mpsc::channel::<GenerationProgress>(32);

    tokio::spawn(async move {
        match generator
            .generate_streaming(&prompt, target_size, progress_tx.clone())
            .await
        {
            Ok(playlist) => {
                let _ = progress_tx
                    .send(GenerationProgress::Done {
                        track_ids: playlist.track_ids,
                        title: playlist.title,
                        description: playlist.description,
                        strategy: playlist.strategy,
                    })
                    .await;
            }
            Err(e) => {
                let _ = progress_tx
                    .send(GenerationProgress::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        }
    });

    let stream = ReceiverStream::new(progress_rx).map(|progress| {
        let data = serde_json::to_string(&progress).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
