pub mod playlists;

pub use playlists::{playlist_routes, AppState};
