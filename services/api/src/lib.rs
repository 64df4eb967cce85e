//! Video-sharing platform API
//!
//! Users, videos, comments, likes, playlists, subscriptions and tweets behind
//! a uniform JSON response envelope. The binary in `main.rs` wires the
//! configuration, store and media backends together; tests build the router
//! directly over the in-memory store.

pub mod config;
pub mod error;
pub mod extract;
pub mod jwt;
pub mod media;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
