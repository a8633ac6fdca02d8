// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod http_launcher;
pub mod http_response;
pub mod ws_feed;
