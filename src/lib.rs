pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod feeds;
pub mod ingest;
pub mod status;
