pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod feed;
pub mod global;
pub mod history;
pub mod playback;
pub mod recording;
pub mod store;
