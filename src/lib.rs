pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod message;
pub mod query;
pub mod ui;
