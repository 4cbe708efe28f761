pub mod api;
pub mod app;
pub mod audit;
pub mod auth;
pub mod catalog;
pub mod common;
pub mod config;
pub mod database;
pub mod deployment;
pub mod dispatch;
pub mod entity;
pub mod logger;
pub mod matching;
pub mod migrate;
pub mod params;
pub mod serde;
pub mod server;
pub mod updates;
