//! Parley Backend Library
//!
//! User registration, login and session tokens over SQLite.
//! The binary in main.rs only loads configuration and serves `app::router`.

pub mod app;
pub mod auth;
pub mod config;
pub mod middleware;
