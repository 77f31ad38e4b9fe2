pub mod auth;
pub mod cli;
pub mod collection;
pub mod config;
pub mod controller;
pub mod database;
pub mod drag;
pub mod error;
pub mod services;
pub mod types;
