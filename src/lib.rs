pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod notifier;
pub mod repository;
pub mod services;
pub mod state;
