pub mod auth;
pub mod chat;
pub mod garden;
pub mod health;
pub mod mood;
pub mod progress;
pub mod questions;
