//! API route handlers

pub mod broadcasts;
pub mod health;
pub mod history;
