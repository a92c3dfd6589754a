//! HTTP route handlers (§4.8, §6).

pub mod conversation;
pub mod generate;
pub mod health;
pub mod stream;
