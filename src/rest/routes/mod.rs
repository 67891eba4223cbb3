//! Route handlers for the REST API.

pub mod health;
pub mod images;
pub mod session;
pub mod story;
pub mod styles;
