//! Fiabe - illustrated story wizard
//!
//! Synthesizes multi-scene story outlines from a form and illustrates each
//! scene through a pluggable image provider. The library backs the `fiabe`
//! binary's CLI and REST server.

pub mod config;
pub mod images;
pub mod logging;
pub mod rest;
pub mod story;
pub mod styles;
pub mod wizard;
