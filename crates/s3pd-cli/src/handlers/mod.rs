//! Command handlers.

pub mod download;
