//! A small HTTP service for creating, reading, updating and deleting items.

pub mod api;
pub mod app;
pub mod core;
pub mod infra;
