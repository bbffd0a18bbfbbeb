//! Item handling, independent of HTTP.

pub mod item;
