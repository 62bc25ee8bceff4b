//! A collection of formats that can be used to convert from structured events
//! to byte frames.

mod json;

pub use json::JsonSerializer;
