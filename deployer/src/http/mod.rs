//! HTTP clients for the remote services

pub mod client;
pub mod completions;
pub mod pulls;
