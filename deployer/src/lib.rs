//! deployerai library
//!
//! Picks which deployment target should receive a build, by consulting a
//! decision oracle under a fixed policy and validating its reply, and
//! resolves ticket identifiers to the single open pull request that
//! implements them.

pub mod app;
pub mod authn;
pub mod context;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod invoke;
pub mod logs;
pub mod models;
pub mod resolve;
pub mod select;
pub mod storage;
pub mod utils;
