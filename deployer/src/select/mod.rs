//! Target selection protocol

pub mod client;
pub mod oracle;
pub mod policy;
pub mod rules;
