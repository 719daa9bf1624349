//! Ticket-to-review resolution

pub mod pattern;
pub mod resolver;
pub mod source;
