//! Data models

pub mod review;
pub mod selection;
