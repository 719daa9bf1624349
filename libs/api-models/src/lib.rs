//! Wire models shared by the deployerai clients

pub mod models;
