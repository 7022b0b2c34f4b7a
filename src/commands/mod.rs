pub mod ask;
pub mod config;
