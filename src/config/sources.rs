//! Configuration sources, lowest precedence first

pub mod cache_file;
pub mod environment;
pub mod global_file;
