pub mod config;
pub mod error;
pub mod file_handler;
pub mod file_map;
pub mod merger;
pub mod record;
pub mod report;
pub mod table_print;

pub use error::*;
