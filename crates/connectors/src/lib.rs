pub mod error;
pub mod file;
pub mod http;
pub mod sql;
