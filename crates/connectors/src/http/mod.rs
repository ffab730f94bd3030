pub mod client;
pub mod error;
pub mod page;
pub mod transport;
