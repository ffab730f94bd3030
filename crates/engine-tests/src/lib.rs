pub mod memory;
pub mod postgres;
pub mod transport;
pub mod utils;
