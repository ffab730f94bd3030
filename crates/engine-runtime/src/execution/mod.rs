pub mod executor;
pub mod report;
pub mod scheduler;
pub mod tables;
pub mod workers;
