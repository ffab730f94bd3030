pub mod dataset;
pub mod raw;
