pub mod schema;
pub mod writer;
