pub mod load;
pub mod mapping;
pub mod source;
