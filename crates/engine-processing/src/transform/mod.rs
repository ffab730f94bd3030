pub mod coerce;
pub mod enrich;
pub mod normalizer;
pub mod pipeline;
pub mod sheets;
