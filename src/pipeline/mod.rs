pub mod features;
pub mod geo;
pub mod ingest;
pub mod quality;
