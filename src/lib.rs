pub mod analyzers;
pub mod bucket;
pub mod config;
pub mod construct;
pub mod error;
pub mod ingest;
pub mod normalize;
pub mod output;
pub mod record;
