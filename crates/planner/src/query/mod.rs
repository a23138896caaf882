pub mod dialect;
pub mod encoder;
pub mod renderer;
pub mod schema;

pub use renderer::insert::{BatchBuilder, EncodingPolicy, RenderedBatch, SkippedRecord};
