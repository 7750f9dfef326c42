//! Ingestion pipeline.
//!
//! - `expand`: product → `(color, weight)` variants
//! - `dedup`: natural-key lookup before each write
//! - `image`: download, transcode and upload color images
//! - `writer`: one catalog row per new variant
//! - `orchestrator`: sequences the above per product

pub mod dedup;
pub mod expand;
pub mod image;
pub mod orchestrator;
pub mod writer;

pub use dedup::DedupGuard;
pub use expand::expand;
pub use self::image::{ImagePipeline, ImageProcessor, image_key, transcode};
pub use orchestrator::{Pipeline, RunOptions};
pub use writer::{PersistenceWriter, build_row};
