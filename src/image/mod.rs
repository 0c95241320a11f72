//! Image format support detection
//!
//! Probes whether the host's image decoder can decode WebP by decoding a
//! fixed 1x1 sample.

pub mod decoder;
pub mod mock;
pub mod probe;

pub use decoder::ImageCrateDecoder;
pub use mock::MockImageDecoder;
pub use probe::{probe_webp_support, supports_sample, supports_webp, WEBP_SAMPLE};

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageDecoder: Send + Sync {
    /// Fully decode `data` and report `(width, height)`.
    async fn decode_dimensions(&self, data: &[u8]) -> Result<(u32, u32)>;
}
