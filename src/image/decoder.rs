use super::ImageDecoder;
use crate::{Error, Result};
use async_trait::async_trait;

/// Decoder backed by the `image` crate; decoding runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    pub fn new() -> Self {
        Self
    }

    fn decode_sync(data: &[u8]) -> Result<(u32, u32)> {
        let img = image::load_from_memory(data)?;
        Ok((img.width(), img.height()))
    }
}

#[async_trait]
impl ImageDecoder for ImageCrateDecoder {
    async fn decode_dimensions(&self, data: &[u8]) -> Result<(u32, u32)> {
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || Self::decode_sync(&data))
            .await
            .map_err(|e| Error::Invariant(format!("Image decode task join error: {}", e)))?
    }
}
