use super::ImageDecoder;
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

pub struct MockImageDecoder {
    decode_count: Arc<Mutex<usize>>,
    dimensions: Arc<Mutex<(u32, u32)>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageDecoder {
    pub fn new() -> Self {
        Self {
            decode_count: Arc::new(Mutex::new(0)),
            dimensions: Arc::new(Mutex::new((1, 1))),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_dimensions(self, width: u32, height: u32) -> Self {
        *self.dimensions.lock().unwrap() = (width, height);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_decode_count(&self) -> usize {
        *self.decode_count.lock().unwrap()
    }
}

impl Default for MockImageDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageDecoder for MockImageDecoder {
    async fn decode_dimensions(&self, _data: &[u8]) -> Result<(u32, u32)> {
        *self.decode_count.lock().unwrap() += 1;

        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::Image(image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }

        Ok(*self.dimensions.lock().unwrap())
    }
}
