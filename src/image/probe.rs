use super::{ImageCrateDecoder, ImageDecoder};
use base64::Engine as _;
use tracing::debug;

/// A 1x1 lossy WebP image. Only exercises the basic VP8 path: no alpha, no
/// animation.
pub const WEBP_SAMPLE: &str = "UklGRiIAAABXRUJQVlA4IBYAAAAwAQCdASoBAAEADsD+JaQAA3AAAAAA";

/// Whether `decoder` decodes the embedded WebP sample to a 1 pixel wide
/// image. Never fails: a decode error means "unsupported".
pub async fn supports_webp(decoder: &dyn ImageDecoder) -> bool {
    let sample = match base64::engine::general_purpose::STANDARD.decode(WEBP_SAMPLE) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Embedded WebP sample is not valid base64: {}", e);
            return false;
        }
    };
    supports_sample(decoder, &sample).await
}

/// Whether `decoder` decodes `sample` (a 1x1 image) to a width of 1.
pub async fn supports_sample(decoder: &dyn ImageDecoder, sample: &[u8]) -> bool {
    match decoder.decode_dimensions(sample).await {
        Ok((width, _)) => width == 1,
        Err(e) => {
            debug!("Sample image failed to decode: {}", e);
            false
        }
    }
}

/// [`supports_webp`] against the `image` crate decoder.
pub async fn probe_webp_support() -> bool {
    supports_webp(&ImageCrateDecoder::new()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::MockImageDecoder;
    use image::ImageFormat;

    #[test]
    fn test_webp_sample_has_riff_header() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(WEBP_SAMPLE)
            .unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[tokio::test]
    async fn test_supported_when_width_is_one() {
        let decoder = MockImageDecoder::new();
        assert!(supports_webp(&decoder).await);
        assert_eq!(decoder.get_decode_count(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_when_width_differs() {
        let decoder = MockImageDecoder::new().with_dimensions(0, 0);
        assert!(!supports_webp(&decoder).await);
    }

    #[tokio::test]
    async fn test_unsupported_on_decode_error() {
        let decoder = MockImageDecoder::new().with_failure(true);
        assert!(!supports_webp(&decoder).await);
    }

    #[tokio::test]
    async fn test_embedded_sample_decodes() {
        assert!(probe_webp_support().await);
        assert!(supports_webp(&ImageCrateDecoder::new()).await);
    }

    #[tokio::test]
    async fn test_image_crate_decodes_generated_webp_sample() {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
        let mut sample = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut sample), ImageFormat::WebP)
            .unwrap();

        assert!(supports_sample(&ImageCrateDecoder::new(), &sample).await);
        assert!(!supports_sample(&ImageCrateDecoder::new(), b"RIFF").await);
    }
}
