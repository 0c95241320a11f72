//! Data models and structures
//!
//! Defines the image request encoded into CDN URLs, per-call options, and the
//! environment configuration used to build a [`crate::CdnUrlBuilder`].

use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Edit operations understood by the image-processing service, keyed by name.
///
/// Values are opaque to this crate and passed through as-is.
pub type Edits = serde_json::Map<String, serde_json::Value>;

/// The service enables WebP conversion when this key is present at all,
/// whatever its value.
pub const WEBP_EDIT_KEY: &str = "webp";

/// Base64 alphabet used for the encoded path segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alphabet {
    #[default]
    Standard,
    UrlSafe,
}

impl Alphabet {
    fn engine(self) -> &'static base64::engine::GeneralPurpose {
        match self {
            Alphabet::Standard => &base64::engine::general_purpose::STANDARD,
            Alphabet::UrlSafe => &base64::engine::general_purpose::URL_SAFE,
        }
    }
}

impl std::str::FromStr for Alphabet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Alphabet::Standard),
            "url-safe" | "url_safe" | "urlsafe" => Ok(Alphabet::UrlSafe),
            other => Err(Error::Config(format!("Unknown base64 alphabet '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub bucket: String,
    pub key: String,
    pub edits: Edits,
}

impl ImageRequest {
    pub fn new(bucket: String, key: String, edits: Edits) -> Self {
        Self { bucket, key, edits }
    }

    /// Serialize to JSON and base64-encode the UTF-8 bytes.
    pub fn encode(&self, alphabet: Alphabet) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(alphabet.engine().encode(json.as_bytes()))
    }

    /// Decode a request from an encoded path segment or a full CDN URL.
    ///
    /// Both alphabets are accepted. For URLs whose base carries a path
    /// prefix, the longest decodable suffix of the path wins.
    pub fn from_encoded(input: &str) -> Result<Self> {
        let input = input.trim();
        let path = match url::Url::parse(input) {
            Ok(url) => url.path().trim_start_matches('/').to_string(),
            Err(_) => input.to_string(),
        };

        let starts = std::iter::once(0).chain(path.match_indices('/').map(|(i, _)| i + 1));
        let mut last_err = Error::EncodingFailure("Empty image request segment".to_string());
        for start in starts {
            match Self::decode_segment(&path[start..]) {
                Ok(request) => return Ok(request),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    fn decode_segment(segment: &str) -> Result<Self> {
        let bytes = match base64::engine::general_purpose::STANDARD.decode(segment) {
            Ok(bytes) => bytes,
            Err(_) => base64::engine::general_purpose::URL_SAFE.decode(segment)?,
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Per-call options for [`crate::CdnUrlBuilder::encode_url_with`].
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Bucket for this call only; wins over every other bucket source.
    pub bucket: Option<String>,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub cdn_base_url: String,
    pub cdn_bucket: String,
    pub warnings: bool,
    pub alphabet: Alphabet,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::load_dotenv()?;
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load `.env` into the process environment. A missing file is fine.
    pub fn load_dotenv() -> Result<()> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(()),
            Err(e) if e.not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve configuration through `lookup` instead of the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            cdn_base_url: lookup("CDN_BASE_URL")
                .ok_or_else(|| Error::Config("CDN_BASE_URL not set".to_string()))?,
            cdn_bucket: lookup("CDN_BUCKET")
                .ok_or_else(|| Error::Config("CDN_BUCKET not set".to_string()))?,
            warnings: lookup("CDN_WARNINGS")
                .map(|value| parse_flag(&value))
                .unwrap_or(true),
            alphabet: lookup("CDN_BASE64_ALPHABET")
                .map(|value| value.parse::<Alphabet>())
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_image_request_field_order() {
        let request = ImageRequest::new("b".to_string(), "k.jpg".to_string(), Edits::new());
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"bucket":"b","key":"k.jpg","edits":{}}"#);
    }

    #[test]
    fn test_from_encoded_accepts_full_url() {
        let mut edits = Edits::new();
        edits.insert("resize".to_string(), json!({"width": 10}));
        let request = ImageRequest::new("b".to_string(), "dir/k.jpg".to_string(), edits);

        let encoded = request.encode(Alphabet::Standard).unwrap();
        let url = format!("https://cdn.example.com/{}", encoded);

        assert_eq!(ImageRequest::from_encoded(&url).unwrap(), request);
        assert_eq!(ImageRequest::from_encoded(&encoded).unwrap(), request);
    }

    #[test]
    fn test_from_encoded_with_base_path_prefix() {
        let request = ImageRequest::new("b".to_string(), "k.jpg".to_string(), Edits::new());
        let encoded = request.encode(Alphabet::Standard).unwrap();
        let url = format!("https://cdn.example.com/images/v1/{}", encoded);

        assert_eq!(ImageRequest::from_encoded(&url).unwrap(), request);
    }

    #[test]
    fn test_from_encoded_rejects_garbage() {
        assert!(ImageRequest::from_encoded("https://cdn.example.com/not-a-request").is_err());
        assert!(ImageRequest::from_encoded("").is_err());
    }

    #[test]
    fn test_url_safe_alphabet_has_no_slash_or_plus() {
        let request = ImageRequest::new("??>".to_string(), "???".to_string(), Edits::new());
        let encoded = request.encode(Alphabet::UrlSafe).unwrap();

        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert_eq!(ImageRequest::from_encoded(&encoded).unwrap(), request);
    }

    #[test]
    fn test_alphabet_from_str() {
        assert_eq!("standard".parse::<Alphabet>().unwrap(), Alphabet::Standard);
        assert_eq!("URL-SAFE".parse::<Alphabet>().unwrap(), Alphabet::UrlSafe);
        assert!("hex".parse::<Alphabet>().is_err());
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("CDN_BASE_URL", "https://cdn.example.com"),
            ("CDN_BUCKET", "my-bucket"),
        ]))
        .unwrap();

        assert_eq!(config.cdn_base_url, "https://cdn.example.com");
        assert_eq!(config.cdn_bucket, "my-bucket");
        assert!(config.warnings);
        assert_eq!(config.alphabet, Alphabet::Standard);
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CDN_BASE_URL", "https://cdn.example.com"),
            ("CDN_BUCKET", "my-bucket"),
            ("CDN_WARNINGS", "Off"),
            ("CDN_BASE64_ALPHABET", "url-safe"),
        ]))
        .unwrap();

        assert!(!config.warnings);
        assert_eq!(config.alphabet, Alphabet::UrlSafe);
    }

    #[test]
    fn test_config_missing_bucket() {
        let err = Config::from_lookup(lookup_from(&[("CDN_BASE_URL", "https://cdn.example.com")]))
            .unwrap_err();
        assert!(err.to_string().contains("CDN_BUCKET"));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(" NO "));
    }
}
