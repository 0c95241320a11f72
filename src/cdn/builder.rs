use super::{Membership, MembershipPolicy, PrefixMembership};
use crate::models::{Alphabet, Config, Edits, EncodeOptions, ImageRequest, WEBP_EDIT_KEY};
use crate::sanitize::{sanitize, unsafe_chars};
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};
use url::Url;

/// Host suffix of the backing object store; bucket URLs are
/// `https://{bucket}.{STORAGE_HOST}`.
pub const STORAGE_HOST: &str = "s3.amazonaws.com";

/// Builds image-processing CDN URLs for references that belong to the
/// configured CDN or bucket.
///
/// Configuration is fixed once built. The `with_*` methods consume the
/// builder, so the derived bucket URL always matches the bucket name.
pub struct CdnUrlBuilder {
    base: String,
    bucket: String,
    bucket_url: String,
    membership: Box<dyn MembershipPolicy>,
    warnings: bool,
    alphabet: Alphabet,
}

impl CdnUrlBuilder {
    pub fn new(base: impl Into<String>, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        Self {
            base: base.into(),
            bucket_url: bucket_url_for(&bucket),
            bucket,
            membership: Box::new(PrefixMembership),
            warnings: true,
            alphabet: Alphabet::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cdn_base_url.clone(), config.cdn_bucket.clone())
            .with_warnings(config.warnings)
            .with_alphabet(config.alphabet)
    }

    /// Replace the default membership policy.
    pub fn with_membership<P>(mut self, policy: P) -> Self
    where
        P: MembershipPolicy + 'static,
    {
        self.membership = Box::new(policy);
        self
    }

    pub fn with_warnings(mut self, enabled: bool) -> Self {
        self.warnings = enabled;
        self
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn bucket_url(&self) -> &str {
        &self.bucket_url
    }

    /// Run the membership policy, with `base` and `bucket_url` defaulting to
    /// this builder's own values.
    pub fn membership(
        &self,
        reference: &str,
        base: Option<&str>,
        bucket_url: Option<&str>,
    ) -> Membership {
        self.membership.check(
            reference,
            base.unwrap_or(&self.base),
            bucket_url.unwrap_or(&self.bucket_url),
        )
    }

    pub fn is_cdn_reference(&self, reference: &str) -> bool {
        self.membership(reference, None, None).is_member()
    }

    /// Encode `reference` with `edits`, or return it unchanged when it is not
    /// a CDN reference or cannot be encoded.
    pub fn encode_url(&self, reference: &str, edits: Edits) -> String {
        self.encode_url_with(reference, edits, &EncodeOptions::default())
    }

    pub fn encode_url_with(
        &self,
        reference: &str,
        edits: Edits,
        options: &EncodeOptions,
    ) -> String {
        match self.try_encode_url(reference, edits, options) {
            Ok(url) => url,
            Err(Error::NonCdnReference(_)) => reference.to_string(),
            Err(e) => {
                debug!("Passing {} through unencoded: {}", reference, e);
                reference.to_string()
            }
        }
    }

    /// Fallible form of [`encode_url_with`](Self::encode_url_with).
    pub fn try_encode_url(
        &self,
        reference: &str,
        edits: Edits,
        options: &EncodeOptions,
    ) -> Result<String> {
        let membership = self.membership(reference, None, None);
        let edits = strip_disabled_webp(edits);
        let path = candidate_path(reference)?;

        if !membership.is_member() {
            return Err(Error::NonCdnReference(reference.to_string()));
        }

        let bucket = self.resolve_bucket(options, &membership);
        let key = decode_key(&path)?;

        if self.warnings && sanitize(&key) != key {
            warn!(
                "Object key {:?} contains characters the image service may not handle: {:?}",
                key,
                unsafe_chars(&key)
            );
        }

        let request = ImageRequest::new(bucket.to_string(), key, edits);
        let encoded = request.encode(self.alphabet)?;
        let base = self.base.strip_suffix('/').unwrap_or(&self.base);

        Ok(format!("{}/{}", base, encoded))
    }

    /// Per-call option, then the bucket named by the membership policy, then
    /// the configured bucket.
    fn resolve_bucket<'a>(
        &'a self,
        options: &'a EncodeOptions,
        membership: &'a Membership,
    ) -> &'a str {
        if let Some(bucket) = options.bucket.as_deref() {
            return bucket;
        }
        if let Some(bucket) = membership.bucket_override() {
            return bucket;
        }
        &self.bucket
    }
}

impl fmt::Debug for CdnUrlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdnUrlBuilder")
            .field("base", &self.base)
            .field("bucket", &self.bucket)
            .field("bucket_url", &self.bucket_url)
            .field("warnings", &self.warnings)
            .field("alphabet", &self.alphabet)
            .finish_non_exhaustive()
    }
}

fn bucket_url_for(bucket: &str) -> String {
    format!("https://{}.{}", bucket, STORAGE_HOST)
}

// The service turns WebP conversion on whenever the key is present, so a
// falsy value has to be removed rather than forwarded.
fn strip_disabled_webp(mut edits: Edits) -> Edits {
    if edits.get(WEBP_EDIT_KEY).is_some_and(is_falsy) {
        edits.remove(WEBP_EDIT_KEY);
    }
    edits
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Still-encoded path of an absolute or network-path URL, or the whole
/// reference when it is a bare object key.
fn candidate_path(reference: &str) -> Result<String> {
    let url = if super::is_absolute_url(reference) {
        Url::parse(reference)?
    } else if super::is_network_path(reference) {
        Url::parse(&format!("https:{}", reference))?
    } else {
        return Ok(reference.to_string());
    };
    Ok(url.path().to_string())
}

/// Strip one leading `/` and percent-decode. A `%` not followed by two hex
/// digits is rejected, as is a decoded byte sequence that is not UTF-8.
fn decode_key(path: &str) -> Result<String> {
    let path = path.strip_prefix('/').unwrap_or(path);
    if let Some(pos) = malformed_escape(path) {
        return Err(Error::EncodingFailure(format!(
            "Malformed percent-escape at byte {} in {:?}",
            pos, path
        )));
    }
    urlencoding::decode(path)
        .map(|key| key.into_owned())
        .map_err(|e| {
            Error::EncodingFailure(format!("Invalid percent-encoding in {:?}: {}", path, e))
        })
}

fn malformed_escape(path: &str) -> Option<usize> {
    let bytes = path.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        let well_formed = b != b'%'
            || (bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit));
        (!well_formed).then_some(i)
    })
}
