//! CDN image URL helper
//!
//! Builds image URLs for a serverless image-processing CDN by encoding an
//! image request (bucket, object key, edits) as a base64 path segment, and
//! probes whether the local image decoder supports WebP.

pub mod cdn;
pub mod error;
pub mod image;
pub mod models;
pub mod sanitize;

pub use cdn::{CdnUrlBuilder, Membership, MembershipPolicy};
pub use error::{Error, Result};
pub use models::{Alphabet, Config, Edits, EncodeOptions, ImageRequest};
