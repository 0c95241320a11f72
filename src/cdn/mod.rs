//! CDN image URL construction
//!
//! Decides whether a file reference is served by the configured CDN or
//! bucket, and encodes edits for the serverless image-processing service
//! into the URL path.

pub mod builder;
pub mod mock;

pub use builder::{CdnUrlBuilder, STORAGE_HOST};
pub use mock::MockMembership;

/// Outcome of a membership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    NotMember,
    Member,
    /// Member, and this call should target the named bucket instead of the
    /// configured one.
    MemberWithBucketOverride(String),
}

impl Membership {
    pub fn is_member(&self) -> bool {
        !matches!(self, Membership::NotMember)
    }

    pub fn bucket_override(&self) -> Option<&str> {
        match self {
            Membership::MemberWithBucketOverride(bucket) => Some(bucket),
            _ => None,
        }
    }
}

impl From<bool> for Membership {
    fn from(member: bool) -> Self {
        if member {
            Membership::Member
        } else {
            Membership::NotMember
        }
    }
}

/// Strategy deciding whether `reference` belongs to the CDN at `base` or the
/// bucket at `bucket_url`.
pub trait MembershipPolicy: Send + Sync {
    fn check(&self, reference: &str, base: &str, bucket_url: &str) -> Membership;
}

impl<F> MembershipPolicy for F
where
    F: Fn(&str, &str, &str) -> Membership + Send + Sync,
{
    fn check(&self, reference: &str, base: &str, bucket_url: &str) -> Membership {
        self(reference, base, bucket_url)
    }
}

/// Default policy: non-empty bare object keys, and references under either
/// the CDN base or the bucket URL. Network-path references (`//host/...`)
/// name a host, so they are never treated as bare keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixMembership;

impl MembershipPolicy for PrefixMembership {
    fn check(&self, reference: &str, base: &str, bucket_url: &str) -> Membership {
        let member = !reference.is_empty()
            && (is_object_key(reference)
                || reference.starts_with(base)
                || reference.starts_with(bucket_url));
        member.into()
    }
}

/// True for relative references without an authority, i.e. neither
/// `scheme:...` nor `//host/...`.
pub fn is_object_key(reference: &str) -> bool {
    !is_absolute_url(reference) && !is_network_path(reference)
}

/// True for protocol-relative references such as `//host/a.jpg`.
pub fn is_network_path(reference: &str) -> bool {
    reference.starts_with("//")
}

/// True when `reference` starts with an RFC 3986 scheme (`alpha *( alpha /
/// digit / "+" / "-" / "." ) ":"`).
pub fn is_absolute_url(reference: &str) -> bool {
    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}
