use super::{Membership, MembershipPolicy};
use std::sync::{Arc, Mutex};

/// Membership policy returning a fixed result and recording every call as
/// `(reference, base, bucket_url)`.
#[derive(Clone)]
pub struct MockMembership {
    result: Arc<Mutex<Membership>>,
    calls: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl MockMembership {
    pub fn new() -> Self {
        Self {
            result: Arc::new(Mutex::new(Membership::Member)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_result(self, result: Membership) -> Self {
        *self.result.lock().unwrap() = result;
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockMembership {
    fn default() -> Self {
        Self::new()
    }
}

impl MembershipPolicy for MockMembership {
    fn check(&self, reference: &str, base: &str, bucket_url: &str) -> Membership {
        self.calls.lock().unwrap().push((
            reference.to_string(),
            base.to_string(),
            bucket_url.to_string(),
        ));
        self.result.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdn::CdnUrlBuilder;
    use crate::models::{Edits, EncodeOptions, ImageRequest};

    #[test]
    fn test_mock_records_calls() {
        let mock = MockMembership::new();
        let builder = CdnUrlBuilder::new("https://cdn.example.com", "my-bucket")
            .with_membership(mock.clone());

        builder.encode_url("https://anywhere.com/a.jpg", Edits::new());

        assert_eq!(mock.get_call_count(), 1);
        assert_eq!(
            mock.get_calls()[0],
            (
                "https://anywhere.com/a.jpg".to_string(),
                "https://cdn.example.com".to_string(),
                "https://my-bucket.s3.amazonaws.com".to_string(),
            )
        );
    }

    #[test]
    fn test_mock_not_member_short_circuits() {
        let mock = MockMembership::new().with_result(Membership::NotMember);
        let builder = CdnUrlBuilder::new("https://cdn.example.com", "my-bucket")
            .with_membership(mock.clone());

        let reference = "https://cdn.example.com/a.jpg";
        assert_eq!(builder.encode_url(reference, Edits::new()), reference);
        assert_eq!(mock.get_call_count(), 1);
    }

    #[test]
    fn test_mock_bucket_override() {
        let mock = MockMembership::new()
            .with_result(Membership::MemberWithBucketOverride("other".to_string()));
        let builder = CdnUrlBuilder::new("https://cdn.example.com", "my-bucket")
            .with_membership(mock);

        let url = builder.encode_url_with("a.jpg", Edits::new(), &EncodeOptions::default());
        let request = ImageRequest::from_encoded(&url).unwrap();
        assert_eq!(request.bucket, "other");
    }
}
