use crate::fixtures::{TEST_API_KEY, TEST_KEY_ID};
use integration::Signer;
use wiremock::{Match, Request};

/// Matches only requests whose `Authorization` header is the signature of
/// the request's own method, `Content-Type`, `Date` and path.
pub struct SignatureMatcher {
    signer: Signer
}

impl SignatureMatcher {
    pub fn new(api_key: &str, key_id: u32) -> Self {
        Self {
            signer: Signer::new(api_key, key_id).unwrap()
        }
    }
}

impl Default for SignatureMatcher {
    fn default() -> Self {
        Self::new(TEST_API_KEY, TEST_KEY_ID)
    }
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|value| value.to_str().ok())
}

impl Match for SignatureMatcher {
    fn matches(&self, request: &Request) -> bool {
        let (Some(authorization), Some(date), Some(content_type)) = (
            header(request, "authorization"),
            header(request, "date"),
            header(request, "content-type")
        ) else {
            return false;
        };

        self.signer.verify(
            request.method.as_str(),
            content_type,
            date,
            request.url.path(),
            authorization
        )
    }
}
