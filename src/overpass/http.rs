use std::sync::LazyLock;

use regex::bytes::Regex;

use super::Overpass;
use crate::errors::Result;

static ERROR_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>(?P<msg><strong\s.*?)</p>").expect("valid message regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*?>").expect("valid tag regex"));

/// Status, media type and body of one server answer.
pub(super) struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Overpass {
    /// POST `query` to the configured endpoint. Any status code is a response here.
    pub(super) fn post(&self, query: &str) -> Result<RawResponse> {
        let mut response = self.agent.post(&self.config.url).send(query)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()?;
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Messages of a 400 error page, with markup stripped.
pub(super) fn extract_error_messages(body: &[u8]) -> Vec<String> {
    ERROR_MESSAGE
        .captures_iter(body)
        .filter_map(|captures| captures.name("msg"))
        .map(|msg| {
            let msg = TAG.replace_all(msg.as_bytes(), &b""[..]);
            match std::str::from_utf8(&msg) {
                Ok(text) => text.to_string(),
                Err(_) => format!("{:?}", msg),
            }
        })
        .collect()
}
