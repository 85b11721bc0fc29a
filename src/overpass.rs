//! Client for the Overpass API and the parse entry points that attach it to a
//! decoded result.

use std::rc::Rc;
use std::str;
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;
use ureq::Agent;

pub use crate::config::OverpassConfig;
use crate::data::ResultSet;
use crate::decode::{self, json, xml_tree, XmlElement, XmlStrategy};
use crate::errors::{Error, Result};

mod http;
pub mod remark;

pub use self::remark::classify_remark;

/// Anything able to answer an Overpass QL query with a decoded result.
///
/// Results hold on to one of these to fetch elements they are missing.
pub trait Query {
    fn query(&self, query: &str) -> Result<ResultSet>;
}

#[derive(Clone)]
pub struct Overpass {
    agent: Agent,
    config: OverpassConfig,
}

impl Default for Overpass {
    fn default() -> Self {
        Overpass::build(OverpassConfig::default())
    }
}

impl Overpass {
    pub fn new(config: OverpassConfig) -> Result<Self> {
        config.validate()?;
        Ok(Overpass::build(config))
    }

    /// Client for the endpoint at `url` with every other setting left at its default.
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        Overpass::new(OverpassConfig {
            url: url.into(),
            ..OverpassConfig::default()
        })
    }

    fn build(config: OverpassConfig) -> Self {
        // 0 disables the timeout
        let timeout =
            (config.timeout_secs > 0.0).then(|| Duration::from_secs_f64(config.timeout_secs));
        let agent: Agent = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build()
            .into();
        Overpass { agent, config }
    }

    pub fn config(&self) -> &OverpassConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn handle(&self) -> Rc<dyn Query> {
        Rc::new(self.clone())
    }

    /// Decode a JSON response body.
    pub fn parse_json(&self, text: &str) -> Result<ResultSet> {
        let data: Value = serde_json::from_str(text)?;
        self.parse_json_document(&data)
    }

    pub fn parse_json_document(&self, data: &Value) -> Result<ResultSet> {
        remark::check_json(data)?;
        json::decode_document(data, Some(self.handle()))
    }

    /// Decode an XML response body, with the configured strategy unless one is given.
    pub fn parse_xml(&self, text: &str, strategy: Option<XmlStrategy>) -> Result<ResultSet> {
        remark::check_xml_text(text)?;
        let strategy = strategy.unwrap_or(self.config.xml_parser);
        decode::decode_xml_text(text, Some(strategy), Some(self.handle()))
    }

    pub fn parse_xml_tree(&self, root: &XmlElement) -> Result<ResultSet> {
        remark::check_xml_tree(root)?;
        xml_tree::decode_tree(root, Some(self.handle()))
    }

    /// Decode a raw body according to its media type.
    pub fn parse_response(&self, body: &[u8], content_type: Option<&str>) -> Result<ResultSet> {
        let text = str::from_utf8(body)?;
        match content_type.map(media_type) {
            Some(media) if media.eq_ignore_ascii_case("application/json") => self.parse_json(text),
            Some(media) if media.eq_ignore_ascii_case("application/osm3s+xml") => {
                self.parse_xml(text, None)
            }
            _ => Err(Error::UnknownContentType(content_type.map(str::to_string))),
        }
    }

    /// One exchange with the server, mapped onto a result or an error.
    fn attempt(&self, query: &str) -> Result<ResultSet> {
        let response = self.post(query)?;
        match response.status {
            200 => self.parse_response(&response.body, response.content_type.as_deref()),
            400 => Err(Error::BadRequest {
                query: query.to_string(),
                msgs: http::extract_error_messages(&response.body),
            }),
            429 => Err(Error::TooManyRequests),
            504 => Err(Error::GatewayTimeout),
            status => Err(Error::UnknownHttpStatusCode(status)),
        }
    }
}

impl Query for Overpass {
    /// Send `query` and decode the answer, retrying up to `max_retry_count` times
    /// after unexpected status codes or content types.
    fn query(&self, query: &str) -> Result<ResultSet> {
        let max_retry_count = self.config.max_retry_count;
        let do_retry = max_retry_count > 0;
        let mut errors = Vec::new();

        for attempt in 0..=max_retry_count {
            if attempt > 0 {
                std::thread::sleep(Duration::from_secs_f64(self.config.retry_timeout_secs));
            }
            debug!(url = self.config.url.as_str(), attempt = attempt; "Sending Overpass query");
            match self.attempt(query) {
                Ok(result) => return Ok(result),
                Err(err) if is_retryable(&err) => {
                    if !do_retry {
                        return Err(err);
                    }
                    let reason = err.to_string();
                    warn!(attempt = attempt, reason = reason.as_str(); "Overpass query failed");
                    errors.push(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(Error::MaxRetriesReached {
            retry_count: max_retry_count + 1,
            errors,
        })
    }
}

fn is_retryable(err: &Error) -> bool {
    matches!(
        err,
        Error::BadRequest { .. }
            | Error::TooManyRequests
            | Error::GatewayTimeout
            | Error::UnknownContentType(_)
            | Error::UnknownHttpStatusCode(_)
    )
}

/// `application/json; charset=utf-8` -> `application/json`
fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}
