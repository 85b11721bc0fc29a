//! Decoders turning Overpass responses into a [`ResultSet`].

pub mod json;
pub mod xml;
pub mod xml_stream;
pub mod xml_tree;

use std::rc::Rc;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::data::ResultSet;
use crate::errors::{Error, Result};
use crate::overpass::Query;

pub use self::xml::XmlElement;

/// How raw XML text gets decoded.
///
/// The streaming decoder fails on any element name it does not know, the tree
/// decoder ignores them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XmlStrategy {
    #[default]
    Stream,
    Tree,
}

pub fn decode_from_json_document(data: &Value) -> Result<ResultSet> {
    json::decode_document(data, None)
}

/// Decode XML text, using the streaming decoder unless `strategy` says otherwise.
pub fn decode_from_xml_text(text: &str, strategy: Option<XmlStrategy>) -> Result<ResultSet> {
    decode_xml_text(text, strategy, None)
}

pub fn decode_from_xml_tree(root: &XmlElement) -> Result<ResultSet> {
    xml_tree::decode_tree(root, None)
}

pub(crate) fn decode_xml_text(
    text: &str,
    strategy: Option<XmlStrategy>,
    api: Option<Rc<dyn Query>>,
) -> Result<ResultSet> {
    match strategy.unwrap_or_default() {
        XmlStrategy::Stream => xml_stream::decode_text(text, api),
        XmlStrategy::Tree => xml_tree::decode_tree(&XmlElement::parse(text)?, api),
    }
}

pub(crate) fn new_result(api: Option<Rc<dyn Query>>) -> ResultSet {
    match api {
        Some(api) => ResultSet::with_api(api),
        None => ResultSet::new(),
    }
}

/// Parse decimal text without going through binary floating point.
pub(crate) fn parse_decimal(text: &str, field: &str) -> Result<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| Error::format(format!("invalid decimal '{text}' for '{field}'")))
}

pub(crate) fn parse_id(text: &str, field: &str) -> Result<i64> {
    text.trim()
        .parse()
        .map_err(|_| Error::format(format!("invalid integer '{text}' for '{field}'")))
}
