//! Server remarks: diagnostics the Overpass API embeds in an otherwise
//! successful response.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::decode::XmlElement;
use crate::errors::{Error, Result};

static XML_REMARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<remark>(?P<msg>[^<>]*)</remark>").expect("valid remark regex"));

/// Map a remark message onto the matching error kind.
pub fn classify_remark(msg: &str) -> Error {
    let msg = msg.trim();
    if msg.starts_with("runtime error:") {
        Error::RuntimeError(Some(msg.to_string()))
    } else if msg.starts_with("runtime remark:") {
        Error::RuntimeRemark(Some(msg.to_string()))
    } else {
        Error::UnknownRemark(Some(msg.to_string()))
    }
}

/// Fail if the document carries a top-level `remark`.
pub fn check_json(data: &Value) -> Result<()> {
    match data.get("remark") {
        None => Ok(()),
        Some(Value::String(msg)) => Err(classify_remark(msg)),
        Some(other) => Err(classify_remark(&other.to_string())),
    }
}

pub fn check_xml_text(text: &str) -> Result<()> {
    match XML_REMARK.captures(text) {
        Some(captures) => Err(classify_remark(&captures["msg"])),
        None => Ok(()),
    }
}

pub fn check_xml_tree(root: &XmlElement) -> Result<()> {
    match root.children.iter().find(|child| child.is("remark")) {
        Some(remark) => Err(classify_remark(&remark.text)),
        None => Ok(()),
    }
}
