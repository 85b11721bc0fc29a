use std::{io, str::Utf8Error};

use quick_xml::events::attributes::AttrError;

/// Everything that can go wrong while talking to the Overpass API, decoding one
/// of its responses or navigating a decoded result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field is missing or its value could not be parsed.
    #[error("format error: {0}")]
    Format(String),

    /// An element was handed to the decoder of a different element type.
    #[error("Type expected '{expected}' but '{}' provided", provided_type(.provided))]
    WrongType {
        expected: String,
        provided: Option<String>,
    },

    /// The requested element is not part of the result and could not be resolved.
    #[error("Data incomplete try to improve the query to resolve the missing data: {0}")]
    DataIncomplete(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Remark starting with `runtime error:`.
    #[error("{}", remark_message(.0))]
    RuntimeError(Option<String>),

    /// Remark starting with `runtime remark:`.
    #[error("{}", remark_message(.0))]
    RuntimeRemark(Option<String>),

    /// Remark we are unable to classify.
    #[error("{}", remark_message(.0))]
    UnknownRemark(Option<String>),

    /// The server rejected the query, usually because of a syntax error.
    #[error("{}", join_messages(.msgs))]
    BadRequest { query: String, msgs: Vec<String> },

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Server load too high")]
    GatewayTimeout,

    #[error("{}", content_type_message(.0))]
    UnknownContentType(Option<String>),

    #[error("Unknown/Unhandled status code: {0}")]
    UnknownHttpStatusCode(u16),

    #[error("Unable get any result from the Overpass API server after {retry_count} retries.")]
    MaxRetriesReached {
        retry_count: u32,
        errors: Vec<Error>,
    },

    #[error(transparent)]
    Http(#[from] ureq::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    XmlAttribute(#[from] AttrError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Utf8(#[from] Utf8Error),
}

fn remark_message(msg: &Option<String>) -> &str {
    msg.as_deref().unwrap_or("No error message provided")
}

fn provided_type(provided: &Option<String>) -> &str {
    provided.as_deref().unwrap_or("None")
}

fn join_messages(msgs: &[String]) -> String {
    msgs.join("\n")
}

fn content_type_message(content_type: &Option<String>) -> String {
    match content_type {
        Some(content_type) => format!("Unknown content type: {content_type}"),
        None => "No content type returned".to_string(),
    }
}

impl Error {
    pub fn is_data_incomplete(&self) -> bool {
        matches!(self, Error::DataIncomplete(_))
    }

    /// True for the three error kinds raised from a server remark.
    pub fn is_remark(&self) -> bool {
        matches!(
            self,
            Error::RuntimeError(_) | Error::RuntimeRemark(_) | Error::UnknownRemark(_)
        )
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
