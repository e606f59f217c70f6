use crate::datum::{Datum, DatumValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Link relation marking an artifact produced by an asynchronous generation
/// job. Only links with this relation are pollable.
pub const FILE_REL: &str = "file";

/// A typed reference: `{"rel": "file", "href": "https://..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub rel: String,
    #[serde(default)]
    pub href: String
}

impl Link {
    #[must_use]
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into()
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.rel == FILE_REL
    }
}

/// One addressable resource (a loan review, a document, an image job).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub href: String,

    #[serde(
        default,
        deserialize_with = "crate::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub data: Vec<Datum>,

    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub links: Vec<Link>
}

impl Item {
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_datum(mut self, datum: Datum) -> Self {
        self.data.push(datum);
        self
    }

    #[must_use]
    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// First datum with the given name.
    #[must_use]
    pub fn datum(&self, name: &str) -> Option<&Datum> {
        self.data.iter().find(|datum| datum.name == name)
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&DatumValue> {
        self.datum(name).and_then(|datum| datum.value.as_ref())
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.datum(name).and_then(Datum::text)
    }

    pub fn links_with_rel<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |link| link.rel == rel)
    }

    pub fn file_links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(|link| link.is_file())
    }
}

/// Service-level error record: `{"title": ..., "code": ..., "message": ...}`.
///
/// `code` is either an HTTP-status-like value (`"404"`) or a domain status
/// token such as `"created"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String
}

impl Error {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>
    ) -> Self {
        Self {
            title: title.into(),
            code: code.into(),
            message: message.into()
        }
    }

    #[must_use]
    pub fn has_code(&self, code: &str) -> bool {
        self.code == code
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.title, self.code, self.message)
    }
}
