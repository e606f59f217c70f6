use crate::datum::Template;
use crate::item::{Error, Item, Link};
use serde::{Deserialize, Serialize};

/// Media type of every envelope body, request or response.
pub const MEDIA_TYPE: &str = "application/vnd.collection+json";

/// Root object: `{"collection": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionWrapper {
    pub collection: Collection
}

impl CollectionWrapper {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    #[must_use]
    pub fn into_collection(self) -> Collection {
        self.collection
    }
}

/// The `collection` object. On a response exactly one of `error` and
/// `items` carries meaning; `template` only ever appears on writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,

    #[serde(
        default,
        deserialize_with = "crate::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub items: Vec<Item>,

    #[serde(
        default,
        deserialize_with = "crate::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub links: Vec<Link>
}

impl Collection {
    #[must_use]
    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_error(error: Error) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The item when exactly one was returned.
    #[must_use]
    pub fn single_item(&self) -> Option<&Item> {
        match self.items.as_slice() {
            [item] => Some(item),
            _ => None
        }
    }
}
