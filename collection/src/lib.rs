//! # Collection+JSON Envelope
//!
//! Data model for the hypermedia envelope exchanged with the loan review
//! service over `application/vnd.collection+json`.
//!
//! One wire shape carries four meanings:
//! - a list of items (reads returning zero or more resources)
//! - a single item (reads by id, and the result of every write)
//! - an error (`collection.error`, on non-2xx responses)
//! - a write template (`{"template": {"data": [...]}}`, request bodies only)
//!
//! Binary payloads (`application/pdf`) never travel inside an envelope.
//!
//! Only the subset of the format the service emits is modelled.

mod datum;
mod envelope;
mod item;

pub use datum::{Datum, DatumValue, Template, TemplateWrapper};
pub use envelope::{Collection, CollectionWrapper, MEDIA_TYPE};
pub use item::{Error, FILE_REL, Item, Link};

use serde::{Deserialize, Deserializer};

/// Deserializes `null` (or a missing field, together with `#[serde(default)]`)
/// as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
