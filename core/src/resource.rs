//! Parsed response body with HAL-style hyperlinks.
//!
//! # Design
//! A `Resource` wraps whatever JSON the server returned. Links live under
//! `_links` and embedded resources under `_embedded`, as in HAL:
//!
//! ```json
//! {
//!   "id": 1,
//!   "_links": { "self": { "href": "/items/1" }, "tags": [{ "href": "/tags/a" }] },
//!   "_embedded": { "owner": { "name": "alice" } }
//! }
//! ```
//!
//! `follow` turns a link into a fresh `RestRequest` so navigation continues
//! with the same fluent API.

use std::ops::Index;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::RestClient;
use crate::error::Result;
use crate::request::RestRequest;

const LINKS: &str = "_links";
const EMBEDDED: &str = "_embedded";

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    value: Value,
}

impl From<Value> for Resource {
    fn from(value: Value) -> Self {
        Self { value }
    }
}

impl Resource {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Deserializes the whole body into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.value)?)
    }

    /// All `(rel, href)` pairs. A relation holding an array contributes one
    /// pair per element.
    pub fn links(&self) -> Vec<(&str, &str)> {
        let Some(links) = self.value.get(LINKS).and_then(Value::as_object) else {
            return Vec::new();
        };
        links
            .iter()
            .flat_map(|(rel, link)| {
                link_objects(link)
                    .filter_map(href)
                    .map(move |target| (rel.as_str(), target))
            })
            .collect()
    }

    /// Href of the first link for `rel`.
    pub fn link(&self, rel: &str) -> Option<&str> {
        let link = self.value.get(LINKS)?.get(rel)?;
        link_objects(link).find_map(href)
    }

    /// Embedded resources for `rel`; a single object yields one resource.
    pub fn embedded(&self, rel: &str) -> Vec<Resource> {
        match self.value.get(EMBEDDED).and_then(|e| e.get(rel)) {
            Some(Value::Array(items)) => items.iter().cloned().map(Resource::from).collect(),
            Some(item @ Value::Object(_)) => vec![Resource::from(item.clone())],
            _ => Vec::new(),
        }
    }

    /// A new request targeting the `rel` link, or `None` when absent.
    pub fn follow(&self, rel: &str, client: &RestClient) -> Option<RestRequest> {
        self.link(rel).map(|target| client.request(target))
    }
}

impl Index<&str> for Resource {
    type Output = Value;

    /// Missing keys index to `Value::Null`, as with `serde_json::Value`.
    fn index(&self, key: &str) -> &Value {
        &self.value[key]
    }
}

fn link_objects(link: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match link {
        Value::Array(items) => Box::new(items.iter()),
        other => Box::new(std::iter::once(other)),
    }
}

fn href(link: &Value) -> Option<&str> {
    link.get("href").and_then(Value::as_str)
}
