//! Accepted HTTP response.

use crate::error::Result;
use crate::http::HttpResponse;
use crate::resource::Resource;

/// A response whose status matched what the request's verb expects.
///
/// Only `RestRequest::execute` creates these. The body is parsed lazily by
/// `resource`.
#[derive(Debug, Clone)]
pub struct RestResponse {
    response: HttpResponse,
}

impl RestResponse {
    pub(crate) fn new(response: HttpResponse) -> Self {
        Self { response }
    }

    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// Parses the body as JSON. An empty body yields `Ok(None)`.
    pub fn resource(&self) -> Result<Option<Resource>> {
        if self.response.body.is_empty() {
            return Ok(None);
        }
        let value: serde_json::Value = serde_json::from_slice(&self.response.body)?;
        Ok(Some(Resource::from(value)))
    }

    pub fn body(&self) -> &[u8] {
        &self.response.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.response.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.response.header(name)
    }

    pub fn into_http(self) -> HttpResponse {
        self.response
    }
}
