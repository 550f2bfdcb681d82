//! The HTTP call itself.
//!
//! `RestRequest` never talks to the network directly; it hands an
//! `HttpRequest` to a `Transport` and classifies whatever comes back.
//! `UreqTransport` is the default, blocking implementation.

use std::time::Duration;

use ureq::http;
use url::Url;
use uuid::Uuid;

use crate::error::TransportError;
use crate::http::{
    FilePart, HttpRequest, HttpResponse, Payload, RequestBody, HEADER_CONTENT_TYPE,
    HEADER_USER_AGENT,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Performs one HTTP exchange.
///
/// Implementations must return every status code as data; deciding whether a
/// status is acceptable is the caller's job.
pub trait Transport: Send + Sync {
    fn perform(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a ureq agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: Option<String>,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>, user_agent: Option<String>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent, user_agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl Transport for UreqTransport {
    fn perform(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = url_with_query(&request.url, &request.query)?;

        let mut builder = http::Request::builder()
            .method(request.verb.as_str())
            .uri(url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.header(HEADER_USER_AGENT, user_agent.as_str());
        }

        let encoded = encode_body(&request.body);
        let mut response = match encoded {
            None => self.agent.run(builder.body(())?)?,
            Some((content_type, bytes)) => {
                if let Some(content_type) = content_type {
                    if request.header(HEADER_CONTENT_TYPE).is_none() {
                        builder = builder.header(HEADER_CONTENT_TYPE, content_type);
                    }
                }
                self.agent.run(builder.body(bytes)?)?
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Appends `query` to `target`, form-encoding each pair.
pub(crate) fn url_with_query(
    target: &str,
    query: &[(String, String)],
) -> Result<Url, TransportError> {
    let mut url = Url::parse(target).map_err(|e| TransportError::Other(e.to_string()))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

/// Serializes a body. Returns `None` for an empty body, otherwise the content
/// type the transport should supply (if any) and the bytes.
fn encode_body(body: &RequestBody) -> Option<(Option<String>, Vec<u8>)> {
    match body {
        RequestBody::Empty => None,
        RequestBody::Data(Payload::Bytes(bytes)) => Some((None, bytes.clone())),
        RequestBody::Data(Payload::Text(text)) => Some((None, text.clone().into_bytes())),
        RequestBody::Data(Payload::Form(fields)) => {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields)
                .finish();
            Some((Some(FORM_CONTENT_TYPE.to_string()), encoded.into_bytes()))
        }
        RequestBody::Multipart(files) => {
            let boundary = Uuid::new_v4().simple().to_string();
            let content_type = format!("multipart/form-data; boundary={boundary}");
            Some((Some(content_type), encode_multipart(&boundary, files)))
        }
    }
}

pub(crate) fn encode_multipart(boundary: &str, files: &[FilePart]) -> Vec<u8> {
    let mut out = Vec::new();
    for file in files {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_disposition(&file.field),
                escape_disposition(&file.file_name)
            )
            .as_bytes(),
        );
        let content_type = file
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        out.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        out.extend_from_slice(&file.data);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    out
}

/// Percent-encodes `"`, CR and LF the way browsers encode form-data names,
/// so a name can never close its quoted string or start a new header line.
fn escape_disposition(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            c => out.push(c),
        }
    }
    out
}
