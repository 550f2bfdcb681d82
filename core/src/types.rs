//! Value types supplied by callers: credentials and execution arguments.
//!
//! # Design
//! `Credentials` derives serde so it can sit inside a deserialized
//! `ClientConfig`. `Invocation` carries the three optional execution
//! arguments; files take precedence over the payload when both are present.

use serde::{Deserialize, Serialize};

use crate::http::{FilePart, Payload, RequestBody};

/// A user/password pair for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_string(),
            password: password.to_string(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Optional arguments of one execution: body data, multipart files and URL
/// query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub data: Option<Payload>,
    pub files: Option<Vec<FilePart>>,
    pub params: Option<Vec<(String, String)>>,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, data: impl Into<Payload>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.data = Some(Payload::Form(owned_pairs(fields)));
        self
    }

    pub fn file(mut self, file: FilePart) -> Self {
        self.files.get_or_insert_with(Vec::new).push(file);
        self
    }

    pub fn files(mut self, files: Vec<FilePart>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((key.to_string(), value.to_string()));
        self
    }

    pub fn params(mut self, params: &[(&str, &str)]) -> Self {
        self.params = Some(owned_pairs(params));
        self
    }

    /// Multipart mode: at least one file is attached.
    pub fn is_multipart(&self) -> bool {
        self.files.as_ref().is_some_and(|files| !files.is_empty())
    }

    /// The wire body: files if any, otherwise the payload, never both.
    pub(crate) fn body(&self) -> RequestBody {
        if self.is_multipart() {
            return RequestBody::Multipart(self.files.clone().unwrap_or_default());
        }
        match &self.data {
            Some(data) => RequestBody::Data(data.clone()),
            None => RequestBody::Empty,
        }
    }
}

fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
