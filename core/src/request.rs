//! Fluent request builder.
//!
//! # Design
//! `RestRequest` is configured by consuming chained calls and executed once.
//! Execution builds the headers, dispatches exactly one call through the
//! `Transport`, and checks the status against what the verb expects:
//!
//! | Verb   | Accepted status |
//! |--------|-----------------|
//! | GET    | 200             |
//! | POST   | 200, 201        |
//! | DELETE | 204             |
//! | others | any             |
//!
//! Credentials are only checked at execution time; configuring a request
//! never fails except for an unknown verb name passed to `call`.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, error};
use url::Url;

use crate::error::{RestError, Result};
use crate::http::{
    HttpRequest, Verb, HEADER_ACCEPT, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE,
};
use crate::response::RestResponse;
use crate::transport::Transport;
use crate::types::{Credentials, Invocation};

/// A single HTTP request bound to one target URL.
///
/// Consumed by `execute`; build a new one per call.
pub struct RestRequest {
    target: String,
    verb: Option<Verb>,
    credentials: Option<Credentials>,
    accept_type: Option<String>,
    content_type: Option<String>,
    invocation: Invocation,
    transport: Arc<dyn Transport>,
}

impl RestRequest {
    pub fn new(target: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            target: target.to_string(),
            verb: None,
            credentials: None,
            accept_type: None,
            content_type: None,
            invocation: Invocation::default(),
            transport,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn selected_verb(&self) -> Option<Verb> {
        self.verb
    }

    /// Stores credentials for the Basic `Authorization` header.
    pub fn auth(mut self, user: &str, password: &str) -> Self {
        self.credentials = Some(Credentials::new(user, password));
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the `Accept` header value.
    pub fn accept(mut self, media_type: &str) -> Self {
        self.accept_type = Some(media_type.to_string());
        self
    }

    /// Sets the `Content-Type` header value. Ignored for multipart requests.
    pub fn as_(mut self, media_type: &str) -> Self {
        self.content_type = Some(media_type.to_string());
        self
    }

    pub fn verb(mut self, verb: Verb) -> Self {
        self.verb = Some(verb);
        self
    }

    /// Selects the verb named `name` (case-insensitive).
    ///
    /// Any name that is not an HTTP verb is rejected with
    /// `RestError::Configuration`.
    pub fn call(self, name: &str) -> Result<Self> {
        let verb = name.parse::<Verb>()?;
        Ok(self.verb(verb))
    }

    pub fn delete(self) -> Self {
        self.verb(Verb::Delete)
    }

    pub fn get(self) -> Self {
        self.verb(Verb::Get)
    }

    pub fn head(self) -> Self {
        self.verb(Verb::Head)
    }

    pub fn options(self) -> Self {
        self.verb(Verb::Options)
    }

    pub fn patch(self) -> Self {
        self.verb(Verb::Patch)
    }

    pub fn post(self) -> Self {
        self.verb(Verb::Post)
    }

    pub fn put(self) -> Self {
        self.verb(Verb::Put)
    }

    pub fn trace(self) -> Self {
        self.verb(Verb::Trace)
    }

    /// Headers that execution would send for the stored invocation.
    pub fn prepare_headers(&self) -> Result<Vec<(String, String)>> {
        let mut headers = vec![basic_auth_header(self.credentials.as_ref())?];

        if !self.invocation.is_multipart() {
            if let Some(content_type) = &self.content_type {
                headers.push((HEADER_CONTENT_TYPE.to_string(), content_type.clone()));
            }
        }

        if let Some(accept_type) = &self.accept_type {
            headers.push((HEADER_ACCEPT.to_string(), accept_type.clone()));
        }

        Ok(headers)
    }

    /// Executes with no body, files or query parameters.
    pub fn send(self) -> Result<RestResponse> {
        self.execute(Invocation::default())
    }

    /// Executes the request and classifies the response.
    ///
    /// Transport failures are returned as-is in `RestError::Transport`.
    pub fn execute(mut self, invocation: Invocation) -> Result<RestResponse> {
        self.invocation = invocation;

        let headers = self.prepare_headers()?;
        let verb = self.verb.ok_or_else(|| RestError::Configuration {
            message: format!("no verb selected for {}", self.target),
        })?;
        Url::parse(&self.target).map_err(|source| RestError::InvalidTarget {
            target: self.target.clone(),
            source,
        })?;

        debug!(verb = %verb, target = %self.target, "dispatching request");

        let request = HttpRequest {
            verb,
            url: self.target.clone(),
            headers,
            query: self.invocation.params.clone().unwrap_or_default(),
            body: self.invocation.body(),
        };
        let response = self.transport.perform(&request).map_err(|err| {
            error!(verb = %verb, target = %self.target, error = %err, "transport failed");
            err
        })?;

        let status = response.status;
        debug!(status, "received response");

        if !verb.accepts(status) {
            error!(verb = %verb, target = %self.target, status, "request failed");
            return Err(RestError::RequestFailed {
                verb,
                target: self.target,
                status,
                body: response.body,
            });
        }

        debug!(verb = %verb, target = %self.target, status, "request succeeded");
        Ok(RestResponse::new(response))
    }
}

impl fmt::Debug for RestRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestRequest")
            .field("target", &self.target)
            .field("verb", &self.verb)
            .field("credentials", &self.credentials)
            .field("accept_type", &self.accept_type)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// `Authorization: Basic base64(user:password)`. Both parts must be non-empty.
fn basic_auth_header(credentials: Option<&Credentials>) -> Result<(String, String)> {
    let credentials = credentials.ok_or_else(|| RestError::Authentication {
        reason: "no credentials configured".to_string(),
    })?;
    if credentials.user.is_empty() || credentials.password.is_empty() {
        return Err(RestError::Authentication {
            reason: "login name or password is empty".to_string(),
        });
    }

    let encoded = STANDARD.encode(format!("{}:{}", credentials.user, credentials.password));
    Ok((HEADER_AUTHORIZATION.to_string(), format!("Basic {encoded}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{FilePart, Payload, RequestBody};
    use crate::transport::testing::{FailingTransport, RecordingTransport};
    use std::io;
    use std::sync::Mutex;

    const TARGET: &str = "https://api.example.com/items";

    fn request(transport: &RecordingTransport) -> RestRequest {
        RestRequest::new(TARGET, Arc::new(transport.clone()))
    }

    /// Runs `f` under a DEBUG fmt subscriber and returns what it logged.
    fn captured_logs(f: impl FnOnce()) -> String {
        #[derive(Clone, Default)]
        struct Buffer(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Buffer {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn authorization_header_is_basic_base64() {
        let transport = RecordingTransport::replying(200, b"");
        let headers = request(&transport)
            .auth("alice", "secret")
            .prepare_headers()
            .unwrap();
        assert_eq!(
            header(&headers, "authorization"),
            Some("Basic YWxpY2U6c2VjcmV0")
        );
    }

    #[test]
    fn authorization_header_encodes_non_ascii_credentials() {
        let transport = RecordingTransport::replying(200, b"");
        let headers = request(&transport)
            .auth("jörg", "pa:ss")
            .prepare_headers()
            .unwrap();
        let expected = format!("Basic {}", STANDARD.encode("jörg:pa:ss".as_bytes()));
        assert_eq!(header(&headers, "authorization"), Some(expected.as_str()));
    }

    #[test]
    fn missing_credentials_fail_before_dispatch() {
        let transport = RecordingTransport::replying(200, b"{}");
        let err = request(&transport)
            .get()
            .accept("application/json")
            .send()
            .unwrap_err();
        assert!(matches!(err, RestError::Authentication { .. }));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn missing_credentials_win_over_missing_verb() {
        let transport = RecordingTransport::replying(200, b"{}");
        let err = request(&transport).send().unwrap_err();
        assert!(matches!(err, RestError::Authentication { .. }));
    }

    #[test]
    fn empty_password_is_an_authentication_error() {
        let transport = RecordingTransport::replying(200, b"{}");
        let err = request(&transport).get().auth("alice", "").send().unwrap_err();
        assert!(matches!(err, RestError::Authentication { .. }));
    }

    #[test]
    fn missing_verb_is_a_configuration_error() {
        let transport = RecordingTransport::replying(200, b"{}");
        let err = request(&transport).auth("alice", "secret").send().unwrap_err();
        assert!(matches!(
            &err,
            RestError::Configuration { message } if message == &format!("no verb selected for {TARGET}")
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn unknown_operation_is_rejected_by_name() {
        let transport = RecordingTransport::replying(200, b"{}");
        let err = request(&transport).call("foobar").unwrap_err();
        assert_eq!(err.to_string(), "unknown operation foobar");
    }

    #[test]
    fn call_selects_verb_by_name() {
        let transport = RecordingTransport::replying(200, b"{}");
        let req = request(&transport).call("patch").unwrap();
        assert_eq!(req.selected_verb(), Some(Verb::Patch));
    }

    #[test]
    fn content_type_and_accept_are_sent_when_configured() {
        let transport = RecordingTransport::replying(201, b"{}");
        request(&transport)
            .post()
            .auth("alice", "secret")
            .as_("application/json")
            .accept("application/hal+json")
            .execute(Invocation::new().data(r#"{"name":"widget"}"#))
            .unwrap();

        let sent = transport.last_request();
        assert_eq!(sent.header("content-type"), Some("application/json"));
        assert_eq!(sent.header("accept"), Some("application/hal+json"));
        assert_eq!(
            sent.body,
            RequestBody::Data(Payload::Text(r#"{"name":"widget"}"#.to_string()))
        );
    }

    #[test]
    fn unset_media_types_produce_no_headers() {
        let transport = RecordingTransport::replying(200, b"");
        let headers = request(&transport)
            .auth("alice", "secret")
            .prepare_headers()
            .unwrap();
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn files_suppress_content_type() {
        let transport = RecordingTransport::replying(201, b"");
        request(&transport)
            .post()
            .auth("alice", "secret")
            .as_("application/json")
            .accept("application/json")
            .execute(
                Invocation::new()
                    .data("dropped")
                    .file(FilePart::new("file", "report.txt", b"contents".to_vec())),
            )
            .unwrap();

        let sent = transport.last_request();
        assert!(sent.header("content-type").is_none());
        assert_eq!(sent.header("accept"), Some("application/json"));
        assert!(matches!(sent.body, RequestBody::Multipart(ref files) if files.len() == 1));
    }

    #[test]
    fn query_params_are_forwarded() {
        let transport = RecordingTransport::replying(200, b"[]");
        request(&transport)
            .get()
            .auth("alice", "secret")
            .execute(Invocation::new().param("page", "2"))
            .unwrap();

        let sent = transport.last_request();
        assert_eq!(sent.verb, Verb::Get);
        assert_eq!(sent.url, TARGET);
        assert_eq!(sent.query, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(sent.body, RequestBody::Empty);
    }

    #[test]
    fn get_200_returns_resource() {
        let transport = RecordingTransport::replying(200, br#"{"id":1}"#);
        let response = request(&transport)
            .get()
            .auth("alice", "secret")
            .send()
            .unwrap();
        assert_eq!(response.status(), 200);
        let resource = response.resource().unwrap().unwrap();
        assert_eq!(resource["id"], 1);
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn get_404_fails_with_body_preserved() {
        let transport = RecordingTransport::replying(404, b"no such item \xff");
        let err = request(&transport)
            .get()
            .auth("alice", "secret")
            .send()
            .unwrap_err();
        match err {
            RestError::RequestFailed {
                verb,
                target,
                status,
                body,
            } => {
                assert_eq!(verb, Verb::Get);
                assert_eq!(target, TARGET);
                assert_eq!(status, 404);
                assert_eq!(body, b"no such item \xff");
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn get_rejects_201() {
        let transport = RecordingTransport::replying(201, b"");
        let err = request(&transport).get().auth("a", "b").send().unwrap_err();
        assert_eq!(err.status(), Some(201));
    }

    #[test]
    fn post_accepts_200_and_201() {
        for status in [200, 201] {
            let transport = RecordingTransport::replying(status, b"{}");
            let response = request(&transport).post().auth("a", "b").send().unwrap();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn post_rejects_other_statuses() {
        for status in [202, 204, 400, 500] {
            let transport = RecordingTransport::replying(status, b"oops");
            let err = request(&transport).post().auth("a", "b").send().unwrap_err();
            assert_eq!(err.status(), Some(status));
            assert_eq!(err.body(), Some(&b"oops"[..]));
        }
    }

    #[test]
    fn delete_204_with_empty_body_has_no_resource() {
        let transport = RecordingTransport::replying(204, b"");
        let response = request(&transport).delete().auth("a", "b").send().unwrap();
        assert_eq!(response.status(), 204);
        assert!(response.resource().unwrap().is_none());
    }

    #[test]
    fn delete_rejects_200() {
        let transport = RecordingTransport::replying(200, b"{}");
        let err = request(&transport).delete().auth("a", "b").send().unwrap_err();
        assert!(matches!(err, RestError::RequestFailed { status: 200, .. }));
    }

    #[test]
    fn unchecked_verbs_accept_any_status() {
        let verbs = [Verb::Head, Verb::Options, Verb::Patch, Verb::Put, Verb::Trace];
        for verb in verbs {
            for status in [200, 404, 500] {
                let transport = RecordingTransport::replying(status, b"");
                let response = request(&transport).verb(verb).auth("a", "b").send().unwrap();
                assert_eq!(response.status(), status);
            }
        }
    }

    #[test]
    fn transport_errors_pass_through() {
        let err = RestRequest::new(TARGET, Arc::new(FailingTransport))
            .get()
            .auth("a", "b")
            .send()
            .unwrap_err();
        assert!(matches!(err, RestError::Transport(_)));
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn transport_failure_is_logged_as_an_error() {
        let logs = captured_logs(|| {
            let err = RestRequest::new(TARGET, Arc::new(FailingTransport))
                .delete()
                .auth("a", "b")
                .send()
                .unwrap_err();
            assert!(matches!(err, RestError::Transport(_)));
        });
        let line = logs
            .lines()
            .find(|line| line.contains("transport failed"))
            .unwrap();
        assert!(line.contains("ERROR"));
        assert!(line.contains("verb=DELETE"));
        assert!(line.contains(TARGET));
        assert!(line.contains("connection refused"));
    }

    #[test]
    fn success_is_logged_at_debug() {
        let transport = RecordingTransport::replying(200, b"{}");
        let logs = captured_logs(|| {
            request(&transport).get().auth("a", "b").send().unwrap();
        });
        let line = logs
            .lines()
            .find(|line| line.contains("request succeeded"))
            .unwrap();
        assert!(line.contains("DEBUG"));
        assert!(line.contains("verb=GET"));
        assert!(line.contains("status=200"));
        assert!(!logs.contains("ERROR"));
    }

    #[test]
    fn invalid_target_is_rejected_before_dispatch() {
        let transport = RecordingTransport::replying(200, b"");
        let err = RestRequest::new("not a url", Arc::new(transport.clone()))
            .get()
            .auth("a", "b")
            .send()
            .unwrap_err();
        assert!(matches!(err, RestError::InvalidTarget { .. }));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn debug_output_hides_password() {
        let transport = RecordingTransport::replying(200, b"");
        let debug = format!("{:?}", request(&transport).auth("alice", "secret"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("secret"));
    }
}
