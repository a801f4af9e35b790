//! GraphQL transport to the GitHub API.

use serde_json::{json, Value};
use std::time::Duration;

use crate::error::{ApiErrorEntry, Error, Result};

/// GraphQL variables sent alongside a query.
pub type Variables = serde_json::Map<String, Value>;

const USER_AGENT: &str = concat!("braggard/", env!("CARGO_PKG_VERSION"));

/// Issues one GraphQL query and returns the `data` member of the response.
///
/// Implementations are blocking; async callers run them on a blocking worker.
pub trait Transport: Send + Sync + 'static {
    fn execute(&self, query: &str, variables: &Variables) -> Result<Value>;
}

/// Transport backed by a `ureq` agent talking to a GraphQL endpoint.
pub struct HttpTransport {
    endpoint: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.into(),
            token: token.filter(|token| !token.is_empty()),
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl Transport for HttpTransport {
    fn execute(&self, query: &str, variables: &Variables) -> Result<Value> {
        let body = json!({ "query": query, "variables": variables });

        let mut request = self
            .agent
            .post(&self.endpoint)
            .set("Accept", "application/json")
            .set("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }

        match request.send_json(body) {
            Ok(response) => {
                let envelope: Value = response.into_json().map_err(|e| {
                    Error::transport(format!("unreadable response from {}", self.endpoint), e)
                })?;
                parse_envelope(envelope)
            }
            Err(ureq::Error::Status(code, response)) => {
                // A rejected query may still come back with a GraphQL error list
                match response.into_json::<Value>() {
                    Ok(envelope) if has_errors(&envelope) => parse_envelope(envelope),
                    _ => Err(Error::transport(
                        format!("POST {} returned HTTP {}", self.endpoint, code),
                        format!("HTTP status {}", code),
                    )),
                }
            }
            Err(ureq::Error::Transport(transport)) => Err(Error::transport(
                format!("POST {}", self.endpoint),
                transport,
            )),
        }
    }
}

fn has_errors(envelope: &Value) -> bool {
    envelope
        .get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| !errors.is_empty())
}

/// Unwrap a `{data, errors?}` envelope.
///
/// A present, non-empty `errors` list wins over any partial `data`.
pub fn parse_envelope(mut envelope: Value) -> Result<Value> {
    if has_errors(&envelope) {
        let entries = envelope["errors"]
            .as_array()
            .map(|errors| errors.iter().map(error_entry).collect())
            .unwrap_or_default();
        return Err(Error::Api(entries));
    }

    match envelope.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(Error::MalformedResponse(
            "response has neither data nor errors".to_string(),
        )),
    }
}

fn error_entry(raw: &Value) -> ApiErrorEntry {
    serde_json::from_value(raw.clone()).unwrap_or_else(|_| ApiErrorEntry {
        message: raw.to_string(),
        kind: None,
        path: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    /// Accept one connection, answer it with `status` and `body`, and hand
    /// back the raw request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/graphql", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (endpoint, handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let read = stream.read(&mut chunk).unwrap();
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);

            let text = String::from_utf8_lossy(&buffer);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buffer.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Lowercased header block and parsed JSON body of a captured request.
    fn split_request(request: &str) -> (String, Value) {
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        (head.to_lowercase(), serde_json::from_str(body).unwrap())
    }

    fn variables() -> Variables {
        let mut variables = Variables::new();
        variables.insert("login".to_string(), json!("octo"));
        variables
    }

    #[test]
    fn test_request_carries_headers_and_body() {
        let (endpoint, server) = serve_once("200 OK", r#"{"data": {"ok": true}}"#);
        let transport = HttpTransport::new(endpoint, Some("secret".to_string()), Duration::from_secs(5));

        let data = transport.execute("query { viewer { login } }", &variables()).unwrap();
        assert_eq!(data, json!({"ok": true}));

        let (head, body) = split_request(&server.join().unwrap());
        assert!(head.starts_with("post /graphql"));
        assert!(head.contains("accept: application/json"));
        assert!(head.contains("authorization: bearer secret"));
        assert!(head.contains("user-agent: braggard/"));
        assert_eq!(
            body,
            json!({"query": "query { viewer { login } }", "variables": {"login": "octo"}})
        );
    }

    #[test]
    fn test_no_token_sends_no_authorization() {
        let (endpoint, server) = serve_once("200 OK", r#"{"data": {"ok": true}}"#);
        let transport = HttpTransport::new(endpoint, None, Duration::from_secs(5));

        transport.execute("query { ok }", &Variables::new()).unwrap();

        let (head, body) = split_request(&server.join().unwrap());
        assert!(!head.contains("authorization:"));
        assert_eq!(body["variables"], json!({}));
    }

    #[test]
    fn test_error_status_with_graphql_errors_is_api_error() {
        let (endpoint, server) = serve_once(
            "403 Forbidden",
            r#"{"errors": [{"message": "rate limited", "type": "RATE_LIMITED"}]}"#,
        );
        let transport = HttpTransport::new(endpoint, None, Duration::from_secs(5));

        let err = transport.execute("query { ok }", &variables()).unwrap_err();
        server.join().unwrap();
        match err {
            Error::Api(entries) => {
                assert_eq!(entries[0].message, "rate limited");
                assert_eq!(entries[0].kind.as_deref(), Some("RATE_LIMITED"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_status_without_body_is_transport_error() {
        let (endpoint, server) = serve_once("502 Bad Gateway", "upstream down");
        let transport = HttpTransport::new(endpoint, None, Duration::from_secs(5));

        let err = transport.execute("query { ok }", &variables()).unwrap_err();
        server.join().unwrap();
        assert!(err.is_transport(), "unexpected error: {err:?}");
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[test]
    fn test_success_status_with_errors_is_api_error() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"data": null, "errors": [{"message": "Could not resolve to a User"}]}"#,
        );
        let transport = HttpTransport::new(endpoint, None, Duration::from_secs(5));

        let err = transport.execute("query { ok }", &variables()).unwrap_err();
        server.join().unwrap();
        assert!(err.is_api());
    }

    #[test]
    fn test_envelope_returns_data() {
        let data = parse_envelope(json!({"data": {"user": {"login": "demo"}}})).unwrap();
        assert_eq!(data, json!({"user": {"login": "demo"}}));
    }

    #[test]
    fn test_envelope_errors_become_api_error() {
        let err = parse_envelope(json!({
            "data": null,
            "errors": [{"message": "bad", "type": "NOT_FOUND", "path": ["user"]}]
        }))
        .unwrap_err();

        match err {
            Error::Api(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].message, "bad");
                assert_eq!(entries[0].kind.as_deref(), Some("NOT_FOUND"));
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_errors_win_over_partial_data() {
        let err = parse_envelope(json!({
            "data": {"user": null},
            "errors": [{"message": "partial"}]
        }))
        .unwrap_err();
        assert!(err.is_api());
    }

    #[test]
    fn test_empty_error_list_is_ignored() {
        let data = parse_envelope(json!({"data": {"ok": true}, "errors": []})).unwrap();
        assert_eq!(data, json!({"ok": true}));
    }

    #[test]
    fn test_unstructured_error_entry_keeps_raw_text() {
        let err = parse_envelope(json!({"errors": ["just a string"]})).unwrap_err();
        match err {
            Error::Api(entries) => assert_eq!(entries[0].message, "\"just a string\""),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_data_is_malformed() {
        let err = parse_envelope(json!({})).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) on localhost is closed on test machines
        let transport = HttpTransport::new(
            "http://127.0.0.1:9/graphql",
            None,
            Duration::from_secs(2),
        );
        let err = transport.execute("query { viewer { login } }", &Variables::new()).unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err:?}");
    }

    #[test]
    fn test_empty_token_is_unauthenticated() {
        let transport = HttpTransport::new("http://localhost", Some(String::new()), Duration::from_secs(1));
        assert!(!transport.is_authenticated());
        assert_eq!(transport.endpoint(), "http://localhost");
    }
}
