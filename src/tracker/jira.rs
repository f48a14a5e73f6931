//! Blocking Jira REST client.
//!
//! Uses `ureq` for synchronous requests against `/rest/api/2/search`,
//! authenticated with a personal access token.

use std::time::Duration;

use super::{IssueTracker, JiraIssue, SearchResponse, TrackerSettings};
use crate::error::{TrackerError, TrackerResult};

/// Jira server reachable over HTTP.
pub struct JiraClient {
    base_url: String,
    token: String,
    fields: String,
    max_results: u32,
    http: ureq::Agent,
}

impl JiraClient {
    /// Client for the server at `base_url` (e.g. `https://jira.company.org/`).
    pub fn authorized(base_url: &str, token: &str, settings: &TrackerSettings) -> Self {
        let http = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            fields: format!("key,project,{}", settings.estimation_field),
            max_results: settings.max_results.max(1),
            http,
        }
    }

    /// Full URL of the search endpoint.
    pub fn search_url(&self) -> String {
        format!("{}/rest/api/2/search", self.base_url)
    }
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("fields", &self.fields)
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl IssueTracker for JiraClient {
    fn search(&self, jql: &str) -> TrackerResult<Vec<JiraIssue>> {
        let url = self.search_url();
        tracing::debug!(%url, jql, "searching issue tracker");

        let response = self
            .http
            .get(&url)
            .query("jql", jql)
            .query("maxResults", &self.max_results.to_string())
            .query("expand", "changelog")
            .query("fields", &self.fields)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/json")
            .call();

        match response {
            Ok(response) => {
                let body: SearchResponse =
                    response.into_json().map_err(|e| TrackerError::Response {
                        message: format!("failed to parse search result: {e}"),
                    })?;
                Ok(body.issues)
            }
            Err(ureq::Error::Status(status, _)) => {
                tracing::error!(%url, status, "issue tracker rejected the search");
                Err(TrackerError::Status { url, status })
            }
            Err(ureq::Error::Transport(transport)) => Err(TrackerError::Request {
                url,
                message: transport.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use super::*;

    /// Serve one canned HTTP response on an ephemeral port, returning the
    /// base URL and the request line the server saw.
    fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            let request = String::from_utf8_lossy(&request).to_string();
            request.lines().next().unwrap_or_default().to_string()
        });
        (base, handle)
    }

    fn client_for(base: &str) -> JiraClient {
        let settings = TrackerSettings {
            timeout_secs: 5,
            ..Default::default()
        };
        JiraClient::authorized(base, "token", &settings)
    }

    #[test]
    fn search_url_ignores_trailing_slash() {
        let client = JiraClient::authorized(
            "https://jira.example.org/",
            "secret",
            &TrackerSettings::default(),
        );
        assert_eq!(client.search_url(), "https://jira.example.org/rest/api/2/search");
    }

    #[test]
    fn requested_fields_include_estimation_field() {
        let settings = TrackerSettings {
            estimation_field: "customfield_42".into(),
            ..Default::default()
        };
        let client = JiraClient::authorized("https://jira.example.org", "secret", &settings);
        assert_eq!(client.fields, "key,project,customfield_42");
    }

    #[test]
    fn debug_output_hides_token() {
        let client = JiraClient::authorized(
            "https://jira.example.org",
            "very-secret-token",
            &TrackerSettings::default(),
        );
        let debug = format!("{client:?}");
        assert!(!debug.contains("very-secret-token"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn unreachable_server_is_a_request_error() {
        let settings = TrackerSettings {
            timeout_secs: 1,
            ..Default::default()
        };
        // Port 9 (discard) on localhost is closed on test machines.
        let client = JiraClient::authorized("http://127.0.0.1:9", "t", &settings);
        let err = client.search("project = X").unwrap_err();
        assert!(matches!(err, TrackerError::Request { .. }));
    }

    #[test]
    fn rejected_search_is_a_status_error() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"errorMessages":[]}"#);
        let err = client_for(&base).search("project = X").unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, TrackerError::Status { status: 401, .. }));
    }

    #[test]
    fn non_json_body_is_a_response_error() {
        let (base, server) = serve_once("200 OK", "<html>login</html>");
        let err = client_for(&base).search("project = X").unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, TrackerError::Response { .. }));
    }

    #[test]
    fn search_returns_issues_from_body() {
        let body = r#"{"issues":[{"key":"PRJ-1"},{"key":"PRJ-2"}]}"#;
        let (base, server) = serve_once("200 OK", body);
        let issues = client_for(&base).search("project = PRJ").unwrap();
        let request_line = server.join().unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].key, "PRJ-1");
        assert!(request_line.starts_with("GET /rest/api/2/search?"));
        assert!(request_line.contains("expand=changelog"));
    }
}
