//! Main REST API client implementation

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::debug;
use url::Url;
use wp_api_contract::*;

use crate::auth::AuthConfig;
use crate::error::RestClientResult;
use crate::sse::SseEventStream;

/// Base URL of the mainland China deployment
pub const COZE_CN_BASE_URL: &str = "https://api.coze.cn";

/// Base URL of the international deployment
pub const COZE_COM_BASE_URL: &str = "https://api.coze.com";

const LOG_ID_HEADER: &str = "x-tt-logid";

/// Status and raw body of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// REST API client for the Coze workflow endpoints
#[derive(Debug, Clone)]
pub struct RestClient {
    http_client: HttpClient,
    base_url: Url,
    auth: AuthConfig,
}

impl RestClient {
    /// Create a new REST client
    pub fn new(mut base_url: Url, auth: AuthConfig) -> RestClientResult<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = HttpClient::builder()
            .user_agent(concat!("wp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            auth,
        })
    }

    /// Create a client from a base URL string
    pub fn from_url(base_url: &str, auth: AuthConfig) -> RestClientResult<Self> {
        let base_url = Url::parse(base_url)?;
        Self::new(base_url, auth)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the authentication config
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    /// List workspaces, returning whatever the server answers
    ///
    /// Used as a credential check: a valid token yields `200` with the
    /// workspace list, an invalid one an error envelope. Non-2xx statuses
    /// are reported rather than turned into errors.
    pub async fn list_workspaces_raw(&self) -> RestClientResult<RawResponse> {
        let response = self
            .request(Method::GET, "v1/workspaces")?
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        log_response(&response);

        let status = response.status();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    /// Start a workflow run and stream its events
    pub async fn stream_run(&self, request: &StreamRunRequest) -> RestClientResult<SseEventStream> {
        self.open_stream("v1/workflow/stream_run", request)
    }

    /// Resume an interrupted workflow run and stream the continuation
    pub async fn stream_resume(
        &self,
        request: &StreamResumeRequest,
    ) -> RestClientResult<SseEventStream> {
        self.open_stream("v1/workflow/stream_resume", request)
    }

    // Private helper methods

    fn endpoint(&self, path: &str) -> RestClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, path: &str) -> RestClientResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);
        Ok(self
            .http_client
            .request(method, url)
            .headers(self.auth.headers()?))
    }

    fn open_stream<B: Serialize>(&self, path: &str, body: &B) -> RestClientResult<SseEventStream> {
        let url = self.endpoint(path)?;
        SseEventStream::connect(&url, serde_json::to_string(body)?, &self.auth)
    }
}

fn log_response(response: &Response) {
    let log_id = response
        .headers()
        .get(LOG_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");
    debug!("Response {} (logid {})", response.status(), log_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RestClientError;
    use futures::StreamExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    /// Answer a single connection with `response`, handing back the request text
    async fn serve_once(response: String) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            let _ = tx.send(request);
        });

        (format!("http://{}", addr), rx)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn http_response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        )
    }

    fn run_request() -> StreamRunRequest {
        let mut parameters = WorkflowParameters::new();
        parameters.insert("question_img".to_string(), "q.png".into());
        StreamRunRequest {
            workflow_id: "wf-1".to_string(),
            parameters,
            bot_id: None,
            app_id: None,
        }
    }

    #[tokio::test]
    async fn test_stream_run_decodes_event_stream() {
        let body = concat!(
            "event: Message\n",
            "data: {\"content\":\"hi\",\"node_is_finish\":true}\n\n",
            ": keep-alive\n\n",
            "event: Done\n",
            "data: {}\n\n",
        );
        let (base, request) = serve_once(http_response("200 OK", "text/event-stream", body)).await;
        let client = RestClient::from_url(&base, AuthConfig::with_bearer("pat_x")).unwrap();

        let events: Vec<_> = client.stream_run(&run_request()).await.unwrap().collect().await;
        let events: Vec<_> = events.into_iter().map(|e| e.unwrap()).collect();

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], WorkflowEvent::Message(m) if m.content == "hi"));
        assert!(matches!(events[1], WorkflowEvent::Done));

        let request = request.await.unwrap();
        let lowered = request.to_ascii_lowercase();
        assert!(lowered.starts_with("post /v1/workflow/stream_run http/1.1"));
        assert!(lowered.contains("authorization: bearer pat_x"));
        assert!(request.contains(r#""workflow_id":"wf-1""#));
        assert!(request.contains(r#""question_img":"q.png""#));
    }

    #[tokio::test]
    async fn test_stream_rejected_with_error_status() {
        let (base, _request) = serve_once(http_response(
            "401 Unauthorized",
            "application/json",
            r#"{"code":4100,"msg":"authentication is invalid"}"#,
        ))
        .await;
        let client = RestClient::from_url(&base, AuthConfig::with_bearer("bad")).unwrap();

        let mut events = client.stream_run(&run_request()).await.unwrap();
        let first = events.next().await.unwrap();

        assert!(matches!(first, Err(RestClientError::UnexpectedResponse(_))));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_answered_with_json_envelope() {
        let (base, _request) = serve_once(http_response(
            "200 OK",
            "application/json",
            r#"{"code":4000,"msg":"workflow not published"}"#,
        ))
        .await;
        let client = RestClient::from_url(&base, AuthConfig::with_bearer("pat_x")).unwrap();

        let request = StreamResumeRequest {
            workflow_id: "wf-1".to_string(),
            event_id: "e1".to_string(),
            resume_data: "hey".to_string(),
            interrupt_type: 2,
        };
        let items: Vec<_> = client.stream_resume(&request).await.unwrap().collect().await;

        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(RestClientError::Sse(_))));
    }

    #[tokio::test]
    async fn test_list_workspaces_reports_any_status() {
        let body = r#"{"code":4100,"msg":"authentication is invalid"}"#;
        let (base, request) =
            serve_once(http_response("401 Unauthorized", "application/json", body)).await;
        let client = RestClient::from_url(&base, AuthConfig::with_bearer("bad")).unwrap();

        let answer = client.list_workspaces_raw().await.unwrap();

        assert_eq!(answer.status, StatusCode::UNAUTHORIZED);
        assert_eq!(answer.body, body);
        let request = request.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /v1/workspaces http/1.1"));
    }

    #[test]
    fn test_client_creation() {
        let client = RestClient::from_url(COZE_CN_BASE_URL, AuthConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.coze.cn/");
    }

    #[test]
    fn test_endpoints_keep_path_prefix() {
        let client =
            RestClient::from_url("http://localhost:8080/proxy", AuthConfig::default()).unwrap();

        assert_eq!(
            client.endpoint("v1/workflow/stream_run").unwrap().as_str(),
            "http://localhost:8080/proxy/v1/workflow/stream_run"
        );
        assert_eq!(
            client.endpoint("v1/workspaces").unwrap().as_str(),
            "http://localhost:8080/proxy/v1/workspaces"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = RestClient::from_url("not a url", AuthConfig::default()).unwrap_err();
        assert!(matches!(err, RestClientError::Url(_)));
    }

    #[test]
    fn test_request_carries_bearer_header() {
        let client = RestClient::from_url(COZE_COM_BASE_URL, AuthConfig::with_bearer("pat_x"))
            .unwrap();
        let request = client
            .request(Method::GET, "v1/workspaces")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "https://api.coze.com/v1/workspaces");
        assert_eq!(request.headers().get("authorization").unwrap(), "Bearer pat_x");
    }
}
