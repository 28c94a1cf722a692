//! HTTP transport and the decode-or-envelope response chain.
//!
//! TMDB answers many failures with HTTP 200 and a status envelope, so the
//! status code is not a reliable discriminator. A body is decoded as the
//! expected shape first, then as the envelope, and only then reported as
//! undecodable.

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::endpoints::redact;
use super::error::{TmdbError, TransportError};
use super::types::StatusResponse;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
    /// `DELETE`.
    Delete,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Method.
    pub method: HttpMethod,
    /// Fully-qualified URL.
    pub url: Url,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Optional body.
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a bodiless `GET` request.
    #[must_use]
    pub const fn get(url: Url) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
        }
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
}

/// Executes one HTTP round-trip.
///
/// Abstracts the network for substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Sends `request` and returns whatever the server answered.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Network` if no response was received.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct HttpTransport {
    /// HTTP client.
    http_client: Client,
}

impl HttpTransport {
    /// Creates a transport sending `user_agent` on every request.
    ///
    /// # Errors
    ///
    /// Returns `TmdbError::Configuration` if the `reqwest::Client` build fails.
    pub fn new(user_agent: &str) -> Result<Self, TmdbError> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .map_err(|e| TmdbError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http_client })
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http_client.request(method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Decodes `body` as `T`, falling back to the status envelope.
///
/// # Errors
///
/// - `TmdbError::RemoteApi` if the body is a status envelope.
/// - `TransportError::Decode` if the body matches neither shape.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, TmdbError> {
    let decode_err = match serde_json::from_slice::<T>(body) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    match serde_json::from_slice::<StatusResponse>(body) {
        Ok(status) => Err(TmdbError::RemoteApi {
            status_code: status.status_code,
            status_message: status.status_message,
        }),
        Err(_) => Err(TransportError::Decode(decode_err.to_string()).into()),
    }
}

/// Sends a `GET` and decodes the JSON body as `T`.
///
/// # Errors
///
/// Returns an error if the request fails or the body cannot be decoded
/// (see [`decode_body`]).
#[instrument(skip_all)]
pub async fn fetch<T: DeserializeOwned>(
    transport: &(impl Transport + Sync),
    url: Url,
) -> Result<T, TmdbError> {
    tracing::debug!(url = %redact(&url), "TMDB API request");
    let response = transport.execute(HttpRequest::get(url)).await?;
    decode_body(&response.body)
}

/// Sends `body` as JSON with `method` and decodes the JSON reply as `T`.
///
/// # Errors
///
/// Returns an error if the body cannot be serialized, the request fails,
/// or the reply cannot be decoded (see [`decode_body`]).
#[instrument(skip_all)]
pub async fn submit<B: Serialize + Sync, T: DeserializeOwned>(
    transport: &(impl Transport + Sync),
    url: Url,
    method: HttpMethod,
    body: &B,
) -> Result<T, TmdbError> {
    let payload = serde_json::to_vec(body).map_err(|e| TransportError::Encode(e.to_string()))?;
    tracing::debug!(url = %redact(&url), ?method, "TMDB API request");
    let request = HttpRequest {
        method,
        url,
        headers: vec![(
            String::from("content-type"),
            String::from("application/json"),
        )],
        body: Some(payload),
    };
    let response = transport.execute(request).await?;
    decode_body(&response.body)
}

/// Sends a `GET` and returns the raw body.
///
/// # Errors
///
/// Returns `TransportError::Network` if the request fails and
/// `TransportError::Status` for a non-2xx status.
#[instrument(skip_all)]
pub async fn fetch_bytes(
    transport: &(impl Transport + Sync),
    url: Url,
) -> Result<Vec<u8>, TmdbError> {
    tracing::debug!(url = %url, "image request");
    let response = transport.execute(HttpRequest::get(url)).await?;
    if !(200..300).contains(&response.status) {
        return Err(TransportError::Status(response.status).into());
    }
    Ok(response.body)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::tmdb::types::{LoginRequest, MovieResults, RequestTokenResponse};

    /// Transport that replays scripted outcomes and records every request.
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<HttpResponse, TransportError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn body(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            })
        }
    }

    impl Transport for ScriptedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network(String::from("no scripted outcome"))))
        }
    }

    fn url() -> Url {
        Url::parse("https://api.themoviedb.org/3/search/movie?api_key=k&query=x").unwrap()
    }

    #[tokio::test]
    async fn test_fetch_decodes_expected_shape() {
        // Arrange
        let transport = ScriptedTransport::new(vec![ScriptedTransport::body(
            200,
            include_str!("../../../../fixtures/tmdb/search_movie_matrix.json"),
        )]);

        // Act
        let results: MovieResults = fetch(&transport, url()).await.unwrap();

        // Assert
        assert_eq!(results.results.len(), 3);
        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_envelope_on_success_status() {
        // Arrange
        let transport = ScriptedTransport::new(vec![ScriptedTransport::body(
            200,
            r#"{"success":false,"status_code":34,"status_message":"The resource you requested could not be found."}"#,
        )]);

        // Act
        let result: Result<MovieResults, _> = fetch(&transport, url()).await;

        // Assert
        assert!(matches!(
            result,
            Err(TmdbError::RemoteApi { status_code: 34, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_envelope_on_error_status() {
        // Arrange
        let transport = ScriptedTransport::new(vec![ScriptedTransport::body(
            401,
            r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#,
        )]);

        // Act
        let result: Result<MovieResults, _> = fetch(&transport, url()).await;

        // Assert
        let err = result.unwrap_err();
        assert_eq!(err.status_code(), Some(7));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_fetch_unrecognized_body_is_transport_error() {
        // Arrange
        let transport = ScriptedTransport::new(vec![ScriptedTransport::body(
            200,
            r#"{"unexpected":"shape"}"#,
        )]);

        // Act
        let result: Result<MovieResults, _> = fetch(&transport, url()).await;

        // Assert
        assert!(matches!(
            result,
            Err(TmdbError::Transport(TransportError::Decode(_)))
        ));
    }

    #[tokio::test]
    async fn test_fetch_non_json_body_is_transport_error() {
        // Arrange
        let transport =
            ScriptedTransport::new(vec![ScriptedTransport::body(502, "<html>Bad Gateway</html>")]);

        // Act
        let result: Result<MovieResults, _> = fetch(&transport, url()).await;

        // Assert
        assert!(matches!(
            result,
            Err(TmdbError::Transport(TransportError::Decode(_)))
        ));
    }

    #[tokio::test]
    async fn test_fetch_network_failure() {
        // Arrange
        let transport = ScriptedTransport::new(vec![Err(TransportError::Network(String::from(
            "connection refused",
        )))]);

        // Act
        let result: Result<MovieResults, _> = fetch(&transport, url()).await;

        // Assert
        assert!(matches!(
            result,
            Err(TmdbError::Transport(TransportError::Network(_)))
        ));
    }

    #[tokio::test]
    async fn test_submit_sends_json_body() {
        // Arrange
        let transport = ScriptedTransport::new(vec![ScriptedTransport::body(
            200,
            r#"{"success":true,"expires_at":"2024-06-01 12:00:00 UTC","request_token":"def"}"#,
        )]);
        let body = LoginRequest {
            username: String::from("user"),
            password: String::from("pass"),
            request_token: String::from("abc"),
        };

        // Act
        let response: RequestTokenResponse =
            submit(&transport, url(), HttpMethod::Post, &body).await.unwrap();

        // Assert
        assert_eq!(response.request_token, "def");
        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert!(
            requests[0]
                .headers
                .contains(&(String::from("content-type"), String::from("application/json")))
        );
        let sent: serde_json::Value =
            serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["request_token"], "abc");
        assert_eq!(sent["username"], "user");
    }

    #[tokio::test]
    async fn test_submit_delete_with_empty_body_reply() {
        // Arrange
        let transport = ScriptedTransport::new(vec![ScriptedTransport::body(204, "")]);
        let body = serde_json::json!({ "session_id": "xyz" });

        // Act
        let result: Result<RequestTokenResponse, _> =
            submit(&transport, url(), HttpMethod::Delete, &body).await;

        // Assert
        assert!(matches!(
            result,
            Err(TmdbError::Transport(TransportError::Decode(_)))
        ));
        assert_eq!(
            transport.requests.lock().unwrap()[0].method,
            HttpMethod::Delete
        );
    }

    #[tokio::test]
    async fn test_fetch_bytes_returns_raw_body() {
        // Arrange
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse {
            status: 200,
            body: vec![0xFF, 0xD8, 0xFF, 0xE0],
        })]);

        // Act
        let bytes = fetch_bytes(&transport, url()).await.unwrap();

        // Assert
        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_error_status() {
        // Arrange
        let transport = ScriptedTransport::new(vec![ScriptedTransport::body(404, "Not Found")]);

        // Act
        let result = fetch_bytes(&transport, url()).await;

        // Assert
        assert!(matches!(
            result,
            Err(TmdbError::Transport(TransportError::Status(404)))
        ));
    }
}
