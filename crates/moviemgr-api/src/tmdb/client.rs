//! `TmdbClient` - TMDB API client implementation.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use super::api::TmdbApi;
use super::endpoints::{
    DEFAULT_BASE_URL, DEFAULT_IMAGE_BASE_URL, DEFAULT_POSTER_WIDTH, DEFAULT_REDIRECT_TO,
    DEFAULT_WEB_BASE_URL, Endpoint, EndpointResolver,
};
use super::error::TmdbError;
use super::session::{AuthStep, SessionState};
use super::transport::{self, HttpMethod, HttpTransport, Transport};
use super::types::{
    Account, LoginRequest, LogoutRequest, LogoutResponse, MarkFavoriteRequest,
    MarkWatchlistRequest, MediaType, Movie, MovieResults, RequestTokenResponse, SessionRequest,
    SessionResponse, StatusResponse,
};

/// Status codes acknowledging a watchlist/favorite toggle.
///
/// One endpoint both adds and removes, and the server reports
/// "created" (1), "updated" (12), and "deleted" (13) separately.
pub const ACCEPTED_MARK_CODES: [u32; 3] = [1, 12, 13];

/// TMDB API client.
///
/// Clones share the same session state.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient<T = HttpTransport> {
    /// Network transport.
    transport: T,
    /// URL construction.
    endpoints: EndpointResolver,
    /// Token and session identifiers.
    session: Arc<RwLock<SessionState>>,
}

/// Builder for `TmdbClient`.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    web_base_url: Option<Url>,
    image_base_url: Option<Url>,
    api_key: Option<String>,
    user_agent: Option<String>,
    poster_width: Option<String>,
    redirect_to: Option<String>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            web_base_url: None,
            image_base_url: None,
            api_key: None,
            user_agent: None,
            poster_width: None,
            redirect_to: None,
        }
    }

    /// Overrides the API base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Overrides the website base URL used for authorization.
    #[must_use]
    pub fn web_base_url(mut self, url: Url) -> Self {
        self.web_base_url = Some(url);
        self
    }

    /// Overrides the image CDN base URL.
    #[must_use]
    pub fn image_base_url(mut self, url: Url) -> Self {
        self.image_base_url = Some(url);
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required by `build`).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the poster width segment (default: `w500`).
    #[must_use]
    pub fn poster_width(mut self, width: impl Into<String>) -> Self {
        self.poster_width = Some(width.into());
        self
    }

    /// Sets the redirect URI for website authorization
    /// (default: `themoviemanager:authenticate`).
    #[must_use]
    pub fn redirect_to(mut self, uri: impl Into<String>) -> Self {
        self.redirect_to = Some(uri.into());
        self
    }

    /// Builds the client with the `reqwest` transport.
    ///
    /// # Errors
    ///
    /// - `api_key` or `user_agent` is not set.
    /// - A base URL cannot serve as a base.
    /// - `reqwest::Client` build fails.
    pub fn build(mut self) -> Result<TmdbClient, TmdbError> {
        let user_agent = self
            .user_agent
            .take()
            .ok_or_else(|| TmdbError::Configuration(String::from("user_agent is required")))?;
        let transport = HttpTransport::new(&user_agent)?;
        self.build_with_transport(transport)
    }

    /// Builds the client on top of a custom transport.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set.
    /// - A base URL cannot serve as a base.
    pub fn build_with_transport<T: Transport>(
        self,
        transport: T,
    ) -> Result<TmdbClient<T>, TmdbError> {
        let api_key = self
            .api_key
            .ok_or_else(|| TmdbError::Configuration(String::from("api_key is required")))?;

        let endpoints = EndpointResolver {
            base_url: base_or_default(self.base_url, DEFAULT_BASE_URL)?,
            web_base_url: base_or_default(self.web_base_url, DEFAULT_WEB_BASE_URL)?,
            image_base_url: base_or_default(self.image_base_url, DEFAULT_IMAGE_BASE_URL)?,
            poster_width: self
                .poster_width
                .unwrap_or_else(|| String::from(DEFAULT_POSTER_WIDTH)),
            redirect_to: self
                .redirect_to
                .unwrap_or_else(|| String::from(DEFAULT_REDIRECT_TO)),
            api_key,
        };

        Ok(TmdbClient {
            transport,
            endpoints,
            session: Arc::new(RwLock::new(SessionState::default())),
        })
    }
}

/// Validates a base URL, falling back to `default`, and ensures a trailing `/`
/// so relative paths join below it.
fn base_or_default(url: Option<Url>, default: &str) -> Result<Url, TmdbError> {
    let mut url = match url {
        Some(url) => url,
        None => Url::parse(default)?,
    };
    if url.cannot_be_a_base() {
        return Err(TmdbError::Configuration(format!(
            "{url} cannot be used as a base URL"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }
}

impl<T> TmdbClient<T> {
    /// Returns a snapshot of the session state.
    pub async fn session(&self) -> SessionState {
        self.session.read().await.clone()
    }

    /// Returns the endpoint resolver.
    #[must_use]
    pub const fn endpoints(&self) -> &EndpointResolver {
        &self.endpoints
    }

    /// Resolves `endpoint` against the current session.
    async fn resolve(&self, endpoint: Endpoint<'_>) -> Result<Url, TmdbError> {
        let session = self.session.read().await;
        self.endpoints.resolve(&endpoint, &session)
    }

    /// Checks that `step` is allowed, then resolves `endpoint`.
    async fn resolve_step(
        &self,
        step: AuthStep,
        endpoint: Endpoint<'_>,
    ) -> Result<(Url, SessionState), TmdbError> {
        let session = self.session.read().await;
        session.ensure(step)?;
        let url = self.endpoints.resolve(&endpoint, &session)?;
        Ok((url, session.clone()))
    }
}

impl<T: Transport + Sync> TmdbClient<T> {
    /// Fetches one of the account movie lists.
    async fn movie_list(&self, endpoint: Endpoint<'_>) -> Result<Vec<Movie>, TmdbError> {
        let url = self.resolve(endpoint).await?;
        let response: MovieResults = transport::fetch(&self.transport, url).await?;
        Ok(response.results)
    }

    /// Posts a toggle body and checks the acknowledgment code.
    async fn mark<B: serde::Serialize + Sync>(
        &self,
        endpoint: Endpoint<'_>,
        body: &B,
    ) -> Result<bool, TmdbError> {
        let url = self.resolve(endpoint).await?;
        let response: StatusResponse =
            transport::submit(&self.transport, url, HttpMethod::Post, body).await?;
        let accepted = ACCEPTED_MARK_CODES.contains(&response.status_code);
        if !accepted {
            tracing::warn!(
                status_code = response.status_code,
                status_message = %response.status_message,
                "TMDB rejected list update"
            );
        }
        Ok(accepted)
    }

    /// Sends `DELETE authentication/session` for the current session.
    async fn delete_session(&self) -> Result<bool, TmdbError> {
        let (url, body) = {
            let session = self.session.read().await;
            let url = self.endpoints.resolve(&Endpoint::DeleteSession, &session)?;
            let body = LogoutRequest {
                session_id: session.session_id.clone(),
            };
            (url, body)
        };
        let response: LogoutResponse =
            transport::submit(&self.transport, url, HttpMethod::Delete, &body).await?;
        Ok(response.success)
    }
}

impl<T: Transport + Sync> TmdbApi for TmdbClient<T> {
    #[instrument(skip_all)]
    async fn request_token(&self) -> Result<String, TmdbError> {
        let (url, _) = self
            .resolve_step(AuthStep::RequestToken, Endpoint::RequestToken)
            .await?;
        let response: RequestTokenResponse = transport::fetch(&self.transport, url).await?;

        self.session
            .write()
            .await
            .token_issued(response.request_token.clone());
        tracing::info!(expires_at = ?response.expires_at, "Request token issued");
        Ok(response.request_token)
    }

    #[instrument(skip_all)]
    async fn validate_with_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, TmdbError> {
        let (url, session) = self
            .resolve_step(AuthStep::ValidateWithLogin, Endpoint::ValidateWithLogin)
            .await?;
        let body = LoginRequest {
            username: String::from(username),
            password: String::from(password),
            request_token: session.request_token,
        };
        let response: RequestTokenResponse =
            transport::submit(&self.transport, url, HttpMethod::Post, &body).await?;

        self.session
            .write()
            .await
            .logged_in(response.request_token.clone());
        tracing::info!("Request token validated with login");
        Ok(response.request_token)
    }

    #[instrument(skip_all)]
    async fn create_session(&self) -> Result<String, TmdbError> {
        let (url, session) = self
            .resolve_step(AuthStep::CreateSession, Endpoint::CreateSession)
            .await?;
        let body = SessionRequest {
            request_token: session.request_token,
        };
        let response: SessionResponse =
            transport::submit(&self.transport, url, HttpMethod::Post, &body).await?;

        self.session
            .write()
            .await
            .session_created(response.session_id.clone());
        tracing::info!("Session created");
        Ok(response.session_id)
    }

    #[instrument(skip_all)]
    async fn web_auth_url(&self) -> Result<Url, TmdbError> {
        let (url, _) = self
            .resolve_step(AuthStep::WebAuthorization, Endpoint::WebAuth)
            .await?;
        Ok(url)
    }

    #[instrument(skip_all)]
    async fn log_out(&self) {
        let has_session = self.session.read().await.is_authenticated();
        if has_session {
            match self.delete_session().await {
                Ok(true) => tracing::info!("Session deleted"),
                Ok(false) => tracing::warn!("TMDB did not confirm session deletion"),
                Err(e) => tracing::warn!(error = %e, "Failed to delete session, clearing locally"),
            }
        }
        self.session.write().await.clear();
    }

    #[instrument(skip_all)]
    async fn account(&self) -> Result<Account, TmdbError> {
        let url = self.resolve(Endpoint::Account).await?;
        let account: Account = transport::fetch(&self.transport, url).await?;
        self.session.write().await.account_id = account.id;
        tracing::debug!(account_id = account.id, "Account resolved");
        Ok(account)
    }

    #[instrument(skip_all)]
    async fn search(&self, query: &str) -> Result<Vec<Movie>, TmdbError> {
        let url = self.resolve(Endpoint::SearchMovies { query }).await?;
        let response: MovieResults = transport::fetch(&self.transport, url).await?;
        Ok(response.results)
    }

    #[instrument(skip_all)]
    async fn watchlist(&self) -> Result<Vec<Movie>, TmdbError> {
        self.movie_list(Endpoint::Watchlist).await
    }

    #[instrument(skip_all)]
    async fn favorites(&self) -> Result<Vec<Movie>, TmdbError> {
        self.movie_list(Endpoint::Favorites).await
    }

    #[instrument(skip_all)]
    async fn mark_watchlist(&self, movie_id: u64, watchlist: bool) -> Result<bool, TmdbError> {
        let body = MarkWatchlistRequest {
            media_type: MediaType::Movie,
            media_id: movie_id,
            watchlist,
        };
        self.mark(Endpoint::MarkWatchlist, &body).await
    }

    #[instrument(skip_all)]
    async fn mark_favorite(&self, movie_id: u64, favorite: bool) -> Result<bool, TmdbError> {
        let body = MarkFavoriteRequest {
            media_type: MediaType::Movie,
            media_id: movie_id,
            favorite,
        };
        self.mark(Endpoint::MarkFavorite, &body).await
    }

    #[instrument(skip_all)]
    async fn poster_image(&self, path: &str) -> Result<Vec<u8>, TmdbError> {
        let url = self
            .endpoints
            .resolve(&Endpoint::PosterImage { path }, &SessionState::default())?;
        transport::fetch_bytes(&self.transport, url).await
    }
}
