//! Endpoint resolution for the TMDB API, website, and image CDN.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use super::error::TmdbError;
use super::session::SessionState;

/// Default base URL for TMDB API v3.
pub(crate) const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default base URL of the human-facing TMDB website.
pub(crate) const DEFAULT_WEB_BASE_URL: &str = "https://www.themoviedb.org/";

/// Default base URL of the TMDB image CDN.
pub(crate) const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";

/// Default poster width segment.
pub(crate) const DEFAULT_POSTER_WIDTH: &str = "w500";

/// Default redirect URI passed to the website authorization page.
pub(crate) const DEFAULT_REDIRECT_TO: &str = "themoviemanager:authenticate";

/// Bytes escaped in query components: everything except RFC 3986 unreserved characters.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A remote operation and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `GET authentication/token/new`.
    RequestToken,
    /// `POST authentication/token/validate_with_login`.
    ValidateWithLogin,
    /// `POST authentication/session/new`.
    CreateSession,
    /// `DELETE authentication/session`.
    DeleteSession,
    /// `GET account`.
    Account,
    /// `GET account/{id}/watchlist/movies`.
    Watchlist,
    /// `GET account/{id}/favorite/movies`.
    Favorites,
    /// `POST account/{id}/watchlist`.
    MarkWatchlist,
    /// `POST account/{id}/favorite`.
    MarkFavorite,
    /// `GET search/movie`.
    SearchMovies {
        /// Free-text query.
        query: &'a str,
    },
    /// Poster image on the CDN.
    PosterImage {
        /// Poster path as returned in `Movie::poster_path`.
        path: &'a str,
    },
    /// Website authorization page for the current request token.
    WebAuth,
}

impl Endpoint<'_> {
    /// Whether the endpoint needs the current `session_id`.
    #[must_use]
    pub const fn is_account_scoped(&self) -> bool {
        matches!(
            self,
            Self::Account
                | Self::Watchlist
                | Self::Favorites
                | Self::MarkWatchlist
                | Self::MarkFavorite
        )
    }

    /// API path relative to the base URL, or `None` for non-API origins.
    fn api_path(&self, account_id: u64) -> Option<String> {
        let path = match self {
            Self::RequestToken => String::from("authentication/token/new"),
            Self::ValidateWithLogin => String::from("authentication/token/validate_with_login"),
            Self::CreateSession => String::from("authentication/session/new"),
            Self::DeleteSession => String::from("authentication/session"),
            Self::Account => String::from("account"),
            Self::Watchlist => format!("account/{account_id}/watchlist/movies"),
            Self::Favorites => format!("account/{account_id}/favorite/movies"),
            Self::MarkWatchlist => format!("account/{account_id}/watchlist"),
            Self::MarkFavorite => format!("account/{account_id}/favorite"),
            Self::SearchMovies { .. } => String::from("search/movie"),
            Self::PosterImage { .. } | Self::WebAuth => return None,
        };
        Some(path)
    }
}

/// Percent-encodes a query component.
#[must_use]
pub fn encode_query_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}

/// Builds fully-qualified URLs for `Endpoint`s.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct EndpointResolver {
    /// TMDB API base (ends with `/`).
    pub(crate) base_url: Url,
    /// Website base (ends with `/`).
    pub(crate) web_base_url: Url,
    /// Image CDN base (ends with `/`).
    pub(crate) image_base_url: Url,
    /// Poster width segment (e.g. `w500`).
    pub(crate) poster_width: String,
    /// Redirect URI handed to the website authorization page.
    pub(crate) redirect_to: String,
    /// API key appended to every API-origin URL.
    pub(crate) api_key: String,
}

impl EndpointResolver {
    /// Creates a resolver against the public TMDB hosts.
    ///
    /// # Errors
    ///
    /// Returns `TmdbError::Configuration` if a default URL fails to parse.
    pub fn with_defaults(api_key: impl Into<String>) -> Result<Self, TmdbError> {
        Ok(Self {
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            web_base_url: Url::parse(DEFAULT_WEB_BASE_URL)?,
            image_base_url: Url::parse(DEFAULT_IMAGE_BASE_URL)?,
            poster_width: String::from(DEFAULT_POSTER_WIDTH),
            redirect_to: String::from(DEFAULT_REDIRECT_TO),
            api_key: api_key.into(),
        })
    }

    /// Resolves `endpoint` against the current session.
    ///
    /// # Errors
    ///
    /// Returns `TmdbError::Configuration` if a component cannot be joined
    /// onto its base URL.
    pub fn resolve(&self, endpoint: &Endpoint<'_>, session: &SessionState) -> Result<Url, TmdbError> {
        match endpoint {
            Endpoint::PosterImage { path } => {
                let relative = format!("{}/{}", self.poster_width, path.trim_start_matches('/'));
                Ok(self.image_base_url.join(&relative)?)
            }
            Endpoint::WebAuth => {
                let relative = format!(
                    "authenticate/{}",
                    encode_query_component(&session.request_token)
                );
                let mut url = self.web_base_url.join(&relative)?;
                url.set_query(Some(&format!(
                    "redirect_to={}",
                    encode_query_component(&self.redirect_to)
                )));
                Ok(url)
            }
            _ => self.resolve_api(endpoint, session),
        }
    }

    fn resolve_api(&self, endpoint: &Endpoint<'_>, session: &SessionState) -> Result<Url, TmdbError> {
        let path = endpoint.api_path(session.account_id).ok_or_else(|| {
            TmdbError::Configuration(format!("{endpoint:?} is not an API endpoint"))
        })?;
        let mut url = self.base_url.join(&path)?;

        let mut params: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];
        if endpoint.is_account_scoped() {
            params.push(("session_id", session.session_id.as_str()));
        }
        if let Endpoint::SearchMovies { query } = endpoint {
            params.push(("query", *query));
        }

        let query = params
            .iter()
            .map(|(key, value)| format!("{key}={}", encode_query_component(value)))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
        Ok(url)
    }
}

/// Formats `url` for logs with credentials masked.
pub(crate) fn redact(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "api_key" || key == "session_id" {
                String::from("***")
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
