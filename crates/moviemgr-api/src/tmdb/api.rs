//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use url::Url;

use super::error::TmdbError;
use super::types::{Account, Movie};

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Requests a fresh request token and stores it in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if a session is already active, or if the HTTP
    /// request or JSON decoding fails.
    async fn request_token(&self) -> Result<String, TmdbError>;

    /// Validates the current request token with account credentials.
    ///
    /// The token returned by the server replaces the stored one.
    ///
    /// # Errors
    ///
    /// Returns an error if no unvalidated token is held, or if the HTTP
    /// request or JSON decoding fails.
    async fn validate_with_login(&self, username: &str, password: &str)
    -> Result<String, TmdbError>;

    /// Exchanges the current request token for a session id.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is held, a session is already active,
    /// or the HTTP request or JSON decoding fails.
    async fn create_session(&self) -> Result<String, TmdbError>;

    /// Builds the website authorization URL for the current request token.
    ///
    /// # Errors
    ///
    /// Returns an error unless a freshly issued token is held.
    async fn web_auth_url(&self) -> Result<Url, TmdbError>;

    /// Deletes the remote session and always clears local credentials.
    async fn log_out(&self);

    /// Fetches the signed-in account and stores its id in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn account(&self) -> Result<Account, TmdbError>;

    /// Searches movies by free-text query.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn search(&self, query: &str) -> Result<Vec<Movie>, TmdbError>;

    /// Fetches the account watchlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn watchlist(&self) -> Result<Vec<Movie>, TmdbError>;

    /// Fetches the account favorites.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn favorites(&self) -> Result<Vec<Movie>, TmdbError>;

    /// Adds (`true`) or removes (`false`) a movie on the watchlist.
    ///
    /// Returns whether the server acknowledged the change.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or no acknowledgment
    /// could be decoded.
    async fn mark_watchlist(&self, movie_id: u64, watchlist: bool) -> Result<bool, TmdbError>;

    /// Adds (`true`) or removes (`false`) a movie on the favorites.
    ///
    /// Returns whether the server acknowledged the change.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or no acknowledgment
    /// could be decoded.
    async fn mark_favorite(&self, movie_id: u64, favorite: bool) -> Result<bool, TmdbError>;

    /// Downloads a poster image from the CDN.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or returns a non-2xx status.
    async fn poster_image(&self, path: &str) -> Result<Vec<u8>, TmdbError>;
}
