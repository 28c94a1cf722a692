//! TMDB API request bodies and response types.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

// --- Movies ---

/// A movie as returned by search and account list endpoints.
///
/// Equality and hashing use `id` only.
#[derive(Debug, Clone, Deserialize)]
pub struct Movie {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Poster image path (e.g. `/abc.jpg`).
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Original title.
    #[serde(default)]
    pub original_title: Option<String>,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Release date (YYYY-MM-DD, may be empty).
    #[serde(default)]
    pub release_date: Option<String>,
}

impl PartialEq for Movie {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Movie {}

impl Hash for Movie {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Response from `search/movie` and `account/{id}/{list}/movies`.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieResults {
    /// Current page number.
    #[serde(default)]
    pub page: u32,
    /// Results in server order.
    pub results: Vec<Movie>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of results.
    #[serde(default)]
    pub total_results: u32,
}

// --- Status envelope ---

/// TMDB status envelope.
///
/// Returned as the error body of failed calls and as the acknowledgment of
/// watchlist/favorite toggles.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// TMDB status code.
    pub status_code: u32,
    /// Status message.
    pub status_message: String,
    /// Success flag (absent on some acknowledgments).
    #[serde(default)]
    pub success: Option<bool>,
}

// --- Authentication ---

/// Response from `authentication/token/new` and `authentication/token/validate_with_login`.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestTokenResponse {
    /// Success flag.
    pub success: bool,
    /// Expiry timestamp (e.g. `2024-01-01 00:00:00 UTC`).
    #[serde(default)]
    pub expires_at: Option<String>,
    /// The request token.
    pub request_token: String,
}

/// Response from `authentication/session/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    /// Success flag.
    pub success: bool,
    /// The new session id.
    pub session_id: String,
}

/// Response from `DELETE authentication/session`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogoutResponse {
    /// Success flag.
    pub success: bool,
}

/// Body for `authentication/token/validate_with_login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Request token to validate.
    pub request_token: String,
}

/// Body for `authentication/session/new`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRequest {
    /// Validated (or web-approved) request token.
    pub request_token: String,
}

/// Body for `DELETE authentication/session`.
#[derive(Debug, Clone, Serialize)]
pub struct LogoutRequest {
    /// Session to delete.
    pub session_id: String,
}

// --- Account ---

/// Response from `account`.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// TMDB account id.
    pub id: u64,
    /// Account username.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

// --- Watchlist / favorite toggles ---

/// Media type accepted by the account toggle endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// A movie.
    Movie,
}

/// Body for `account/{id}/watchlist`.
#[derive(Debug, Clone, Serialize)]
pub struct MarkWatchlistRequest {
    /// Always `movie`.
    pub media_type: MediaType,
    /// TMDB movie ID.
    pub media_id: u64,
    /// `true` adds, `false` removes.
    pub watchlist: bool,
}

/// Body for `account/{id}/favorite`.
#[derive(Debug, Clone, Serialize)]
pub struct MarkFavoriteRequest {
    /// Always `movie`.
    pub media_type: MediaType,
    /// TMDB movie ID.
    pub media_id: u64,
    /// `true` adds, `false` removes.
    pub favorite: bool,
}
