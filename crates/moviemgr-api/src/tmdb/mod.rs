//! TMDB API client module.
//!
//! Resolves API v3, image CDN, and website URLs, tracks the authentication
//! session, and decodes responses with a fallback to the TMDB status
//! envelope.

mod api;
pub mod auth;
mod client;
pub mod dispatch;
mod endpoints;
mod error;
mod session;
pub mod transport;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{ACCEPTED_MARK_CODES, TmdbClient, TmdbClientBuilder};
pub use dispatch::{CompletionLoop, CompletionQueue, IntoCompletion, completion_queue};
pub use endpoints::{Endpoint, EndpointResolver, encode_query_component};
#[allow(clippy::module_name_repetitions)]
pub use error::{TmdbError, TransportError};
pub use session::{AuthPhase, AuthStep, SessionState};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, LocalTransport, Transport};
pub use types::{
    Account, LoginRequest, LogoutRequest, LogoutResponse, MarkFavoriteRequest,
    MarkWatchlistRequest, MediaType, Movie, MovieResults, RequestTokenResponse, SessionRequest,
    SessionResponse, StatusResponse,
};
