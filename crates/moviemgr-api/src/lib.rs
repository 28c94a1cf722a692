//! API client library for moviemgr.
//!
//! Provides a TMDB API v3 client with the request-token / login / session
//! authentication flow and account-scoped watchlist and favorite lists.

/// TMDB API client.
pub mod tmdb;
