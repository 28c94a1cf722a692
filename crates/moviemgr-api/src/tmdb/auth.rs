//! Authentication flows built from the individual `TmdbApi` steps.

use tracing::instrument;
use url::Url;

use super::api::TmdbApi;
use super::error::TmdbError;

/// Signs in with account credentials.
///
/// Runs request token, login validation, and session creation in order.
/// Each step starts only after the previous one succeeded; the first
/// failure is returned and no later step runs.
///
/// # Errors
///
/// Returns the error of the first failing step.
#[instrument(skip_all)]
pub async fn login(
    api: &(impl TmdbApi + Sync),
    username: &str,
    password: &str,
) -> Result<String, TmdbError> {
    api.request_token().await?;
    api.validate_with_login(username, password).await?;
    let session_id = api.create_session().await?;
    tracing::info!("Signed in");
    Ok(session_id)
}

/// Starts website authorization.
///
/// Requests a token and returns the URL where the user approves it.
/// Once approved, call `create_session` to finish.
///
/// # Errors
///
/// Returns an error if the token request fails.
#[instrument(skip_all)]
pub async fn begin_web_authorization(api: &(impl TmdbApi + Sync)) -> Result<Url, TmdbError> {
    api.request_token().await?;
    api.web_auth_url().await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::tmdb::types::{Account, Movie};

    /// Which step of the mock should fail.
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum FailAt {
        Nothing,
        RequestToken,
        Login,
        Session,
    }

    /// Mock API that counts calls per authentication step.
    struct MockTmdbApi {
        fail_at: FailAt,
        token_calls: AtomicU32,
        login_calls: AtomicU32,
        session_calls: AtomicU32,
    }

    impl MockTmdbApi {
        fn new(fail_at: FailAt) -> Self {
            Self {
                fail_at,
                token_calls: AtomicU32::new(0),
                login_calls: AtomicU32::new(0),
                session_calls: AtomicU32::new(0),
            }
        }

        fn step(&self, counter: &AtomicU32, step: FailAt, value: &str) -> Result<String, TmdbError> {
            counter.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == step {
                Err(TmdbError::RemoteApi {
                    status_code: 30,
                    status_message: String::from("Invalid username and/or password"),
                })
            } else {
                Ok(String::from(value))
            }
        }

        fn counts(&self) -> (u32, u32, u32) {
            (
                self.token_calls.load(Ordering::SeqCst),
                self.login_calls.load(Ordering::SeqCst),
                self.session_calls.load(Ordering::SeqCst),
            )
        }
    }

    impl TmdbApi for MockTmdbApi {
        async fn request_token(&self) -> Result<String, TmdbError> {
            self.step(&self.token_calls, FailAt::RequestToken, "abc")
        }

        async fn validate_with_login(
            &self,
            _username: &str,
            _password: &str,
        ) -> Result<String, TmdbError> {
            self.step(&self.login_calls, FailAt::Login, "def")
        }

        async fn create_session(&self) -> Result<String, TmdbError> {
            self.step(&self.session_calls, FailAt::Session, "xyz")
        }

        async fn web_auth_url(&self) -> Result<Url, TmdbError> {
            Ok(Url::parse("https://www.themoviedb.org/authenticate/abc").unwrap())
        }

        async fn log_out(&self) {}

        async fn account(&self) -> Result<Account, TmdbError> {
            Ok(Account {
                id: 1,
                username: String::from("user"),
                name: None,
            })
        }

        async fn search(&self, _query: &str) -> Result<Vec<Movie>, TmdbError> {
            Ok(vec![])
        }

        async fn watchlist(&self) -> Result<Vec<Movie>, TmdbError> {
            Ok(vec![])
        }

        async fn favorites(&self) -> Result<Vec<Movie>, TmdbError> {
            Ok(vec![])
        }

        async fn mark_watchlist(&self, _movie_id: u64, _watchlist: bool) -> Result<bool, TmdbError> {
            Ok(true)
        }

        async fn mark_favorite(&self, _movie_id: u64, _favorite: bool) -> Result<bool, TmdbError> {
            Ok(true)
        }

        async fn poster_image(&self, _path: &str) -> Result<Vec<u8>, TmdbError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_login_runs_all_steps() {
        // Arrange
        let mock = MockTmdbApi::new(FailAt::Nothing);

        // Act
        let session_id = login(&mock, "user", "pass").await.unwrap();

        // Assert
        assert_eq!(session_id, "xyz");
        assert_eq!(mock.counts(), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_login_stops_after_token_failure() {
        // Arrange
        let mock = MockTmdbApi::new(FailAt::RequestToken);

        // Act
        let result = login(&mock, "user", "pass").await;

        // Assert
        assert!(result.is_err());
        assert_eq!(mock.counts(), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_login_stops_after_validation_failure() {
        // Arrange
        let mock = MockTmdbApi::new(FailAt::Login);

        // Act
        let result = login(&mock, "user", "wrong").await;

        // Assert
        assert_eq!(result.unwrap_err().status_code(), Some(30));
        assert_eq!(mock.counts(), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_login_reports_session_failure() {
        // Arrange
        let mock = MockTmdbApi::new(FailAt::Session);

        // Act
        let result = login(&mock, "user", "pass").await;

        // Assert
        assert!(result.is_err());
        assert_eq!(mock.counts(), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_begin_web_authorization() {
        // Arrange
        let mock = MockTmdbApi::new(FailAt::Nothing);

        // Act
        let url = begin_web_authorization(&mock).await.unwrap();

        // Assert
        assert!(url.as_str().ends_with("/authenticate/abc"));
        assert_eq!(mock.counts(), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_begin_web_authorization_token_failure() {
        // Arrange
        let mock = MockTmdbApi::new(FailAt::RequestToken);

        // Act
        let result = begin_web_authorization(&mock).await;

        // Assert
        assert!(result.is_err());
    }
}
