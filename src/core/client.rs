use crate::config::EnvConfig;
use crate::domain::model::{FollowOp, Relation, UserRecord};
use crate::domain::ports::Delay;
use crate::utils::error::{Result, SyncError};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use std::collections::HashSet;
use std::time::Duration;

pub const PER_PAGE: u32 = 100;
pub const MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);
pub const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);

/// Thin client over the GitHub user-relationship endpoints: paginated
/// listing of followers/following, and the follow/unfollow mutations.
pub struct GithubClient {
    http: Client,
    api_base: String,
    token: String,
    username: String,
}

impl GithubClient {
    pub fn new(config: &EnvConfig) -> Self {
        Self {
            // GitHub rejects requests without a User-Agent.
            http: Client::builder()
                .user_agent(concat!("follow-sync/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            username: config.username.clone(),
        }
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.token)
    }

    /// Fetches every page of the given relation and returns the flattened
    /// login set. Pagination ends at the first empty page.
    pub async fn list_users<D: Delay>(
        &self,
        relation: Relation,
        delay: &D,
    ) -> Result<HashSet<String>> {
        let mut users = HashSet::new();
        let mut page = 1u32;

        loop {
            let records = self.fetch_page(relation, page, delay).await?;
            if records.is_empty() {
                break;
            }
            for record in records {
                match record.login {
                    Some(login) => {
                        users.insert(login);
                    }
                    None => {
                        tracing::warn!(
                            "Skipping {} record without a login on page {}",
                            relation,
                            page
                        );
                    }
                }
            }
            page += 1;
        }

        tracing::info!("Fetched {} {} for {}", users.len(), relation, self.username);
        Ok(users)
    }

    /// One page of a relation listing, retried up to MAX_ATTEMPTS on
    /// transport errors and non-2xx statuses. Exhaustion is fatal: a
    /// partial set would corrupt the reconciliation downstream.
    async fn fetch_page<D: Delay>(
        &self,
        relation: Relation,
        page: u32,
        delay: &D,
    ) -> Result<Vec<UserRecord>> {
        let url = format!("{}/users/{}/{}", self.api_base, self.username, relation);

        for attempt in 1..=MAX_ATTEMPTS {
            tracing::debug!("GET {} page {} (attempt {}/{})", url, page, attempt, MAX_ATTEMPTS);
            let result = self
                .http
                .get(&url)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
                .header(AUTHORIZATION, self.auth_header())
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.json::<Vec<UserRecord>>().await?);
                }
                Ok(response) => {
                    tracing::warn!(
                        "{} page {} returned {} (attempt {}/{})",
                        relation,
                        page,
                        response.status(),
                        attempt,
                        MAX_ATTEMPTS
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "{} page {} request failed: {} (attempt {}/{})",
                        relation,
                        page,
                        e,
                        attempt,
                        MAX_ATTEMPTS
                    );
                }
            }

            if attempt < MAX_ATTEMPTS {
                delay.sleep(RETRY_BACKOFF).await;
            }
        }

        Err(SyncError::FetchError {
            message: format!(
                "giving up on {} page {} after {} attempts",
                relation, page, MAX_ATTEMPTS
            ),
        })
    }

    /// Follows or unfollows a single account, retrying up to MAX_ATTEMPTS.
    /// 204 is the only success signal; 403 means rate limited and gets the
    /// long backoff. Never errors past this boundary: the outcome is a
    /// boolean, and the caller moves on to the next account either way.
    pub async fn set_following<D: Delay>(&self, login: &str, op: FollowOp, delay: &D) -> bool {
        let url = format!("{}/user/following/{}", self.api_base, login);

        for attempt in 1..=MAX_ATTEMPTS {
            let request = match op {
                FollowOp::Follow => self.http.put(&url),
                FollowOp::Unfollow => self.http.delete(&url),
            };

            match request.header(AUTHORIZATION, self.auth_header()).send().await {
                Ok(response) if response.status() == StatusCode::NO_CONTENT => {
                    return true;
                }
                Ok(response) if response.status() == StatusCode::FORBIDDEN => {
                    tracing::warn!(
                        "Rate limit hit while trying to {} {} (attempt {}/{})",
                        op.as_str(),
                        login,
                        attempt,
                        MAX_ATTEMPTS
                    );
                    if attempt < MAX_ATTEMPTS {
                        delay.sleep(RATE_LIMIT_BACKOFF).await;
                    }
                }
                Ok(response) => {
                    tracing::warn!(
                        "{} {} returned {} (attempt {}/{})",
                        op.as_str(),
                        login,
                        response.status(),
                        attempt,
                        MAX_ATTEMPTS
                    );
                    if attempt < MAX_ATTEMPTS {
                        delay.sleep(RETRY_BACKOFF).await;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "{} {} request failed: {} (attempt {}/{})",
                        op.as_str(),
                        login,
                        e,
                        attempt,
                        MAX_ATTEMPTS
                    );
                    if attempt < MAX_ATTEMPTS {
                        delay.sleep(RETRY_BACKOFF).await;
                    }
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use std::sync::Mutex;

    /// Records requested sleep durations instead of waiting.
    #[derive(Default)]
    struct RecordingDelay {
        slept: Mutex<Vec<Duration>>,
    }

    impl RecordingDelay {
        fn durations(&self) -> Vec<Duration> {
            self.slept.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    fn client_for(server: &MockServer) -> GithubClient {
        let config = EnvConfig {
            token: "test-token".to_string(),
            username: "octocat".to_string(),
            api_base: server.base_url(),
            webhook_url: None,
        };
        GithubClient::new(&config)
    }

    #[tokio::test]
    async fn test_list_users_paginates_until_empty_page() {
        let server = MockServer::start();
        let page1 = server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/followers")
                .query_param("per_page", "100")
                .query_param("page", "1");
            then.status(200)
                .json_body(serde_json::json!([{"login": "alice"}, {"login": "bob"}]));
        });
        let page2 = server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/followers")
                .query_param("page", "2");
            then.status(200).json_body(serde_json::json!([{"login": "carol"}]));
        });
        let page3 = server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/followers")
                .query_param("page", "3");
            then.status(200).json_body(serde_json::json!([]));
        });

        let client = client_for(&server);
        let delay = RecordingDelay::default();
        let users = client.list_users(Relation::Followers, &delay).await.unwrap();

        page1.assert();
        page2.assert();
        page3.assert();
        assert_eq!(
            users,
            HashSet::from(["alice".to_string(), "bob".to_string(), "carol".to_string()])
        );
        assert!(delay.durations().is_empty());
    }

    #[tokio::test]
    async fn test_list_users_deduplicates_page_overlap() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/following")
                .query_param("page", "1");
            then.status(200)
                .json_body(serde_json::json!([{"login": "alice"}, {"login": "bob"}]));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/following")
                .query_param("page", "2");
            then.status(200)
                .json_body(serde_json::json!([{"login": "bob"}, {"login": "carol"}]));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/following")
                .query_param("page", "3");
            then.status(200).json_body(serde_json::json!([]));
        });

        let client = client_for(&server);
        let users = client
            .list_users(Relation::Following, &RecordingDelay::default())
            .await
            .unwrap();

        assert_eq!(users.len(), 3);
    }

    #[tokio::test]
    async fn test_list_users_skips_records_without_login() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/followers")
                .query_param("page", "1");
            then.status(200)
                .json_body(serde_json::json!([{"login": "alice"}, {"id": 42}]));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/followers")
                .query_param("page", "2");
            then.status(200).json_body(serde_json::json!([]));
        });

        let client = client_for(&server);
        let users = client
            .list_users(Relation::Followers, &RecordingDelay::default())
            .await
            .unwrap();

        assert_eq!(users, HashSet::from(["alice".to_string()]));
    }

    #[tokio::test]
    async fn test_list_users_sends_token_header() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/followers")
                .header("authorization", "token test-token");
            then.status(200).json_body(serde_json::json!([]));
        });

        let client = client_for(&server);
        client
            .list_users(Relation::Followers, &RecordingDelay::default())
            .await
            .unwrap();

        page.assert();
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal_after_retries() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET).path("/users/octocat/followers");
            then.status(500);
        });

        let client = client_for(&server);
        let delay = RecordingDelay::default();
        let result = client.list_users(Relation::Followers, &delay).await;

        page.assert_hits(3);
        assert!(matches!(result, Err(SyncError::FetchError { .. })));
        assert_eq!(delay.durations(), vec![RETRY_BACKOFF, RETRY_BACKOFF]);
    }

    #[tokio::test]
    async fn test_set_following_success_on_first_attempt() {
        let server = MockServer::start();
        let put = server.mock(|when, then| {
            when.method(PUT).path("/user/following/alice");
            then.status(204);
        });

        let client = client_for(&server);
        let delay = RecordingDelay::default();
        let ok = client.set_following("alice", FollowOp::Follow, &delay).await;

        put.assert();
        assert!(ok);
        assert!(delay.durations().is_empty());
    }

    #[tokio::test]
    async fn test_unfollow_uses_delete() {
        let server = MockServer::start();
        let del = server.mock(|when, then| {
            when.method(DELETE).path("/user/following/bob");
            then.status(204);
        });

        let client = client_for(&server);
        let ok = client
            .set_following("bob", FollowOp::Unfollow, &RecordingDelay::default())
            .await;

        del.assert();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_persistent_server_error_gives_up_after_three_attempts() {
        let server = MockServer::start();
        let put = server.mock(|when, then| {
            when.method(PUT).path("/user/following/alice");
            then.status(500);
        });

        let client = client_for(&server);
        let delay = RecordingDelay::default();
        let ok = client.set_following("alice", FollowOp::Follow, &delay).await;

        put.assert_hits(3);
        assert!(!ok);
        // Two backoffs between three attempts, none after the last.
        assert_eq!(delay.durations(), vec![RETRY_BACKOFF, RETRY_BACKOFF]);
    }

    /// Delay that flips the server from rate-limiting to accepting when
    /// the first backoff is requested, so the next attempt sees a 204.
    struct RateLimitLiftingDelay<'a> {
        slept: Mutex<Vec<Duration>>,
        rate_limited: Mutex<Option<httpmock::Mock<'a>>>,
        server: &'a MockServer,
    }

    #[async_trait]
    impl Delay for RateLimitLiftingDelay<'_> {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
            if let Some(mut mock) = self.rate_limited.lock().unwrap().take() {
                mock.delete();
                let _ = self.server.mock(|when, then| {
                    when.method(DELETE).path("/user/following/alice");
                    then.status(204);
                });
            }
        }
    }

    #[tokio::test]
    async fn test_rate_limit_then_success_on_second_attempt() {
        let server = MockServer::start();
        let rate_limited = server.mock(|when, then| {
            when.method(DELETE).path("/user/following/alice");
            then.status(403);
        });

        let client = client_for(&server);
        let delay = RateLimitLiftingDelay {
            slept: Mutex::new(Vec::new()),
            rate_limited: Mutex::new(Some(rate_limited)),
            server: &server,
        };
        let ok = client
            .set_following("alice", FollowOp::Unfollow, &delay)
            .await;

        assert!(ok);
        // One long backoff after the 403, then the 204 ends the loop.
        assert_eq!(*delay.slept.lock().unwrap(), vec![RATE_LIMIT_BACKOFF]);
    }

    #[tokio::test]
    async fn test_rate_limit_gets_long_backoff() {
        let server = MockServer::start();
        let del = server.mock(|when, then| {
            when.method(DELETE).path("/user/following/alice");
            then.status(403);
        });

        let client = client_for(&server);
        let delay = RecordingDelay::default();
        let ok = client
            .set_following("alice", FollowOp::Unfollow, &delay)
            .await;

        del.assert_hits(3);
        assert!(!ok);
        assert_eq!(
            delay.durations(),
            vec![RATE_LIMIT_BACKOFF, RATE_LIMIT_BACKOFF]
        );
    }
}
