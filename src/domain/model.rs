use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Which side of the relationship graph to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Followers,
    Following,
}

impl Relation {
    /// API path segment under `/users/{username}/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Followers => "followers",
            Relation::Following => "following",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State-changing operation against `/user/following/{login}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOp {
    Follow,
    Unfollow,
}

impl FollowOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowOp::Follow => "follow",
            FollowOp::Unfollow => "unfollow",
        }
    }

    /// Past-tense verb for progress lines ("Followed x.").
    pub fn verb(&self) -> &'static str {
        match self {
            FollowOp::Follow => "Followed",
            FollowOp::Unfollow => "Unfollowed",
        }
    }
}

/// One record of a followers/following page. Only the login matters;
/// records without one are skipped by the lister.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub login: Option<String>,
}

/// Accumulated outcome of a single run, consumed by the notifier.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub followed: Vec<String>,
    pub unfollowed: Vec<String>,
    pub failed_follows: Vec<String>,
    pub failed_unfollows: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            followed: Vec::new(),
            unfollowed: Vec::new(),
            failed_follows: Vec::new(),
            failed_unfollows: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn record(&mut self, op: FollowOp, login: &str, succeeded: bool) {
        let bucket = match (op, succeeded) {
            (FollowOp::Follow, true) => &mut self.followed,
            (FollowOp::Follow, false) => &mut self.failed_follows,
            (FollowOp::Unfollow, true) => &mut self.unfollowed,
            (FollowOp::Unfollow, false) => &mut self.failed_unfollows,
        };
        bucket.push(login.to_string());
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_follows.is_empty() || !self.failed_unfollows.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.followed.is_empty()
            && self.unfollowed.is_empty()
            && self.failed_follows.is_empty()
            && self.failed_unfollows.is_empty()
    }

    /// One-line summary of the non-empty categories, e.g.
    /// "Followed: 2, Failed to unfollow: 1".
    pub fn summary(&self) -> String {
        let categories = [
            (&self.followed, "Followed"),
            (&self.unfollowed, "Unfollowed"),
            (&self.failed_follows, "Failed to follow"),
            (&self.failed_unfollows, "Failed to unfollow"),
        ];

        categories
            .iter()
            .filter(|(users, _)| !users.is_empty())
            .map(|(users, label)| format!("{}: {}", label, users.len()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Webhook payload shape: one `{count, users}` object per category.
    pub fn to_json(&self) -> serde_json::Value {
        fn category(users: &[String]) -> serde_json::Value {
            serde_json::json!({
                "count": users.len(),
                "users": users,
            })
        }

        serde_json::json!({
            "generated_at": self.generated_at,
            "followed": category(&self.followed),
            "unfollowed": category(&self.unfollowed),
            "failed_follows": category(&self.failed_follows),
            "failed_unfollows": category(&self.failed_unfollows),
        })
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_routes_to_correct_bucket() {
        let mut report = RunReport::new();
        report.record(FollowOp::Follow, "alice", true);
        report.record(FollowOp::Follow, "bob", false);
        report.record(FollowOp::Unfollow, "carol", true);
        report.record(FollowOp::Unfollow, "dave", false);

        assert_eq!(report.followed, vec!["alice"]);
        assert_eq!(report.failed_follows, vec!["bob"]);
        assert_eq!(report.unfollowed, vec!["carol"]);
        assert_eq!(report.failed_unfollows, vec!["dave"]);
        assert!(report.has_failures());
        assert!(!report.is_empty());
    }

    #[test]
    fn test_summary_skips_empty_categories() {
        let mut report = RunReport::new();
        report.record(FollowOp::Follow, "alice", true);
        report.record(FollowOp::Follow, "bob", true);
        report.record(FollowOp::Unfollow, "dave", false);

        assert_eq!(report.summary(), "Followed: 2, Failed to unfollow: 1");
    }

    #[test]
    fn test_to_json_category_shape() {
        let mut report = RunReport::new();
        report.record(FollowOp::Follow, "alice", true);

        let json = report.to_json();
        assert_eq!(json["followed"]["count"], 1);
        assert_eq!(json["followed"]["users"][0], "alice");
        assert_eq!(json["unfollowed"]["count"], 0);
        assert!(json["generated_at"].is_string());
    }

    #[test]
    fn test_empty_report() {
        let report = RunReport::new();
        assert!(report.is_empty());
        assert!(!report.has_failures());
        assert_eq!(report.summary(), "");
    }
}
