use crate::core::client::GithubClient;
use crate::domain::model::{FollowOp, Relation, RunReport};
use crate::domain::ports::{Delay, Notifier};
use crate::utils::error::Result;
use std::collections::HashSet;
use std::time::Duration;

/// Pause between consecutive mutations, independent of the retry
/// backoffs inside the client.
pub const MUTATION_THROTTLE: Duration = Duration::from_secs(2);

/// Drives the two reconciliation workflows: follow back accounts that
/// follow us, then unfollow accounts that don't reciprocate.
pub struct SyncEngine<D: Delay, N: Notifier> {
    client: GithubClient,
    delay: D,
    notifier: N,
}

impl<D: Delay, N: Notifier> SyncEngine<D, N> {
    pub fn new(client: GithubClient, delay: D, notifier: N) -> Self {
        Self {
            client,
            delay,
            notifier,
        }
    }

    /// Runs both workflows once, in order, then ships the consolidated
    /// report. Fetch failures abort; mutation failures are recorded and
    /// the run continues.
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::new();

        self.follow_back(&mut report).await?;
        self.prune_non_followers(&mut report).await?;

        if !report.is_empty() {
            self.notifier.send_report(&report).await;
        }
        Ok(report)
    }

    /// Follows every account in `followers − following`.
    pub async fn follow_back(&self, report: &mut RunReport) -> Result<()> {
        let following = self.client.list_users(Relation::Following, &self.delay).await?;
        let followers = self.client.list_users(Relation::Followers, &self.delay).await?;
        let targets = sorted_difference(&followers, &following);

        if targets.is_empty() {
            println!("No one left to follow back");
            self.notifier.notify("No one to follow back today.").await;
            return Ok(());
        }

        println!("\n{} are left to follow back\n", targets.len());
        println!("List of users to follow:");
        self.process(&targets, FollowOp::Follow, report).await;
        println!("\nFinished processing all non-following.");
        Ok(())
    }

    /// Unfollows every account in `following − followers`. Fetches fresh
    /// snapshots: the follow-back pass may have changed the following set.
    pub async fn prune_non_followers(&self, report: &mut RunReport) -> Result<()> {
        let following = self.client.list_users(Relation::Following, &self.delay).await?;
        let followers = self.client.list_users(Relation::Followers, &self.delay).await?;
        let targets = sorted_difference(&following, &followers);

        if targets.is_empty() {
            println!("You don't follow anyone who doesn't follow you back.");
            self.notifier.notify("No one to unfollow today.").await;
            return Ok(());
        }

        println!("\nYou follow {} people who don't follow you back.", targets.len());
        println!("List of non-followers:");
        self.process(&targets, FollowOp::Unfollow, report).await;
        println!("\nFinished processing all non-followers.");
        Ok(())
    }

    async fn process(&self, targets: &[String], op: FollowOp, report: &mut RunReport) {
        for (index, login) in targets.iter().enumerate() {
            let succeeded = self.client.set_following(login, op, &self.delay).await;
            let line = if succeeded {
                format!("{} {}.", op.verb(), login)
            } else {
                format!("Failed to {} {}.", op.as_str(), login)
            };
            println!("{}. {}", index + 1, line);
            self.notifier.notify(&line).await;
            report.record(op, login, succeeded);

            // Throttle regardless of outcome.
            self.delay.sleep(MUTATION_THROTTLE).await;
        }
    }
}

/// Set difference in lexicographic order, so runs and tests see a stable
/// iteration order.
fn sorted_difference(left: &HashSet<String>, right: &HashSet<String>) -> Vec<String> {
    let mut diff: Vec<String> = left.difference(right).cloned().collect();
    diff.sort();
    diff
}
