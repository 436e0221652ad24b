pub mod client;
pub mod engine;

pub use crate::domain::model::{FollowOp, Relation, RunReport, UserRecord};
pub use crate::domain::ports::{Delay, Notifier};
pub use crate::utils::error::Result;
pub use client::GithubClient;
pub use engine::SyncEngine;
