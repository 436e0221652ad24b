pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::discord::DiscordNotifier;
pub use config::EnvConfig;
pub use core::{GithubClient, SyncEngine};
pub use domain::model::{FollowOp, Relation, RunReport};
pub use domain::ports::{Delay, NoopNotifier, Notifier, TokioDelay};
pub use utils::error::{Result, SyncError};
