use crate::domain::model::RunReport;
use async_trait::async_trait;
use std::time::Duration;

/// Sleeping goes through this seam so tests run without real delays.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production delay backed by the tokio timer.
#[derive(Debug, Clone, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Outbound notification channel. Failures are the implementor's
/// problem; callers never abort a run over a notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
    async fn send_report(&self, report: &RunReport);
}

#[async_trait]
impl Notifier for Box<dyn Notifier> {
    async fn notify(&self, message: &str) {
        (**self).notify(message).await;
    }

    async fn send_report(&self, report: &RunReport) {
        (**self).send_report(report).await;
    }
}

/// Notifier used when no webhook is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _message: &str) {}

    async fn send_report(&self, _report: &RunReport) {}
}
