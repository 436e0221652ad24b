use follow_sync::utils::logger;
use follow_sync::{
    DiscordNotifier, EnvConfig, GithubClient, NoopNotifier, Notifier, SyncEngine, TokioDelay,
};

#[tokio::main]
async fn main() {
    logger::init_cli_logger();

    let config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            eprintln!("💡 Set TOKEN and USERNAME before running.");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting follow-sync for {}", config.username);

    let notifier: Box<dyn Notifier> = match &config.webhook_url {
        Some(url) => Box::new(DiscordNotifier::new(url.clone())),
        None => Box::new(NoopNotifier),
    };
    let client = GithubClient::new(&config);
    let engine = SyncEngine::new(client, TokioDelay, notifier);

    match engine.run().await {
        Ok(report) => {
            if report.is_empty() {
                tracing::info!("Nothing to reconcile");
            } else {
                tracing::info!("Run finished: {}", report.summary());
                println!("\n{}", report.summary());
            }
            if report.has_failures() {
                // Partial failure: the run completed but some mutations
                // never got their 204.
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!("Reconciliation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
