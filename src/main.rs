use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use class_reminder::api::router;
use class_reminder::clock::SystemClock;
use class_reminder::config::Config;
use class_reminder::notifier::ConsoleNotifier;
use class_reminder::repository::HttpClassRepository;
use class_reminder::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new_from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "class_reminder=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("class API at {}", config.api_url);

    let repository = Arc::new(HttpClassRepository::new(&config)?);
    let notifier = Arc::new(ConsoleNotifier::new(config.notifications_enabled));
    let state = AppState::new(repository, notifier, Arc::new(SystemClock));

    if config.notifications_enabled {
        state.scheduler.start();
    } else {
        info!("notifications disabled; grant permission via POST /notifications/permission");
    }

    let app = router(state.clone());

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    state.scheduler.stop();
    Ok(())
}
