/**
 * Todosync Monitor Entry Point
 *
 * Polls the health endpoints and the first todo page of the configured
 * backend and logs every change of their render models until Ctrl-C.
 */

use todosync::client::sync::{HealthRenderModel, TodoRenderModel};
use todosync::client::{Config, HttpRemoteClient, SyncEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = Config::load()?;
    tracing::info!(
        "Monitoring {} (health every {:?})",
        config.server_url(),
        config.app().health_poll_interval
    );

    let client = HttpRemoteClient::new(config.clone())?;
    let engine = SyncEngine::new(client, config.app().clone());

    let list = engine.list_state()?;
    let mut health = engine.subscribe_health().await;
    let mut todos = engine.subscribe_list(&list).await;
    log_health(&health.current());
    log_todos(&todos.current());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            model = health.changed() => match model {
                Some(model) => log_health(&model),
                None => break,
            },
            model = todos.changed() => match model {
                Some(model) => log_todos(&model),
                None => break,
            },
        }
    }

    let metrics = engine.metrics();
    tracing::info!(
        "Fetches: {} started, {} ok, {} failed, {} ticks skipped",
        metrics.fetches_started,
        metrics.fetches_succeeded,
        metrics.fetches_failed,
        metrics.ticks_skipped
    );
    Ok(())
}

fn log_health(model: &HealthRenderModel) {
    match &model.database.error {
        Some(error) => tracing::warn!(
            "app={} db={} ({}) error: {}",
            model.app.status,
            model.database.status,
            model.database.connection,
            error
        ),
        None => tracing::info!(
            "app={} db={} ({})",
            model.app.status,
            model.database.status,
            model.database.connection
        ),
    }
}

fn log_todos(model: &TodoRenderModel) {
    if let Some(error) = &model.error {
        tracing::warn!("Todo list error: {}", error);
        return;
    }
    tracing::info!(
        "{:?}: {} | {} | {} done, {} active, {} overdue",
        model.view,
        model.page_label,
        model.range_label,
        model.stats.completed,
        model.stats.active,
        model.stats.overdue
    );
}
