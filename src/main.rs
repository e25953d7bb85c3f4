use std::sync::Arc;

use affretement::config::Config;
use affretement::engine::Engine;
use affretement::error::Error;
use affretement::notifier::{HttpMailer, LogNotifier, Notifier};
use affretement::server::serve;
use affretement::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(database_url) => {
            Arc::new(PgStore::connect(database_url, config.database_max_connections).await?)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, data is kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let notifier: Arc<dyn Notifier> = match config.mailer.clone() {
        Some(mailer) => Arc::new(HttpMailer::new(mailer)),
        None => {
            tracing::warn!("mailer is not configured, emails are only logged");
            Arc::new(LogNotifier)
        }
    };

    let engine = Engine::new(store, notifier, config.settings.clone())?;

    serve(engine, config.listen_addr).await
}
