use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadflow::automation::{AutomationEngine, RuleCatalog};
use leadflow::jobs::AutomationScheduler;
use leadflow::services::EmailService;
use leadflow::storage::PostgresStore;
use leadflow::{config, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;

    // A malformed rule catalog must never reach the tick loop.
    let catalog = RuleCatalog::builtin()?;

    let db_pool = database::create_pool(&config.database_url).await?;
    database::migrate(&db_pool).await?;

    if !config.smtp.is_configured() {
        tracing::warn!("SMTP is not fully configured; follow-up emails will fail to send");
    }
    let email_service = EmailService::new(&config.smtp)?;

    let store = Arc::new(PostgresStore::new(db_pool));
    let engine = Arc::new(AutomationEngine::new(
        store,
        Arc::new(email_service),
        catalog,
        config.automation.links.clone(),
    ));

    let mut scheduler = AutomationScheduler::new(engine, &config.automation).await?;
    scheduler.start().await?;

    tokio::signal::ctrl_c().await?;
    scheduler.shutdown().await?;

    Ok(())
}
