use dotenvy::dotenv;
use std::path::Path;
use ticketdesk::{
    cache, config,
    core::{catalog, invoice},
    errors::Result,
    jobs::{JobQueue, OutboundJob},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (as early as possible)
    dotenv().ok(); // Make it non-fatal, env vars can be set externally
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = if Path::new("config.toml").exists() {
        config::load_default_configuration()?
    } else {
        warn!("No config.toml found, running with default conference settings.");
        config::AppConfig::default()
    };

    // 4. Initialize database
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db).await?;

    // 5. Seed configured ticket types (idempotent by name)
    let seeded = catalog::seed_ticket_types(&db, &app_config)
        .await
        .inspect_err(|e| error!("Failed to seed ticket types: {}", e))?;
    info!("Seeded {} new ticket type(s).", seeded);

    let catalog_cache = cache::new_catalog_cache();
    cache::refresh_catalog_cache(&db, &catalog_cache).await?;

    // 6. Allocate invoice numbers for the export backlog and queue the mails
    let (jobs, mut job_receiver) = JobQueue::new();
    let queued = invoice::run_export_pass(&db, &jobs).await?;
    info!("Export pass queued {} invoice job(s).", queued);

    // The mail transport is an external worker; here we only report what
    // the pass produced.
    drop(jobs);
    while let Some(job) = job_receiver.recv().await {
        match job {
            OutboundJob::RenderAndEmailInvoice { purchase_id } => {
                info!("Pending invoice mail for purchase {}.", purchase_id);
            }
            OutboundJob::SendPaymentNotification {
                purchase_id,
                recipients,
            } => {
                info!(
                    "Pending payment notification for purchase {} to {}.",
                    purchase_id,
                    recipients.join(", ")
                );
            }
        }
    }

    Ok(())
}
