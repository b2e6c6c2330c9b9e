use budget_sync::{
    bot::{self, BotData},
    config::{database, settings},
    core::{
        connectivity::{self, ConnectivityMonitor},
        local::LocalStore,
        remote::{CloudStore, RemoteStore},
        session::SessionState,
        sync::SyncEngine,
    },
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load config.toml
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    // 4. Connect both tiers
    let local_db = database::connect(&database::local_database_url())
        .await
        .inspect_err(|e| error!("Failed to open local database: {e}"))?;
    database::create_local_tables(&local_db).await?;
    info!("Local database ready.");

    let cloud_db = database::connect(&database::cloud_database_url())
        .await
        .inspect_err(|e| error!("Failed to open cloud database: {e}"))?;
    database::create_cloud_tables(&cloud_db).await?;
    info!("Cloud database ready.");

    // 5. Session, connectivity and the engine
    let session = app_config
        .session
        .user_id
        .clone()
        .map_or_else(SessionState::signed_out, SessionState::signed_in);
    if !session.is_authenticated() {
        warn!("No [session] user_id configured; cloud sync is disabled until sign-in.");
    }

    let connectivity = ConnectivityMonitor::new(cloud_db.ping().await.is_ok());
    let remote: Arc<dyn RemoteStore> = Arc::new(CloudStore::new(cloud_db.clone()));
    let engine = Arc::new(SyncEngine::new(
        LocalStore::new(local_db),
        remote,
        session,
        connectivity.clone(),
    ));
    let pending = engine.refresh_pending_count().await;
    info!(pending, online = engine.is_online(), "Sync engine started.");

    let _probe = connectivity::spawn_probe(
        connectivity,
        cloud_db,
        app_config.sync.probe_interval(),
    );
    let _auto_flush = engine.spawn_auto_flush();
    if engine.is_online() {
        engine.sync_now().await?;
    }

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(
        &token,
        BotData::new(engine, app_config.sync.progress_clear_delay()),
    )
    .await
}
