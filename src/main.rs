use dotenvy::dotenv;
use overtime_tracker::{
    api::{self, AppState},
    config::{database, settings},
    core::{accrual, user},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Load settings (config.toml plus environment overrides)
    let settings = settings::load_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    info!(
        cost_per_minute = settings.worklog.cost_per_minute,
        delete_policy = ?settings.worklog.delete_policy,
        "Settings loaded"
    );

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed configured users
    let seeded = user::seed_users(&db, &settings.users).await?;
    if seeded > 0 {
        info!("Seeded {} users", seeded);
    }

    // 6. Background balance accrual
    let _accrual = accrual::spawn_accrual_task(
        db.clone(),
        settings.accrual.balance_increment,
        settings.accrual.interval_hours,
    );

    // 7. Serve the HTTP API
    let app = api::build_router(AppState::new(db, settings.worklog_policy()));
    let listener = tokio::net::TcpListener::bind(&settings.server.bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", settings.server.bind_address, e))?;
    info!("Listening on {}", settings.server.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
