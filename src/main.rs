use dotenvy::dotenv;
use order_server::{
    api::{AppState, build_router},
    config::{self, database},
    core::{event, tracking, user},
    errors::{Error, Result},
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
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

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;

    // 4. Initialize database and schema
    let db = database::create_connection(&app_config.database.url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;
    tracking::ensure_tracking_rows(&db).await?;
    info!("Database initialized successfully.");

    // 5. Bootstrap the administrator account
    if let Some(admin) = user::ensure_admin(&db, &app_config.security).await? {
        info!("Bootstrapped administrator {}", admin.uuid);
    }

    // 6. Seed a default event when none is active
    if let Some(seeded) = event::ensure_default_event(&db, &app_config.events).await? {
        info!("Seeded default event {}", seeded.uuid);
    }

    // 7. Serve
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let app = build_router(AppState::new(db, app_config));
    let listener = TcpListener::bind(&addr)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", addr, e))?;
    info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(Error::from)?;

    Ok(())
}
