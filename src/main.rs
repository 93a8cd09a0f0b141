use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use pharmacy_service::config::Config;
use pharmacy_service::infrastructure::alert_sound::LoggingAlertSound;
use pharmacy_service::infrastructure::catalog_repo::DieselCatalog;
use pharmacy_service::infrastructure::order_repo::DieselOrderStore;
use pharmacy_service::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(io::Error::other)?;

    let pool = create_pool(&config.database_url).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;

    let catalog = Arc::new(DieselCatalog::new(pool.clone()));
    let state = AppState::new(
        Arc::new(DieselOrderStore::new(pool, config.poll_interval)),
        catalog.clone(),
        catalog.clone(),
        catalog,
        Arc::new(LoggingAlertSound),
        config.desk_settings(),
    );

    log::info!(
        "Starting server at http://{}:{} ({}s notifications)",
        config.host,
        config.port,
        config.countdown_secs
    );

    let desks = state.desks.clone();
    let result = build_server(state, &config.host, config.port)?.await;
    desks.shutdown();
    result
}
