pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::catalog_service::CatalogService;
use application::desk_runtime::{DeskRegistry, DeskSettings};
use application::order_service::OrderService;
use domain::ports::{AlertSound, MedicineCatalog, OrderStore, PharmacyDirectory, ReferenceCatalog};

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} migration(s)", applied.len());
    Ok(())
}

/// Everything the handlers need, shared across workers.
#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub catalog: CatalogService,
    pub desks: DeskRegistry,
}

impl AppState {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn MedicineCatalog>,
        directory: Arc<dyn PharmacyDirectory>,
        references: Arc<dyn ReferenceCatalog>,
        sound: Arc<dyn AlertSound>,
        settings: DeskSettings,
    ) -> Self {
        Self {
            orders: OrderService::new(store.clone(), catalog.clone(), directory.clone()),
            catalog: CatalogService::new(catalog, directory.clone(), references),
            desks: DeskRegistry::new(store, directory, sound, settings),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::pharmacies::register_pharmacy,
        handlers::pharmacies::nearby_pharmacies,
        handlers::pharmacies::get_pharmacy,
        handlers::pharmacies::update_pharmacy,
        handlers::medicines::add_reference,
        handlers::medicines::list_references,
        handlers::medicines::get_reference,
        handlers::medicines::add_medicine,
        handlers::medicines::list_medicines,
        handlers::medicines::set_availability,
        handlers::orders::place_order,
        handlers::orders::list_pharmacy_orders,
        handlers::orders::get_order,
        handlers::orders::list_client_orders,
        handlers::notifications::get_notification,
        handlers::notifications::list_pending,
        handlers::notifications::accept_order,
        handlers::notifications::reject_order,
        handlers::notifications::dismiss_notification,
    ),
    tags(
        (name = "pharmacies", description = "Pharmacy directory"),
        (name = "medicines", description = "Reference list and per-pharmacy catalog"),
        (name = "orders", description = "Placing and reading orders"),
        (name = "notifications", description = "Pharmacist order desk"),
    )
)]
pub struct ApiDoc;

/// Registers every route. `/pharmacies/nearby` comes before `/pharmacies/{id}`
/// so it is not captured as an id.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use handlers::{medicines, notifications, orders, pharmacies};

    cfg.service(
        web::scope("/pharmacies")
            .route("", web::post().to(pharmacies::register_pharmacy))
            .route("/nearby", web::get().to(pharmacies::nearby_pharmacies))
            .route("/{id}", web::get().to(pharmacies::get_pharmacy))
            .route("/{id}", web::put().to(pharmacies::update_pharmacy))
            .route("/{id}/medicines", web::get().to(medicines::list_medicines))
            .route("/{id}/medicines", web::post().to(medicines::add_medicine))
            .route(
                "/{id}/medicines/{medicine_id}/availability",
                web::put().to(medicines::set_availability),
            )
            .route("/{id}/orders", web::get().to(orders::list_pharmacy_orders))
            .route("/{id}/orders", web::post().to(orders::place_order))
            .route(
                "/{id}/orders/{order_id}/accept",
                web::post().to(notifications::accept_order),
            )
            .route(
                "/{id}/orders/{order_id}/reject",
                web::post().to(notifications::reject_order),
            )
            .route("/{id}/notification", web::get().to(notifications::get_notification))
            .route(
                "/{id}/notification/dismiss",
                web::post().to(notifications::dismiss_notification),
            )
            .route("/{id}/pending", web::get().to(notifications::list_pending)),
    )
    .service(
        web::scope("/medicines")
            .route("", web::get().to(medicines::list_references))
            .route("", web::post().to(medicines::add_reference))
            .route("/{id}", web::get().to(medicines::get_reference)),
    )
    .route("/orders/{id}", web::get().to(orders::get_order))
    .route("/clients/{id}/orders", web::get().to(orders::list_client_orders));
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
