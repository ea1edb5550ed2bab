// File: services/medibook_backend/src/main.rs
mod service_factory;

use axum::{routing::get, Router};
use medibook_booking::{routes as booking_routes, BookingState};
use medibook_common::services::SharedDispatcher;
use medibook_common::{config_error, log_error, log_result, Context, MedibookError};
use medibook_config::{load_config, AppConfig};
use medibook_db::{DbClient, MemoryReservationStore, ReservationStore, SqlReservationStore};
use service_factory::MedibookServiceFactory;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

fn app<S: ReservationStore>(
    config: Arc<AppConfig>,
    store: Arc<S>,
    dispatcher: SharedDispatcher,
) -> Router {
    let state = Arc::new(BookingState::new(config, store, dispatcher));

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the MediBook API!" }))
        .merge(medibook_common::routes())
        .merge(booking_routes(state));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    #[cfg(feature = "openapi")]
    {
        use medibook_booking::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "MediBook API",
                version = "0.1.0",
                description = "Appointment reservation service",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        info!("📖 Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn serve<S: ReservationStore>(
    config: Arc<AppConfig>,
    store: Arc<S>,
    dispatcher: SharedDispatcher,
) -> Result<(), MedibookError> {
    log_result(
        store.init_schema().await,
        "Schema ready",
        "Failed to initialize schema",
    )
    .context("initializing schema")?;

    let app = app(config.clone(), store, dispatcher);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("serving HTTP")
}

async fn run() -> Result<(), MedibookError> {
    let config = Arc::new(load_config().map_err(config_error)?);
    let _log_guard = medibook_common::init_from_config(&config.logging);

    let factory = MedibookServiceFactory::new(config.clone());
    let dispatcher = factory.notification_dispatcher();

    match config.database.as_ref() {
        Some(db_config) => {
            info!("ℹ️ Using database store");
            let client = DbClient::from_config(db_config)
                .await
                .context("connecting to the database")?;
            let store = Arc::new(SqlReservationStore::new(client));
            serve(config.clone(), store, dispatcher).await
        }
        None => {
            warn!("⚠️ No [database] section configured, bookings are kept in memory");
            let store = Arc::new(MemoryReservationStore::new());
            serve(config.clone(), store, dispatcher).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), MedibookError> {
    let result = run().await;
    if let Err(e) = &result {
        log_error(e, "Server stopped");
    }
    result
}
