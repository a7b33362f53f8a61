pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Task Publisher API",
        version = "0.1.0",
        description = "Generates static web apps from task briefs and publishes them to GitHub Pages"
    ),
    paths(routes::health_check, routes::handle_task),
    components(schemas(
        routes::HealthResponse,
        taskpub_core::TaskSubmission,
        taskpub_core::Attachment,
        orchestrator::TaskResponse,
        orchestrator::Round1Summary,
        orchestrator::Round2Summary,
        orchestrator::ErrorResponse,
        orchestrator::FlowStep,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "tasks", description = "Task submission endpoints"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let app_dir = state.app_dir.clone();

    let api_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route("/handle_task", post(routes::handle_task))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    if let Some(app_dir) = app_dir {
        let index_file = app_dir.join("index.html");
        let serve_dir = ServeDir::new(&app_dir).not_found_service(ServeFile::new(&index_file));
        api_router.fallback_service(serve_dir)
    } else {
        api_router
    }
}
