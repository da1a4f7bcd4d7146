//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{availability, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Alma Service API",
        version = "1.0.0",
        description = "Catalog availability mediator for the Alma library API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Availability
        availability::bibs,
        availability::textbooks,
        availability::holdings,
    ),
    components(
        schemas(
            health::HealthResponse,
            crate::models::AggregatedItem,
            crate::models::DisplayStatus,
            crate::models::HoldingItem,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "availability", description = "Bib, Top Textbook and holding availability")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
