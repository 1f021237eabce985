pub mod error;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::http::state::HttpState;
use crate::domain::errors::{DomainError, DomainResult};

/// Un data URL de un frame 1080p en PNG supera con facilidad los 2 MiB por defecto de axum.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn router(state: HttpState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/process_frame", post(routes::process_frame))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS para un único origen (el frontend). Con credenciales no se admite `*`,
/// así que métodos y cabeceras se reflejan desde la petición.
pub fn cors_layer(frontend_origin: &str) -> DomainResult<CorsLayer> {
    // tower-http trata `*` como comodín y entra en pánico al combinarlo con credenciales.
    if frontend_origin.trim() == "*" {
        return Err(DomainError::InvalidInput(
            "el origen CORS debe ser concreto (se permiten credenciales), no '*'".into(),
        ));
    }

    let origin = HeaderValue::from_str(frontend_origin)
        .map_err(|_| DomainError::InvalidInput(format!("origen CORS inválido: {}", frontend_origin)))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}
