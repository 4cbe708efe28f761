use axum::Router;

use crate::common::ApiError;

pub mod migrations;
pub mod updates;

pub fn create_router() -> Router<crate::app::AppState> {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .nest("/migrations", migrations::routes())
                .nest("/updates", updates::routes())
                .layer(crate::auth::get_identity_auth_layer()),
        )
        .fallback(async || -> ApiError {
            tracing::info!("Not Found!");
            ApiError::NotFound
        })
        .method_not_allowed_fallback(async || -> ApiError {
            tracing::info!("Method Not Allowed!");
            ApiError::MethodNotAllowed
        })
}
