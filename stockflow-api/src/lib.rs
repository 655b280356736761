use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod audit;
pub mod auth;
pub mod error;
pub mod middleware;
pub mod state;
pub mod stock;
pub mod transfers;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let protected = Router::new()
        .route(
            "/v1/transfers",
            post(transfers::create_transfer).get(transfers::list_transfers),
        )
        .route("/v1/transfers/{id}", get(transfers::get_transfer))
        .route("/v1/transfers/{id}/approve", post(transfers::approve_transfer))
        .route("/v1/transfers/{id}/reject", post(transfers::reject_transfer))
        .route("/v1/transfers/{id}/ship", post(transfers::ship_transfer))
        .route("/v1/transfers/{id}/deliver", post(transfers::deliver_transfer))
        .route("/v1/transfers/{id}/cancel", post(transfers::cancel_transfer))
        .route(
            "/v1/stock/{warehouse_id}/{product_id}",
            get(stock::get_available).put(stock::set_stock),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::staff_auth_middleware,
        ));

    Router::new()
        .merge(auth::routes())
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
