mod extract;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, patch, post},
    Router,
};

use crate::api::{DynAPI, API};
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{admin, bids, messages, reviews, rides, users, vehicles};

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/users", post(users::register))
        .route("/users/:id", get(users::find))
        .route("/users/:id/vehicles", get(vehicles::list))
        .route("/users/:id/reviews", get(reviews::list))
        .route("/me", get(users::me).patch(users::update_profile))
        .route("/me/rides", get(rides::list_mine))
        .route("/vehicles", post(vehicles::create))
        .route("/rides", post(rides::publish).get(rides::list_available))
        .route("/rides/:id", get(rides::find).delete(rides::cancel))
        .route("/rides/:id/complete", patch(rides::complete))
        .route("/rides/:id/bids", post(bids::submit).get(bids::list))
        .route("/rides/:id/reviews", post(reviews::submit))
        .route("/rides/:id/messages", post(messages::send).get(messages::list))
        .route("/rides/:id/messages/read", patch(messages::mark_read))
        .route("/bids/:id", patch(bids::revise).delete(bids::withdraw))
        .route("/bids/:id/accept", patch(bids::accept))
        .route("/bids/:id/refuse", patch(bids::refuse))
        .route("/admin/users/:id/validate", patch(admin::validate_user))
        .route("/admin/stats", get(admin::stats))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;
    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| {
            tracing::error!("server error: {}", err);
            unexpected_error()
        })
}
