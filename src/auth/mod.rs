use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::ratelimit;
use crate::state::AppState;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;

pub fn router(state: AppState) -> Router<AppState> {
    // Signup/signin sit behind the strict auth policy; the profile routes
    // behind the general one plus the bearer gate in the handlers.
    let credentials = Router::new()
        .route("/signup", post(handlers::signup))
        .route("/signin", post(handlers::signin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            ratelimit::auth_admission,
        ));

    let profile = Router::new()
        .route("/me", get(handlers::get_me).put(handlers::update_me))
        .layer(middleware::from_fn_with_state(
            state,
            ratelimit::api_admission,
        ));

    credentials.merge(profile)
}
