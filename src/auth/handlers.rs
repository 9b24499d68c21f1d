use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            CredentialsRequest, MessageResponse, TokenResponse, UpdateDescriptionRequest,
            UserResponse,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password,
        repo_types::User,
    },
    error::ApiError,
    state::AppState,
};

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    payload.validate_signup()?;

    // Pre-check so an obvious duplicate skips the hashing cost. The unique
    // constraint below still catches the check-then-insert race.
    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "signup with existing username");
        return Err(ApiError::Conflict);
    }

    let password = payload.password;
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| anyhow::anyhow!(e).context("hashing task panicked"))??;

    let user = match User::create(&state.db, &payload.username, &hash).await {
        Ok(user) => user,
        Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
            warn!(username = %payload.username, "signup lost creation race");
            return Err(ApiError::Conflict);
        }
        Err(e) => return Err(anyhow::Error::new(e).context("create user").into()),
    };

    info!(user_id = user.id, username = %user.username, "user created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully",
            success: true,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.validate_signin()?;

    // Unknown username and wrong password must be indistinguishable to the
    // client.
    let Some(user) = User::find_by_username(&state.db, &payload.username).await? else {
        warn!("signin with unknown username");
        return Err(ApiError::BadCredentials);
    };

    let password = payload.password;
    let stored_hash = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || password::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| anyhow::anyhow!(e).context("verification task panicked"))?;
    if !ok {
        warn!(user_id = user.id, "signin with wrong password");
        return Err(ApiError::BadCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = user.id, "signin successful");
    Ok(Json(TokenResponse {
        message: "Signin successful",
        success: true,
        token,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(UserResponse {
        message: "User data retrieved successfully",
        success: true,
        data: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateDescriptionRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    payload.validate()?;

    let user = User::update_description(&state.db, user_id, &payload.description)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!(user_id = user.id, "description updated");
    Ok(Json(UserResponse {
        message: "Description updated successfully",
        success: true,
        data: user.into(),
    }))
}
