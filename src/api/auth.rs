/// User endpoints: sign-up, sign-in, token renewal and user management
use crate::{
    account::{CreateUserRequest, LoginRequest, Role, UpdateUserRequest, User, UserWithToken},
    api::extract::ValidatedJson,
    auth::{AuthUser, RoleGuard},
    context::AppContext,
    error::VaultResult,
    files::Receipt,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

/// Build auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/renew", get(renew))
        .route("/auth/logout", get(logout))
        .route(
            "/auth/:id",
            get(find_user).patch(update_user).delete(deactivate_user),
        )
}

/// Register endpoint
async fn sign_up(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> VaultResult<(StatusCode, Json<UserWithToken>)> {
    let created = ctx.account_manager.register(req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Login endpoint
async fn sign_in(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> VaultResult<Json<UserWithToken>> {
    let session = ctx.account_manager.login(req).await?;
    tracing::debug!("User {} signed in", session.user.id);
    Ok(Json(session))
}

/// Issue a fresh token for the caller
async fn renew(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
) -> VaultResult<Json<UserWithToken>> {
    Ok(Json(ctx.account_manager.renew(user)?))
}

/// Tokens are stateless; logout only confirms the token was valid
async fn logout(AuthUser(user): AuthUser) -> Json<serde_json::Value> {
    tracing::debug!("User {} logged out", user.id);
    Json(json!({ "ok": true }))
}

async fn find_user(State(ctx): State<AppContext>, Path(id): Path<i64>) -> VaultResult<Json<User>> {
    Ok(Json(ctx.account_manager.find_one(id).await?))
}

async fn update_user(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> VaultResult<Json<UserWithToken>> {
    Ok(Json(ctx.account_manager.update(id, req).await?))
}

/// Deactivate a user (admins only)
async fn deactivate_user(
    State(ctx): State<AppContext>,
    AuthUser(caller): AuthUser,
    Path(id): Path<i64>,
) -> VaultResult<Json<Receipt>> {
    RoleGuard::check(&caller, &[Role::Admin])?;

    let receipt = ctx.account_manager.deactivate(id).await?;
    tracing::info!("User {} deactivated user {}", caller.id, id);

    Ok(Json(receipt))
}
