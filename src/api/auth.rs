use std::sync::Arc;

use rocket::{
    serde::json::{self, Json},
    Route, State,
};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            user::{AuthResponse, LoginRequest, RegisterRequest, UserDescription},
        },
        db::user::NewUser,
    },
    store::UserStore,
    Config,
};

use super::bad_json;

pub fn routes() -> Vec<Route> {
    routes![register, login, me]
}

#[post("/auth/register", data = "<request>", format = "json")]
pub async fn register(
    request: std::result::Result<Json<RegisterRequest>, json::Error<'_>>,
    users: &State<Arc<dyn UserStore>>,
    config: &State<Config>,
) -> Result<Json<AuthResponse>> {
    let request = request.map_err(bad_json)?.into_inner();
    let user = users.insert(NewUser::try_from(request)?).await?;

    let token = AuthToken::for_user(&user).into_token(config);
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[post("/auth/login", data = "<request>", format = "json")]
pub async fn login(
    request: std::result::Result<Json<LoginRequest>, json::Error<'_>>,
    users: &State<Arc<dyn UserStore>>,
    config: &State<Config>,
) -> Result<Json<AuthResponse>> {
    let request = request.map_err(bad_json)?.into_inner();

    // Look up by lowercased email so login is case-insensitive, like
    // registration. A missing user and a wrong password are deliberately
    // indistinguishable.
    let user = users
        .find_by_email(&request.email.to_lowercase())
        .await?
        .filter(|user| user.verify_password(&request.password))
        .ok_or_else(|| Error::unauthorized("invalid credentials"))?;

    let token = AuthToken::for_user(&user).into_token(config);
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Who does the presented token belong to?
#[get("/auth/me")]
pub async fn me(
    token: AuthToken,
    users: &State<Arc<dyn UserStore>>,
) -> Result<Json<UserDescription>> {
    let user = users
        .find_by_id(token.id)
        .await?
        .ok_or_else(|| Error::unauthorized("user no longer exists"))?;
    Ok(Json(user.into()))
}
