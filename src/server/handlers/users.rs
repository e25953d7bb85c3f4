use axum::extract::{Extension, Json, Path};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Actor;
use crate::entities::{ProfileUpdate, Registration, User};
use crate::error::Error;
use crate::server::extract::Identity;

pub async fn register(
    Extension(api): Extension<DynAPI>,
    Identity(id): Identity,
    Json(registration): Json<Registration>,
) -> Result<Json<User>, Error> {
    let user = api.register_user(id, registration).await?;

    Ok(user.into())
}

pub async fn me(Extension(api): Extension<DynAPI>, actor: Actor) -> Result<Json<User>, Error> {
    let id = actor.id;
    let user = api.find_user(actor, id).await?;

    Ok(user.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, Error> {
    let user = api.find_user(actor, id).await?;

    Ok(user.into())
}

pub async fn update_profile(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, Error> {
    let user = api.update_profile(actor, update).await?;

    Ok(user.into())
}
