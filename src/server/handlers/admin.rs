use axum::extract::{Extension, Json, Path};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Actor;
use crate::entities::User;
use crate::error::Error;
use crate::store::PlatformStats;

pub async fn validate_user(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, Error> {
    let user = api.validate_user(actor, id).await?;

    Ok(user.into())
}

pub async fn stats(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
) -> Result<Json<PlatformStats>, Error> {
    let stats = api.platform_stats(actor).await?;

    Ok(stats.into())
}
