use axum::extract::{Extension, Json, Path};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Actor;
use crate::entities::{Ride, RideDetails};
use crate::error::Error;

pub async fn publish(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Json(details): Json<RideDetails>,
) -> Result<Json<Ride>, Error> {
    let ride = api.publish_ride(actor, details).await?;

    Ok(ride.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, Error> {
    let ride = api.find_ride(actor, id).await?;

    Ok(ride.into())
}

pub async fn list_available(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
) -> Result<Json<Vec<Ride>>, Error> {
    let rides = api.list_available_rides(actor).await?;

    Ok(rides.into())
}

pub async fn list_mine(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
) -> Result<Json<Vec<Ride>>, Error> {
    let rides = api.list_my_rides(actor).await?;

    Ok(rides.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<(), Error> {
    api.cancel_ride(actor, id).await
}

pub async fn complete(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, Error> {
    let ride = api.complete_ride(actor, id).await?;

    Ok(ride.into())
}
