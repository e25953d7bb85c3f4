use axum::extract::{Extension, Json, Path};
use uuid::Uuid;

use crate::api::{DynAPI, NewVehicle};
use crate::auth::Actor;
use crate::entities::Vehicle;
use crate::error::Error;

pub async fn create(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Json(params): Json<NewVehicle>,
) -> Result<Json<Vehicle>, Error> {
    let vehicle = api.add_vehicle(actor, params).await?;

    Ok(vehicle.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Vehicle>>, Error> {
    let vehicles = api.list_vehicles(actor, user_id).await?;

    Ok(vehicles.into())
}
