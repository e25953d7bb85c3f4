use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::{NewVehicle, VehicleAPI},
    auth::{Actor, Platform},
    entities::Vehicle,
    error::Error,
};

#[async_trait]
impl VehicleAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn add_vehicle(&self, actor: Actor, vehicle: NewVehicle) -> Result<Vehicle, Error> {
        self.authorize(actor.clone(), "add_vehicle", Platform::default())?;

        let vehicle = Vehicle::new(actor.id, vehicle.make, vehicle.model, vehicle.seats)?;

        self.store.insert_vehicle(&vehicle).await?;

        Ok(vehicle)
    }

    #[tracing::instrument(skip(self))]
    async fn list_vehicles(&self, _actor: Actor, user_id: Uuid) -> Result<Vec<Vehicle>, Error> {
        self.store.list_vehicles(user_id).await
    }
}
