use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Actor;
use crate::entities::{
    Bid, EvaluationType, Message, ProfileUpdate, Registration, Review, Ride, RideDetails, User,
    Vehicle,
};
use crate::error::Error;
use crate::store::PlatformStats;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BidSubmission {
    pub bid: Bid,
    /// The bid is the first one on its ride; the ride's chat opens with it.
    pub is_first: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewVehicle {
    pub make: String,
    pub model: String,
    pub seats: i16,
}

#[async_trait]
pub trait UserAPI {
    /// Creates the account of an identity issued by the auth provider.
    async fn register_user(&self, id: Uuid, registration: Registration) -> Result<User, Error>;
    async fn authenticate(&self, id: Uuid) -> Result<Actor, Error>;
    async fn find_user(&self, actor: Actor, id: Uuid) -> Result<User, Error>;
    async fn update_profile(&self, actor: Actor, update: ProfileUpdate) -> Result<User, Error>;
}

#[async_trait]
pub trait VehicleAPI {
    async fn add_vehicle(&self, actor: Actor, vehicle: NewVehicle) -> Result<Vehicle, Error>;
    async fn list_vehicles(&self, actor: Actor, user_id: Uuid) -> Result<Vec<Vehicle>, Error>;
}

#[async_trait]
pub trait RideAPI {
    async fn publish_ride(&self, actor: Actor, details: RideDetails) -> Result<Ride, Error>;
    async fn find_ride(&self, actor: Actor, id: Uuid) -> Result<Ride, Error>;
    async fn list_available_rides(&self, actor: Actor) -> Result<Vec<Ride>, Error>;
    async fn list_my_rides(&self, actor: Actor) -> Result<Vec<Ride>, Error>;
    async fn cancel_ride(&self, actor: Actor, id: Uuid) -> Result<(), Error>;
    async fn complete_ride(&self, actor: Actor, id: Uuid) -> Result<Ride, Error>;
}

#[async_trait]
pub trait BidAPI {
    async fn submit_bid(
        &self,
        actor: Actor,
        ride_id: Uuid,
        proposed_price: f64,
    ) -> Result<BidSubmission, Error>;
    async fn revise_bid(&self, actor: Actor, id: Uuid, new_price: f64) -> Result<Bid, Error>;
    async fn accept_bid(&self, actor: Actor, id: Uuid) -> Result<Ride, Error>;
    async fn withdraw_bid(&self, actor: Actor, id: Uuid) -> Result<(), Error>;
    async fn refuse_bid(&self, actor: Actor, id: Uuid) -> Result<(), Error>;
    async fn list_bids(&self, actor: Actor, ride_id: Uuid) -> Result<Vec<Bid>, Error>;
}

#[async_trait]
pub trait ReviewAPI {
    async fn submit_review(
        &self,
        actor: Actor,
        ride_id: Uuid,
        note: i16,
        comment: Option<String>,
    ) -> Result<Review, Error>;
    async fn list_reviews(
        &self,
        actor: Actor,
        user_id: Uuid,
        evaluation_type: EvaluationType,
    ) -> Result<Vec<Review>, Error>;
}

#[async_trait]
pub trait MessageAPI {
    async fn send_message(
        &self,
        actor: Actor,
        ride_id: Uuid,
        recipient_id: Uuid,
        content: String,
    ) -> Result<Message, Error>;
    async fn list_messages(&self, actor: Actor, ride_id: Uuid) -> Result<Vec<Message>, Error>;
    async fn mark_read(&self, actor: Actor, ride_id: Uuid) -> Result<u64, Error>;
}

#[async_trait]
pub trait AdminAPI {
    async fn validate_user(&self, actor: Actor, id: Uuid) -> Result<User, Error>;
    async fn platform_stats(&self, actor: Actor) -> Result<PlatformStats, Error>;
}

pub trait API: UserAPI + VehicleAPI + RideAPI + BidAPI + ReviewAPI + MessageAPI + AdminAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
