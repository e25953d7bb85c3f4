//! Persistence behind the engine.
//!
//! The store is the final authority on uniqueness: a second bid from the same
//! driver on a ride, or a second review from the same evaluator on a ride,
//! must be refused by the write itself, never by a read performed beforehand.
//! Implementations map those violations to `duplicate_bid_error` and
//! `already_reviewed_error`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Bid, EvaluationType, Message, Review, Ride, RideStatus, User, Vehicle};
use crate::error::Error;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub users: i64,
    pub validated_users: i64,
    pub available_rides: i64,
    pub awarded_rides: i64,
    pub completed_rides: i64,
    pub open_bids: i64,
    pub reviews: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    // users

    /// Fails with `duplicate_user_error` when the id or the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), Error>;
    async fn find_user(&self, id: Uuid) -> Result<User, Error>;
    /// Writes the profile fields. The validation flag and the cached ratings
    /// keep their stored values.
    async fn update_user(&self, user: &User) -> Result<(), Error>;
    /// Marks the user validated. Returns the updated user, or `None` when it
    /// already was.
    async fn set_validated(&self, id: Uuid) -> Result<Option<User>, Error>;
    /// Validated users opted into immediate notifications.
    async fn list_immediate_subscribers(&self) -> Result<Vec<User>, Error>;

    // vehicles

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), Error>;
    async fn list_vehicles(&self, user_id: Uuid) -> Result<Vec<Vehicle>, Error>;

    // rides

    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error>;
    async fn find_ride(&self, id: Uuid) -> Result<Ride, Error>;
    /// Compare-and-set on the status: writes `ride` only if the stored ride is
    /// still in `expected`, otherwise fails with `invalid_state_error`.
    async fn update_ride(&self, ride: &Ride, expected: RideStatus) -> Result<(), Error>;
    /// Writes the awarded `ride` only while the stored ride is available and
    /// `bid` is still stored at the price it was awarded at. Fails with
    /// `ride_not_available_error` or `bid_changed_error`.
    async fn award_ride(&self, ride: &Ride, bid: &Bid) -> Result<(), Error>;
    /// Deletes an available ride together with its bids and messages.
    async fn delete_available_ride(&self, id: Uuid) -> Result<(), Error>;
    async fn list_rides_by_status(&self, status: RideStatus) -> Result<Vec<Ride>, Error>;
    /// Rides the user requested or was awarded.
    async fn list_rides_for_user(&self, user_id: Uuid) -> Result<Vec<Ride>, Error>;

    // bids

    /// Inserts the bid only while its ride is available and the price is
    /// within the ceiling. Fails with `duplicate_bid_error` on a second bid
    /// from the same driver. Returns how many bids the ride has received,
    /// this one included; withdrawn and refused bids still count.
    async fn insert_bid(&self, bid: &Bid) -> Result<i64, Error>;
    async fn find_bid(&self, id: Uuid) -> Result<Bid, Error>;
    async fn find_driver_bid(&self, ride_id: Uuid, driver_id: Uuid)
        -> Result<Option<Bid>, Error>;
    /// Lowers the stored price while the ride is available; fails with
    /// `price_not_lower_error` unless the new price is strictly below the
    /// stored one.
    async fn lower_bid_price(&self, id: Uuid, new_price: f64) -> Result<(), Error>;
    /// Deletes a bid while its ride is available.
    async fn delete_bid(&self, id: Uuid) -> Result<(), Error>;
    /// Bids of a ride ordered by creation time.
    async fn list_bids(&self, ride_id: Uuid) -> Result<Vec<Bid>, Error>;
    async fn count_bids(&self, ride_id: Uuid) -> Result<i64, Error>;
    /// Deletes every bid of the ride except `keep`, returning what was deleted.
    async fn delete_sibling_bids(&self, ride_id: Uuid, keep: Uuid) -> Result<Vec<Bid>, Error>;

    // reviews

    /// Inserts the review and recomputes the cached rating of the evaluated
    /// user for its pool in the same write, returning the updated user. Fails
    /// with `already_reviewed_error` on a second review from the same
    /// evaluator for the ride, leaving nothing behind.
    async fn insert_review(&self, review: &Review) -> Result<User, Error>;
    async fn list_reviews_about(
        &self,
        evaluated_id: Uuid,
        evaluation_type: EvaluationType,
    ) -> Result<Vec<Review>, Error>;

    // messages

    async fn insert_message(&self, message: &Message) -> Result<(), Error>;
    /// Messages of a ride ordered by creation time.
    async fn list_messages(&self, ride_id: Uuid) -> Result<Vec<Message>, Error>;
    /// Marks every message of the ride addressed to `recipient_id` as read and
    /// returns how many changed.
    async fn mark_messages_read(&self, ride_id: Uuid, recipient_id: Uuid) -> Result<u64, Error>;

    // admin

    async fn platform_stats(&self) -> Result<PlatformStats, Error>;
}
