//! In-memory implementation of `Store`.
//!
//! All tables sit behind a single lock so each operation is atomic, which is
//! what the uniqueness contract needs. State is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PlatformStats, Store};
use crate::entities::{
    Bid, EvaluationType, Message, RatingSummary, Review, Ride, RideStatus, User, Vehicle,
};
use crate::error::{
    already_reviewed_error, bid_changed_error, bid_not_found_error, duplicate_bid_error,
    duplicate_user_error, invalid_price_error, invalid_state_error, price_not_lower_error,
    ride_not_available_error, ride_not_found_error, user_not_found_error, Error,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    vehicles: Vec<Vehicle>,
    rides: HashMap<Uuid, Ride>,
    bids: Vec<Bid>,
    bids_received: HashMap<Uuid, i64>,
    reviews: Vec<Review>,
    messages: Vec<Message>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_rides(mut rides: Vec<Ride>) -> Vec<Ride> {
    rides.sort_by_key(|ride| ride.scheduled_at);
    rides
}

impl Tables {
    /// Fails unless the bid exists and its ride is still available.
    fn ensure_open_bid(&self, bid_id: Uuid) -> Result<(), Error> {
        let bid = self
            .bids
            .iter()
            .find(|bid| bid.id == bid_id)
            .ok_or_else(bid_not_found_error)?;

        match self.rides.get(&bid.ride_id) {
            Some(ride) if ride.is_available() => Ok(()),
            Some(_) => Err(ride_not_available_error()),
            None => Err(ride_not_found_error()),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), Error> {
        let mut tables = self.tables.write().await;

        let taken = tables.users.contains_key(&user.id)
            || tables.users.values().any(|other| other.email == user.email);
        if taken {
            return Err(duplicate_user_error());
        }

        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<User, Error> {
        let tables = self.tables.read().await;
        tables.users.get(&id).cloned().ok_or_else(user_not_found_error)
    }

    async fn update_user(&self, user: &User) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(user_not_found_error)?;
        *stored = user.with_managed_fields_of(stored);
        Ok(())
    }

    async fn set_validated(&self, id: Uuid) -> Result<Option<User>, Error> {
        let mut tables = self.tables.write().await;
        let stored = tables.users.get_mut(&id).ok_or_else(user_not_found_error)?;

        if stored.validated {
            return Ok(None);
        }

        stored.validated = true;
        Ok(Some(stored.clone()))
    }

    async fn list_immediate_subscribers(&self) -> Result<Vec<User>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|user| user.accepts_immediate_notifications())
            .cloned()
            .collect())
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), Error> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&vehicle.user_id) {
            return Err(user_not_found_error());
        }

        tables.vehicles.push(vehicle.clone());
        Ok(())
    }

    async fn list_vehicles(&self, user_id: Uuid) -> Result<Vec<Vehicle>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&ride.requester_id) {
            return Err(user_not_found_error());
        }

        tables.rides.insert(ride.id, ride.clone());
        Ok(())
    }

    async fn find_ride(&self, id: Uuid) -> Result<Ride, Error> {
        let tables = self.tables.read().await;
        tables.rides.get(&id).cloned().ok_or_else(ride_not_found_error)
    }

    async fn update_ride(&self, ride: &Ride, expected: RideStatus) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .rides
            .get_mut(&ride.id)
            .ok_or_else(ride_not_found_error)?;

        if stored.status != expected {
            return Err(invalid_state_error());
        }

        *stored = ride.clone();
        Ok(())
    }

    async fn award_ride(&self, ride: &Ride, bid: &Bid) -> Result<(), Error> {
        let mut tables = self.tables.write().await;

        let unchanged = tables.bids.iter().any(|stored| {
            stored.id == bid.id
                && stored.ride_id == ride.id
                && stored.proposed_price == bid.proposed_price
        });

        let stored = tables
            .rides
            .get_mut(&ride.id)
            .ok_or_else(ride_not_found_error)?;

        if !stored.is_available() {
            return Err(ride_not_available_error());
        }

        if !unchanged {
            return Err(bid_changed_error());
        }

        *stored = ride.clone();
        Ok(())
    }

    async fn delete_available_ride(&self, id: Uuid) -> Result<(), Error> {
        let mut tables = self.tables.write().await;

        match tables.rides.get(&id) {
            None => return Err(ride_not_found_error()),
            Some(ride) if !ride.is_available() => return Err(ride_not_available_error()),
            Some(_) => {}
        }

        tables.rides.remove(&id);
        tables.bids.retain(|bid| bid.ride_id != id);
        tables.messages.retain(|message| message.ride_id != id);
        Ok(())
    }

    async fn list_rides_by_status(&self, status: RideStatus) -> Result<Vec<Ride>, Error> {
        let tables = self.tables.read().await;
        Ok(sorted_rides(
            tables
                .rides
                .values()
                .filter(|ride| ride.status == status)
                .cloned()
                .collect(),
        ))
    }

    async fn list_rides_for_user(&self, user_id: Uuid) -> Result<Vec<Ride>, Error> {
        let tables = self.tables.read().await;
        Ok(sorted_rides(
            tables
                .rides
                .values()
                .filter(|ride| ride.is_participant(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn insert_bid(&self, bid: &Bid) -> Result<i64, Error> {
        let mut tables = self.tables.write().await;

        let ride = tables
            .rides
            .get(&bid.ride_id)
            .ok_or_else(ride_not_found_error)?;

        if !ride.is_available() {
            return Err(ride_not_available_error());
        }

        if bid.proposed_price > ride.price {
            return Err(invalid_price_error());
        }

        let duplicate = tables
            .bids
            .iter()
            .any(|other| other.ride_id == bid.ride_id && other.driver_id == bid.driver_id);
        if duplicate {
            return Err(duplicate_bid_error());
        }

        tables.bids.push(bid.clone());

        let received = tables.bids_received.entry(bid.ride_id).or_insert(0);
        *received += 1;

        Ok(*received)
    }

    async fn find_bid(&self, id: Uuid) -> Result<Bid, Error> {
        let tables = self.tables.read().await;
        tables
            .bids
            .iter()
            .find(|bid| bid.id == id)
            .cloned()
            .ok_or_else(bid_not_found_error)
    }

    async fn find_driver_bid(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<Option<Bid>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .bids
            .iter()
            .find(|bid| bid.ride_id == ride_id && bid.driver_id == driver_id)
            .cloned())
    }

    async fn lower_bid_price(&self, id: Uuid, new_price: f64) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        tables.ensure_open_bid(id)?;

        let bid = tables
            .bids
            .iter_mut()
            .find(|bid| bid.id == id)
            .ok_or_else(bid_not_found_error)?;

        if new_price >= bid.proposed_price {
            return Err(price_not_lower_error());
        }

        bid.proposed_price = new_price;
        Ok(())
    }

    async fn delete_bid(&self, id: Uuid) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        tables.ensure_open_bid(id)?;

        tables.bids.retain(|bid| bid.id != id);
        Ok(())
    }

    async fn list_bids(&self, ride_id: Uuid) -> Result<Vec<Bid>, Error> {
        let tables = self.tables.read().await;
        let mut bids: Vec<Bid> = tables
            .bids
            .iter()
            .filter(|bid| bid.ride_id == ride_id)
            .cloned()
            .collect();
        bids.sort_by_key(|bid| bid.created_at);
        Ok(bids)
    }

    async fn count_bids(&self, ride_id: Uuid) -> Result<i64, Error> {
        let tables = self.tables.read().await;
        Ok(tables.bids.iter().filter(|bid| bid.ride_id == ride_id).count() as i64)
    }

    async fn delete_sibling_bids(&self, ride_id: Uuid, keep: Uuid) -> Result<Vec<Bid>, Error> {
        let mut tables = self.tables.write().await;
        let (deleted, kept): (Vec<Bid>, Vec<Bid>) = tables
            .bids
            .drain(..)
            .partition(|bid| bid.ride_id == ride_id && bid.id != keep);
        tables.bids = kept;
        Ok(deleted)
    }

    async fn insert_review(&self, review: &Review) -> Result<User, Error> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&review.evaluated_id) {
            return Err(user_not_found_error());
        }

        let duplicate = tables.reviews.iter().any(|other| {
            other.ride_id == review.ride_id && other.evaluator_id == review.evaluator_id
        });
        if duplicate {
            return Err(already_reviewed_error());
        }

        tables.reviews.push(review.clone());

        let notes: Vec<i16> = tables
            .reviews
            .iter()
            .filter(|other| {
                other.evaluated_id == review.evaluated_id
                    && other.evaluation_type == review.evaluation_type
            })
            .map(|other| other.note)
            .collect();

        let user = tables
            .users
            .get_mut(&review.evaluated_id)
            .ok_or_else(user_not_found_error)?;
        user.apply_rating(review.evaluation_type, RatingSummary::from_notes(&notes));

        Ok(user.clone())
    }

    async fn list_reviews_about(
        &self,
        evaluated_id: Uuid,
        evaluation_type: EvaluationType,
    ) -> Result<Vec<Review>, Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .filter(|review| {
                review.evaluated_id == evaluated_id && review.evaluation_type == evaluation_type
            })
            .cloned()
            .collect())
    }

    async fn insert_message(&self, message: &Message) -> Result<(), Error> {
        let mut tables = self.tables.write().await;

        if !tables.rides.contains_key(&message.ride_id) {
            return Err(ride_not_found_error());
        }

        tables.messages.push(message.clone());
        Ok(())
    }

    async fn list_messages(&self, ride_id: Uuid) -> Result<Vec<Message>, Error> {
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|message| message.ride_id == ride_id)
            .cloned()
            .collect();
        messages.sort_by_key(|message| message.created_at);
        Ok(messages)
    }

    async fn mark_messages_read(&self, ride_id: Uuid, recipient_id: Uuid) -> Result<u64, Error> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;

        for message in tables.messages.iter_mut() {
            if message.ride_id == ride_id && message.recipient_id == recipient_id && !message.read
            {
                message.read = true;
                changed += 1;
            }
        }

        Ok(changed)
    }

    async fn platform_stats(&self) -> Result<PlatformStats, Error> {
        let tables = self.tables.read().await;
        let count_rides = |status: RideStatus| {
            tables
                .rides
                .values()
                .filter(|ride| ride.status == status)
                .count() as i64
        };

        Ok(PlatformStats {
            users: tables.users.len() as i64,
            validated_users: tables.users.values().filter(|user| user.validated).count() as i64,
            available_rides: count_rides(RideStatus::Available),
            awarded_rides: count_rides(RideStatus::Awarded),
            completed_rides: count_rides(RideStatus::Completed),
            open_bids: tables
                .bids
                .iter()
                .filter(|bid| {
                    tables
                        .rides
                        .get(&bid.ride_id)
                        .map_or(false, |ride| ride.is_available())
                })
                .count() as i64,
            reviews: tables.reviews.len() as i64,
        })
    }
}

#[cfg(test)]
use crate::entities::{ride::details, user::registration, AccountType};
#[cfg(test)]
use chrono::Utc;
#[cfg(test)]
use tokio_test::block_on;

#[cfg(test)]
async fn seeded() -> (MemoryStore, Ride) {
    let store = MemoryStore::new();
    let requester = User::new(
        Uuid::new_v4(),
        registration("requester@example.com", AccountType::Requester),
    )
    .unwrap();
    store.insert_user(&requester).await.unwrap();

    let ride = Ride::new(requester.id, details(100.0, Utc::now())).unwrap();
    store.insert_ride(&ride).await.unwrap();

    (store, ride)
}

#[test]
fn duplicate_bid_is_refused_by_the_write_test() {
    block_on(async {
        let (store, ride) = seeded().await;
        let driver_id = Uuid::new_v4();

        store
            .insert_bid(&Bid::new(ride.id, driver_id, 90.0))
            .await
            .unwrap();
        let err = store
            .insert_bid(&Bid::new(ride.id, driver_id, 80.0))
            .await
            .unwrap_err();

        assert_eq!(err, duplicate_bid_error());
        assert_eq!(store.count_bids(ride.id).await.unwrap(), 1);
    })
}

#[test]
fn bid_above_ceiling_is_refused_by_the_write_test() {
    block_on(async {
        let (store, ride) = seeded().await;
        let err = store
            .insert_bid(&Bid::new(ride.id, Uuid::new_v4(), 100.5))
            .await
            .unwrap_err();

        assert_eq!(err, invalid_price_error());
    })
}

#[test]
fn received_bids_keep_counting_after_a_withdrawal_test() {
    block_on(async {
        let (store, ride) = seeded().await;
        let first = Bid::new(ride.id, Uuid::new_v4(), 90.0);

        assert_eq!(store.insert_bid(&first).await.unwrap(), 1);
        store.delete_bid(first.id).await.unwrap();

        let second = Bid::new(ride.id, Uuid::new_v4(), 95.0);
        assert_eq!(store.insert_bid(&second).await.unwrap(), 2);

        let refused = store
            .insert_bid(&Bid::new(ride.id, second.driver_id, 80.0))
            .await
            .unwrap_err();
        assert_eq!(refused, duplicate_bid_error());

        let third = Bid::new(ride.id, Uuid::new_v4(), 85.0);
        assert_eq!(store.insert_bid(&third).await.unwrap(), 3);
    })
}

#[test]
fn lower_bid_price_is_strict_test() {
    block_on(async {
        let (store, ride) = seeded().await;
        let bid = Bid::new(ride.id, Uuid::new_v4(), 80.0);
        store.insert_bid(&bid).await.unwrap();

        assert_eq!(
            store.lower_bid_price(bid.id, 80.0).await.unwrap_err(),
            price_not_lower_error()
        );
        store.lower_bid_price(bid.id, 79.0).await.unwrap();
        assert_eq!(store.find_bid(bid.id).await.unwrap().proposed_price, 79.0);
    })
}

#[test]
fn update_ride_is_compare_and_set_test() {
    block_on(async {
        let (store, mut ride) = seeded().await;
        let bid = Bid::new(ride.id, Uuid::new_v4(), 80.0);
        ride.award(&bid).unwrap();

        store
            .update_ride(&ride, RideStatus::Available)
            .await
            .unwrap();
        let err = store
            .update_ride(&ride, RideStatus::Available)
            .await
            .unwrap_err();

        assert_eq!(err, invalid_state_error());
    })
}

#[test]
fn award_ride_refuses_a_revised_bid_test() {
    block_on(async {
        let (store, mut ride) = seeded().await;
        let bid = Bid::new(ride.id, Uuid::new_v4(), 85.0);
        store.insert_bid(&bid).await.unwrap();

        // the driver lowers the bid after the requester loaded it
        store.lower_bid_price(bid.id, 70.0).await.unwrap();

        ride.award(&bid).unwrap();
        let err = store.award_ride(&ride, &bid).await.unwrap_err();

        assert_eq!(err, bid_changed_error());
        assert!(store.find_ride(ride.id).await.unwrap().is_available());
    })
}

#[test]
fn award_ride_refuses_a_withdrawn_bid_test() {
    block_on(async {
        let (store, mut ride) = seeded().await;
        let bid = Bid::new(ride.id, Uuid::new_v4(), 85.0);
        store.insert_bid(&bid).await.unwrap();
        store.delete_bid(bid.id).await.unwrap();

        ride.award(&bid).unwrap();
        let err = store.award_ride(&ride, &bid).await.unwrap_err();

        assert_eq!(err, bid_changed_error());
        assert_eq!(store.find_ride(ride.id).await.unwrap().awarded_driver_id, None);
    })
}

#[test]
fn awarded_bid_is_frozen_test() {
    block_on(async {
        let (store, mut ride) = seeded().await;
        let bid = Bid::new(ride.id, Uuid::new_v4(), 85.0);
        store.insert_bid(&bid).await.unwrap();

        ride.award(&bid).unwrap();
        store.award_ride(&ride, &bid).await.unwrap();

        assert_eq!(
            store.award_ride(&ride, &bid).await.unwrap_err(),
            ride_not_available_error()
        );
        assert_eq!(
            store.lower_bid_price(bid.id, 70.0).await.unwrap_err(),
            ride_not_available_error()
        );
        assert_eq!(
            store.delete_bid(bid.id).await.unwrap_err(),
            ride_not_available_error()
        );

        let stored = store.find_ride(ride.id).await.unwrap();
        assert_eq!(stored.price, store.find_bid(bid.id).await.unwrap().proposed_price);
    })
}

#[test]
fn deleting_a_ride_cascades_to_bids_test() {
    block_on(async {
        let (store, ride) = seeded().await;
        store
            .insert_bid(&Bid::new(ride.id, Uuid::new_v4(), 90.0))
            .await
            .unwrap();
        store
            .insert_bid(&Bid::new(ride.id, Uuid::new_v4(), 85.0))
            .await
            .unwrap();

        store.delete_available_ride(ride.id).await.unwrap();

        assert_eq!(store.count_bids(ride.id).await.unwrap(), 0);
        assert_eq!(
            store.find_ride(ride.id).await.unwrap_err(),
            ride_not_found_error()
        );
    })
}

#[test]
fn delete_sibling_bids_keeps_the_winner_test() {
    block_on(async {
        let (store, ride) = seeded().await;
        let winner = Bid::new(ride.id, Uuid::new_v4(), 85.0);
        let loser = Bid::new(ride.id, Uuid::new_v4(), 90.0);
        store.insert_bid(&loser).await.unwrap();
        store.insert_bid(&winner).await.unwrap();

        let deleted = store.delete_sibling_bids(ride.id, winner.id).await.unwrap();

        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].id, loser.id);
        let remaining = store.list_bids(ride.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, winner.id);
    })
}

#[test]
fn duplicate_review_is_refused_by_the_write_test() {
    block_on(async {
        let (store, ride) = seeded().await;
        let evaluator = Uuid::new_v4();

        let review = Review::new(
            ride.id,
            evaluator,
            ride.requester_id,
            EvaluationType::Requester,
            5,
            None,
        )
        .unwrap();
        store.insert_review(&review).await.unwrap();

        let again = Review::new(
            ride.id,
            evaluator,
            ride.requester_id,
            EvaluationType::Requester,
            1,
            None,
        )
        .unwrap();
        assert_eq!(
            store.insert_review(&again).await.unwrap_err(),
            already_reviewed_error()
        );

        let requester = store.find_user(ride.requester_id).await.unwrap();
        assert_eq!(requester.rating_as_requester, Some(5.0));
        assert_eq!(requester.rides_as_requester, 1);
    })
}

#[test]
fn failed_review_leaves_nothing_behind_test() {
    block_on(async {
        let (store, ride) = seeded().await;
        let driver = User::new(
            Uuid::new_v4(),
            registration("driver@example.com", AccountType::Driver),
        )
        .unwrap();

        let review = Review::new(
            ride.id,
            ride.requester_id,
            driver.id,
            EvaluationType::Driver,
            4,
            None,
        )
        .unwrap();

        // the evaluated account does not exist yet
        assert_eq!(
            store.insert_review(&review).await.unwrap_err(),
            user_not_found_error()
        );
        assert!(store
            .list_reviews_about(driver.id, EvaluationType::Driver)
            .await
            .unwrap()
            .is_empty());

        store.insert_user(&driver).await.unwrap();
        let rated = store.insert_review(&review).await.unwrap();

        assert_eq!(rated.rating_as_driver, Some(4.0));
        assert_eq!(rated.rides_as_driver, 1);
    })
}

#[test]
fn profile_update_keeps_managed_fields_test() {
    block_on(async {
        let (store, ride) = seeded().await;
        let stale = store.find_user(ride.requester_id).await.unwrap();

        let review = Review::new(
            ride.id,
            Uuid::new_v4(),
            ride.requester_id,
            EvaluationType::Requester,
            4,
            None,
        )
        .unwrap();
        store.insert_review(&review).await.unwrap();
        store.set_validated(ride.requester_id).await.unwrap();

        let mut update = stale;
        update.first_name = "Louise".into();
        store.update_user(&update).await.unwrap();

        let user = store.find_user(ride.requester_id).await.unwrap();
        assert_eq!(user.first_name, "Louise");
        assert!(user.validated);
        assert_eq!(user.rating_as_requester, Some(4.0));
        assert_eq!(user.rides_as_requester, 1);
    })
}

#[test]
fn set_validated_is_idempotent_test() {
    block_on(async {
        let (store, ride) = seeded().await;

        let validated = store.set_validated(ride.requester_id).await.unwrap();
        assert!(validated.unwrap().validated);
        assert!(store.set_validated(ride.requester_id).await.unwrap().is_none());
        assert_eq!(
            store.set_validated(Uuid::new_v4()).await.unwrap_err(),
            user_not_found_error()
        );
    })
}
