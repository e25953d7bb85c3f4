use chrono::{DateTime, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Ride;
use crate::error::{
    non_positive_price_error, price_above_ceiling_error, price_not_lower_error,
    ride_not_available_error, Error,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub proposed_price: f64,
    pub created_at: DateTime<Utc>,
}

impl PolarClass for Bid {
    fn get_polar_class_builder() -> oso::ClassBuilder<Bid> {
        oso::Class::builder()
            .name("Bid")
            .add_attribute_getter("id", |recv: &Bid| recv.id.to_string())
            .add_attribute_getter("ride_id", |recv: &Bid| recv.ride_id.to_string())
            .add_attribute_getter("driver_id", |recv: &Bid| recv.driver_id.to_string())
    }

    fn get_polar_class() -> oso::Class {
        let builder = Bid::get_polar_class_builder();
        builder.build()
    }
}

impl Bid {
    pub fn new(ride_id: Uuid, driver_id: Uuid, proposed_price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            ride_id,
            driver_id,
            proposed_price,
            created_at: Utc::now(),
        }
    }

    /// Lowers the proposed price. Bids only ever go down, and never above the
    /// ride's ceiling.
    #[tracing::instrument(skip(self, ride), fields(bid_id = %self.id))]
    pub fn revise(&mut self, ride: &Ride, new_price: f64) -> Result<(), Error> {
        if !ride.is_available() {
            return Err(ride_not_available_error());
        }

        if !(new_price > 0.0) {
            return Err(non_positive_price_error());
        }

        if new_price >= self.proposed_price {
            return Err(price_not_lower_error());
        }

        if new_price > ride.price {
            return Err(price_above_ceiling_error());
        }

        self.proposed_price = new_price;

        Ok(())
    }
}

#[test]
fn revise_must_lower_the_price_test() {
    use crate::entities::ride::details;

    let ride = Ride::new(Uuid::new_v4(), details(100.0, Utc::now())).unwrap();
    let mut bid = Bid::new(ride.id, Uuid::new_v4(), 80.0);

    assert_eq!(bid.revise(&ride, 80.0).unwrap_err(), price_not_lower_error());
    assert_eq!(bid.revise(&ride, 85.0).unwrap_err(), price_not_lower_error());
    assert_eq!(bid.proposed_price, 80.0);

    bid.revise(&ride, 79.0).unwrap();
    assert_eq!(bid.proposed_price, 79.0);
}

#[test]
fn revise_never_exceeds_ceiling_test() {
    use crate::entities::ride::details;

    let ride = Ride::new(Uuid::new_v4(), details(100.0, Utc::now())).unwrap();

    // a bid that somehow sits above the ceiling can only come down below it
    let mut bid = Bid::new(ride.id, Uuid::new_v4(), 130.0);

    assert_eq!(bid.revise(&ride, 120.0).unwrap_err(), price_above_ceiling_error());
    bid.revise(&ride, 95.0).unwrap();
    assert_eq!(bid.proposed_price, 95.0);
}

#[test]
fn revise_requires_available_ride_test() {
    use crate::entities::ride::details;

    let mut ride = Ride::new(Uuid::new_v4(), details(100.0, Utc::now())).unwrap();
    let mut bid = Bid::new(ride.id, Uuid::new_v4(), 90.0);
    let winner = Bid::new(ride.id, Uuid::new_v4(), 85.0);
    ride.award(&winner).unwrap();

    assert_eq!(bid.revise(&ride, 70.0).unwrap_err(), ride_not_available_error());
    assert_eq!(bid.proposed_price, 90.0);
}
