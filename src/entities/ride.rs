use chrono::{DateTime, Duration, Utc};
use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Bid, EvaluationType};
use crate::error::{
    invalid_input_error, invalid_price_error, non_positive_price_error, ride_not_available_error,
    ride_not_awarded_error, Error,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub status: Status,
    pub origin: Address,
    pub destination: Address,
    pub scheduled_at: DateTime<Utc>,
    pub passengers: i32,
    pub luggage: i32,
    /// Ceiling while the ride is open, agreed price once awarded.
    pub price: f64,
    pub client_price: Option<f64>,
    pub settlement_mode: SettlementMode,
    pub privacy_mode: PrivacyMode,
    pub flight: Option<FlightInfo>,
    pub instructions: Option<String>,
    pub passenger: Option<PassengerContact>,
    pub awarded_driver_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Available,
    Awarded,
    Completed,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Available => "available".into(),
            Self::Awarded => "awarded".into(),
            Self::Completed => "completed".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Short form shown to every driver, usually the city.
    pub label: String,
    pub full_address: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// The passenger pays the driver on board.
    OnBoard,
    /// The driver invoices the requester.
    Invoice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyMode {
    Standard,
    /// Instructions are withheld from drivers until the ride is awarded.
    Discreet,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlightInfo {
    pub number: String,
    pub airport: Option<String>,
    pub terminal: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassengerContact {
    pub name: String,
    pub phone: Option<String>,
}

/// Everything a requester provides when publishing a ride.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RideDetails {
    pub origin: Address,
    pub destination: Address,
    pub scheduled_at: DateTime<Utc>,
    pub passengers: i32,
    #[serde(default)]
    pub luggage: i32,
    pub price: f64,
    pub client_price: Option<f64>,
    pub settlement_mode: SettlementMode,
    pub privacy_mode: PrivacyMode,
    pub flight: Option<FlightInfo>,
    pub instructions: Option<String>,
    pub passenger: Option<PassengerContact>,
}

impl PolarClass for Ride {
    fn get_polar_class_builder() -> oso::ClassBuilder<Ride> {
        oso::Class::builder()
            .name("Ride")
            .add_attribute_getter("id", |recv: &Ride| recv.id.to_string())
            .add_attribute_getter("requester_id", |recv: &Ride| recv.requester_id.to_string())
            .add_attribute_getter("status", |recv: &Ride| recv.status.name())
            .add_attribute_getter("awarded_driver_id", |recv: &Ride| {
                recv.awarded_driver_id
                    .map(|id| id.to_string())
                    .unwrap_or_default()
            })
    }

    fn get_polar_class() -> oso::Class {
        let builder = Ride::get_polar_class_builder();
        builder.build()
    }
}

impl Ride {
    pub fn new(requester_id: Uuid, details: RideDetails) -> Result<Self, Error> {
        if !(details.price > 0.0) {
            return Err(non_positive_price_error());
        }

        if let Some(client_price) = details.client_price {
            if !(client_price > 0.0) {
                return Err(non_positive_price_error());
            }
        }

        if details.passengers < 1 || details.luggage < 0 {
            return Err(invalid_input_error());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            requester_id,
            status: Status::Available,
            origin: details.origin,
            destination: details.destination,
            scheduled_at: details.scheduled_at,
            passengers: details.passengers,
            luggage: details.luggage,
            price: details.price,
            client_price: details.client_price,
            settlement_mode: details.settlement_mode,
            privacy_mode: details.privacy_mode,
            flight: details.flight,
            instructions: details.instructions,
            passenger: details.passenger,
            awarded_driver_id: None,
            created_at: Utc::now(),
        })
    }

    pub fn is_available(&self) -> bool {
        self.status == Status::Available
    }

    pub fn is_urgent(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.scheduled_at - now < window
    }

    pub fn is_requester(&self, user_id: Uuid) -> bool {
        self.requester_id == user_id
    }

    pub fn is_awarded_driver(&self, user_id: Uuid) -> bool {
        self.awarded_driver_id == Some(user_id)
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.is_requester(user_id) || self.is_awarded_driver(user_id)
    }

    /// Checks a price offered by a driver against the ceiling.
    pub fn check_bid_price(&self, proposed_price: f64) -> Result<(), Error> {
        if !self.is_available() {
            return Err(ride_not_available_error());
        }

        if !(proposed_price > 0.0) {
            return Err(non_positive_price_error());
        }

        if proposed_price > self.price {
            return Err(invalid_price_error());
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(ride_id = %self.id))]
    pub fn award(&mut self, bid: &Bid) -> Result<(), Error> {
        if !self.is_available() {
            return Err(ride_not_available_error());
        }

        if bid.ride_id != self.id {
            return Err(invalid_input_error());
        }

        if bid.proposed_price > self.price {
            return Err(invalid_price_error());
        }

        self.status = Status::Awarded;
        self.awarded_driver_id = Some(bid.driver_id);
        self.price = bid.proposed_price;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(ride_id = %self.id))]
    pub fn complete(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Awarded => {
                self.status = Status::Completed;
                Ok(())
            }
            _ => Err(ride_not_awarded_error()),
        }
    }

    pub fn ensure_cancellable(&self) -> Result<(), Error> {
        match self.status {
            Status::Available => Ok(()),
            _ => Err(ride_not_available_error()),
        }
    }

    /// Who `evaluator_id` rates on this ride, and in which pool.
    pub fn counterpart_of(&self, evaluator_id: Uuid) -> Option<(Uuid, EvaluationType)> {
        let driver_id = self.awarded_driver_id?;

        if evaluator_id == self.requester_id {
            Some((driver_id, EvaluationType::Driver))
        } else if evaluator_id == driver_id {
            Some((self.requester_id, EvaluationType::Requester))
        } else {
            None
        }
    }

    /// The view of the ride given to drivers who have not been awarded it.
    pub fn redacted(&self) -> Ride {
        let mut ride = self.clone();

        ride.origin.full_address = ride.origin.label.clone();
        ride.destination.full_address = ride.destination.label.clone();
        ride.passenger = None;
        ride.flight = None;

        if ride.privacy_mode == PrivacyMode::Discreet {
            ride.instructions = None;
        }

        ride
    }
}

#[cfg(test)]
pub(crate) fn details(price: f64, scheduled_at: DateTime<Utc>) -> RideDetails {
    RideDetails {
        origin: Address {
            label: "Paris".into(),
            full_address: "12 rue de Rivoli, 75001 Paris".into(),
        },
        destination: Address {
            label: "Roissy CDG".into(),
            full_address: "Aéroport Charles de Gaulle, Terminal 2E".into(),
        },
        scheduled_at,
        passengers: 2,
        luggage: 3,
        price,
        client_price: Some(price * 1.2),
        settlement_mode: SettlementMode::Invoice,
        privacy_mode: PrivacyMode::Discreet,
        flight: Some(FlightInfo {
            number: "AF1234".into(),
            airport: Some("CDG".into()),
            terminal: Some("2E".into()),
        }),
        instructions: Some("Pancarte au nom de M. Dupont".into()),
        passenger: Some(PassengerContact {
            name: "M. Dupont".into(),
            phone: Some("0611223344".into()),
        }),
    }
}

#[test]
fn new_ride_is_available_test() {
    let ride = Ride::new(Uuid::new_v4(), details(100.0, Utc::now())).unwrap();

    assert_eq!(ride.status, Status::Available);
    assert_eq!(ride.awarded_driver_id, None);
    assert_eq!(ride.price, 100.0);
}

#[test]
fn non_positive_ceiling_is_rejected_test() {
    let result = Ride::new(Uuid::new_v4(), details(0.0, Utc::now()));
    assert_eq!(result.unwrap_err(), non_positive_price_error());

    let result = Ride::new(Uuid::new_v4(), details(-10.0, Utc::now()));
    assert_eq!(result.unwrap_err(), non_positive_price_error());
}

#[test]
fn bid_price_is_bounded_by_ceiling_test() {
    let ride = Ride::new(Uuid::new_v4(), details(100.0, Utc::now())).unwrap();

    assert!(ride.check_bid_price(100.0).is_ok());
    assert!(ride.check_bid_price(42.5).is_ok());
    assert_eq!(ride.check_bid_price(100.01).unwrap_err(), invalid_price_error());
    assert_eq!(ride.check_bid_price(0.0).unwrap_err(), non_positive_price_error());
}

#[test]
fn award_sets_driver_and_agreed_price_test() {
    let mut ride = Ride::new(Uuid::new_v4(), details(100.0, Utc::now())).unwrap();
    let bid = Bid::new(ride.id, Uuid::new_v4(), 85.0);

    ride.award(&bid).unwrap();

    assert_eq!(ride.status, Status::Awarded);
    assert_eq!(ride.awarded_driver_id, Some(bid.driver_id));
    assert_eq!(ride.price, 85.0);

    // a second award is refused
    let other = Bid::new(ride.id, Uuid::new_v4(), 80.0);
    assert_eq!(ride.award(&other).unwrap_err(), ride_not_available_error());
}

#[test]
fn award_rejects_foreign_bid_test() {
    let mut ride = Ride::new(Uuid::new_v4(), details(100.0, Utc::now())).unwrap();
    let bid = Bid::new(Uuid::new_v4(), Uuid::new_v4(), 85.0);

    assert_eq!(ride.award(&bid).unwrap_err(), invalid_input_error());
    assert_eq!(ride.status, Status::Available);
}

#[test]
fn complete_requires_award_test() {
    let mut ride = Ride::new(Uuid::new_v4(), details(100.0, Utc::now())).unwrap();
    assert_eq!(ride.complete().unwrap_err(), ride_not_awarded_error());

    let bid = Bid::new(ride.id, Uuid::new_v4(), 90.0);
    ride.award(&bid).unwrap();
    ride.complete().unwrap();

    assert_eq!(ride.status, Status::Completed);
    assert_eq!(ride.check_bid_price(50.0).unwrap_err(), ride_not_available_error());
    assert_eq!(ride.complete().unwrap_err(), ride_not_awarded_error());
    assert_eq!(ride.ensure_cancellable().unwrap_err(), ride_not_available_error());
}

#[test]
fn counterpart_test() {
    let requester_id = Uuid::new_v4();
    let mut ride = Ride::new(requester_id, details(100.0, Utc::now())).unwrap();
    assert_eq!(ride.counterpart_of(requester_id), None);

    let bid = Bid::new(ride.id, Uuid::new_v4(), 90.0);
    ride.award(&bid).unwrap();

    assert_eq!(
        ride.counterpart_of(requester_id),
        Some((bid.driver_id, EvaluationType::Driver))
    );
    assert_eq!(
        ride.counterpart_of(bid.driver_id),
        Some((requester_id, EvaluationType::Requester))
    );
    assert_eq!(ride.counterpart_of(Uuid::new_v4()), None);
}

#[test]
fn urgency_window_test() {
    let now = Utc::now();
    let window = Duration::hours(48);

    let soon = Ride::new(Uuid::new_v4(), details(100.0, now + Duration::hours(20))).unwrap();
    let later = Ride::new(Uuid::new_v4(), details(100.0, now + Duration::hours(72))).unwrap();

    assert!(soon.is_urgent(now, window));
    assert!(!later.is_urgent(now, window));
}

#[test]
fn redacted_view_hides_private_details_test() {
    let ride = Ride::new(Uuid::new_v4(), details(100.0, Utc::now())).unwrap();
    let view = ride.redacted();

    assert_eq!(view.origin.full_address, "Paris");
    assert_eq!(view.destination.full_address, "Roissy CDG");
    assert_eq!(view.passenger, None);
    assert_eq!(view.flight, None);
    assert_eq!(view.instructions, None);
    assert_eq!(view.price, ride.price);
}
