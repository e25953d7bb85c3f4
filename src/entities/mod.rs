mod bid;
mod message;
mod review;
pub(crate) mod ride;
pub(crate) mod user;
mod vehicle;

pub use bid::Bid;
pub use message::Message;
pub use review::{EvaluationType, RatingSummary, Review};
pub use ride::{
    Address, FlightInfo, PassengerContact, PrivacyMode, Ride, RideDetails, SettlementMode,
    Status as RideStatus,
};
pub use user::{AccountType, BillingInfo, ProfileUpdate, Registration, User};
pub use vehicle::Vehicle;
