pub mod admin;
pub mod bids;
pub mod messages;
pub mod reviews;
pub mod rides;
pub mod users;
pub mod vehicles;
