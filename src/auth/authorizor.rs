use oso::{Oso, PolarClass};

use crate::auth::{Actor, Platform};
use crate::entities::{Bid, Ride};
use crate::error::Error;

pub fn new() -> Result<Oso, Error> {
    let mut o = Oso::new();

    o.register_class(Platform::get_polar_class())?;
    o.register_class(Actor::get_polar_class())?;
    o.register_class(Ride::get_polar_class())?;
    o.register_class(Bid::get_polar_class())?;

    o.load_str(include_str!("rules.polar"))?;

    Ok(o)
}

#[cfg(test)]
fn actor(roles: &[&str], validated: bool) -> Actor {
    use uuid::Uuid;

    Actor {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", Uuid::new_v4()),
        validated,
        roles: roles.iter().map(|role| role.to_string()).collect(),
    }
}

#[cfg(test)]
fn ride(requester: &Actor) -> Ride {
    use crate::entities::ride::details;
    use chrono::Utc;

    Ride::new(requester.id, details(100.0, Utc::now())).unwrap()
}

#[test]
fn rules_load_test() {
    let authorizor = new();

    assert!(authorizor.is_ok(), "{:?}", authorizor.err());
}

#[test]
fn platform_role_test() {
    let authorizor = new().unwrap();

    let requester = actor(&["requester"], false);
    let driver = actor(&["driver"], true);
    let admin = actor(&["admin"], false);

    let result = authorizor.is_allowed(requester.clone(), "publish_ride", Platform);
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver.clone(), "publish_ride", Platform);
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(driver.clone(), "add_vehicle", Platform);
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(requester.clone(), "add_vehicle", Platform);
    assert_eq!(result.unwrap(), false);

    for action in ["validate_user", "view_stats"] {
        let result = authorizor.is_allowed(admin.clone(), action, Platform);
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(requester.clone(), action, Platform);
        assert_eq!(result.unwrap(), false);
    }
}

#[test]
fn ride_requester_role_test() {
    let authorizor = new().unwrap();

    let requester = actor(&["requester"], true);
    let stranger = actor(&["requester"], true);
    let ride = ride(&requester);

    let result = authorizor.is_allowed(requester.clone(), "manage", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(stranger.clone(), "manage", ride.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(requester.clone(), "review", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(stranger.clone(), "review", ride.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn ride_bid_permission_test() {
    let authorizor = new().unwrap();

    let requester = actor(&["requester", "driver"], true);
    let validated_driver = actor(&["driver"], true);
    let pending_driver = actor(&["driver"], false);
    let plain_requester = actor(&["requester"], true);
    let ride = ride(&requester);

    let result = authorizor.is_allowed(validated_driver.clone(), "bid", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(pending_driver.clone(), "bid", ride.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(plain_requester.clone(), "bid", ride.clone());
    assert_eq!(result.unwrap(), false);

    // no bidding on one's own ride
    let result = authorizor.is_allowed(requester.clone(), "bid", ride.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn ride_read_and_award_test() {
    let authorizor = new().unwrap();

    let requester = actor(&["requester"], true);
    let driver = actor(&["driver"], true);
    let other_driver = actor(&["driver"], true);
    let mut ride = ride(&requester);

    // an open ride is readable by everyone
    let result = authorizor.is_allowed(other_driver.clone(), "read", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver.clone(), "review", ride.clone());
    assert_eq!(result.unwrap(), false);

    ride.award(&Bid::new(ride.id, driver.id, 90.0)).unwrap();

    let result = authorizor.is_allowed(other_driver.clone(), "read", ride.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(driver.clone(), "read", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(requester.clone(), "read", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver.clone(), "review", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver.clone(), "message", ride.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(driver.clone(), "manage", ride.clone());
    assert_eq!(result.unwrap(), false);
}

#[test]
fn bid_owner_test() {
    let authorizor = new().unwrap();

    let requester = actor(&["requester"], true);
    let driver = actor(&["driver"], true);
    let other_driver = actor(&["driver"], true);
    let ride = ride(&requester);
    let bid = Bid::new(ride.id, driver.id, 90.0);

    let result = authorizor.is_allowed(driver.clone(), "update", bid.clone());
    assert_eq!(result.unwrap(), true);

    let result = authorizor.is_allowed(other_driver.clone(), "update", bid.clone());
    assert_eq!(result.unwrap(), false);

    let result = authorizor.is_allowed(requester.clone(), "update", bid.clone());
    assert_eq!(result.unwrap(), false);
}
