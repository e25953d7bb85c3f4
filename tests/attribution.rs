mod common;

use chrono::{Duration, Utc};
use tokio_test::block_on;

use affretement::api::{BidAPI, MessageAPI, RideAPI};
use affretement::entities::{AccountType, RideStatus};
use affretement::error::{
    chat_not_open_error, duplicate_bid_error, invalid_price_error, not_participant_error,
    price_above_ceiling_error, price_not_lower_error, ride_not_available_error,
    ride_not_found_error, unauthorized_error, user_not_validated_error,
};

use common::{details, failing_harness, harness, publish, register, register_validated};

#[test]
fn accepting_a_bid_awards_the_ride_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;
        let b = register_validated(&h.engine, &h.admin, "b@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;

        let bid_a = h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap();
        let bid_b = h.engine.submit_bid(b.clone(), ride.id, 85.0).await.unwrap();
        assert!(bid_a.is_first);
        assert!(!bid_b.is_first);

        h.notifier.clear();

        let ride = h
            .engine
            .accept_bid(requester.clone(), bid_b.bid.id)
            .await
            .unwrap();

        assert_eq!(ride.status, RideStatus::Awarded);
        assert_eq!(ride.awarded_driver_id, Some(b.id));
        assert_eq!(ride.price, 85.0);

        // only the accepted offer survives
        let bids = h.engine.list_bids(requester.clone(), ride.id).await.unwrap();
        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0].id, bid_b.bid.id);
        assert!(h.engine.list_bids(a.clone(), ride.id).await.unwrap().is_empty());

        let to_a = h.notifier.sent_to("a@vtc.fr");
        assert_eq!(to_a.len(), 1);
        assert!(to_a[0].subject.contains("pas été retenue"));

        let to_b = h.notifier.sent_to("b@vtc.fr");
        assert_eq!(to_b.len(), 1);
        assert!(to_b[0].subject.contains("a été retenue"));
        assert!(to_b[0].html.contains("SAS ops@transports.fr"));
        assert!(to_b[0].html.contains("12345678900011"));
        assert!(to_b[0].html.contains("10 rue du Faubourg Saint-Honoré"));
    });
}

#[test]
fn ceiling_stays_fixed_after_revisions_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;
        let b = register_validated(&h.engine, &h.admin, "b@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;

        let bid = h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap().bid;
        let bid = h.engine.revise_bid(a.clone(), bid.id, 70.0).await.unwrap();
        assert_eq!(bid.proposed_price, 70.0);

        assert_eq!(
            h.engine.submit_bid(b.clone(), ride.id, 100.5).await.unwrap_err(),
            invalid_price_error()
        );

        // the ceiling, not the best offer, bounds new bids
        let other = h.engine.submit_bid(b.clone(), ride.id, 95.0).await.unwrap();
        assert_eq!(other.bid.proposed_price, 95.0);
    });
}

#[test]
fn revisions_only_go_down_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;
        let b = register_validated(&h.engine, &h.admin, "b@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;
        let bid = h.engine.submit_bid(a.clone(), ride.id, 80.0).await.unwrap().bid;

        assert_eq!(
            h.engine.revise_bid(a.clone(), bid.id, 80.0).await.unwrap_err(),
            price_not_lower_error()
        );
        assert_eq!(
            h.engine.revise_bid(a.clone(), bid.id, 85.0).await.unwrap_err(),
            price_not_lower_error()
        );

        // someone else's bid
        assert_eq!(
            h.engine.revise_bid(b.clone(), bid.id, 60.0).await.unwrap_err(),
            unauthorized_error()
        );

        let bid = h.engine.revise_bid(a.clone(), bid.id, 79.0).await.unwrap();
        assert_eq!(bid.proposed_price, 79.0);

        let stored = h.engine.list_bids(a.clone(), ride.id).await.unwrap();
        assert_eq!(stored[0].proposed_price, 79.0);
    });
}

#[test]
fn revision_above_ceiling_is_rejected_test() {
    use affretement::entities::Bid;
    use affretement::store::Store;

    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;
        let bid = h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap().bid;

        // a bid stored above the ceiling cannot be revised to another price
        // above it
        let mut ride_lowered = h.store.find_ride(ride.id).await.unwrap();
        ride_lowered.price = 50.0;
        h.store
            .update_ride(&ride_lowered, RideStatus::Available)
            .await
            .unwrap();

        assert_eq!(
            h.engine.revise_bid(a.clone(), bid.id, 60.0).await.unwrap_err(),
            price_above_ceiling_error()
        );

        let bid: Bid = h.engine.revise_bid(a.clone(), bid.id, 45.0).await.unwrap();
        assert_eq!(bid.proposed_price, 45.0);
    });
}

#[test]
fn one_bid_per_driver_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;

        h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap();

        assert_eq!(
            h.engine.submit_bid(a.clone(), ride.id, 80.0).await.unwrap_err(),
            duplicate_bid_error()
        );
        assert_eq!(
            h.engine
                .list_bids(requester.clone(), ride.id)
                .await
                .unwrap()
                .len(),
            1
        );
    });
}

#[test]
fn only_validated_drivers_bid_test() {
    block_on(async {
        let h = harness().await;
        let requester =
            register_validated(&h.engine, &h.admin, "ops@transports.fr", AccountType::Both).await;
        let pending = register(&h.engine, "pending@vtc.fr", AccountType::Driver).await;
        let other_requester = register(&h.engine, "other@transports.fr", AccountType::Requester).await;

        let ride = publish(&h.engine, &requester, 100.0).await;

        assert_eq!(
            h.engine
                .submit_bid(pending.clone(), ride.id, 90.0)
                .await
                .unwrap_err(),
            user_not_validated_error()
        );
        assert_eq!(
            h.engine
                .submit_bid(other_requester.clone(), ride.id, 90.0)
                .await
                .unwrap_err(),
            unauthorized_error()
        );

        // a validated driver cannot bid on a ride they published
        assert_eq!(
            h.engine
                .submit_bid(requester.clone(), ride.id, 90.0)
                .await
                .unwrap_err(),
            unauthorized_error()
        );
    });
}

#[test]
fn completed_ride_accepts_nothing_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;
        let b = register_validated(&h.engine, &h.admin, "b@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;
        let bid = h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap().bid;

        h.engine.accept_bid(requester.clone(), bid.id).await.unwrap();

        // awarded rides are closed to bidding already
        assert_eq!(
            h.engine.submit_bid(b.clone(), ride.id, 80.0).await.unwrap_err(),
            ride_not_available_error()
        );

        let ride = h.engine.complete_ride(requester.clone(), ride.id).await.unwrap();
        assert_eq!(ride.status, RideStatus::Completed);

        let err = h.engine.submit_bid(b.clone(), ride.id, 80.0).await.unwrap_err();
        assert!(err.is_state_error());

        let err = h
            .engine
            .accept_bid(requester.clone(), bid.id)
            .await
            .unwrap_err();
        assert!(err.is_state_error());

        let err = h
            .engine
            .complete_ride(requester.clone(), ride.id)
            .await
            .unwrap_err();
        assert!(err.is_state_error());
    });
}

#[test]
fn completion_invites_both_parties_to_review_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;
        let bid = h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap().bid;
        h.engine.accept_bid(requester.clone(), bid.id).await.unwrap();

        // only the requester completes a ride
        assert_eq!(
            h.engine.complete_ride(a.clone(), ride.id).await.unwrap_err(),
            unauthorized_error()
        );

        h.notifier.clear();
        h.engine.complete_ride(requester.clone(), ride.id).await.unwrap();

        assert_eq!(h.notifier.sent_to("ops@transports.fr").len(), 1);
        assert_eq!(h.notifier.sent_to("a@vtc.fr").len(), 1);
    });
}

#[test]
fn failing_notifications_never_block_test() {
    block_on(async {
        let (engine, admin) = failing_harness().await;
        let requester = register(&engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&engine, &admin, "a@vtc.fr", AccountType::Driver).await;
        let b = register_validated(&engine, &admin, "b@vtc.fr", AccountType::Driver).await;

        let ride = engine
            .publish_ride(requester.clone(), details(100.0, Utc::now() + Duration::hours(3)))
            .await
            .unwrap();

        engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap();
        let bid = engine.submit_bid(b.clone(), ride.id, 85.0).await.unwrap().bid;

        let ride = engine.accept_bid(requester.clone(), bid.id).await.unwrap();
        assert_eq!(ride.status, RideStatus::Awarded);
        assert_eq!(ride.price, 85.0);

        let ride = engine.complete_ride(requester.clone(), ride.id).await.unwrap();
        assert_eq!(ride.status, RideStatus::Completed);
    });
}

#[test]
fn urgent_rides_are_announced_test() {
    block_on(async {
        let h = harness().await;
        let requester =
            register_validated(&h.engine, &h.admin, "ops@transports.fr", AccountType::Requester)
                .await;
        register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;
        register(&h.engine, "pending@vtc.fr", AccountType::Driver).await;

        h.notifier.clear();

        // far ahead: nobody is told
        publish(&h.engine, &requester, 100.0).await;
        assert!(h.notifier.sent().is_empty());

        h.engine
            .publish_ride(requester.clone(), details(100.0, Utc::now() + Duration::hours(12)))
            .await
            .unwrap();

        assert_eq!(h.notifier.sent_to("a@vtc.fr").len(), 1);
        assert!(h.notifier.sent_to("pending@vtc.fr").is_empty());
        assert!(h.notifier.sent_to("ops@transports.fr").is_empty());
    });
}

#[test]
fn cancelling_a_ride_removes_its_bids_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;
        h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap();

        assert_eq!(
            h.engine.cancel_ride(a.clone(), ride.id).await.unwrap_err(),
            unauthorized_error()
        );

        h.notifier.clear();
        h.engine.cancel_ride(requester.clone(), ride.id).await.unwrap();

        assert_eq!(h.notifier.sent_to("a@vtc.fr").len(), 1);
        assert_eq!(
            h.engine.list_bids(a.clone(), ride.id).await.unwrap_err(),
            ride_not_found_error()
        );
    });
}

#[test]
fn awarded_ride_cannot_be_cancelled_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;
        let bid = h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap().bid;
        h.engine.accept_bid(requester.clone(), bid.id).await.unwrap();

        assert_eq!(
            h.engine.cancel_ride(requester.clone(), ride.id).await.unwrap_err(),
            ride_not_available_error()
        );
        assert_eq!(
            h.engine.withdraw_bid(a.clone(), bid.id).await.unwrap_err(),
            ride_not_available_error()
        );
    });
}

#[test]
fn withdraw_and_refuse_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;
        let b = register_validated(&h.engine, &h.admin, "b@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;
        let bid_a = h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap().bid;
        let bid_b = h.engine.submit_bid(b.clone(), ride.id, 95.0).await.unwrap().bid;

        h.engine.withdraw_bid(a.clone(), bid_a.id).await.unwrap();

        h.notifier.clear();
        h.engine.refuse_bid(requester.clone(), bid_b.id).await.unwrap();

        assert_eq!(h.notifier.sent_to("b@vtc.fr").len(), 1);
        assert!(h
            .engine
            .list_bids(requester.clone(), ride.id)
            .await
            .unwrap()
            .is_empty());

        // the driver may bid again once the previous bid is gone
        h.engine.submit_bid(a.clone(), ride.id, 88.0).await.unwrap();
    });
}

#[test]
fn only_the_very_first_bid_opens_the_chat_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;
        let b = register_validated(&h.engine, &h.admin, "b@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;

        let first = h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap();
        assert!(first.is_first);
        h.engine.withdraw_bid(a.clone(), first.bid.id).await.unwrap();

        h.notifier.clear();

        let next = h.engine.submit_bid(b.clone(), ride.id, 95.0).await.unwrap();
        assert!(!next.is_first);

        let to_requester = h.notifier.sent_to("ops@transports.fr");
        assert_eq!(to_requester.len(), 1);
        assert!(to_requester[0].subject.starts_with("Nouvelle"));
        assert!(!to_requester[0].html.contains("messagerie"));
    });
}

#[test]
fn requester_sees_bids_by_ascending_price_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;
        let b = register_validated(&h.engine, &h.admin, "b@vtc.fr", AccountType::Driver).await;
        let c = register_validated(&h.engine, &h.admin, "c@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;
        h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap();
        h.engine.submit_bid(b.clone(), ride.id, 70.0).await.unwrap();
        h.engine.submit_bid(c.clone(), ride.id, 80.0).await.unwrap();

        let prices: Vec<f64> = h
            .engine
            .list_bids(requester.clone(), ride.id)
            .await
            .unwrap()
            .iter()
            .map(|bid| bid.proposed_price)
            .collect();
        assert_eq!(prices, vec![70.0, 80.0, 90.0]);

        let own = h.engine.list_bids(c.clone(), ride.id).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].driver_id, c.id);
    });
}

#[test]
fn drivers_see_redacted_rides_until_awarded_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;

        let view = h.engine.find_ride(a.clone(), ride.id).await.unwrap();
        assert_eq!(view.origin.full_address, "Paris 8e");

        let listed = h.engine.list_available_rides(a.clone()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].destination.full_address, "Orly");

        let bid = h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap().bid;
        h.engine.accept_bid(requester.clone(), bid.id).await.unwrap();

        let view = h.engine.find_ride(a.clone(), ride.id).await.unwrap();
        assert_eq!(
            view.origin.full_address,
            "10 rue du Faubourg Saint-Honoré, 75008 Paris"
        );

        let mine = h.engine.list_my_rides(a.clone()).await.unwrap();
        assert_eq!(mine.len(), 1);
    });
}

#[test]
fn chat_opens_with_the_first_bid_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let a = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;
        let b = register_validated(&h.engine, &h.admin, "b@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;

        assert_eq!(
            h.engine
                .send_message(requester.clone(), ride.id, a.id, "Bonjour".into())
                .await
                .unwrap_err(),
            chat_not_open_error()
        );

        h.engine.submit_bid(a.clone(), ride.id, 90.0).await.unwrap();
        h.notifier.clear();

        h.engine
            .send_message(a.clone(), ride.id, requester.id, "Disponible".into())
            .await
            .unwrap();
        h.engine
            .send_message(a.clone(), ride.id, requester.id, "Je confirme".into())
            .await
            .unwrap();

        // one email for the first message of the conversation only
        assert_eq!(h.notifier.sent_to("ops@transports.fr").len(), 1);

        h.engine
            .send_message(requester.clone(), ride.id, a.id, "Merci".into())
            .await
            .unwrap();
        assert_eq!(h.notifier.sent_to("a@vtc.fr").len(), 1);

        // b holds no bid on the ride
        assert_eq!(
            h.engine
                .send_message(b.clone(), ride.id, requester.id, "Et moi ?".into())
                .await
                .unwrap_err(),
            not_participant_error()
        );
        assert_eq!(
            h.engine
                .send_message(requester.clone(), ride.id, b.id, "Non".into())
                .await
                .unwrap_err(),
            not_participant_error()
        );
        assert_eq!(
            h.engine
                .send_message(a.clone(), ride.id, b.id, "Salut".into())
                .await
                .unwrap_err(),
            not_participant_error()
        );

        let messages = h.engine.list_messages(a.clone(), ride.id).await.unwrap();
        assert_eq!(messages.len(), 3);

        assert_eq!(h.engine.mark_read(requester.clone(), ride.id).await.unwrap(), 2);
        assert_eq!(h.engine.mark_read(requester.clone(), ride.id).await.unwrap(), 0);
    });
}
