mod common;

use tokio_test::block_on;

use affretement::api::{BidAPI, ReviewAPI, RideAPI, UserAPI};
use affretement::auth::Actor;
use affretement::entities::{AccountType, EvaluationType, Ride};
use affretement::error::{
    already_reviewed_error, invalid_note_error, not_participant_error, ride_not_completed_error,
};

use common::{harness, publish, register, register_validated, Harness};

/// Publishes, awards to `driver` and completes a ride.
async fn completed_ride(h: &Harness, requester: &Actor, driver: &Actor) -> Ride {
    let ride = publish(&h.engine, requester, 100.0).await;
    let bid = h
        .engine
        .submit_bid(driver.clone(), ride.id, 90.0)
        .await
        .unwrap()
        .bid;

    h.engine.accept_bid(requester.clone(), bid.id).await.unwrap();
    h.engine
        .complete_ride(requester.clone(), ride.id)
        .await
        .unwrap()
}

#[test]
fn driver_rating_is_the_rounded_mean_test() {
    block_on(async {
        let h = harness().await;
        let driver = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        for (email, note) in [("r1@transports.fr", 5), ("r2@transports.fr", 4), ("r3@transports.fr", 5)] {
            let requester = register(&h.engine, email, AccountType::Requester).await;
            let ride = completed_ride(&h, &requester, &driver).await;

            let review = h
                .engine
                .submit_review(requester.clone(), ride.id, note, Some("Ponctuel".into()))
                .await
                .unwrap();

            assert_eq!(review.evaluated_id, driver.id);
            assert_eq!(review.evaluation_type, EvaluationType::Driver);
        }

        let user = h.engine.find_user(driver.clone(), driver.id).await.unwrap();
        assert_eq!(user.rating_as_driver, Some(4.7));
        assert_eq!(user.rides_as_driver, 3);

        // the other pool is untouched
        assert_eq!(user.rating_as_requester, None);
        assert_eq!(user.rides_as_requester, 0);

        let reviews = h
            .engine
            .list_reviews(driver.clone(), driver.id, EvaluationType::Driver)
            .await
            .unwrap();
        assert_eq!(reviews.len(), 3);
    });
}

#[test]
fn driver_rates_the_requester_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let driver = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        let ride = completed_ride(&h, &requester, &driver).await;

        let review = h
            .engine
            .submit_review(driver.clone(), ride.id, 3, None)
            .await
            .unwrap();
        assert_eq!(review.evaluated_id, requester.id);
        assert_eq!(review.evaluation_type, EvaluationType::Requester);

        let user = h
            .engine
            .find_user(requester.clone(), requester.id)
            .await
            .unwrap();
        assert_eq!(user.rating_as_requester, Some(3.0));
        assert_eq!(user.rides_as_requester, 1);
        assert_eq!(user.rating_as_driver, None);
    });
}

#[test]
fn one_review_per_evaluator_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let driver = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        let ride = completed_ride(&h, &requester, &driver).await;

        h.engine
            .submit_review(requester.clone(), ride.id, 5, None)
            .await
            .unwrap();

        assert_eq!(
            h.engine
                .submit_review(requester.clone(), ride.id, 1, None)
                .await
                .unwrap_err(),
            already_reviewed_error()
        );

        // the refused review left the aggregate alone
        let user = h.engine.find_user(driver.clone(), driver.id).await.unwrap();
        assert_eq!(user.rating_as_driver, Some(5.0));
        assert_eq!(user.rides_as_driver, 1);

        // the other side still has its own review to give
        h.engine
            .submit_review(driver.clone(), ride.id, 4, None)
            .await
            .unwrap();
    });
}

#[test]
fn reviews_wait_for_completion_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let driver = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;
        let bid = h
            .engine
            .submit_bid(driver.clone(), ride.id, 90.0)
            .await
            .unwrap()
            .bid;
        h.engine.accept_bid(requester.clone(), bid.id).await.unwrap();

        assert_eq!(
            h.engine
                .submit_review(requester.clone(), ride.id, 5, None)
                .await
                .unwrap_err(),
            ride_not_completed_error()
        );
    });
}

#[test]
fn only_participants_review_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let driver = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;
        let outsider = register_validated(&h.engine, &h.admin, "b@vtc.fr", AccountType::Driver).await;

        let ride = completed_ride(&h, &requester, &driver).await;

        assert_eq!(
            h.engine
                .submit_review(outsider.clone(), ride.id, 1, None)
                .await
                .unwrap_err(),
            not_participant_error()
        );

        assert_eq!(
            h.engine
                .submit_review(requester.clone(), ride.id, 6, None)
                .await
                .unwrap_err(),
            invalid_note_error()
        );
    });
}
