mod common;

use tokio_test::block_on;
use uuid::Uuid;

use affretement::api::{AdminAPI, BidAPI, NewVehicle, UserAPI, VehicleAPI};
use affretement::entities::{AccountType, ProfileUpdate};
use affretement::error::{duplicate_user_error, unauthenticated_error, unauthorized_error};

use common::{harness, publish, register, register_validated, registration};

#[test]
fn registration_test() {
    block_on(async {
        let h = harness().await;

        let user = h
            .engine
            .register_user(Uuid::new_v4(), registration("A@VTC.fr", AccountType::Driver))
            .await
            .unwrap();
        assert_eq!(user.email, "a@vtc.fr");
        assert!(!user.validated);

        assert_eq!(
            h.engine
                .register_user(Uuid::new_v4(), registration("a@vtc.fr", AccountType::Both))
                .await
                .unwrap_err(),
            duplicate_user_error()
        );

        assert_eq!(
            h.engine.authenticate(Uuid::new_v4()).await.unwrap_err(),
            unauthenticated_error()
        );
    });
}

#[test]
fn admin_validates_accounts_test() {
    block_on(async {
        let h = harness().await;
        let driver = register(&h.engine, "a@vtc.fr", AccountType::Driver).await;
        let other = register(&h.engine, "b@vtc.fr", AccountType::Driver).await;

        assert!(h.admin.has_role("admin".into()));
        assert!(!driver.has_role("admin".into()));

        assert_eq!(
            h.engine
                .validate_user(other.clone(), driver.id)
                .await
                .unwrap_err(),
            unauthorized_error()
        );

        h.notifier.clear();

        let user = h
            .engine
            .validate_user(h.admin.clone(), driver.id)
            .await
            .unwrap();
        assert!(user.validated);
        assert_eq!(h.notifier.sent_to("a@vtc.fr").len(), 1);

        // validating twice sends nothing more
        h.engine
            .validate_user(h.admin.clone(), driver.id)
            .await
            .unwrap();
        assert_eq!(h.notifier.sent_to("a@vtc.fr").len(), 1);

        assert!(h.engine.authenticate(driver.id).await.unwrap().validated);
    });
}

#[test]
fn platform_stats_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let driver = register_validated(&h.engine, &h.admin, "a@vtc.fr", AccountType::Driver).await;

        let ride = publish(&h.engine, &requester, 100.0).await;
        publish(&h.engine, &requester, 60.0).await;
        let bid = h
            .engine
            .submit_bid(driver.clone(), ride.id, 90.0)
            .await
            .unwrap()
            .bid;
        h.engine.accept_bid(requester.clone(), bid.id).await.unwrap();

        assert_eq!(
            h.engine.platform_stats(requester.clone()).await.unwrap_err(),
            unauthorized_error()
        );

        let stats = h.engine.platform_stats(h.admin.clone()).await.unwrap();
        assert_eq!(stats.users, 3);
        assert_eq!(stats.validated_users, 1);
        assert_eq!(stats.available_rides, 1);
        assert_eq!(stats.awarded_rides, 1);
        assert_eq!(stats.completed_rides, 0);
        assert_eq!(stats.reviews, 0);
    });
}

#[test]
fn profile_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let driver = register(&h.engine, "a@vtc.fr", AccountType::Driver).await;

        let user = h
            .engine
            .update_profile(
                requester.clone(),
                ProfileUpdate {
                    notify_immediately: Some(false),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(!user.notify_immediately);
        assert!(!user.validated);

        // other users only see the public profile
        let seen = h
            .engine
            .find_user(driver.clone(), requester.id)
            .await
            .unwrap();
        assert_eq!(seen.email, "");
        assert_eq!(seen.billing.siret, None);

        let seen = h
            .engine
            .find_user(h.admin.clone(), requester.id)
            .await
            .unwrap();
        assert_eq!(seen.email, "ops@transports.fr");
    });
}

#[test]
fn vehicles_test() {
    block_on(async {
        let h = harness().await;
        let requester = register(&h.engine, "ops@transports.fr", AccountType::Requester).await;
        let driver = register(&h.engine, "a@vtc.fr", AccountType::Driver).await;

        let vehicle = NewVehicle {
            make: " Mercedes ".into(),
            model: "Classe E".into(),
            seats: 4,
        };

        assert_eq!(
            h.engine
                .add_vehicle(requester.clone(), vehicle.clone())
                .await
                .unwrap_err(),
            unauthorized_error()
        );

        let added = h.engine.add_vehicle(driver.clone(), vehicle).await.unwrap();
        assert_eq!(added.make, "Mercedes");

        let invalid = NewVehicle {
            make: "Peugeot".into(),
            model: "508".into(),
            seats: 0,
        };
        assert!(h
            .engine
            .add_vehicle(driver.clone(), invalid)
            .await
            .unwrap_err()
            .is_validation_error());

        let vehicles = h
            .engine
            .list_vehicles(requester.clone(), driver.id)
            .await
            .unwrap();
        assert_eq!(vehicles.len(), 1);
    });
}
