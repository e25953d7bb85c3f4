#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use affretement::api::{AdminAPI, RideAPI, UserAPI};
use affretement::auth::Actor;
use affretement::config::Settings;
use affretement::engine::Engine;
use affretement::entities::{
    AccountType, Address, BillingInfo, PrivacyMode, Registration, Ride, RideDetails,
    SettlementMode,
};
use affretement::error::{upstream_error, Error};
use affretement::notifier::{Email, Notifier};
use affretement::store::MemoryStore;

pub const ADMIN_EMAIL: &str = "admin@affretement.fr";

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Email>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: &str) -> Vec<Email> {
        self.sent().into_iter().filter(|email| email.to == to).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: Email) -> Result<(), Error> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Refuses every email.
#[derive(Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _email: Email) -> Result<(), Error> {
        Err(upstream_error())
    }
}

pub struct Harness {
    pub engine: Engine,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub admin: Actor,
}

fn settings() -> Settings {
    Settings {
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        urgent_window: Duration::hours(48),
        public_url: "https://affretement.test".to_string(),
    }
}

pub async fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Engine::new(store.clone(), notifier.clone(), settings()).unwrap();

    let admin = register(&engine, ADMIN_EMAIL, AccountType::Requester).await;

    Harness {
        engine,
        store,
        notifier,
        admin,
    }
}

/// An engine whose every email fails.
pub async fn failing_harness() -> (Engine, Actor) {
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store, Arc::new(FailingNotifier), settings()).unwrap();

    let admin = register(&engine, ADMIN_EMAIL, AccountType::Requester).await;

    (engine, admin)
}

pub fn registration(email: &str, account_type: AccountType) -> Registration {
    Registration {
        email: email.into(),
        first_name: "Camille".into(),
        last_name: email.split('@').next().unwrap_or_default().into(),
        phone: Some("0611223344".into()),
        account_type,
        notify_immediately: true,
        billing: BillingInfo {
            company_name: Some(format!("SAS {}", email)),
            siret: Some("12345678900011".into()),
            address: Some("5 avenue de l'Opéra, 75001 Paris".into()),
            vat_number: Some("FR12345678901".into()),
        },
    }
}

pub async fn register(engine: &Engine, email: &str, account_type: AccountType) -> Actor {
    let id = Uuid::new_v4();

    engine
        .register_user(id, registration(email, account_type))
        .await
        .unwrap();

    engine.authenticate(id).await.unwrap()
}

/// Registers a user, has the admin validate it and returns the refreshed actor.
pub async fn register_validated(
    engine: &Engine,
    admin: &Actor,
    email: &str,
    account_type: AccountType,
) -> Actor {
    let actor = register(engine, email, account_type).await;

    engine
        .validate_user(admin.clone(), actor.id)
        .await
        .unwrap();

    engine.authenticate(actor.id).await.unwrap()
}

pub fn details(price: f64, scheduled_at: DateTime<Utc>) -> RideDetails {
    RideDetails {
        origin: Address {
            label: "Paris 8e".into(),
            full_address: "10 rue du Faubourg Saint-Honoré, 75008 Paris".into(),
        },
        destination: Address {
            label: "Orly".into(),
            full_address: "Aéroport d'Orly, Orly 4".into(),
        },
        scheduled_at,
        passengers: 1,
        luggage: 2,
        price,
        client_price: None,
        settlement_mode: SettlementMode::Invoice,
        privacy_mode: PrivacyMode::Standard,
        flight: None,
        instructions: Some("Attendre en zone arrivée".into()),
        passenger: None,
    }
}

/// Publishes a ride far enough ahead not to be announced as urgent.
pub async fn publish(engine: &Engine, requester: &Actor, price: f64) -> Ride {
    engine
        .publish_ride(requester.clone(), details(price, Utc::now() + Duration::days(7)))
        .await
        .unwrap()
}
