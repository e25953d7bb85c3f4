use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::RideAPI,
    auth::{Actor, Platform},
    entities::{Ride, RideDetails, RideStatus},
    error::{ride_not_awarded_error, Error},
};

#[async_trait]
impl RideAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn publish_ride(&self, actor: Actor, details: RideDetails) -> Result<Ride, Error> {
        self.authorize(actor.clone(), "publish_ride", Platform::default())?;

        let requester = self.store.find_user(actor.id).await?;
        let ride = Ride::new(requester.id, details)?;

        self.store.insert_ride(&ride).await?;

        tracing::info!(ride_id = %ride.id, "ride published");

        if ride.is_urgent(Utc::now(), self.settings.urgent_window) {
            self.announce_urgent_ride(&ride).await;
        }

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, actor: Actor, id: Uuid) -> Result<Ride, Error> {
        let ride = self.store.find_ride(id).await?;

        self.authorize(actor.clone(), "read", ride.clone())?;

        if ride.is_participant(actor.id) {
            return Ok(ride);
        }

        Ok(ride.redacted())
    }

    #[tracing::instrument(skip(self))]
    async fn list_available_rides(&self, actor: Actor) -> Result<Vec<Ride>, Error> {
        let rides = self.store.list_rides_by_status(RideStatus::Available).await?;

        Ok(rides
            .into_iter()
            .map(|ride| {
                if ride.is_requester(actor.id) {
                    ride
                } else {
                    ride.redacted()
                }
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_my_rides(&self, actor: Actor) -> Result<Vec<Ride>, Error> {
        self.store.list_rides_for_user(actor.id).await
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_ride(&self, actor: Actor, id: Uuid) -> Result<(), Error> {
        let ride = self.store.find_ride(id).await?;

        self.authorize(actor.clone(), "manage", ride.clone())?;

        ride.ensure_cancellable()?;

        let bids = self.store.list_bids(ride.id).await?;

        // removes the bids and messages with it
        self.store.delete_available_ride(ride.id).await?;

        tracing::info!(ride_id = %ride.id, bids = bids.len(), "ride cancelled");

        let drivers = self
            .recipients(bids.iter().map(|bid| bid.driver_id).collect())
            .await;
        let emails = drivers
            .iter()
            .map(|driver| self.templates.ride_cancelled(driver, &ride))
            .collect();

        self.deliver(emails).await;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn complete_ride(&self, actor: Actor, id: Uuid) -> Result<Ride, Error> {
        let mut ride = self.store.find_ride(id).await?;

        self.authorize(actor.clone(), "manage", ride.clone())?;

        ride.complete()?;

        self.store
            .update_ride(&ride, RideStatus::Awarded)
            .await
            .map_err(|err| {
                if err.is_state_error() {
                    ride_not_awarded_error()
                } else {
                    err
                }
            })?;

        tracing::info!(ride_id = %ride.id, "ride completed");

        if let Some(driver_id) = ride.awarded_driver_id {
            let parties = self.recipients(vec![ride.requester_id, driver_id]).await;

            if let [requester, driver] = parties.as_slice() {
                self.deliver(vec![
                    self.templates.review_invitation(requester, driver, &ride),
                    self.templates.review_invitation(driver, requester, &ride),
                ])
                .await;
            }
        }

        Ok(ride)
    }
}

impl Engine {
    async fn announce_urgent_ride(&self, ride: &Ride) {
        let subscribers = match self.store.list_immediate_subscribers().await {
            Ok(subscribers) => subscribers,
            Err(err) => {
                tracing::warn!(ride_id = %ride.id, %err, "could not load subscribers");
                return;
            }
        };

        let emails = subscribers
            .iter()
            .filter(|user| user.id != ride.requester_id)
            .map(|user| self.templates.urgent_ride(user, ride))
            .collect();

        self.deliver(emails).await;
    }
}
