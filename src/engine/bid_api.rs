use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::{BidAPI, BidSubmission},
    auth::Actor,
    entities::{Bid, Ride},
    error::{ride_not_available_error, user_not_validated_error, Error},
};

#[async_trait]
impl BidAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn submit_bid(
        &self,
        actor: Actor,
        ride_id: Uuid,
        proposed_price: f64,
    ) -> Result<BidSubmission, Error> {
        let ride = self.store.find_ride(ride_id).await?;

        if actor.has_role("driver".into()) && !actor.validated {
            return Err(user_not_validated_error());
        }

        self.authorize(actor.clone(), "bid", ride.clone())?;

        ride.check_bid_price(proposed_price)?;

        let bid = Bid::new(ride.id, actor.id, proposed_price);

        // the store refuses a second bid from this driver and re-checks the
        // ride status and ceiling
        let received = self.store.insert_bid(&bid).await?;
        let is_first = received == 1;

        tracing::info!(ride_id = %ride.id, bid_id = %bid.id, is_first, "bid submitted");

        if let Some(requester) = self.recipient(ride.requester_id).await {
            if requester.notify_immediately {
                let email = self
                    .templates
                    .bid_received(&requester, &ride, &bid, is_first);
                self.deliver(vec![email]).await;
            }
        }

        Ok(BidSubmission { bid, is_first })
    }

    #[tracing::instrument(skip(self))]
    async fn revise_bid(&self, actor: Actor, id: Uuid, new_price: f64) -> Result<Bid, Error> {
        let mut bid = self.store.find_bid(id).await?;

        self.authorize(actor.clone(), "update", bid.clone())?;

        let ride = self.store.find_ride(bid.ride_id).await?;

        bid.revise(&ride, new_price)?;

        // the store only lowers the price, whatever happened since the read
        self.store.lower_bid_price(bid.id, bid.proposed_price).await?;

        tracing::info!(bid_id = %bid.id, new_price, "bid revised");

        Ok(bid)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_bid(&self, actor: Actor, id: Uuid) -> Result<Ride, Error> {
        let bid = self.store.find_bid(id).await?;
        let mut ride = self.store.find_ride(bid.ride_id).await?;

        self.authorize(actor.clone(), "manage", ride.clone())?;

        ride.award(&bid)?;

        // authoritative write, refused if the bid moved since it was read;
        // everything after it is cleanup
        self.store.award_ride(&ride, &bid).await?;

        tracing::info!(ride_id = %ride.id, bid_id = %bid.id, price = ride.price, "bid accepted");

        let losers = match self.store.delete_sibling_bids(ride.id, bid.id).await {
            Ok(losers) => losers,
            Err(err) => {
                tracing::warn!(ride_id = %ride.id, %err, "could not delete sibling bids");
                Vec::new()
            }
        };

        let requester = self.recipient(ride.requester_id).await;
        let winner = self.recipient(bid.driver_id).await;
        let losers = self
            .recipients(losers.iter().map(|bid| bid.driver_id).collect())
            .await;

        let mut emails: Vec<_> = losers
            .iter()
            .map(|driver| self.templates.bid_not_selected(driver, &ride))
            .collect();

        match (&winner, &requester) {
            (Some(winner), Some(requester)) => {
                emails.push(self.templates.bid_accepted(winner, requester, &ride))
            }
            _ => tracing::warn!(ride_id = %ride.id, "acceptance email skipped"),
        }

        self.deliver(emails).await;

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn withdraw_bid(&self, actor: Actor, id: Uuid) -> Result<(), Error> {
        let bid = self.store.find_bid(id).await?;

        self.authorize(actor.clone(), "update", bid.clone())?;

        let ride = self.store.find_ride(bid.ride_id).await?;

        if !ride.is_available() {
            return Err(ride_not_available_error());
        }

        self.store.delete_bid(bid.id).await?;

        tracing::info!(ride_id = %ride.id, bid_id = %bid.id, "bid withdrawn");

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn refuse_bid(&self, actor: Actor, id: Uuid) -> Result<(), Error> {
        let bid = self.store.find_bid(id).await?;
        let ride = self.store.find_ride(bid.ride_id).await?;

        self.authorize(actor.clone(), "manage", ride.clone())?;

        if !ride.is_available() {
            return Err(ride_not_available_error());
        }

        self.store.delete_bid(bid.id).await?;

        tracing::info!(ride_id = %ride.id, bid_id = %bid.id, "bid refused");

        if let Some(driver) = self.recipient(bid.driver_id).await {
            self.deliver(vec![self.templates.bid_refused(&driver, &ride)])
                .await;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_bids(&self, actor: Actor, ride_id: Uuid) -> Result<Vec<Bid>, Error> {
        let ride = self.store.find_ride(ride_id).await?;

        if ride.is_requester(actor.id) {
            let mut bids = self.store.list_bids(ride.id).await?;
            bids.sort_by(|a, b| a.proposed_price.total_cmp(&b.proposed_price));
            return Ok(bids);
        }

        let own = self.store.find_driver_bid(ride.id, actor.id).await?;

        Ok(own.into_iter().collect())
    }
}
