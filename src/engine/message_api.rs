use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::MessageAPI,
    auth::Actor,
    entities::{Message, Ride},
    error::{chat_not_open_error, not_participant_error, Error},
};

#[async_trait]
impl MessageAPI for Engine {
    #[tracing::instrument(skip(self, content))]
    async fn send_message(
        &self,
        actor: Actor,
        ride_id: Uuid,
        recipient_id: Uuid,
        content: String,
    ) -> Result<Message, Error> {
        let ride = self.store.find_ride(ride_id).await?;

        // one side of every conversation is the requester
        let driver_id = if ride.is_requester(actor.id) {
            recipient_id
        } else if ride.is_requester(recipient_id) {
            actor.id
        } else {
            return Err(not_participant_error());
        };

        self.ensure_chat_member(&actor, &ride, driver_id).await?;

        let message = Message::new(ride.id, actor.id, recipient_id, content)?;

        let is_first = !self
            .store
            .list_messages(ride.id)
            .await?
            .iter()
            .any(|other| other.sender_id == actor.id && other.recipient_id == recipient_id);

        self.store.insert_message(&message).await?;

        if is_first {
            let parties = self.recipients(vec![actor.id, recipient_id]).await;

            if let [sender, recipient] = parties.as_slice() {
                self.deliver(vec![self.templates.first_message(recipient, sender, &ride)])
                    .await;
            }
        }

        Ok(message)
    }

    #[tracing::instrument(skip(self))]
    async fn list_messages(&self, actor: Actor, ride_id: Uuid) -> Result<Vec<Message>, Error> {
        let ride = self.store.find_ride(ride_id).await?;

        if !ride.is_requester(actor.id) {
            self.ensure_chat_member(&actor, &ride, actor.id).await?;
        }

        let messages = self.store.list_messages(ride.id).await?;

        Ok(messages
            .into_iter()
            .filter(|message| message.involves(actor.id))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn mark_read(&self, actor: Actor, ride_id: Uuid) -> Result<u64, Error> {
        let ride = self.store.find_ride(ride_id).await?;

        self.store.mark_messages_read(ride.id, actor.id).await
    }
}

impl Engine {
    /// A ride's chat opens with its first bid. Past that, the requester talks
    /// with the awarded driver or with any driver holding a bid.
    async fn ensure_chat_member(
        &self,
        actor: &Actor,
        ride: &Ride,
        driver_id: Uuid,
    ) -> Result<(), Error> {
        if ride.is_awarded_driver(driver_id) {
            return self
                .authorize(actor.clone(), "message", ride.clone())
                .map_err(|_| not_participant_error());
        }

        if self.store.count_bids(ride.id).await? == 0 {
            return Err(chat_not_open_error());
        }

        let bid = self
            .store
            .find_driver_bid(ride.id, driver_id)
            .await?
            .ok_or_else(not_participant_error)?;

        if ride.is_requester(actor.id) {
            return self
                .authorize(actor.clone(), "message", ride.clone())
                .map_err(|_| not_participant_error());
        }

        self.authorize(actor.clone(), "message", bid)
            .map_err(|_| not_participant_error())
    }
}
