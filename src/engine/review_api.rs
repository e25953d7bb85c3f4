use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::ReviewAPI,
    auth::Actor,
    entities::{EvaluationType, Review, RideStatus},
    error::{not_participant_error, ride_not_completed_error, Error},
};

#[async_trait]
impl ReviewAPI for Engine {
    #[tracing::instrument(skip(self, comment))]
    async fn submit_review(
        &self,
        actor: Actor,
        ride_id: Uuid,
        note: i16,
        comment: Option<String>,
    ) -> Result<Review, Error> {
        let ride = self.store.find_ride(ride_id).await?;

        self.authorize(actor.clone(), "review", ride.clone())
            .map_err(|_| not_participant_error())?;

        let (evaluated_id, evaluation_type) = ride
            .counterpart_of(actor.id)
            .ok_or_else(not_participant_error)?;

        if ride.status != RideStatus::Completed {
            return Err(ride_not_completed_error());
        }

        let review = Review::new(
            ride.id,
            actor.id,
            evaluated_id,
            evaluation_type,
            note,
            comment,
        )?;

        // a second review from this evaluator is refused by the store, which
        // refreshes the cached rating in the same write
        let evaluated = self.store.insert_review(&review).await?;

        tracing::info!(
            ride_id = %ride.id,
            evaluated_id = %evaluated.id,
            evaluation_type = evaluation_type.name(),
            "review submitted"
        );

        Ok(review)
    }

    #[tracing::instrument(skip(self))]
    async fn list_reviews(
        &self,
        _actor: Actor,
        user_id: Uuid,
        evaluation_type: EvaluationType,
    ) -> Result<Vec<Review>, Error> {
        self.store.list_reviews_about(user_id, evaluation_type).await
    }
}
