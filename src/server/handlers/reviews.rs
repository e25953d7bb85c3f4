use axum::extract::{Extension, Json, Path, Query};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Actor;
use crate::entities::{EvaluationType, Review};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct SubmitParams {
    note: i16,
    comment: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    evaluation_type: EvaluationType,
}

pub async fn submit(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(ride_id): Path<Uuid>,
    Json(params): Json<SubmitParams>,
) -> Result<Json<Review>, Error> {
    let review = api
        .submit_review(actor, ride_id, params.note, params.comment)
        .await?;

    Ok(review.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(user_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Review>>, Error> {
    let reviews = api
        .list_reviews(actor, user_id, params.evaluation_type)
        .await?;

    Ok(reviews.into())
}
