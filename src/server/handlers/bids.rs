use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{BidSubmission, DynAPI};
use crate::auth::Actor;
use crate::entities::{Bid, Ride};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct PriceParams {
    proposed_price: f64,
}

pub async fn submit(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(ride_id): Path<Uuid>,
    Json(params): Json<PriceParams>,
) -> Result<Json<BidSubmission>, Error> {
    let submission = api.submit_bid(actor, ride_id, params.proposed_price).await?;

    Ok(submission.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<Vec<Bid>>, Error> {
    let bids = api.list_bids(actor, ride_id).await?;

    Ok(bids.into())
}

pub async fn revise(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(params): Json<PriceParams>,
) -> Result<Json<Bid>, Error> {
    let bid = api.revise_bid(actor, id, params.proposed_price).await?;

    Ok(bid.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, Error> {
    let ride = api.accept_bid(actor, id).await?;

    Ok(ride.into())
}

pub async fn refuse(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<(), Error> {
    api.refuse_bid(actor, id).await
}

pub async fn withdraw(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<(), Error> {
    api.withdraw_bid(actor, id).await
}
