use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Actor;
use crate::entities::Message;
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct SendParams {
    recipient_id: Uuid,
    content: String,
}

#[derive(Serialize, Deserialize)]
pub struct MarkReadResponse {
    updated: u64,
}

pub async fn send(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(ride_id): Path<Uuid>,
    Json(params): Json<SendParams>,
) -> Result<Json<Message>, Error> {
    let message = api
        .send_message(actor, ride_id, params.recipient_id, params.content)
        .await?;

    Ok(message.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, Error> {
    let messages = api.list_messages(actor, ride_id).await?;

    Ok(messages.into())
}

pub async fn mark_read(
    Extension(api): Extension<DynAPI>,
    actor: Actor,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<MarkReadResponse>, Error> {
    let updated = api.mark_read(actor, ride_id).await?;

    Ok(MarkReadResponse { updated }.into())
}
