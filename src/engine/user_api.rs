use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::UserAPI,
    auth::Actor,
    entities::{ProfileUpdate, Registration, User},
    error::{unauthenticated_error, Error},
};

#[async_trait]
impl UserAPI for Engine {
    #[tracing::instrument(skip(self, registration))]
    async fn register_user(&self, id: Uuid, registration: Registration) -> Result<User, Error> {
        let user = User::new(id, registration)?;

        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, "user registered");

        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    async fn authenticate(&self, id: Uuid) -> Result<Actor, Error> {
        let user = self.store.find_user(id).await.map_err(|err| {
            if err.is_not_found_error() {
                unauthenticated_error()
            } else {
                err
            }
        })?;

        Ok(Actor::from_user(&user, &self.settings.admin_emails))
    }

    #[tracing::instrument(skip(self))]
    async fn find_user(&self, actor: Actor, id: Uuid) -> Result<User, Error> {
        let user = self.store.find_user(id).await?;

        if actor.id == user.id || actor.has_role("admin".into()) {
            return Ok(user);
        }

        Ok(user.public_view())
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_profile(&self, actor: Actor, update: ProfileUpdate) -> Result<User, Error> {
        let mut user = self.store.find_user(actor.id).await?;

        user.apply_profile_update(update);
        self.store.update_user(&user).await?;

        Ok(user)
    }
}
