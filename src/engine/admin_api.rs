use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::AdminAPI,
    auth::{Actor, Platform},
    entities::User,
    error::Error,
    store::PlatformStats,
};

#[async_trait]
impl AdminAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn validate_user(&self, actor: Actor, id: Uuid) -> Result<User, Error> {
        self.authorize(actor.clone(), "validate_user", Platform::default())?;

        let user = match self.store.set_validated(id).await? {
            Some(user) => user,
            None => return self.store.find_user(id).await,
        };

        tracing::info!(user_id = %user.id, validated_by = %actor.id, "user validated");

        self.deliver(vec![self.templates.account_validated(&user)])
            .await;

        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    async fn platform_stats(&self, actor: Actor) -> Result<PlatformStats, Error> {
        self.authorize(actor.clone(), "view_stats", Platform::default())?;

        self.store.platform_stats().await
    }
}
