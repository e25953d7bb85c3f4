mod admin_api;
mod bid_api;
mod message_api;
mod review_api;
mod ride_api;
mod user_api;
mod vehicle_api;

use std::sync::Arc;

use futures::future::join_all;
use oso::Oso;
use uuid::Uuid;

use crate::{
    api::API,
    auth::authorizor,
    config::Settings,
    entities::User,
    error::{unauthorized_error, Error},
    notifier::{templates::Templates, Email, Notifier},
    store::Store,
};

pub struct Engine {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    authorizor: Oso,
    templates: Templates,
    settings: Settings,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        settings: Settings,
    ) -> Result<Self, Error> {
        Ok(Self {
            store,
            notifier,
            authorizor: authorizor::new()?,
            templates: Templates::new(&settings.public_url)?,
            settings,
        })
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(unauthorized_error())
    }

    /// Sends every email concurrently. Rendering and sending failures are
    /// logged and dropped, the operation that triggered them has already been
    /// committed.
    pub(crate) async fn deliver(&self, emails: Vec<Result<Email, Error>>) {
        let mut rendered = Vec::with_capacity(emails.len());

        for email in emails {
            match email {
                Ok(email) => rendered.push(email),
                Err(err) => tracing::warn!(%err, "notification not rendered"),
            }
        }

        let sends = rendered.into_iter().map(|email| async move {
            let to = email.to.clone();
            let subject = email.subject.clone();
            (to, subject, self.notifier.send(email).await)
        });

        for (to, subject, result) in join_all(sends).await {
            if let Err(err) = result {
                tracing::warn!(%to, %subject, %err, "notification failed");
            }
        }
    }

    /// Loads the recipients of a notification, skipping the ones that cannot
    /// be loaded.
    pub(crate) async fn recipients(&self, ids: Vec<Uuid>) -> Vec<User> {
        let lookups = ids.into_iter().map(|id| async move {
            let result = self.store.find_user(id).await;
            (id, result)
        });

        let mut users = Vec::new();

        for (id, result) in join_all(lookups).await {
            match result {
                Ok(user) => users.push(user),
                Err(err) => tracing::warn!(user_id = %id, %err, "notification recipient not found"),
            }
        }

        users
    }

    pub(crate) async fn recipient(&self, id: Uuid) -> Option<User> {
        self.recipients(vec![id]).await.pop()
    }
}

impl API for Engine {}
