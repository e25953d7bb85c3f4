use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::User;

/// The authenticated identity an operation runs on behalf of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub validated: bool,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn from_user(user: &User, admin_emails: &[String]) -> Self {
        let mut roles = Vec::new();

        if user.account_type.can_request() {
            roles.push("requester".to_string());
        }

        if user.account_type.can_drive() {
            roles.push("driver".to_string());
        }

        if admin_emails
            .iter()
            .any(|email| email.eq_ignore_ascii_case(&user.email))
        {
            roles.push("admin".to_string());
        }

        Self {
            id: user.id,
            email: user.email.clone(),
            validated: user.validated,
            roles,
        }
    }

    pub fn has_role(&self, role: String) -> bool {
        self.roles.iter().any(|x| x == &role)
    }
}

impl PolarClass for Actor {
    fn get_polar_class_builder() -> oso::ClassBuilder<Actor> {
        oso::Class::builder()
            .name("Member")
            .add_attribute_getter("id", |recv: &Actor| recv.id.to_string())
            .add_attribute_getter("validated", |recv: &Actor| recv.validated)
            .add_attribute_getter("roles", |recv: &Actor| recv.roles.clone())
            .add_method("has_role", Actor::has_role)
    }

    fn get_polar_class() -> oso::Class {
        let builder = Actor::get_polar_class_builder();
        builder.build()
    }
}

#[test]
fn roles_follow_account_type_and_allow_list_test() {
    use crate::entities::user::registration;
    use crate::entities::AccountType;

    let admins = vec!["Ops@Affretement.fr".to_string()];

    let user = User::new(
        Uuid::new_v4(),
        registration("ops@affretement.fr", AccountType::Both),
    )
    .unwrap();
    let actor = Actor::from_user(&user, &admins);

    assert!(actor.has_role("requester".into()));
    assert!(actor.has_role("driver".into()));
    assert!(actor.has_role("admin".into()));
    assert!(!actor.validated);

    let user = User::new(
        Uuid::new_v4(),
        registration("driver@example.com", AccountType::Driver),
    )
    .unwrap();
    let actor = Actor::from_user(&user, &admins);

    assert_eq!(actor.roles, vec!["driver".to_string()]);
}
