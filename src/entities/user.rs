use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{EvaluationType, RatingSummary};
use crate::error::{invalid_input_error, Error};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub account_type: AccountType,
    /// Set by an administrator once the supporting documents were checked.
    pub validated: bool,
    pub notify_immediately: bool,
    pub billing: BillingInfo,
    pub rating_as_requester: Option<f64>,
    pub rides_as_requester: i64,
    pub rating_as_driver: Option<f64>,
    pub rides_as_driver: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Requester,
    Driver,
    Both,
}

impl AccountType {
    pub fn can_request(&self) -> bool {
        matches!(self, Self::Requester | Self::Both)
    }

    pub fn can_drive(&self) -> bool {
        matches!(self, Self::Driver | Self::Both)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BillingInfo {
    pub company_name: Option<String>,
    pub siret: Option<String>,
    pub address: Option<String>,
    pub vat_number: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub account_type: AccountType,
    #[serde(default)]
    pub notify_immediately: bool,
    #[serde(default)]
    pub billing: BillingInfo,
}

/// Fields a user may change on their own profile.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub account_type: Option<AccountType>,
    pub notify_immediately: Option<bool>,
    pub billing: Option<BillingInfo>,
}

impl User {
    pub fn new(id: Uuid, registration: Registration) -> Result<Self, Error> {
        let email = registration.email.trim().to_lowercase();

        if !email.contains('@') {
            return Err(invalid_input_error());
        }

        Ok(Self {
            id,
            email,
            first_name: registration.first_name,
            last_name: registration.last_name,
            phone: registration.phone,
            account_type: registration.account_type,
            validated: false,
            notify_immediately: registration.notify_immediately,
            billing: registration.billing,
            rating_as_requester: None,
            rides_as_requester: 0,
            rating_as_driver: None,
            rides_as_driver: 0,
            created_at: Utc::now(),
        })
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn apply_profile_update(&mut self, update: ProfileUpdate) {
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(account_type) = update.account_type {
            self.account_type = account_type;
        }
        if let Some(notify_immediately) = update.notify_immediately {
            self.notify_immediately = notify_immediately;
        }
        if let Some(billing) = update.billing {
            self.billing = billing;
        }
    }

    /// Overwrites the cached aggregate for one evaluation pool.
    pub fn apply_rating(&mut self, evaluation_type: EvaluationType, summary: RatingSummary) {
        match evaluation_type {
            EvaluationType::Driver => {
                self.rating_as_driver = summary.average;
                self.rides_as_driver = summary.count;
            }
            EvaluationType::Requester => {
                self.rating_as_requester = summary.average;
                self.rides_as_requester = summary.count;
            }
        }
    }

    /// A copy of `self` carrying the fields of `stored` that a profile write
    /// must not touch: the validation flag and the cached ratings.
    pub fn with_managed_fields_of(&self, stored: &User) -> User {
        User {
            validated: stored.validated,
            rating_as_requester: stored.rating_as_requester,
            rides_as_requester: stored.rides_as_requester,
            rating_as_driver: stored.rating_as_driver,
            rides_as_driver: stored.rides_as_driver,
            ..self.clone()
        }
    }

    pub fn accepts_immediate_notifications(&self) -> bool {
        self.validated && self.notify_immediately
    }

    /// The profile shown to other users: ratings stay, contact and billing
    /// details go.
    pub fn public_view(&self) -> User {
        User {
            email: String::new(),
            phone: None,
            billing: BillingInfo::default(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
pub(crate) fn registration(email: &str, account_type: AccountType) -> Registration {
    Registration {
        email: email.into(),
        first_name: "Jean".into(),
        last_name: "Martin".into(),
        phone: None,
        account_type,
        notify_immediately: true,
        billing: BillingInfo::default(),
    }
}

#[test]
fn new_user_is_unvalidated_test() {
    let user = User::new(
        Uuid::new_v4(),
        registration(" Jean@Example.com ", AccountType::Both),
    )
    .unwrap();

    assert!(!user.validated);
    assert_eq!(user.email, "jean@example.com");
    assert_eq!(user.rating_as_driver, None);
    assert!(!user.accepts_immediate_notifications());
}

#[test]
fn invalid_email_is_rejected_test() {
    let result = User::new(
        Uuid::new_v4(),
        registration("not-an-email", AccountType::Driver),
    );

    assert_eq!(result.unwrap_err(), invalid_input_error());
}

#[test]
fn apply_rating_only_touches_its_pool_test() {
    let mut user = User::new(
        Uuid::new_v4(),
        registration("a@b.fr", AccountType::Both),
    )
    .unwrap();

    user.apply_rating(
        EvaluationType::Driver,
        RatingSummary {
            average: Some(4.7),
            count: 3,
        },
    );

    assert_eq!(user.rating_as_driver, Some(4.7));
    assert_eq!(user.rides_as_driver, 3);
    assert_eq!(user.rating_as_requester, None);
    assert_eq!(user.rides_as_requester, 0);
}

#[test]
fn profile_update_keeps_unset_fields_test() {
    let mut user = User::new(
        Uuid::new_v4(),
        registration("a@b.fr", AccountType::Requester),
    )
    .unwrap();

    user.apply_profile_update(ProfileUpdate {
        phone: Some("0600000000".into()),
        account_type: Some(AccountType::Both),
        ..ProfileUpdate::default()
    });

    assert_eq!(user.first_name, "Jean");
    assert_eq!(user.phone.as_deref(), Some("0600000000"));
    assert!(user.account_type.can_drive());
}

#[test]
fn public_view_hides_contact_details_test() {
    let mut user = User::new(
        Uuid::new_v4(),
        registration("ops@transports.fr", AccountType::Requester),
    )
    .unwrap();
    user.phone = Some("0600000000".into());
    user.billing.siret = Some("12345678900011".into());
    user.rating_as_requester = Some(4.5);

    let view = user.public_view();

    assert_eq!(view.email, "");
    assert_eq!(view.phone, None);
    assert_eq!(view.billing, BillingInfo::default());
    assert_eq!(view.rating_as_requester, Some(4.5));
    assert_eq!(view.first_name, "Jean");
}

#[test]
fn managed_fields_come_from_the_stored_record_test() {
    let mut stored = User::new(
        Uuid::new_v4(),
        registration("a@b.fr", AccountType::Driver),
    )
    .unwrap();
    let mut stale = stored.clone();

    stored.validated = true;
    stored.apply_rating(
        EvaluationType::Driver,
        RatingSummary {
            average: Some(4.5),
            count: 2,
        },
    );
    stale.first_name = "Louise".into();

    let written = stale.with_managed_fields_of(&stored);

    assert_eq!(written.first_name, "Louise");
    assert!(written.validated);
    assert_eq!(written.rating_as_driver, Some(4.5));
    assert_eq!(written.rides_as_driver, 2);
}
