//! HTML bodies of the emails sent by the engine.

use minijinja::{context, AutoEscape, Environment, Value};

use super::Email;
use crate::entities::{Bid, Ride, User};
use crate::error::Error;

const SOURCES: &[(&str, &str)] = &[
    ("layout.html", include_str!("templates/layout.html")),
    ("ride_link.html", include_str!("templates/ride_link.html")),
    ("ride_summary.html", include_str!("templates/ride_summary.html")),
    ("ride_details.html", include_str!("templates/ride_details.html")),
    ("billing.html", include_str!("templates/billing.html")),
    ("urgent_ride.html", include_str!("templates/urgent_ride.html")),
    ("bid_received.html", include_str!("templates/bid_received.html")),
    ("bid_accepted.html", include_str!("templates/bid_accepted.html")),
    ("bid_not_selected.html", include_str!("templates/bid_not_selected.html")),
    ("bid_refused.html", include_str!("templates/bid_refused.html")),
    ("ride_cancelled.html", include_str!("templates/ride_cancelled.html")),
    ("first_message.html", include_str!("templates/first_message.html")),
    ("account_validated.html", include_str!("templates/account_validated.html")),
    ("review_invitation.html", include_str!("templates/review_invitation.html")),
];

fn euros(amount: f64) -> String {
    format!("{:.2} €", amount)
}

fn when(ride: &Ride) -> String {
    ride.scheduled_at.format("%d/%m/%Y %H:%M UTC").to_string()
}

/// Email renderer. Every value is HTML-escaped unless marked safe.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new(public_url: &str) -> Result<Self, Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_filter("euros", euros);
        env.add_global(
            "public_url",
            Value::from_safe_string(public_url.trim_end_matches('/').to_string()),
        );

        for &(name, source) in SOURCES {
            env.add_template(name, source)?;
        }

        Ok(Self { env })
    }

    fn email(&self, to: &User, subject: String, template: &str, ctx: Value) -> Result<Email, Error> {
        let html = self.env.get_template(template)?.render(ctx)?;

        Ok(Email {
            to: to.email.clone(),
            subject,
            html,
        })
    }

    pub fn urgent_ride(&self, to: &User, ride: &Ride) -> Result<Email, Error> {
        let title = "Course urgente disponible";

        self.email(
            to,
            format!("{} : {} → {}", title, ride.origin.label, ride.destination.label),
            "urgent_ride.html",
            context! { title, ride, when => when(ride) },
        )
    }

    pub fn bid_received(
        &self,
        requester: &User,
        ride: &Ride,
        bid: &Bid,
        is_first: bool,
    ) -> Result<Email, Error> {
        let title = if is_first {
            "Première candidature sur votre course"
        } else {
            "Nouvelle candidature sur votre course"
        };

        self.email(
            requester,
            title.into(),
            "bid_received.html",
            context! { title, ride, bid, is_first, when => when(ride) },
        )
    }

    pub fn bid_accepted(&self, driver: &User, requester: &User, ride: &Ride) -> Result<Email, Error> {
        let title = "Votre candidature a été retenue";

        self.email(
            driver,
            title.into(),
            "bid_accepted.html",
            context! {
                title,
                ride,
                requester,
                requester_name => requester.display_name(),
                when => when(ride),
            },
        )
    }

    pub fn bid_not_selected(&self, driver: &User, ride: &Ride) -> Result<Email, Error> {
        let title = "Votre candidature n'a pas été retenue";

        self.email(
            driver,
            title.into(),
            "bid_not_selected.html",
            context! { title, ride, when => when(ride) },
        )
    }

    pub fn bid_refused(&self, driver: &User, ride: &Ride) -> Result<Email, Error> {
        let title = "Votre candidature a été refusée";

        self.email(
            driver,
            title.into(),
            "bid_refused.html",
            context! { title, ride, when => when(ride) },
        )
    }

    pub fn ride_cancelled(&self, driver: &User, ride: &Ride) -> Result<Email, Error> {
        let title = "Course annulée";

        self.email(
            driver,
            title.into(),
            "ride_cancelled.html",
            context! { title, ride, when => when(ride) },
        )
    }

    pub fn first_message(&self, recipient: &User, sender: &User, ride: &Ride) -> Result<Email, Error> {
        let title = "Nouveau message";

        self.email(
            recipient,
            format!("{} de {}", title, sender.display_name()),
            "first_message.html",
            context! { title, ride, sender_name => sender.display_name() },
        )
    }

    pub fn account_validated(&self, user: &User) -> Result<Email, Error> {
        let title = "Votre compte est validé";

        self.email(
            user,
            title.into(),
            "account_validated.html",
            context! { title, user },
        )
    }

    pub fn review_invitation(&self, to: &User, counterpart: &User, ride: &Ride) -> Result<Email, Error> {
        let title = "Évaluez votre course";

        self.email(
            to,
            title.into(),
            "review_invitation.html",
            context! { title, ride, counterpart_name => counterpart.display_name() },
        )
    }
}

#[cfg(test)]
fn templates() -> Templates {
    Templates::new("https://example.test/").unwrap()
}

#[test]
fn bid_accepted_carries_billing_and_full_details_test() {
    use crate::entities::{ride::details, user::registration, AccountType, BillingInfo};
    use chrono::Utc;
    use uuid::Uuid;

    let mut requester =
        User::new(Uuid::new_v4(), registration("ops@transports.fr", AccountType::Requester))
            .unwrap();
    requester.billing = BillingInfo {
        company_name: Some("Transports Dupont".into()),
        siret: Some("12345678900011".into()),
        address: None,
        vat_number: None,
    };
    let driver =
        User::new(Uuid::new_v4(), registration("driver@vtc.fr", AccountType::Driver)).unwrap();

    let mut ride = Ride::new(requester.id, details(100.0, Utc::now())).unwrap();
    let bid = Bid::new(ride.id, driver.id, 85.0);
    ride.award(&bid).unwrap();

    let email = templates().bid_accepted(&driver, &requester, &ride).unwrap();

    assert_eq!(email.to, "driver@vtc.fr");
    assert!(email.html.contains("Transports Dupont"));
    assert!(email.html.contains("12345678900011"));
    assert!(email.html.contains("12 rue de Rivoli"));
    assert!(email.html.contains("AF1234"));
    assert!(email.html.contains("85.00 €"));
    assert!(email
        .html
        .contains(&format!("href=\"https://example.test/rides/{}\"", ride.id)));
}

#[test]
fn first_bid_wording_test() {
    use crate::entities::{ride::details, user::registration, AccountType};
    use chrono::Utc;
    use uuid::Uuid;

    let requester =
        User::new(Uuid::new_v4(), registration("ops@transports.fr", AccountType::Requester))
            .unwrap();
    let ride = Ride::new(requester.id, details(100.0, Utc::now())).unwrap();
    let bid = Bid::new(ride.id, Uuid::new_v4(), 90.0);

    let templates = templates();
    let first = templates
        .bid_received(&requester, &ride, &bid, true)
        .unwrap();
    let next = templates
        .bid_received(&requester, &ride, &bid, false)
        .unwrap();

    assert!(first.subject.starts_with("Première"));
    assert!(first.html.contains("messagerie"));
    assert!(!next.html.contains("messagerie"));
}

#[test]
fn user_input_is_escaped_test() {
    use crate::entities::{ride::details, user::registration, AccountType};
    use chrono::Utc;
    use uuid::Uuid;

    let mut sender =
        User::new(Uuid::new_v4(), registration("ops@transports.fr", AccountType::Requester))
            .unwrap();
    sender.first_name = "<script>alert(1)</script>".into();
    let recipient =
        User::new(Uuid::new_v4(), registration("driver@vtc.fr", AccountType::Driver)).unwrap();
    let ride = Ride::new(sender.id, details(100.0, Utc::now())).unwrap();

    let email = templates()
        .first_message(&recipient, &sender, &ride)
        .unwrap();

    assert!(!email.html.contains("<script>"));
    assert!(email.html.contains("&lt;script&gt;"));
}
