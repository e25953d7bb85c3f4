use async_trait::async_trait;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    types::Json,
    Executor, Pool, Postgres, Row, Transaction,
};
use uuid::Uuid;

use super::{PlatformStats, Store};
use crate::entities::{
    Bid, EvaluationType, Message, RatingSummary, Review, Ride, RideStatus, User, Vehicle,
};
use crate::error::{
    already_reviewed_error, bid_changed_error, bid_not_found_error, database_error,
    duplicate_bid_error, duplicate_user_error, invalid_price_error, invalid_state_error,
    price_not_lower_error, ride_not_available_error, ride_not_found_error, unexpected_error,
    user_not_found_error, Error,
};

type Database = Postgres;

const UNIQUE_VIOLATION: &str = "23505";

pub struct PgStore {
    pool: Pool<Database>,
}

impl PgStore {
    #[tracing::instrument(name = "PgStore::connect", skip(db_uri))]
    pub async fn connect(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        let store = Self { pool };
        store.create_tables().await?;

        Ok(store)
    }

    async fn create_tables(&self) -> Result<(), Error> {
        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id UUID PRIMARY KEY,
                    email VARCHAR NOT NULL UNIQUE,
                    validated BOOLEAN NOT NULL,
                    notify_immediately BOOLEAN NOT NULL,
                    data JSONB NOT NULL
                )",
            )
            .await?;

        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS vehicles (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL REFERENCES users(id),
                    data JSONB NOT NULL
                )",
            )
            .await?;

        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS courses (
                    id UUID PRIMARY KEY,
                    requester_id UUID NOT NULL REFERENCES users(id),
                    awarded_driver_id UUID REFERENCES users(id),
                    status VARCHAR NOT NULL,
                    price DOUBLE PRECISION NOT NULL,
                    scheduled_at TIMESTAMPTZ NOT NULL,
                    bids_received BIGINT NOT NULL DEFAULT 0,
                    data JSONB NOT NULL
                )",
            )
            .await?;

        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS candidatures (
                    id UUID PRIMARY KEY,
                    course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                    driver_id UUID NOT NULL REFERENCES users(id),
                    proposed_price DOUBLE PRECISION NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    UNIQUE (course_id, driver_id)
                )",
            )
            .await?;

        // reviews stay when a ride goes away
        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS avis (
                    id UUID PRIMARY KEY,
                    course_id UUID NOT NULL,
                    evaluator_id UUID NOT NULL REFERENCES users(id),
                    evaluated_id UUID NOT NULL REFERENCES users(id),
                    evaluation_type VARCHAR NOT NULL,
                    note SMALLINT NOT NULL CHECK (note BETWEEN 1 AND 5),
                    comment TEXT,
                    created_at TIMESTAMPTZ NOT NULL,
                    UNIQUE (course_id, evaluator_id)
                )",
            )
            .await?;

        self.pool
            .execute(
                "CREATE TABLE IF NOT EXISTS messages (
                    id UUID PRIMARY KEY,
                    course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                    sender_id UUID NOT NULL REFERENCES users(id),
                    recipient_id UUID NOT NULL REFERENCES users(id),
                    content TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    read BOOLEAN NOT NULL DEFAULT FALSE
                )",
            )
            .await?;

        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

fn map_unique_violation(err: sqlx::Error, conflict: fn() -> Error) -> Error {
    if is_unique_violation(&err) {
        return conflict();
    }

    database_error(err)
}

const BID_COLUMNS: &str = "id, course_id, driver_id, proposed_price, created_at";

fn bid_from_row(row: &PgRow) -> Result<Bid, Error> {
    Ok(Bid {
        id: row.try_get("id")?,
        ride_id: row.try_get("course_id")?,
        driver_id: row.try_get("driver_id")?,
        proposed_price: row.try_get("proposed_price")?,
        created_at: row.try_get("created_at")?,
    })
}

const REVIEW_COLUMNS: &str =
    "id, course_id, evaluator_id, evaluated_id, evaluation_type, note, comment, created_at";

fn review_from_row(row: &PgRow) -> Result<Review, Error> {
    let evaluation_type: String = row.try_get("evaluation_type")?;

    Ok(Review {
        id: row.try_get("id")?,
        ride_id: row.try_get("course_id")?,
        evaluator_id: row.try_get("evaluator_id")?,
        evaluated_id: row.try_get("evaluated_id")?,
        evaluation_type: EvaluationType::from_name(&evaluation_type)
            .ok_or_else(unexpected_error)?,
        note: row.try_get("note")?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
    })
}

fn message_from_row(row: &PgRow) -> Result<Message, Error> {
    Ok(Message {
        id: row.try_get("id")?,
        ride_id: row.try_get("course_id")?,
        sender_id: row.try_get("sender_id")?,
        recipient_id: row.try_get("recipient_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        read: row.try_get("read")?,
    })
}

fn rides_from_rows(rows: Vec<PgRow>) -> Result<Vec<Ride>, Error> {
    rows.iter()
        .map(|row| -> Result<Ride, Error> {
            let Json(ride): Json<Ride> = row.try_get("data")?;
            Ok(ride)
        })
        .collect()
}

#[tracing::instrument(skip(tx))]
async fn fetch_user_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<User, Error> {
    let Json(user): Json<User> = tx
        .fetch_optional(sqlx::query("SELECT data FROM users WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or_else(user_not_found_error)?
        .try_get("data")?;

    Ok(user)
}

#[tracing::instrument(skip(tx, user), fields(user_id = %user.id))]
async fn update_user(tx: &mut Transaction<'_, Database>, user: &User) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "UPDATE users SET email = $2, validated = $3, notify_immediately = $4, data = $5 WHERE id = $1",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(user.validated)
        .bind(user.notify_immediately)
        .bind(Json(user)),
    )
    .await
    .map_err(|err| map_unique_violation(err, duplicate_user_error))?;

    Ok(())
}

/// Locks the ride of a bid against an award and fails unless it is still
/// available.
#[tracing::instrument(skip(tx))]
async fn lock_open_bid(tx: &mut Transaction<'_, Database>, id: &Uuid) -> Result<(), Error> {
    let status: String = tx
        .fetch_optional(
            sqlx::query(
                "SELECT c.status FROM candidatures b JOIN courses c ON c.id = b.course_id WHERE b.id = $1 FOR SHARE OF c",
            )
            .bind(id),
        )
        .await?
        .ok_or_else(bid_not_found_error)?
        .try_get("status")?;

    if status != RideStatus::Available.name() {
        return Err(ride_not_available_error());
    }

    Ok(())
}

#[async_trait]
impl Store for PgStore {
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert_user(&self, user: &User) -> Result<(), Error> {
        self.pool
            .execute(
                sqlx::query(
                    "INSERT INTO users (id, email, validated, notify_immediately, data) VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(&user.id)
                .bind(&user.email)
                .bind(user.validated)
                .bind(user.notify_immediately)
                .bind(Json(user)),
            )
            .await
            .map_err(|err| map_unique_violation(err, duplicate_user_error))?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_user(&self, id: Uuid) -> Result<User, Error> {
        let Json(user): Json<User> = self
            .pool
            .fetch_optional(sqlx::query("SELECT data FROM users WHERE id = $1").bind(&id))
            .await?
            .ok_or_else(user_not_found_error)?
            .try_get("data")?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update_user(&self, user: &User) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        let stored = fetch_user_for_update(&mut tx, &user.id).await?;
        update_user(&mut tx, &user.with_managed_fields_of(&stored)).await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn set_validated(&self, id: Uuid) -> Result<Option<User>, Error> {
        let mut tx = self.pool.begin().await?;

        let mut user = fetch_user_for_update(&mut tx, &id).await?;

        if user.validated {
            return Ok(None);
        }

        user.validated = true;
        update_user(&mut tx, &user).await?;

        tx.commit().await?;

        Ok(Some(user))
    }

    #[tracing::instrument(skip(self))]
    async fn list_immediate_subscribers(&self) -> Result<Vec<User>, Error> {
        let rows = self
            .pool
            .fetch_all(sqlx::query(
                "SELECT data FROM users WHERE validated AND notify_immediately",
            ))
            .await?;

        rows.iter()
            .map(|row| -> Result<User, Error> {
                let Json(user): Json<User> = row.try_get("data")?;
                Ok(user)
            })
            .collect()
    }

    #[tracing::instrument(skip(self, vehicle), fields(vehicle_id = %vehicle.id))]
    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), Error> {
        self.pool
            .execute(
                sqlx::query("INSERT INTO vehicles (id, user_id, data) VALUES ($1, $2, $3)")
                    .bind(&vehicle.id)
                    .bind(&vehicle.user_id)
                    .bind(Json(vehicle)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_vehicles(&self, user_id: Uuid) -> Result<Vec<Vehicle>, Error> {
        let rows = self
            .pool
            .fetch_all(
                sqlx::query("SELECT data FROM vehicles WHERE user_id = $1 ORDER BY data->>'created_at'")
                    .bind(&user_id),
            )
            .await?;

        rows.iter()
            .map(|row| -> Result<Vehicle, Error> {
                let Json(vehicle): Json<Vehicle> = row.try_get("data")?;
                Ok(vehicle)
            })
            .collect()
    }

    #[tracing::instrument(skip(self, ride), fields(ride_id = %ride.id))]
    async fn insert_ride(&self, ride: &Ride) -> Result<(), Error> {
        self.pool
            .execute(
                sqlx::query(
                    "INSERT INTO courses (id, requester_id, awarded_driver_id, status, price, scheduled_at, data) VALUES ($1, $2, $3, $4, $5, $6, $7)",
                )
                .bind(&ride.id)
                .bind(&ride.requester_id)
                .bind(&ride.awarded_driver_id)
                .bind(ride.status.name())
                .bind(ride.price)
                .bind(&ride.scheduled_at)
                .bind(Json(ride)),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_ride(&self, id: Uuid) -> Result<Ride, Error> {
        let Json(ride): Json<Ride> = self
            .pool
            .fetch_optional(sqlx::query("SELECT data FROM courses WHERE id = $1").bind(&id))
            .await?
            .ok_or_else(ride_not_found_error)?
            .try_get("data")?;

        Ok(ride)
    }

    #[tracing::instrument(skip(self, ride), fields(ride_id = %ride.id))]
    async fn update_ride(&self, ride: &Ride, expected: RideStatus) -> Result<(), Error> {
        let result = self
            .pool
            .execute(
                sqlx::query(
                    "UPDATE courses SET status = $3, awarded_driver_id = $4, price = $5, scheduled_at = $6, data = $7 WHERE id = $1 AND status = $2",
                )
                .bind(&ride.id)
                .bind(expected.name())
                .bind(ride.status.name())
                .bind(&ride.awarded_driver_id)
                .bind(ride.price)
                .bind(&ride.scheduled_at)
                .bind(Json(ride)),
            )
            .await?;

        if result.rows_affected() == 0 {
            // distinguishes a missing ride from a lost race
            self.find_ride(ride.id).await?;
            return Err(invalid_state_error());
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, ride, bid), fields(ride_id = %ride.id, bid_id = %bid.id))]
    async fn award_ride(&self, ride: &Ride, bid: &Bid) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        let status: String = tx
            .fetch_optional(
                sqlx::query("SELECT status FROM courses WHERE id = $1 FOR UPDATE").bind(&ride.id),
            )
            .await?
            .ok_or_else(ride_not_found_error)?
            .try_get("status")?;

        if status != RideStatus::Available.name() {
            return Err(ride_not_available_error());
        }

        let stored_price: Option<f64> = tx
            .fetch_optional(
                sqlx::query(
                    "SELECT proposed_price FROM candidatures WHERE id = $1 AND course_id = $2 FOR UPDATE",
                )
                .bind(&bid.id)
                .bind(&ride.id),
            )
            .await?
            .map(|row| row.try_get("proposed_price"))
            .transpose()?;

        if stored_price != Some(bid.proposed_price) {
            return Err(bid_changed_error());
        }

        tx.execute(
            sqlx::query(
                "UPDATE courses SET status = $2, awarded_driver_id = $3, price = $4, data = $5 WHERE id = $1",
            )
            .bind(&ride.id)
            .bind(ride.status.name())
            .bind(&ride.awarded_driver_id)
            .bind(ride.price)
            .bind(Json(ride)),
        )
        .await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_available_ride(&self, id: Uuid) -> Result<(), Error> {
        let result = self
            .pool
            .execute(
                sqlx::query("DELETE FROM courses WHERE id = $1 AND status = $2")
                    .bind(&id)
                    .bind(RideStatus::Available.name()),
            )
            .await?;

        if result.rows_affected() == 0 {
            self.find_ride(id).await?;
            return Err(ride_not_available_error());
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_rides_by_status(&self, status: RideStatus) -> Result<Vec<Ride>, Error> {
        let rows = self
            .pool
            .fetch_all(
                sqlx::query("SELECT data FROM courses WHERE status = $1 ORDER BY scheduled_at ASC")
                    .bind(status.name()),
            )
            .await?;

        rides_from_rows(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn list_rides_for_user(&self, user_id: Uuid) -> Result<Vec<Ride>, Error> {
        let rows = self
            .pool
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM courses WHERE requester_id = $1 OR awarded_driver_id = $1 ORDER BY scheduled_at ASC",
                )
                .bind(&user_id),
            )
            .await?;

        rides_from_rows(rows)
    }

    #[tracing::instrument(skip(self, bid), fields(bid_id = %bid.id, ride_id = %bid.ride_id))]
    async fn insert_bid(&self, bid: &Bid) -> Result<i64, Error> {
        let mut tx = self.pool.begin().await?;

        // the counter update locks the ride until the bid is in
        let received: Option<i64> = tx
            .fetch_optional(
                sqlx::query(
                    "UPDATE courses SET bids_received = bids_received + 1
                     WHERE id = $1 AND status = $2 AND price >= $3
                     RETURNING bids_received",
                )
                .bind(&bid.ride_id)
                .bind(RideStatus::Available.name())
                .bind(bid.proposed_price),
            )
            .await?
            .map(|row| row.try_get("bids_received"))
            .transpose()?;

        let received = match received {
            Some(received) => received,
            None => {
                tx.rollback().await?;

                let ride = self.find_ride(bid.ride_id).await?;

                if !ride.is_available() {
                    return Err(ride_not_available_error());
                }

                return Err(invalid_price_error());
            }
        };

        tx.execute(
            sqlx::query(
                "INSERT INTO candidatures (id, course_id, driver_id, proposed_price, created_at) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&bid.id)
            .bind(&bid.ride_id)
            .bind(&bid.driver_id)
            .bind(bid.proposed_price)
            .bind(&bid.created_at),
        )
        .await
        .map_err(|err| map_unique_violation(err, duplicate_bid_error))?;

        tx.commit().await?;

        Ok(received)
    }

    #[tracing::instrument(skip(self))]
    async fn find_bid(&self, id: Uuid) -> Result<Bid, Error> {
        let row = self
            .pool
            .fetch_optional(
                sqlx::query(&format!("SELECT {} FROM candidatures WHERE id = $1", BID_COLUMNS))
                    .bind(&id),
            )
            .await?
            .ok_or_else(bid_not_found_error)?;

        bid_from_row(&row)
    }

    #[tracing::instrument(skip(self))]
    async fn find_driver_bid(
        &self,
        ride_id: Uuid,
        driver_id: Uuid,
    ) -> Result<Option<Bid>, Error> {
        let maybe_row = self
            .pool
            .fetch_optional(
                sqlx::query(&format!(
                    "SELECT {} FROM candidatures WHERE course_id = $1 AND driver_id = $2",
                    BID_COLUMNS
                ))
                .bind(&ride_id)
                .bind(&driver_id),
            )
            .await?;

        maybe_row.as_ref().map(bid_from_row).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn lower_bid_price(&self, id: Uuid, new_price: f64) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        lock_open_bid(&mut tx, &id).await?;

        let result = tx
            .execute(
                sqlx::query(
                    "UPDATE candidatures SET proposed_price = $2 WHERE id = $1 AND proposed_price > $2",
                )
                .bind(&id)
                .bind(new_price),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(price_not_lower_error());
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_bid(&self, id: Uuid) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        lock_open_bid(&mut tx, &id).await?;

        tx.execute(sqlx::query("DELETE FROM candidatures WHERE id = $1").bind(&id))
            .await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_bids(&self, ride_id: Uuid) -> Result<Vec<Bid>, Error> {
        let rows = self
            .pool
            .fetch_all(
                sqlx::query(&format!(
                    "SELECT {} FROM candidatures WHERE course_id = $1 ORDER BY created_at ASC",
                    BID_COLUMNS
                ))
                .bind(&ride_id),
            )
            .await?;

        rows.iter().map(bid_from_row).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn count_bids(&self, ride_id: Uuid) -> Result<i64, Error> {
        let count: i64 = self
            .pool
            .fetch_one(
                sqlx::query("SELECT COUNT(*) AS count FROM candidatures WHERE course_id = $1")
                    .bind(&ride_id),
            )
            .await?
            .try_get("count")?;

        Ok(count)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_sibling_bids(&self, ride_id: Uuid, keep: Uuid) -> Result<Vec<Bid>, Error> {
        let rows = self
            .pool
            .fetch_all(
                sqlx::query(&format!(
                    "DELETE FROM candidatures WHERE course_id = $1 AND id <> $2 RETURNING {}",
                    BID_COLUMNS
                ))
                .bind(&ride_id)
                .bind(&keep),
            )
            .await?;

        rows.iter().map(bid_from_row).collect()
    }

    #[tracing::instrument(skip(self, review), fields(review_id = %review.id, ride_id = %review.ride_id))]
    async fn insert_review(&self, review: &Review) -> Result<User, Error> {
        let mut tx = self.pool.begin().await?;

        let mut user = fetch_user_for_update(&mut tx, &review.evaluated_id).await?;

        tx.execute(
            sqlx::query(&format!(
                "INSERT INTO avis ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                REVIEW_COLUMNS
            ))
            .bind(&review.id)
            .bind(&review.ride_id)
            .bind(&review.evaluator_id)
            .bind(&review.evaluated_id)
            .bind(review.evaluation_type.name())
            .bind(review.note)
            .bind(&review.comment)
            .bind(&review.created_at),
        )
        .await
        .map_err(|err| map_unique_violation(err, already_reviewed_error))?;

        let rows = tx
            .fetch_all(
                sqlx::query("SELECT note FROM avis WHERE evaluated_id = $1 AND evaluation_type = $2")
                    .bind(&review.evaluated_id)
                    .bind(review.evaluation_type.name()),
            )
            .await?;

        let notes = rows
            .iter()
            .map(|row| row.try_get::<i16, _>("note"))
            .collect::<Result<Vec<i16>, sqlx::Error>>()?;

        user.apply_rating(review.evaluation_type, RatingSummary::from_notes(&notes));
        update_user(&mut tx, &user).await?;

        tx.commit().await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    async fn list_reviews_about(
        &self,
        evaluated_id: Uuid,
        evaluation_type: EvaluationType,
    ) -> Result<Vec<Review>, Error> {
        let rows = self
            .pool
            .fetch_all(
                sqlx::query(&format!(
                    "SELECT {} FROM avis WHERE evaluated_id = $1 AND evaluation_type = $2 ORDER BY created_at DESC",
                    REVIEW_COLUMNS
                ))
                .bind(&evaluated_id)
                .bind(evaluation_type.name()),
            )
            .await?;

        rows.iter().map(review_from_row).collect()
    }

    #[tracing::instrument(skip(self, message), fields(message_id = %message.id, ride_id = %message.ride_id))]
    async fn insert_message(&self, message: &Message) -> Result<(), Error> {
        self.pool
            .execute(
                sqlx::query(
                    "INSERT INTO messages (id, course_id, sender_id, recipient_id, content, created_at, read) VALUES ($1, $2, $3, $4, $5, $6, $7)",
                )
                .bind(&message.id)
                .bind(&message.ride_id)
                .bind(&message.sender_id)
                .bind(&message.recipient_id)
                .bind(&message.content)
                .bind(&message.created_at)
                .bind(message.read),
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_messages(&self, ride_id: Uuid) -> Result<Vec<Message>, Error> {
        let rows = self
            .pool
            .fetch_all(
                sqlx::query(
                    "SELECT id, course_id, sender_id, recipient_id, content, created_at, read FROM messages WHERE course_id = $1 ORDER BY created_at ASC",
                )
                .bind(&ride_id),
            )
            .await?;

        rows.iter().map(message_from_row).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn mark_messages_read(&self, ride_id: Uuid, recipient_id: Uuid) -> Result<u64, Error> {
        let result = self
            .pool
            .execute(
                sqlx::query(
                    "UPDATE messages SET read = TRUE WHERE course_id = $1 AND recipient_id = $2 AND NOT read",
                )
                .bind(&ride_id)
                .bind(&recipient_id),
            )
            .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self))]
    async fn platform_stats(&self) -> Result<PlatformStats, Error> {
        let row = self
            .pool
            .fetch_one(
                sqlx::query(
                    "SELECT
                        (SELECT COUNT(*) FROM users) AS users,
                        (SELECT COUNT(*) FROM users WHERE validated) AS validated_users,
                        (SELECT COUNT(*) FROM courses WHERE status = 'available') AS available_rides,
                        (SELECT COUNT(*) FROM courses WHERE status = 'awarded') AS awarded_rides,
                        (SELECT COUNT(*) FROM courses WHERE status = 'completed') AS completed_rides,
                        (
                            SELECT COUNT(*)
                            FROM candidatures c JOIN courses r ON r.id = c.course_id
                            WHERE r.status = 'available'
                        ) AS open_bids,
                        (SELECT COUNT(*) FROM avis) AS reviews",
                ),
            )
            .await?;

        Ok(PlatformStats {
            users: row.try_get("users")?,
            validated_users: row.try_get("validated_users")?,
            available_rides: row.try_get("available_rides")?,
            awarded_rides: row.try_get("awarded_rides")?,
            completed_rides: row.try_get("completed_rides")?,
            open_bids: row.try_get("open_bids")?,
            reviews: row.try_get("reviews")?,
        })
    }
}
