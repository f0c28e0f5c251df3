use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::reservations::{error::ReservationError, repo_types::Reservation, ticket::generate_ticket};
use crate::seating::Seat;

/// Persistent reservation records. Every implementation guarantees that at most
/// one reservation holds a given seat, and that each mutation is all-or-nothing.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Inserts a reservation with a fresh ticket; `SeatTaken` if the seat is held.
    async fn create(&self, passenger_name: &str, seat: Seat) -> Result<Reservation, ReservationError>;
    /// All reservations ordered by id.
    async fn list_all(&self) -> Result<Vec<Reservation>, ReservationError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Reservation>, ReservationError>;
    /// Current holder of a seat. Part of the store contract; the request path
    /// relies on the write-time seat check instead, so only tests read it.
    #[allow(dead_code)]
    async fn find_by_seat(&self, seat: Seat) -> Result<Option<Reservation>, ReservationError>;
    async fn find_by_ticket(&self, ticket: &str) -> Result<Option<Reservation>, ReservationError>;
    /// Returns false (and changes nothing) when no reservation has this ticket.
    async fn delete_by_ticket(&self, ticket: &str) -> Result<bool, ReservationError>;
    /// Rewrites name and seat; the seat check ignores the record being updated.
    async fn update(
        &self,
        id: i64,
        passenger_name: &str,
        seat: Seat,
    ) -> Result<Reservation, ReservationError>;
}

/* ---------- postgres ---------- */

const SEAT_CONSTRAINT: &str = "reservations_seat_key";
const TICKET_CONSTRAINT: &str = "reservations_ticket_key";
const INSERT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conflict {
    Seat,
    Ticket,
}

fn conflict_for_constraint(constraint: Option<&str>) -> Option<Conflict> {
    match constraint {
        Some(SEAT_CONSTRAINT) => Some(Conflict::Seat),
        Some(TICKET_CONSTRAINT) => Some(Conflict::Ticket),
        _ => None,
    }
}

fn conflict_of(err: &sqlx::Error) -> Option<Conflict> {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            conflict_for_constraint(db.constraint())
        }
        _ => None,
    }
}

#[derive(Clone)]
pub struct PgReservationStore {
    db: PgPool,
}

impl PgReservationStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Inserts with tickets drawn from `next_ticket`, retrying on a ticket
    /// collision up to `INSERT_ATTEMPTS` times.
    async fn insert_with<F>(
        &self,
        passenger_name: &str,
        seat: Seat,
        mut next_ticket: F,
    ) -> Result<Reservation, ReservationError>
    where
        F: FnMut() -> String + Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let ticket = next_ticket();
            // seat uniqueness is decided by the constraint, not by a prior SELECT
            let inserted = sqlx::query_as::<_, Reservation>(
                r#"
                INSERT INTO reservations (passenger_name, seat_row, seat_column, ticket_number)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT ON CONSTRAINT reservations_seat_key DO NOTHING
                RETURNING id, passenger_name, seat_row, seat_column, ticket_number, created_at
                "#,
            )
            .bind(passenger_name)
            .bind(seat.row())
            .bind(seat.column())
            .bind(&ticket)
            .fetch_optional(&self.db)
            .await;

            match inserted {
                Ok(Some(r)) => return Ok(r),
                Ok(None) => return Err(ReservationError::SeatTaken),
                Err(e) => match conflict_of(&e) {
                    Some(Conflict::Seat) => return Err(ReservationError::SeatTaken),
                    Some(Conflict::Ticket) if attempt < INSERT_ATTEMPTS => {
                        warn!(attempt, "ticket collision; regenerating");
                    }
                    _ => return Err(e.into()),
                },
            }
        }
    }
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn create(&self, passenger_name: &str, seat: Seat) -> Result<Reservation, ReservationError> {
        self.insert_with(passenger_name, seat, generate_ticket).await
    }

    async fn list_all(&self) -> Result<Vec<Reservation>, ReservationError> {
        let rows = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, passenger_name, seat_row, seat_column, ticket_number, created_at
            FROM reservations
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Reservation>, ReservationError> {
        let row = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, passenger_name, seat_row, seat_column, ticket_number, created_at
            FROM reservations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_seat(&self, seat: Seat) -> Result<Option<Reservation>, ReservationError> {
        let row = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, passenger_name, seat_row, seat_column, ticket_number, created_at
            FROM reservations
            WHERE seat_row = $1 AND seat_column = $2
            "#,
        )
        .bind(seat.row())
        .bind(seat.column())
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_ticket(&self, ticket: &str) -> Result<Option<Reservation>, ReservationError> {
        let row = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, passenger_name, seat_row, seat_column, ticket_number, created_at
            FROM reservations
            WHERE ticket_number = $1
            "#,
        )
        .bind(ticket)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_by_ticket(&self, ticket: &str) -> Result<bool, ReservationError> {
        let res = sqlx::query("DELETE FROM reservations WHERE ticket_number = $1")
            .bind(ticket)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn update(
        &self,
        id: i64,
        passenger_name: &str,
        seat: Seat,
    ) -> Result<Reservation, ReservationError> {
        let updated = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET passenger_name = $2, seat_row = $3, seat_column = $4
            WHERE id = $1
            RETURNING id, passenger_name, seat_row, seat_column, ticket_number, created_at
            "#,
        )
        .bind(id)
        .bind(passenger_name)
        .bind(seat.row())
        .bind(seat.column())
        .fetch_optional(&self.db)
        .await;

        match updated {
            Ok(Some(r)) => Ok(r),
            Ok(None) => Err(ReservationError::NotFound),
            Err(e) if conflict_of(&e) == Some(Conflict::Seat) => Err(ReservationError::SeatTaken),
            Err(e) => Err(e.into()),
        }
    }
}

/* ---------- in-memory ---------- */

#[derive(Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<i64, Reservation>,
    by_seat: HashMap<Seat, i64>,
    by_ticket: HashMap<String, i64>,
}

/// Process-local store. All writes happen under one lock, which gives the same
/// seat guarantee as the database constraint.
#[derive(Default)]
pub struct MemoryReservationStore {
    inner: RwLock<Inner>,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn create(&self, passenger_name: &str, seat: Seat) -> Result<Reservation, ReservationError> {
        let mut inner = self.inner.write().await;
        if inner.by_seat.contains_key(&seat) {
            return Err(ReservationError::SeatTaken);
        }
        let mut ticket = generate_ticket();
        while inner.by_ticket.contains_key(&ticket) {
            ticket = generate_ticket();
        }

        inner.last_id += 1;
        let reservation = Reservation {
            id: inner.last_id,
            passenger_name: passenger_name.to_string(),
            seat_row: seat.row(),
            seat_column: seat.column(),
            ticket_number: ticket.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.by_seat.insert(seat, reservation.id);
        inner.by_ticket.insert(ticket, reservation.id);
        inner.rows.insert(reservation.id, reservation.clone());
        debug!(id = reservation.id, "reservation stored in memory");
        Ok(reservation)
    }

    async fn list_all(&self) -> Result<Vec<Reservation>, ReservationError> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Reservation>, ReservationError> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn find_by_seat(&self, seat: Seat) -> Result<Option<Reservation>, ReservationError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_seat
            .get(&seat)
            .and_then(|id| inner.rows.get(id))
            .cloned())
    }

    async fn find_by_ticket(&self, ticket: &str) -> Result<Option<Reservation>, ReservationError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_ticket
            .get(ticket)
            .and_then(|id| inner.rows.get(id))
            .cloned())
    }

    async fn delete_by_ticket(&self, ticket: &str) -> Result<bool, ReservationError> {
        let mut inner = self.inner.write().await;
        let Some(id) = inner.by_ticket.remove(ticket) else {
            return Ok(false);
        };
        if let Some(r) = inner.rows.remove(&id) {
            if let Ok(seat) = Seat::new(r.seat_row, r.seat_column) {
                inner.by_seat.remove(&seat);
            }
        }
        Ok(true)
    }

    async fn update(
        &self,
        id: i64,
        passenger_name: &str,
        seat: Seat,
    ) -> Result<Reservation, ReservationError> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.rows.get(&id).cloned() else {
            return Err(ReservationError::NotFound);
        };
        if matches!(inner.by_seat.get(&seat), Some(holder) if *holder != id) {
            return Err(ReservationError::SeatTaken);
        }

        if let Ok(old_seat) = Seat::new(current.seat_row, current.seat_column) {
            inner.by_seat.remove(&old_seat);
        }
        inner.by_seat.insert(seat, id);

        let updated = Reservation {
            passenger_name: passenger_name.to_string(),
            seat_row: seat.row(),
            seat_column: seat.column(),
            ..current
        };
        inner.rows.insert(id, updated.clone());
        Ok(updated)
    }
}


/// Runs against a real database: `DATABASE_URL=... cargo test -- --ignored`.
/// Tests share one schema, so they serialize on `DB_LOCK` and start from an
/// empty table.
#[cfg(test)]
mod pg_tests {
    use super::*;
    use std::sync::Arc;

    use sqlx::postgres::PgPoolOptions;
    use tokio::sync::{Mutex, MutexGuard};

    static DB_LOCK: Mutex<()> = Mutex::const_new(());

    fn seat(row: i32, col: i32) -> Seat {
        Seat::new(row, col).unwrap()
    }

    async fn fresh_store() -> (PgReservationStore, MutexGuard<'static, ()>) {
        let guard = DB_LOCK.lock().await;
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(&url)
            .await
            .expect("connect to postgres");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");
        sqlx::query("TRUNCATE reservations RESTART IDENTITY")
            .execute(&pool)
            .await
            .expect("truncate reservations");
        (PgReservationStore::new(pool), guard)
    }

    #[tokio::test]
    #[ignore]
    async fn concurrent_reservations_for_one_seat_yield_one_winner() {
        let (store, _guard) = fresh_store().await;
        let store = Arc::new(store);
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(&format!("racer {i}"), seat(6, 1)).await
            }));
        }

        let mut winners = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => winners += 1,
                Err(ReservationError::SeatTaken) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore]
    async fn second_reservation_for_same_seat_is_seat_taken() {
        let (store, _guard) = fresh_store().await;
        let first = store.create("Alice", seat(5, 2)).await.unwrap();

        let err = store.create("Bob", seat(5, 2)).await.unwrap_err();
        assert!(matches!(err, ReservationError::SeatTaken));
        assert_eq!(store.list_all().await.unwrap(), vec![first.clone()]);
        assert_eq!(store.find_by_seat(seat(5, 2)).await.unwrap(), Some(first));
    }

    #[tokio::test]
    #[ignore]
    async fn edit_onto_occupied_seat_is_seat_taken() {
        let (store, _guard) = fresh_store().await;
        let alice = store.create("Alice", seat(1, 1)).await.unwrap();
        let bob = store.create("Bob", seat(2, 1)).await.unwrap();

        let err = store.update(bob.id, "Bob", seat(1, 1)).await.unwrap_err();
        assert!(matches!(err, ReservationError::SeatTaken));
        assert_eq!(store.find_by_id(bob.id).await.unwrap(), Some(bob.clone()));
        assert_eq!(store.find_by_seat(seat(1, 1)).await.unwrap(), Some(alice));

        let moved = store.update(bob.id, "Robert", seat(3, 3)).await.unwrap();
        assert_eq!((moved.seat_row, moved.seat_column), (3, 3));
        assert_eq!(moved.ticket_number, bob.ticket_number);
        assert!(store.find_by_seat(seat(2, 1)).await.unwrap().is_none());

        let err = store.update(9999, "Nobody", seat(4, 4)).await.unwrap_err();
        assert!(matches!(err, ReservationError::NotFound));
    }

    #[tokio::test]
    #[ignore]
    async fn deleting_unknown_ticket_leaves_table_unchanged() {
        let (store, _guard) = fresh_store().await;
        let r = store.create("Eve", seat(2, 2)).await.unwrap();

        assert!(!store.delete_by_ticket("ffffffffffffffffffffffffffffffff").await.unwrap());
        assert_eq!(store.list_all().await.unwrap(), vec![r.clone()]);

        assert!(store.delete_by_ticket(&r.ticket_number).await.unwrap());
        assert!(store.find_by_ticket(&r.ticket_number).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn ticket_collision_is_retried_with_a_new_ticket() {
        let (store, _guard) = fresh_store().await;
        let taken = store.create("Alice", seat(1, 1)).await.unwrap();

        let mut tickets = vec![generate_ticket(), taken.ticket_number.clone()];
        let r = store
            .insert_with("Bob", seat(1, 2), move || tickets.pop().unwrap_or_else(generate_ticket))
            .await
            .unwrap();
        assert_ne!(r.ticket_number, taken.ticket_number);
        assert_eq!(store.list_all().await.unwrap().len(), 2);

        let same = taken.ticket_number.clone();
        let err = store
            .insert_with("Carol", seat(1, 3), move || same.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ReservationError::Storage(_)));
        assert!(store.find_by_seat(seat(1, 3)).await.unwrap().is_none());
    }
}
