//! SQLite store adapter.
//!
//! Money is stored as decimal TEXT so no precision is lost on the way through
//! SQLite's REAL affinity. Timestamps are RFC 3339 with microseconds.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::domain::error::StockfolioError;
use crate::domain::goal::{Goal, GoalKind};
use crate::domain::holding::{Holding, Transaction, TransactionKind};
use crate::domain::instrument::Instrument;
use crate::domain::settings::DatabaseSettings;
use crate::domain::user::{normalize_email, User, UserPatch};
use crate::ports::store_port::StorePort;

const USER_COLUMNS: &str =
    "id, email, password_hash, name, phone, profile_image, balance, is_admin, is_active, created_at";
const INSTRUMENT_COLUMNS: &str = "symbol, company_name, current_price, day_high, day_low, volume, \
     sector, industry, description, last_updated, cached";
const HOLDING_COLUMNS: &str =
    "id, user_id, symbol, quantity, average_buy_price, investment_date, last_updated";
const GOAL_COLUMNS: &str =
    "id, user_id, title, target_amount, target_date, description, kind, progress, created_at";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_settings(settings: &DatabaseSettings) -> Result<Self, StockfolioError> {
        if settings.path == ":memory:" {
            return Self::in_memory();
        }
        let manager = SqliteConnectionManager::file(&settings.path)
            .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));
        let pool = Pool::builder()
            .max_size(settings.pool_size)
            .build(manager)
            .map_err(StockfolioError::database)?;
        Ok(Self { pool })
    }

    /// A single-connection pool over a private in-memory database.
    pub fn in_memory() -> Result<Self, StockfolioError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(StockfolioError::database)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StockfolioError> {
        self.pool.get().map_err(StockfolioError::database)
    }

    pub fn initialize_schema(&self) -> Result<(), StockfolioError> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                phone TEXT,
                profile_image TEXT,
                balance TEXT NOT NULL DEFAULT '0',
                is_admin INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS instruments (
                symbol TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                current_price TEXT NOT NULL,
                day_high TEXT,
                day_low TEXT,
                volume INTEGER,
                sector TEXT,
                industry TEXT,
                description TEXT,
                last_updated TEXT NOT NULL,
                cached INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS holdings (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                symbol TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                average_buy_price TEXT NOT NULL,
                investment_date TEXT NOT NULL,
                last_updated TEXT NOT NULL,
                UNIQUE (user_id, symbol)
            );
            CREATE TABLE IF NOT EXISTS holding_transactions (
                holding_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                kind TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                PRIMARY KEY (holding_id, seq)
            );
            CREATE TABLE IF NOT EXISTS goals (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                target_amount TEXT NOT NULL,
                target_date TEXT NOT NULL,
                description TEXT,
                kind TEXT NOT NULL,
                progress TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_holdings_user ON holdings(user_id);
            CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id);",
        )
        .map_err(StockfolioError::query)?;
        Ok(())
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_failure(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn decimal_at(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|e| conversion_failure(idx, e))
}

fn optional_decimal_at(row: &Row, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| Decimal::from_str(&t).map_err(|e| conversion_failure(idx, e)))
        .transpose()
}

fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        phone: row.get(4)?,
        profile_image: row.get(5)?,
        balance: decimal_at(row, 6)?,
        is_admin: row.get(7)?,
        is_active: row.get(8)?,
        created_at: timestamp_at(row, 9)?,
    })
}

fn instrument_from_row(row: &Row) -> rusqlite::Result<Instrument> {
    Ok(Instrument {
        symbol: row.get(0)?,
        company_name: row.get(1)?,
        current_price: decimal_at(row, 2)?,
        day_high: optional_decimal_at(row, 3)?,
        day_low: optional_decimal_at(row, 4)?,
        volume: row.get(5)?,
        sector: row.get(6)?,
        industry: row.get(7)?,
        description: row.get(8)?,
        last_updated: timestamp_at(row, 9)?,
        cached: row.get(10)?,
    })
}

fn holding_from_row(row: &Row) -> rusqlite::Result<Holding> {
    Ok(Holding {
        id: row.get(0)?,
        user_id: row.get(1)?,
        symbol: row.get(2)?,
        quantity: row.get(3)?,
        average_buy_price: decimal_at(row, 4)?,
        transactions: Vec::new(),
        investment_date: timestamp_at(row, 5)?,
        last_updated: timestamp_at(row, 6)?,
    })
}

fn transaction_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    let kind: String = row.get(0)?;
    let kind = TransactionKind::parse(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Text,
            format!("unknown transaction kind {}", kind).into(),
        )
    })?;
    Ok(Transaction {
        kind,
        quantity: row.get(1)?,
        price: decimal_at(row, 2)?,
        timestamp: timestamp_at(row, 3)?,
    })
}

fn goal_from_row(row: &Row) -> rusqlite::Result<Goal> {
    let date: String = row.get(4)?;
    let target_date =
        NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| conversion_failure(4, e))?;
    let kind: String = row.get(6)?;
    let kind = GoalKind::parse(&kind).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.to_string().into())
    })?;
    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        target_amount: decimal_at(row, 3)?,
        target_date,
        description: row.get(5)?,
        kind,
        progress: decimal_at(row, 7)?,
        created_at: timestamp_at(row, 8)?,
    })
}

fn load_transactions(conn: &Connection, holding: &mut Holding) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        "SELECT kind, quantity, price, timestamp FROM holding_transactions
         WHERE holding_id = ?1 ORDER BY seq ASC",
    )?;
    holding.transactions = stmt
        .query_map(params![holding.id], transaction_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl SqliteAdapter {
    fn find_one_holding(
        &self,
        where_clause: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Option<Holding>, StockfolioError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM holdings WHERE {}", HOLDING_COLUMNS, where_clause);
        let holding = conn
            .query_row(&sql, args, holding_from_row)
            .optional()
            .map_err(StockfolioError::query)?;
        match holding {
            Some(mut holding) => {
                load_transactions(&conn, &mut holding).map_err(StockfolioError::query)?;
                Ok(Some(holding))
            }
            None => Ok(None),
        }
    }

    fn count(&self, table: &str) -> Result<u64, StockfolioError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .map_err(StockfolioError::query)?;
        Ok(count as u64)
    }
}

impl StorePort for SqliteAdapter {
    fn insert_user(&self, user: &User) -> Result<(), StockfolioError> {
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO users ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)", USER_COLUMNS),
            params![
                user.id,
                normalize_email(&user.email),
                user.password_hash,
                user.name,
                user.phone,
                user.profile_image,
                user.balance.to_string(),
                user.is_admin,
                user.is_active,
                timestamp(&user.created_at),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StockfolioError::Conflict {
                    reason: "User already exists".into(),
                }
            } else {
                StockfolioError::query(e)
            }
        })?;
        Ok(())
    }

    fn find_user(&self, id: &str) -> Result<Option<User>, StockfolioError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(StockfolioError::query)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StockfolioError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
            params![normalize_email(email)],
            user_from_row,
        )
        .optional()
        .map_err(StockfolioError::query)
    }

    fn list_users(&self, include_inactive: bool) -> Result<Vec<User>, StockfolioError> {
        let conn = self.conn()?;
        let sql = if include_inactive {
            format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM users WHERE is_active = 1 ORDER BY created_at DESC",
                USER_COLUMNS
            )
        };
        let mut stmt = conn.prepare(&sql).map_err(StockfolioError::query)?;
        let users = stmt
            .query_map([], user_from_row)
            .map_err(StockfolioError::query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StockfolioError::query)?;
        Ok(users)
    }

    fn patch_user(&self, user_id: &str, patch: &UserPatch) -> Result<(), StockfolioError> {
        let mut sets = Vec::new();
        let mut values = vec![Value::Text(user_id.to_string())];
        let mut set = |column: &str, value: Value| {
            values.push(value);
            sets.push(format!("{} = ?{}", column, values.len()));
        };
        if let Some(name) = &patch.name {
            set("name", Value::Text(name.clone()));
        }
        if let Some(phone) = &patch.phone {
            set("phone", phone.clone().map_or(Value::Null, Value::Text));
        }
        if let Some(image) = &patch.profile_image {
            set("profile_image", Value::Text(image.clone()));
        }
        if let Some(is_admin) = patch.is_admin {
            set("is_admin", Value::Integer(is_admin.into()));
        }
        if let Some(is_active) = patch.is_active {
            set("is_active", Value::Integer(is_active.into()));
        }
        // An empty patch still reports a missing user.
        if sets.is_empty() {
            sets.push("id = id".to_string());
        }

        let conn = self.conn()?;
        let changed = conn
            .execute(
                &format!("UPDATE users SET {} WHERE id = ?1", sets.join(", ")),
                params_from_iter(values),
            )
            .map_err(StockfolioError::query)?;
        if changed == 0 {
            return Err(StockfolioError::not_found("User"));
        }
        Ok(())
    }

    fn update_balance(&self, user_id: &str, balance: Decimal) -> Result<(), StockfolioError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE users SET balance = ?2 WHERE id = ?1",
                params![user_id, balance.to_string()],
            )
            .map_err(StockfolioError::query)?;
        if changed == 0 {
            return Err(StockfolioError::not_found("User"));
        }
        Ok(())
    }

    fn count_users(&self) -> Result<u64, StockfolioError> {
        self.count("users")
    }

    fn upsert_instrument(&self, instrument: &Instrument) -> Result<(), StockfolioError> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO instruments ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                INSTRUMENT_COLUMNS
            ),
            params![
                instrument.symbol,
                instrument.company_name,
                instrument.current_price.to_string(),
                instrument.day_high.map(|d| d.to_string()),
                instrument.day_low.map(|d| d.to_string()),
                instrument.volume,
                instrument.sector,
                instrument.industry,
                instrument.description,
                timestamp(&instrument.last_updated),
                instrument.cached,
            ],
        )
        .map_err(StockfolioError::query)?;
        Ok(())
    }

    fn find_instrument(&self, symbol: &str) -> Result<Option<Instrument>, StockfolioError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM instruments WHERE symbol = ?1", INSTRUMENT_COLUMNS),
            params![symbol],
            instrument_from_row,
        )
        .optional()
        .map_err(StockfolioError::query)
    }

    fn list_instruments(&self) -> Result<Vec<Instrument>, StockfolioError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM instruments ORDER BY symbol", INSTRUMENT_COLUMNS))
            .map_err(StockfolioError::query)?;
        let instruments = stmt
            .query_map([], instrument_from_row)
            .map_err(StockfolioError::query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StockfolioError::query)?;
        Ok(instruments)
    }

    fn delete_instrument(&self, symbol: &str) -> Result<bool, StockfolioError> {
        let conn = self.conn()?;
        let changed = conn
            .execute("DELETE FROM instruments WHERE symbol = ?1", params![symbol])
            .map_err(StockfolioError::query)?;
        Ok(changed > 0)
    }

    fn count_instruments(&self) -> Result<u64, StockfolioError> {
        self.count("instruments")
    }

    fn save_holding(&self, holding: &Holding) -> Result<(), StockfolioError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(StockfolioError::query)?;
        tx.execute(
            &format!(
                "INSERT INTO holdings ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET quantity = excluded.quantity,
                 average_buy_price = excluded.average_buy_price,
                 last_updated = excluded.last_updated",
                HOLDING_COLUMNS
            ),
            params![
                holding.id,
                holding.user_id,
                holding.symbol,
                holding.quantity,
                holding.average_buy_price.to_string(),
                timestamp(&holding.investment_date),
                timestamp(&holding.last_updated),
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StockfolioError::Conflict {
                    reason: format!("holding for {} already exists", holding.symbol),
                }
            } else {
                StockfolioError::query(e)
            }
        })?;
        tx.execute(
            "DELETE FROM holding_transactions WHERE holding_id = ?1",
            params![holding.id],
        )
        .map_err(StockfolioError::query)?;
        for (seq, t) in holding.transactions.iter().enumerate() {
            tx.execute(
                "INSERT INTO holding_transactions (holding_id, seq, kind, quantity, price, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    holding.id,
                    seq as i64,
                    t.kind.as_str(),
                    t.quantity,
                    t.price.to_string(),
                    timestamp(&t.timestamp),
                ],
            )
            .map_err(StockfolioError::query)?;
        }
        tx.commit().map_err(StockfolioError::query)?;
        Ok(())
    }

    fn find_holding(&self, id: &str) -> Result<Option<Holding>, StockfolioError> {
        self.find_one_holding("id = ?1", &[&id])
    }

    fn find_holding_by_symbol(
        &self,
        user_id: &str,
        symbol: &str,
    ) -> Result<Option<Holding>, StockfolioError> {
        self.find_one_holding("user_id = ?1 AND symbol = ?2", &[&user_id, &symbol])
    }

    fn list_holdings(&self, user_id: &str) -> Result<Vec<Holding>, StockfolioError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM holdings WHERE user_id = ?1 ORDER BY investment_date ASC",
                HOLDING_COLUMNS
            ))
            .map_err(StockfolioError::query)?;
        let mut holdings = stmt
            .query_map(params![user_id], holding_from_row)
            .map_err(StockfolioError::query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StockfolioError::query)?;
        for holding in holdings.iter_mut() {
            load_transactions(&conn, holding).map_err(StockfolioError::query)?;
        }
        Ok(holdings)
    }

    fn delete_holding(&self, id: &str) -> Result<bool, StockfolioError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(StockfolioError::query)?;
        tx.execute(
            "DELETE FROM holding_transactions WHERE holding_id = ?1",
            params![id],
        )
        .map_err(StockfolioError::query)?;
        let changed = tx
            .execute("DELETE FROM holdings WHERE id = ?1", params![id])
            .map_err(StockfolioError::query)?;
        tx.commit().map_err(StockfolioError::query)?;
        Ok(changed > 0)
    }

    fn count_holdings(&self) -> Result<u64, StockfolioError> {
        self.count("holdings")
    }

    fn insert_goal(&self, goal: &Goal) -> Result<(), StockfolioError> {
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO goals ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)", GOAL_COLUMNS),
            params![
                goal.id,
                goal.user_id,
                goal.title,
                goal.target_amount.to_string(),
                goal.target_date.format("%Y-%m-%d").to_string(),
                goal.description,
                goal.kind.as_str(),
                goal.progress.to_string(),
                timestamp(&goal.created_at),
            ],
        )
        .map_err(StockfolioError::query)?;
        Ok(())
    }

    fn find_goal(&self, id: &str) -> Result<Option<Goal>, StockfolioError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM goals WHERE id = ?1", GOAL_COLUMNS),
            params![id],
            goal_from_row,
        )
        .optional()
        .map_err(StockfolioError::query)
    }

    fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>, StockfolioError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM goals WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
                GOAL_COLUMNS
            ))
            .map_err(StockfolioError::query)?;
        let goals = stmt
            .query_map(params![user_id], goal_from_row)
            .map_err(StockfolioError::query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StockfolioError::query)?;
        Ok(goals)
    }

    fn delete_goal(&self, id: &str) -> Result<bool, StockfolioError> {
        let conn = self.conn()?;
        let changed = conn
            .execute("DELETE FROM goals WHERE id = ?1", params![id])
            .map_err(StockfolioError::query)?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn instrument(symbol: &str, price: Decimal) -> Instrument {
        Instrument {
            symbol: symbol.into(),
            company_name: format!("{} Ltd", symbol),
            current_price: price,
            day_high: Some(price + dec!(1.25)),
            day_low: None,
            volume: Some(42),
            sector: Some("Energy".into()),
            industry: None,
            description: None,
            last_updated: Utc::now(),
            cached: false,
        }
    }

    #[test]
    fn in_memory_initialization_is_idempotent() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn from_settings_memory_path() {
        let adapter = SqliteAdapter::from_settings(&DatabaseSettings {
            path: ":memory:".into(),
            pool_size: 4,
        })
        .unwrap();
        adapter.initialize_schema().unwrap();
        assert_eq!(adapter.count_users().unwrap(), 0);
    }

    #[test]
    fn user_roundtrip_and_case_insensitive_lookup() {
        let adapter = adapter();
        let user = User::new("Carol@Example.com", "hash".into(), "Carol");
        adapter.insert_user(&user).unwrap();
        let found = adapter.find_user_by_email("CAROL@example.COM").unwrap().unwrap();
        assert_eq!(found, user);
        assert_eq!(adapter.find_user(&user.id).unwrap().unwrap().email, "carol@example.com");
    }

    #[test]
    fn duplicate_email_conflicts() {
        let adapter = adapter();
        adapter
            .insert_user(&User::new("dup@example.com", "h".into(), "A"))
            .unwrap();
        let err = adapter
            .insert_user(&User::new("DUP@example.com", "h".into(), "B"))
            .unwrap_err();
        assert!(matches!(err, StockfolioError::Conflict { .. }));
    }

    #[test]
    fn patch_user_writes_only_given_fields() {
        let adapter = adapter();
        let mut user = User::new("eve@example.com", "h".into(), "Eve");
        user.phone = Some("555-0100".into());
        adapter.insert_user(&user).unwrap();
        adapter.update_balance(&user.id, dec!(750.50)).unwrap();

        let rename = UserPatch {
            name: Some("Eve Renamed".into()),
            ..UserPatch::default()
        };
        adapter.patch_user(&user.id, &rename).unwrap();
        let disable = UserPatch {
            is_active: Some(false),
            phone: Some(None),
            ..UserPatch::default()
        };
        adapter.patch_user(&user.id, &disable).unwrap();

        let stored = adapter.find_user(&user.id).unwrap().unwrap();
        assert_eq!(stored.name, "Eve Renamed");
        assert_eq!(stored.phone, None);
        assert!(!stored.is_active);
        assert!(!stored.is_admin);
        assert_eq!(stored.balance(), dec!(750.50));
    }

    #[test]
    fn patch_unknown_user_is_not_found() {
        let adapter = adapter();
        for patch in [
            UserPatch::default(),
            UserPatch {
                is_admin: Some(true),
                ..UserPatch::default()
            },
        ] {
            assert!(matches!(
                adapter.patch_user("missing", &patch),
                Err(StockfolioError::NotFound { .. })
            ));
        }
    }

    #[test]
    fn list_users_hides_inactive_unless_asked() {
        let adapter = adapter();
        let active = User::new("a@example.com", "h".into(), "A");
        let mut inactive = User::new("b@example.com", "h".into(), "B");
        inactive.is_active = false;
        adapter.insert_user(&active).unwrap();
        adapter.insert_user(&inactive).unwrap();
        assert_eq!(adapter.list_users(false).unwrap().len(), 1);
        assert_eq!(adapter.list_users(true).unwrap().len(), 2);
        assert_eq!(adapter.count_users().unwrap(), 2);
    }

    #[test]
    fn instrument_upsert_overwrites() {
        let adapter = adapter();
        adapter.upsert_instrument(&instrument("TCS", dec!(3500.10))).unwrap();
        adapter.upsert_instrument(&instrument("TCS", dec!(3600))).unwrap();
        let stored = adapter.find_instrument("TCS").unwrap().unwrap();
        assert_eq!(stored.current_price, dec!(3600));
        assert_eq!(stored.day_high, Some(dec!(3601.25)));
        assert_eq!(stored.day_low, None);
        assert_eq!(adapter.count_instruments().unwrap(), 1);
        assert!(adapter.delete_instrument("TCS").unwrap());
        assert!(!adapter.delete_instrument("TCS").unwrap());
    }

    #[test]
    fn holding_roundtrip_keeps_transaction_order() {
        let adapter = adapter();
        let mut holding = Holding::open("u1", "INFY", 5, dec!(100), Utc::now());
        holding.record_buy(5, dec!(200), Utc::now()).unwrap();
        holding.record_sell(3, dec!(180), Utc::now()).unwrap();
        adapter.save_holding(&holding).unwrap();

        let stored = adapter.find_holding(&holding.id).unwrap().unwrap();
        assert_eq!(stored.quantity, 7);
        assert_eq!(stored.average_buy_price, dec!(150));
        let kinds: Vec<_> = stored.transactions.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TransactionKind::Buy, TransactionKind::Buy, TransactionKind::Sell]
        );
        assert!(adapter.find_holding_by_symbol("u1", "INFY").unwrap().is_some());
        assert!(adapter.find_holding_by_symbol("u2", "INFY").unwrap().is_none());
    }

    #[test]
    fn delete_holding_removes_transactions() {
        let adapter = adapter();
        let holding = Holding::open("u1", "SBIN", 2, dec!(600), Utc::now());
        adapter.save_holding(&holding).unwrap();
        assert!(adapter.delete_holding(&holding.id).unwrap());
        assert!(adapter.find_holding(&holding.id).unwrap().is_none());
        assert_eq!(adapter.count_holdings().unwrap(), 0);
        let conn = adapter.conn().unwrap();
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM holding_transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn goals_list_newest_first() {
        let adapter = adapter();
        let now = Utc::now();
        for (i, title) in ["first", "second"].iter().enumerate() {
            adapter
                .insert_goal(&Goal {
                    id: format!("g{}", i),
                    user_id: "u1".into(),
                    title: title.to_string(),
                    target_amount: dec!(1000),
                    target_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                    description: None,
                    kind: GoalKind::Profit,
                    progress: Decimal::ZERO,
                    created_at: now + chrono::Duration::seconds(i as i64),
                })
                .unwrap();
        }
        let goals = adapter.list_goals("u1").unwrap();
        assert_eq!(goals[0].title, "second");
        assert_eq!(goals[1].kind, GoalKind::Profit);
        assert!(adapter.delete_goal("g0").unwrap());
        assert!(adapter.find_goal("g0").unwrap().is_none());
        assert!(adapter.list_goals("u2").unwrap().is_empty());
    }
}
