//! Issue-record source for workload reports.
//!
//! Stores the subset of an issue tracker's schema that workload reports
//! read, using `rusqlite`, and hands back validated [`IssueRecord`]s.
//!
//! # Thread Safety
//!
//! [`Database`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Open one `Database` per thread, or serialize access with a `Mutex`.
//!
//! # Schema
//!
//! Users and groups share the `users` table and are told apart by `type`
//! (`User` or `Group`); a group's name lives in `lastname`. Only rows with
//! `status = 1` are active. A person's full name is `lastname || firstname`.
//!
//! Dates are stored as TEXT in `YYYY-MM-DD` form, so lexicographic order
//! matches chronological order. Estimates are stored as REAL and read back
//! through their SQLite text rendering to avoid binary float noise.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wl_core::{DateRange, IssueRecord, RawIssueRow, ValidationError};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored date could not be parsed.
    #[error("invalid date for issue #{issue_id}: {value}")]
    DateParse {
        issue_id: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored estimate could not be parsed.
    #[error("invalid estimated hours for issue #{issue_id}: {value}")]
    HoursParse {
        issue_id: i64,
        value: String,
        #[source]
        source: rust_decimal::Error,
    },
    /// A row violated the engine's input contract.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Which issues to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    pub group: String,
    /// Full names to restrict to; empty means the whole group.
    pub people: Vec<String>,
    /// Issues overlapping this window are returned.
    pub window: DateRange,
    /// List closed issues ahead of open ones within each project.
    pub closed_first: bool,
}

/// A flat issue record as exported from a tracker, used for imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueImport {
    pub group: String,
    pub login: String,
    pub firstname: String,
    pub lastname: String,
    pub project: String,
    pub issue_id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_hours: Option<Decimal>,
    pub status: String,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub closed_on: Option<NaiveDate>,
    /// Whether the assignee's account is active.
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// An issue row with dates and hours still in their stored text form.
struct StoredIssue {
    group: String,
    person: String,
    project: String,
    issue_id: i64,
    subject: String,
    start_date: Option<String>,
    due_date: Option<String>,
    estimated_hours: Option<String>,
    status: String,
    is_closed: bool,
    closed_on: Option<String>,
}

impl StoredIssue {
    fn into_raw(self) -> Result<RawIssueRow, DbError> {
        let issue_id = self.issue_id;
        let estimated_hours = self
            .estimated_hours
            .map(|value| {
                Decimal::from_str(&value).map_err(|source| DbError::HoursParse {
                    issue_id,
                    value,
                    source,
                })
            })
            .transpose()?;

        Ok(RawIssueRow {
            group: self.group,
            person: self.person,
            project: self.project,
            issue_id,
            subject: self.subject,
            start_date: parse_date(issue_id, self.start_date)?,
            due_date: parse_date(issue_id, self.due_date)?,
            estimated_hours,
            status: self.status,
            is_closed: self.is_closed,
            closed_on: parse_date(issue_id, self.closed_on)?,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            -- users: people (type = 'User') and groups (type = 'Group')
            -- status: 1 = active
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                login TEXT NOT NULL DEFAULT '',
                firstname TEXT NOT NULL DEFAULT '',
                lastname TEXT NOT NULL DEFAULT '',
                type TEXT NOT NULL,
                status INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_users_type ON users(type, lastname);

            CREATE TABLE IF NOT EXISTS groups_users (
                group_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                PRIMARY KEY (group_id, user_id),
                FOREIGN KEY (group_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS issue_statuses (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                is_closed INTEGER NOT NULL DEFAULT 0
            );

            -- start_date, due_date, closed_on: 'YYYY-MM-DD'
            CREATE TABLE IF NOT EXISTS issues (
                id INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL,
                subject TEXT NOT NULL DEFAULT '',
                assigned_to_id INTEGER,
                status_id INTEGER NOT NULL,
                start_date TEXT,
                due_date TEXT,
                estimated_hours REAL,
                closed_on TEXT,
                FOREIGN KEY (project_id) REFERENCES projects(id),
                FOREIGN KEY (assigned_to_id) REFERENCES users(id) ON DELETE SET NULL,
                FOREIGN KEY (status_id) REFERENCES issue_statuses(id)
            );

            CREATE INDEX IF NOT EXISTS idx_issues_assigned ON issues(assigned_to_id);
            CREATE INDEX IF NOT EXISTS idx_issues_dates ON issues(start_date, due_date);
            ",
        )?;
        Ok(())
    }

    /// Lists all group names, sorted.
    pub fn list_groups(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT DISTINCT lastname
            FROM users
            WHERE type = 'Group'
            ORDER BY lastname ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }
        Ok(groups)
    }

    /// Lists full names of active members of an active group, sorted.
    pub fn list_people(&self, group: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT DISTINCT u.lastname || u.firstname AS full_name
            FROM users u
            JOIN groups_users gu ON gu.user_id = u.id
            JOIN users g ON g.id = gu.group_id AND g.type = 'Group'
            WHERE g.lastname = ? AND u.status = 1 AND g.status = 1
            ORDER BY full_name ASC
            ",
        )?;
        let rows = stmt.query_map([group], |row| row.get(0))?;
        let mut people = Vec::new();
        for row in rows {
            people.push(row?);
        }
        Ok(people)
    }

    /// Fetches issues of a group overlapping the query window.
    ///
    /// Only active users in active groups are considered, and issues missing
    /// a start date, due date or estimate are skipped. Rows are ordered by
    /// person, project and issue id, with closed issues first within a
    /// project when [`IssueQuery::closed_first`] is set.
    pub fn fetch_issues(&self, query: &IssueQuery) -> Result<Vec<IssueRecord>, DbError> {
        let people: Vec<&str> = query
            .people
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();

        let person_clause = if people.is_empty() {
            String::new()
        } else {
            let placeholders = vec!["?"; people.len()].join(", ");
            format!("AND (u.lastname || u.firstname) IN ({placeholders})")
        };
        let closed_order = if query.closed_first {
            "s.is_closed DESC, "
        } else {
            ""
        };
        let sql = format!(
            "
            SELECT
                g.lastname,
                u.lastname || u.firstname AS person,
                p.name,
                i.id,
                i.subject,
                i.start_date,
                i.due_date,
                CAST(i.estimated_hours AS TEXT),
                s.name,
                s.is_closed,
                i.closed_on
            FROM issues i
            JOIN projects p ON p.id = i.project_id
            JOIN users u ON u.id = i.assigned_to_id
            JOIN groups_users gu ON gu.user_id = u.id
            JOIN users g ON g.id = gu.group_id AND g.type = 'Group'
            JOIN issue_statuses s ON s.id = i.status_id
            WHERE g.lastname = ?
              AND u.status = 1
              AND g.status = 1
              AND i.start_date IS NOT NULL
              AND i.due_date IS NOT NULL
              AND i.estimated_hours IS NOT NULL
              AND i.start_date <= ?
              AND i.due_date >= ?
              {person_clause}
            ORDER BY g.lastname ASC, person ASC, p.name ASC, {closed_order}i.id ASC
            "
        );

        let mut bindings = vec![
            query.group.clone(),
            query.window.end().format(DATE_FORMAT).to_string(),
            query.window.start().format(DATE_FORMAT).to_string(),
        ];
        bindings.extend(people.iter().map(|p| (*p).to_string()));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bindings), |row| {
            Ok(StoredIssue {
                group: row.get(0)?,
                person: row.get(1)?,
                project: row.get(2)?,
                issue_id: row.get(3)?,
                subject: row.get(4)?,
                start_date: row.get(5)?,
                due_date: row.get(6)?,
                estimated_hours: row.get(7)?,
                status: row.get(8)?,
                is_closed: row.get(9)?,
                closed_on: row.get(10)?,
            })
        })?;

        let mut issues = Vec::new();
        for row in rows {
            issues.push(IssueRecord::try_from(row?.into_raw()?)?);
        }

        tracing::debug!(
            group = %query.group,
            people = people.len(),
            window = %query.window,
            rows = issues.len(),
            "fetched issues"
        );
        Ok(issues)
    }

    /// Imports flat issue records in one transaction.
    ///
    /// Groups, users, memberships, projects and statuses are created or
    /// updated as needed; issues are replaced by id. Returns the number of
    /// issues written.
    pub fn import_issues(&mut self, rows: &[IssueImport]) -> Result<usize, DbError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut written = 0;
        for row in rows {
            let group_id = ensure_group(&tx, &row.group)?;
            let user_id = ensure_user(&tx, row)?;
            tx.execute(
                "INSERT OR IGNORE INTO groups_users (group_id, user_id) VALUES (?, ?)",
                params![group_id, user_id],
            )?;
            let project_id = ensure_project(&tx, &row.project)?;
            let status_id = ensure_status(&tx, &row.status, row.is_closed)?;

            written += tx.execute(
                "
                INSERT OR REPLACE INTO issues
                (id, project_id, subject, assigned_to_id, status_id, start_date, due_date, estimated_hours, closed_on)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    row.issue_id,
                    project_id,
                    row.subject,
                    user_id,
                    status_id,
                    row.start_date.map(format_date),
                    row.due_date.map(format_date),
                    row.estimated_hours.map(|h| h.to_string()),
                    row.closed_on.map(format_date),
                ],
            )?;
        }
        tx.commit()?;

        tracing::info!(issues = written, "imported issues");
        Ok(written)
    }
}

fn ensure_group(conn: &Connection, name: &str) -> Result<i64, DbError> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM users WHERE type = 'Group' AND lastname = ?",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO users (login, firstname, lastname, type, status) VALUES ('', '', ?, 'Group', 1)",
        [name],
    )?;
    Ok(conn.last_insert_rowid())
}

fn ensure_user(conn: &Connection, row: &IssueImport) -> Result<i64, DbError> {
    let status = i64::from(row.active);
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM users WHERE type = 'User' AND login = ?",
            [&row.login],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        conn.execute(
            "UPDATE users SET firstname = ?, lastname = ?, status = ? WHERE id = ?",
            params![row.firstname, row.lastname, status, id],
        )?;
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO users (login, firstname, lastname, type, status) VALUES (?, ?, ?, 'User', ?)",
        params![row.login, row.firstname, row.lastname, status],
    )?;
    Ok(conn.last_insert_rowid())
}

fn ensure_project(conn: &Connection, name: &str) -> Result<i64, DbError> {
    conn.execute("INSERT OR IGNORE INTO projects (name) VALUES (?)", [name])?;
    let id = conn.query_row("SELECT id FROM projects WHERE name = ?", [name], |row| {
        row.get(0)
    })?;
    Ok(id)
}

fn ensure_status(conn: &Connection, name: &str, is_closed: bool) -> Result<i64, DbError> {
    conn.execute(
        "
        INSERT INTO issue_statuses (name, is_closed) VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET is_closed = excluded.is_closed
        ",
        params![name, is_closed],
    )?;
    let id = conn.query_row(
        "SELECT id FROM issue_statuses WHERE name = ?",
        [name],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(issue_id: i64, value: Option<String>) -> Result<Option<NaiveDate>, DbError> {
    value
        .map(|value| {
            NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|source| DbError::DateParse {
                issue_id,
                value,
                source,
            })
        })
        .transpose()
}
