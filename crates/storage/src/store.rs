// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job store.
//!
//! A single SQLite connection behind a mutex. Every state transition
//! is one guarded UPDATE, so transitions are atomic and illegal ones
//! (completing a dead job, reviving a completed one) are no-ops at the
//! SQL layer no matter what callers race.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use rj_core::{CachedHostInfo, Job, JobStatus};

use crate::db;

/// Errors from the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("job not found: {0}")]
    NotFound(i64),
    #[error("store poisoned by a panicked writer")]
    Poisoned,
}

/// Fields for inserting a job row.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub host: String,
    pub working_dir: String,
    pub command: String,
    pub description: Option<String>,
    /// Session tag; `None` makes this a queue-runner job.
    pub session: Option<String>,
    pub queue: Option<String>,
    pub env_vars: Vec<String>,
    /// UNIX seconds; 0 for queued inserts.
    pub start_time: i64,
}

/// Keyed store of jobs and cached host facts.
pub struct JobStore {
    conn: Mutex<Connection>,
}

impl JobStore {
    /// Open (creating if needed) a store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            // Missing directory surfaces as a cryptic sqlite error
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        db::init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        db::init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    // --- inserts ---

    /// Insert a tmux-owned job in `starting`. Returns its id.
    pub fn record_job_starting(&self, new: &NewJob) -> Result<i64, StoreError> {
        self.insert(new, JobStatus::Starting, new.start_time)
    }

    /// Insert a queue-runner job in `queued`, start time unknown.
    pub fn record_job_queued(&self, new: &NewJob) -> Result<i64, StoreError> {
        self.insert(new, JobStatus::Queued, 0)
    }

    fn insert(&self, new: &NewJob, status: JobStatus, start_time: i64) -> Result<i64, StoreError> {
        let env_json =
            serde_json::to_string(&new.env_vars).unwrap_or_else(|_| "[]".to_string());
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO jobs
             (host, working_dir, command, description, session, queue, status, start_time, env_vars)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                new.host,
                new.working_dir,
                new.command,
                new.description,
                new.session,
                new.queue,
                status.as_str(),
                start_time,
                env_json,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    // --- queries ---

    pub fn get_job(&self, id: i64) -> Result<Option<Job>, StoreError> {
        let conn = self.lock()?;
        let job = conn
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                params![id],
                row_to_job,
            )
            .optional()?;
        Ok(job)
    }

    /// Most recent jobs, optionally filtered by host and/or status.
    pub fn list_jobs(
        &self,
        host: Option<&str>,
        status: Option<JobStatus>,
        limit: usize,
    ) -> Result<Vec<Job>, StoreError> {
        let conn = self.lock()?;
        let mut sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE 1=1");
        let mut args: Vec<rusqlite::types::Value> = Vec::new();
        if let Some(host) = host {
            sql.push_str(" AND host = ?");
            args.push(host.to_string().into());
        }
        if let Some(status) = status {
            sql.push_str(" AND status = ?");
            args.push(status.as_str().to_string().into());
        }
        sql.push_str(" ORDER BY id DESC LIMIT ?");
        args.push((limit as i64).into());

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), row_to_job)?;
        collect_jobs(rows)
    }

    pub fn list_running(&self, host: &str) -> Result<Vec<Job>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE host = ?1 AND status = 'running' ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![host], row_to_job)?;
        collect_jobs(rows)
    }

    pub fn list_unique_running_hosts(&self) -> Result<Vec<String>, StoreError> {
        self.string_column(
            "SELECT DISTINCT host FROM jobs WHERE status = 'running' ORDER BY host",
        )
    }

    pub fn list_unique_hosts(&self) -> Result<Vec<String>, StoreError> {
        self.string_column("SELECT DISTINCT host FROM jobs ORDER BY host")
    }

    pub fn list_all_queued(&self) -> Result<Vec<Job>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'queued' ORDER BY id"
        ))?;
        let rows = stmt.query_map([], row_to_job)?;
        collect_jobs(rows)
    }

    /// Queue-runner jobs marked dead at or after `since_ts`: the
    /// revive pass candidates.
    pub fn list_recent_dead_queue_jobs(&self, since_ts: i64) -> Result<Vec<Job>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs
             WHERE status = 'dead' AND session IS NULL AND COALESCE(end_time, 0) >= ?1
             ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![since_ts], row_to_job)?;
        collect_jobs(rows)
    }

    fn string_column(&self, sql: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    // --- transitions ---

    /// `starting → running` after a successful launch.
    pub fn update_job_running(&self, id: i64) -> Result<(), StoreError> {
        let changed = self.lock()?.execute(
            "UPDATE jobs SET status = 'running' WHERE id = ?1 AND status = 'starting'",
            params![id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// `queued → running` on runner pickup. Returns whether the row
    /// actually transitioned (it may have completed in the meantime).
    pub fn update_queued_to_running(&self, id: i64) -> Result<bool, StoreError> {
        let changed = self.lock()?.execute(
            "UPDATE jobs SET status = 'running' WHERE id = ?1 AND status = 'queued'",
            params![id],
        )?;
        Ok(changed > 0)
    }

    pub fn update_start_time(&self, id: i64, ts: i64) -> Result<(), StoreError> {
        self.lock()?.execute(
            "UPDATE jobs SET start_time = ?2 WHERE id = ?1",
            params![id, ts],
        )?;
        Ok(())
    }

    /// Record a terminal completion from a status file. Idempotent:
    /// a second observation of the same status file is a no-op, and a
    /// completion never overwrites another terminal state.
    pub fn record_completion(
        &self,
        id: i64,
        exit_code: i32,
        end_ts: i64,
    ) -> Result<bool, StoreError> {
        let changed = self.lock()?.execute(
            "UPDATE jobs SET status = 'completed', exit_code = ?2, end_time = ?3, error = NULL
             WHERE id = ?1 AND status NOT IN ('completed', 'dead', 'failed')",
            params![id, exit_code, end_ts],
        )?;
        Ok(changed > 0)
    }

    /// Mark a job dead (session vanished without a status file, or an
    /// explicit kill). Never demotes a job already terminal.
    pub fn mark_dead(&self, id: i64, end_ts: i64) -> Result<bool, StoreError> {
        let changed = self.lock()?.execute(
            "UPDATE jobs SET status = 'dead', end_time = ?2
             WHERE id = ?1 AND status NOT IN ('completed', 'dead', 'failed')",
            params![id, end_ts],
        )?;
        Ok(changed > 0)
    }

    /// Undo a false-dead diagnosis. Only moves `dead → running`.
    pub fn revive_dead(&self, id: i64) -> Result<bool, StoreError> {
        let changed = self.lock()?.execute(
            "UPDATE jobs SET status = 'running', end_time = NULL, exit_code = NULL, error = NULL
             WHERE id = ?1 AND status = 'dead'",
            params![id],
        )?;
        Ok(changed > 0)
    }

    /// A launch step failed; record the friendly error.
    pub fn update_failed(&self, id: i64, message: &str, end_ts: i64) -> Result<(), StoreError> {
        self.lock()?.execute(
            "UPDATE jobs SET status = 'failed', error = ?2, end_time = ?3
             WHERE id = ?1 AND status NOT IN ('completed', 'dead', 'failed')",
            params![id, message, end_ts],
        )?;
        Ok(())
    }

    pub fn delete_job(&self, id: i64) -> Result<bool, StoreError> {
        let changed = self
            .lock()?
            .execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Delete terminal rows (and optionally running ones), optionally
    /// only those that ended before `older_than`. Returns the count.
    pub fn prune_jobs(
        &self,
        include_running: bool,
        older_than: Option<i64>,
    ) -> Result<usize, StoreError> {
        let mut sql = String::from(
            "DELETE FROM jobs WHERE status IN ('completed', 'dead', 'failed')",
        );
        if include_running {
            sql = String::from(
                "DELETE FROM jobs WHERE status IN ('completed', 'dead', 'failed', 'running')",
            );
        }
        let conn = self.lock()?;
        let changed = match older_than {
            Some(ts) => {
                sql.push_str(" AND COALESCE(end_time, start_time) < ?1");
                conn.execute(&sql, params![ts])?
            }
            None => conn.execute(&sql, [])?,
        };
        Ok(changed)
    }

    // --- host cache ---

    pub fn load_cached_host(&self, name: &str) -> Result<Option<CachedHostInfo>, StoreError> {
        let conn = self.lock()?;
        let host = conn
            .query_row(
                "SELECT name, arch, os_version, hardware_model, cpu_model, cpu_count,
                        total_memory, gpus, last_check
                 FROM hosts WHERE name = ?1",
                params![name],
                row_to_cached_host,
            )
            .optional()?;
        Ok(host)
    }

    /// Upsert the cache row for a host after a successful probe.
    pub fn save_cached_host(&self, info: &CachedHostInfo) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT INTO hosts
             (name, arch, os_version, hardware_model, cpu_model, cpu_count, total_memory, gpus, last_check)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(name) DO UPDATE SET
               arch = excluded.arch,
               os_version = excluded.os_version,
               hardware_model = excluded.hardware_model,
               cpu_model = excluded.cpu_model,
               cpu_count = excluded.cpu_count,
               total_memory = excluded.total_memory,
               gpus = excluded.gpus,
               last_check = excluded.last_check",
            params![
                info.name,
                info.arch,
                info.os_version,
                info.hardware_model,
                info.cpu_model,
                info.cpu_count,
                info.total_memory,
                info.gpus_json,
                info.last_check,
            ],
        )?;
        Ok(())
    }

    pub fn load_all_cached_hosts(&self) -> Result<Vec<CachedHostInfo>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, arch, os_version, hardware_model, cpu_model, cpu_count,
                    total_memory, gpus, last_check
             FROM hosts ORDER BY name",
        )?;
        let rows = stmt.query_map([], row_to_cached_host)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn delete_cached_host(&self, name: &str) -> Result<bool, StoreError> {
        let changed = self
            .lock()?
            .execute("DELETE FROM hosts WHERE name = ?1", params![name])?;
        Ok(changed > 0)
    }
}

const JOB_COLUMNS: &str = "id, host, working_dir, command, description, session, queue, \
                           status, start_time, end_time, exit_code, error, env_vars";

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let status_str: String = row.get(7)?;
    let status = JobStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("unknown job status: {status_str}").into(),
        )
    })?;
    let env_json: String = row.get(12)?;
    Ok(Job {
        id: row.get(0)?,
        host: row.get(1)?,
        working_dir: row.get(2)?,
        command: row.get(3)?,
        description: row.get(4)?,
        session: row.get(5)?,
        queue: row.get(6)?,
        status,
        start_time: row.get(8)?,
        end_time: row.get(9)?,
        exit_code: row.get(10)?,
        error: row.get(11)?,
        env_vars: serde_json::from_str(&env_json).unwrap_or_default(),
    })
}

fn row_to_cached_host(row: &rusqlite::Row<'_>) -> rusqlite::Result<CachedHostInfo> {
    Ok(CachedHostInfo {
        name: row.get(0)?,
        arch: row.get(1)?,
        os_version: row.get(2)?,
        hardware_model: row.get(3)?,
        cpu_model: row.get(4)?,
        cpu_count: row.get(5)?,
        total_memory: row.get(6)?,
        gpus_json: row.get(7)?,
        last_check: row.get(8)?,
    })
}

fn collect_jobs(
    rows: impl Iterator<Item = rusqlite::Result<Job>>,
) -> Result<Vec<Job>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
