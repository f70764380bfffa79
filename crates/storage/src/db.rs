// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema initialisation.

use rusqlite::Connection;

use crate::store::StoreError;

/// Initialise the jobs and host cache tables.
///
/// Safe to call on every startup; uses `IF NOT EXISTS` throughout.
pub fn init_db(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS jobs (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            host         TEXT NOT NULL,
            working_dir  TEXT NOT NULL,
            command      TEXT NOT NULL,
            description  TEXT,
            session      TEXT,
            queue        TEXT,
            status       TEXT NOT NULL,
            start_time   INTEGER NOT NULL DEFAULT 0,
            end_time     INTEGER,
            exit_code    INTEGER,
            error        TEXT,
            env_vars     TEXT NOT NULL DEFAULT '[]'
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_host_status
            ON jobs(host, status);
        CREATE INDEX IF NOT EXISTS idx_jobs_status
            ON jobs(status);
        CREATE TABLE IF NOT EXISTS hosts (
            name           TEXT PRIMARY KEY,
            arch           TEXT NOT NULL DEFAULT '',
            os_version     TEXT NOT NULL DEFAULT '',
            hardware_model TEXT NOT NULL DEFAULT '',
            cpu_model      TEXT NOT NULL DEFAULT '',
            cpu_count      INTEGER NOT NULL DEFAULT 0,
            total_memory   TEXT NOT NULL DEFAULT '',
            gpus           TEXT NOT NULL DEFAULT '[]',
            last_check     INTEGER NOT NULL DEFAULT 0
        );",
    )?;
    Ok(())
}
