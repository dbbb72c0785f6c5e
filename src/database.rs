use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

use crate::constants::DATABASE_FILE_NAME;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id           TEXT    PRIMARY KEY,
    title        TEXT    NOT NULL,
    amount       TEXT    NOT NULL,
    kind         TEXT    NOT NULL CHECK (kind IN ('income', 'expense')),
    occurred_at  INTEGER NOT NULL
);
"#;

const CREATE_TRANSACTIONS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_occurred_at ON transactions (occurred_at);
"#;

const CREATE_GOALS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS goals (
    id             TEXT    PRIMARY KEY,
    name           TEXT    NOT NULL,
    target_amount  TEXT    NOT NULL,
    deadline       INTEGER NOT NULL,
    completed      INTEGER NOT NULL DEFAULT 0,
    created_at     INTEGER NOT NULL
);
"#;

const CREATE_NOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    id          TEXT    PRIMARY KEY,
    text        TEXT    NOT NULL,
    created_at  INTEGER NOT NULL
);
"#;

pub type Db = Arc<RwLock<Connection>>;

/// Opens (or creates) `finance.db` under `data_dir` and ensures the schema exists.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(DATABASE_FILE_NAME);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute(CREATE_TRANSACTIONS_TABLE, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_INDEX, ()).await?;
    conn.execute(CREATE_GOALS_TABLE, ()).await?;
    conn.execute(CREATE_NOTES_TABLE, ()).await?;

    Ok(Arc::new(RwLock::new(conn)))
}
