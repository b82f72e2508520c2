use crate::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS accounts (
                id              INTEGER PRIMARY KEY,
                screen_name     TEXT NOT NULL UNIQUE,
                name            TEXT NOT NULL,
                protected       BOOLEAN NOT NULL,
                friends_count   INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS account_name_history (
                id              INTEGER PRIMARY KEY,
                account_id      INTEGER NOT NULL REFERENCES accounts(id),
                screen_name     TEXT NOT NULL,
                name            TEXT NOT NULL,
                record_date     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS lists (
                id                  INTEGER PRIMARY KEY,
                name                TEXT NOT NULL,
                owner_account_id    INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS list_entities (
                id          INTEGER PRIMARY KEY,
                list_id     INTEGER NOT NULL,
                name        TEXT NOT NULL,
                parent_dir  TEXT NOT NULL COLLATE NOCASE,
                UNIQUE(list_id, parent_dir)
            );

            CREATE TABLE IF NOT EXISTS account_entities (
                id                      INTEGER PRIMARY KEY,
                account_id              INTEGER NOT NULL REFERENCES accounts(id),
                name                    TEXT NOT NULL,
                latest_release_time     TEXT,
                parent_dir              TEXT NOT NULL COLLATE NOCASE,
                media_count             INTEGER,
                UNIQUE(account_id, parent_dir)
            );

            CREATE TABLE IF NOT EXISTS account_links (
                id                      INTEGER PRIMARY KEY,
                account_id              INTEGER NOT NULL REFERENCES accounts(id),
                name                    TEXT NOT NULL,
                parent_list_entity_id   INTEGER NOT NULL REFERENCES list_entities(id),
                UNIQUE(account_id, parent_list_entity_id)
            );

            CREATE INDEX IF NOT EXISTS idx_account_links_account
                ON account_links(account_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rerunning_is_a_noop() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
