use crate::error::OptionalExt;
use crate::models::{
    Account, AccountEntity, AccountLink, AccountList, AccountNameHistory, ListEntity,
};
use crate::paths::CanonicalDir;
use crate::{Database, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use std::path::{Path, PathBuf};

const ACCOUNT_COLUMNS: &str = "id, screen_name, name, protected, friends_count";
const ACCOUNT_ENTITY_COLUMNS: &str =
    "id, account_id, name, latest_release_time, parent_dir, media_count";
const LIST_ENTITY_COLUMNS: &str = "id, list_id, name, parent_dir";
const LINK_COLUMNS: &str = "id, account_id, name, parent_list_entity_id";

impl Database {
    // -- Accounts --

    pub fn create_account(&self, account: &Account) -> Result<()> {
        self.with_conn(|conn| insert_account(conn, account))
    }

    pub fn get_account(&self, id: i64) -> Result<Option<Account>> {
        self.with_conn(|conn| query_account(conn, id))
    }

    pub fn update_account(&self, account: &Account) -> Result<()> {
        self.with_conn(|conn| update_account(conn, account))
    }

    pub fn delete_account(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Name history --

    /// Append the names an account used before a rename, stamped now.
    pub fn record_name_change(
        &self,
        account_id: i64,
        prior_screen_name: &str,
        prior_name: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            insert_name_change(conn, account_id, prior_screen_name, prior_name, Utc::now())
        })
    }

    /// Oldest first.
    pub fn name_history(&self, account_id: i64) -> Result<Vec<AccountNameHistory>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, account_id, screen_name, name, record_date
                 FROM account_name_history
                 WHERE account_id = ?1
                 ORDER BY record_date, id",
            )?;

            let rows = stmt
                .query_map([account_id], |row| {
                    Ok(AccountNameHistory {
                        id: row.get(0)?,
                        account_id: row.get(1)?,
                        screen_name: row.get(2)?,
                        name: row.get(3)?,
                        record_date: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Lists --

    pub fn create_list(&self, list: &AccountList) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO lists (id, name, owner_account_id) VALUES (?1, ?2, ?3)",
                params![list.id, list.name, list.owner_account_id],
            )?;
            Ok(())
        })
    }

    pub fn get_list(&self, id: i64) -> Result<Option<AccountList>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, owner_account_id FROM lists WHERE id = ?1",
                [id],
                |row| {
                    Ok(AccountList {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        owner_account_id: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Only the name of a list ever changes.
    pub fn update_list(&self, list: &AccountList) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE lists SET name = ?1 WHERE id = ?2",
                params![list.name, list.id],
            )?;
            Ok(())
        })
    }

    pub fn delete_list(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM lists WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Account entities --

    /// Plain insert. Prefer `create_or_reconcile_account_entity` when the
    /// directory may be a relocated root.
    pub fn create_account_entity(
        &self,
        account_id: i64,
        name: &str,
        parent_dir: impl AsRef<Path>,
    ) -> Result<AccountEntity> {
        let dir = CanonicalDir::new(parent_dir)?;
        self.with_conn(|conn| insert_account_entity(conn, account_id, name, &dir))
    }

    pub fn get_account_entity(&self, id: i64) -> Result<Option<AccountEntity>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {ACCOUNT_ENTITY_COLUMNS} FROM account_entities WHERE id = ?1"),
                [id],
                account_entity_from_row,
            )
            .optional()
        })
    }

    pub fn account_entities_for(&self, account_id: i64) -> Result<Vec<AccountEntity>> {
        self.with_conn(|conn| query_account_entities(conn, account_id))
    }

    /// Exact `(account, directory)` lookup, no reconciliation.
    pub fn find_account_entity(
        &self,
        account_id: i64,
        parent_dir: impl AsRef<Path>,
    ) -> Result<Option<AccountEntity>> {
        let dir = CanonicalDir::new(parent_dir)?;
        self.with_conn(|conn| query_account_entity_at(conn, account_id, &dir))
    }

    pub fn update_account_entity(&self, entity: &AccountEntity) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE account_entities
                 SET name = ?1, latest_release_time = ?2, media_count = ?3
                 WHERE id = ?4",
                params![
                    entity.name,
                    entity.latest_release_time,
                    entity.media_count,
                    entity.id
                ],
            )?;
            Ok(())
        })
    }

    pub fn set_latest_release_time(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE account_entities SET latest_release_time = ?1 WHERE id = ?2",
                params![at, id],
            )?;
            Ok(())
        })
    }

    pub fn set_media_count(&self, id: i64, count: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE account_entities SET media_count = ?1 WHERE id = ?2",
                params![count, id],
            )?;
            Ok(())
        })
    }

    /// Baseline and count after a finished download pass, written together.
    pub fn record_release_stats(&self, id: i64, baseline: DateTime<Utc>, count: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE account_entities SET latest_release_time = ?1, media_count = ?2 WHERE id = ?3",
                params![baseline, count, id],
            )?;
            Ok(())
        })
    }

    pub fn set_account_entity_dir(&self, id: i64, parent_dir: impl AsRef<Path>) -> Result<()> {
        let dir = CanonicalDir::new(parent_dir)?;
        self.with_conn(|conn| relocate_account_entity(conn, id, &dir, None))
    }

    pub fn delete_account_entity(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM account_entities WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- List entities --

    pub fn create_list_entity(
        &self,
        list_id: i64,
        name: &str,
        parent_dir: impl AsRef<Path>,
    ) -> Result<ListEntity> {
        let dir = CanonicalDir::new(parent_dir)?;
        self.with_conn(|conn| insert_list_entity(conn, list_id, name, &dir))
    }

    pub fn get_list_entity(&self, id: i64) -> Result<Option<ListEntity>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {LIST_ENTITY_COLUMNS} FROM list_entities WHERE id = ?1"),
                [id],
                list_entity_from_row,
            )
            .optional()
        })
    }

    pub fn list_entities_for(&self, list_id: i64) -> Result<Vec<ListEntity>> {
        self.with_conn(|conn| query_list_entities(conn, list_id))
    }

    pub fn find_list_entity(
        &self,
        list_id: i64,
        parent_dir: impl AsRef<Path>,
    ) -> Result<Option<ListEntity>> {
        let dir = CanonicalDir::new(parent_dir)?;
        self.with_conn(|conn| query_list_entity_at(conn, list_id, &dir))
    }

    pub fn update_list_entity(&self, entity: &ListEntity) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE list_entities SET name = ?1 WHERE id = ?2",
                params![entity.name, entity.id],
            )?;
            Ok(())
        })
    }

    pub fn set_list_entity_dir(&self, id: i64, parent_dir: impl AsRef<Path>) -> Result<()> {
        let dir = CanonicalDir::new(parent_dir)?;
        self.with_conn(|conn| relocate_list_entity(conn, id, &dir))
    }

    pub fn delete_list_entity(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM list_entities WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Account links --

    pub fn create_account_link(
        &self,
        account_id: i64,
        name: &str,
        parent_list_entity_id: i64,
    ) -> Result<AccountLink> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO account_links (account_id, name, parent_list_entity_id) VALUES (?1, ?2, ?3)",
                params![account_id, name, parent_list_entity_id],
            )?;
            Ok(AccountLink {
                id: conn.last_insert_rowid(),
                account_id,
                name: name.to_owned(),
                parent_list_entity_id,
            })
        })
    }

    pub fn get_account_link(
        &self,
        account_id: i64,
        parent_list_entity_id: i64,
    ) -> Result<Option<AccountLink>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {LINK_COLUMNS} FROM account_links
                     WHERE account_id = ?1 AND parent_list_entity_id = ?2"
                ),
                [account_id, parent_list_entity_id],
                link_from_row,
            )
            .optional()
        })
    }

    /// Every list directory the account is linked into. Order carries no meaning.
    pub fn links_for_account(&self, account_id: i64) -> Result<Vec<AccountLink>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LINK_COLUMNS} FROM account_links WHERE account_id = ?1"
            ))?;
            let rows = stmt
                .query_map([account_id], link_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_account_link(&self, id: i64, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE account_links SET name = ?1 WHERE id = ?2",
                params![name, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_account_link(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM account_links WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

// Connection-level primitives. The reconciliation engine composes these
// inside its own transaction.

pub(crate) fn insert_account(conn: &Connection, account: &Account) -> Result<()> {
    conn.execute(
        "INSERT INTO accounts (id, screen_name, name, protected, friends_count)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            account.id,
            account.screen_name,
            account.name,
            account.protected,
            account.friends_count
        ],
    )?;
    Ok(())
}

pub(crate) fn query_account(conn: &Connection, id: i64) -> Result<Option<Account>> {
    conn.query_row(
        &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1"),
        [id],
        |row| {
            Ok(Account {
                id: row.get(0)?,
                screen_name: row.get(1)?,
                name: row.get(2)?,
                protected: row.get(3)?,
                friends_count: row.get(4)?,
            })
        },
    )
    .optional()
}

pub(crate) fn update_account(conn: &Connection, account: &Account) -> Result<()> {
    conn.execute(
        "UPDATE accounts SET screen_name = ?1, name = ?2, protected = ?3, friends_count = ?4
         WHERE id = ?5",
        params![
            account.screen_name,
            account.name,
            account.protected,
            account.friends_count,
            account.id
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_name_change(
    conn: &Connection,
    account_id: i64,
    screen_name: &str,
    name: &str,
    at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO account_name_history (account_id, screen_name, name, record_date)
         VALUES (?1, ?2, ?3, ?4)",
        params![account_id, screen_name, name, at],
    )?;
    Ok(())
}

pub(crate) fn insert_account_entity(
    conn: &Connection,
    account_id: i64,
    name: &str,
    dir: &CanonicalDir,
) -> Result<AccountEntity> {
    conn.execute(
        "INSERT INTO account_entities (account_id, name, parent_dir) VALUES (?1, ?2, ?3)",
        params![account_id, name, dir.as_str()],
    )?;
    Ok(AccountEntity {
        id: conn.last_insert_rowid(),
        account_id,
        name: name.to_owned(),
        latest_release_time: None,
        parent_dir: dir.to_path_buf(),
        media_count: None,
    })
}

/// Ordered by id so "the first one" is stable between calls.
pub(crate) fn query_account_entities(
    conn: &Connection,
    account_id: i64,
) -> Result<Vec<AccountEntity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACCOUNT_ENTITY_COLUMNS} FROM account_entities WHERE account_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([account_id], account_entity_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn query_account_entity_at(
    conn: &Connection,
    account_id: i64,
    dir: &CanonicalDir,
) -> Result<Option<AccountEntity>> {
    conn.query_row(
        &format!(
            "SELECT {ACCOUNT_ENTITY_COLUMNS} FROM account_entities
             WHERE account_id = ?1 AND parent_dir = ?2"
        ),
        params![account_id, dir.as_str()],
        account_entity_from_row,
    )
    .optional()
}

/// Move a row to `dir`, optionally renaming it in the same statement.
pub(crate) fn relocate_account_entity(
    conn: &Connection,
    id: i64,
    dir: &CanonicalDir,
    name: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE account_entities SET parent_dir = ?1, name = COALESCE(?2, name) WHERE id = ?3",
        params![dir.as_str(), name, id],
    )?;
    Ok(())
}

pub(crate) fn insert_list_entity(
    conn: &Connection,
    list_id: i64,
    name: &str,
    dir: &CanonicalDir,
) -> Result<ListEntity> {
    conn.execute(
        "INSERT INTO list_entities (list_id, name, parent_dir) VALUES (?1, ?2, ?3)",
        params![list_id, name, dir.as_str()],
    )?;
    Ok(ListEntity {
        id: conn.last_insert_rowid(),
        list_id,
        name: name.to_owned(),
        parent_dir: dir.to_path_buf(),
    })
}

pub(crate) fn query_list_entities(conn: &Connection, list_id: i64) -> Result<Vec<ListEntity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LIST_ENTITY_COLUMNS} FROM list_entities WHERE list_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([list_id], list_entity_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn query_list_entity_at(
    conn: &Connection,
    list_id: i64,
    dir: &CanonicalDir,
) -> Result<Option<ListEntity>> {
    conn.query_row(
        &format!(
            "SELECT {LIST_ENTITY_COLUMNS} FROM list_entities
             WHERE list_id = ?1 AND parent_dir = ?2"
        ),
        params![list_id, dir.as_str()],
        list_entity_from_row,
    )
    .optional()
}

pub(crate) fn relocate_list_entity(conn: &Connection, id: i64, dir: &CanonicalDir) -> Result<()> {
    conn.execute(
        "UPDATE list_entities SET parent_dir = ?1 WHERE id = ?2",
        params![dir.as_str(), id],
    )?;
    Ok(())
}

fn account_entity_from_row(row: &Row<'_>) -> rusqlite::Result<AccountEntity> {
    Ok(AccountEntity {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        latest_release_time: row.get(3)?,
        parent_dir: PathBuf::from(row.get::<_, String>(4)?),
        media_count: row.get(5)?,
    })
}

fn list_entity_from_row(row: &Row<'_>) -> rusqlite::Result<ListEntity> {
    Ok(ListEntity {
        id: row.get(0)?,
        list_id: row.get(1)?,
        name: row.get(2)?,
        parent_dir: PathBuf::from(row.get::<_, String>(3)?),
    })
}

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<AccountLink> {
    Ok(AccountLink {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        parent_list_entity_id: row.get(3)?,
    })
}
