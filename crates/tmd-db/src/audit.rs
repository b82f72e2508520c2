//! Account name audit: remember what an account was called before each rename.

use crate::models::Account;
use crate::queries;
use crate::{Database, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

impl Database {
    /// Record `previous`'s names if either differs from the incoming pair.
    /// Returns whether a history row was written.
    ///
    /// Call before overwriting the account row; the audit never blocks the update.
    pub fn record_name_change_if_different(
        &self,
        account_id: i64,
        new_screen_name: &str,
        new_name: &str,
        previous: &Account,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            audit_names(conn, account_id, new_screen_name, new_name, previous)
        })
    }

    /// Mirror `incoming` into the store: insert when unknown, otherwise audit
    /// any rename and overwrite the row.
    pub fn sync_account(&self, incoming: &Account) -> Result<()> {
        self.with_tx(|conn| match queries::query_account(conn, incoming.id)? {
            None => queries::insert_account(conn, incoming),
            Some(previous) => {
                audit_names(
                    conn,
                    incoming.id,
                    &incoming.screen_name,
                    &incoming.name,
                    &previous,
                )?;
                queries::update_account(conn, incoming)
            }
        })
    }
}

fn audit_names(
    conn: &Connection,
    account_id: i64,
    new_screen_name: &str,
    new_name: &str,
    previous: &Account,
) -> Result<bool> {
    if previous.screen_name == new_screen_name && previous.name == new_name {
        return Ok(false);
    }

    info!(
        account_id,
        "account renamed: '{}' ({}) -> '{}' ({})",
        previous.name,
        previous.screen_name,
        new_name,
        new_screen_name
    );
    queries::insert_name_change(
        conn,
        account_id,
        &previous.screen_name,
        &previous.name,
        Utc::now(),
    )?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob() -> Account {
        Account {
            id: 5,
            screen_name: "bob".into(),
            name: "Bob".into(),
            protected: false,
            friends_count: 3,
        }
    }

    #[test]
    fn unchanged_names_write_nothing() {
        let db = Database::open_in_memory().unwrap();
        db.create_account(&bob()).unwrap();

        let written = db
            .record_name_change_if_different(5, "bob", "Bob", &bob())
            .unwrap();
        assert!(!written);
        assert!(db.name_history(5).unwrap().is_empty());
    }

    #[test]
    fn display_name_change_alone_is_recorded() {
        let db = Database::open_in_memory().unwrap();
        db.create_account(&bob()).unwrap();

        let written = db
            .record_name_change_if_different(5, "bob", "Robert", &bob())
            .unwrap();
        assert!(written);

        let history = db.name_history(5).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].screen_name, "bob");
        assert_eq!(history[0].name, "Bob");
    }

    #[test]
    fn sync_inserts_then_audits() {
        let db = Database::open_in_memory().unwrap();
        db.sync_account(&bob()).unwrap();
        assert_eq!(db.get_account(5).unwrap(), Some(bob()));
        assert!(db.name_history(5).unwrap().is_empty());

        let renamed = Account {
            screen_name: "bobby".into(),
            friends_count: 4,
            ..bob()
        };
        db.sync_account(&renamed).unwrap();
        assert_eq!(db.get_account(5).unwrap(), Some(renamed.clone()));

        let history = db.name_history(5).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].screen_name, "bob");

        // Metadata-only change: no new history row.
        db.sync_account(&Account {
            protected: true,
            ..renamed
        })
        .unwrap();
        assert_eq!(db.name_history(5).unwrap().len(), 1);
    }
}
