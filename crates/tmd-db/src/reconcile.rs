//! Directory-identity reconciliation.
//!
//! Given a remote id and a candidate download directory, decide whether the
//! directory is a tracked root that was renamed or moved outside our control,
//! or a genuinely new one. Evidence is limited to the marker file and, for
//! lists, directory existence and name equality. File contents are never read.
//!
//! Each call runs in one immediate transaction, so the read-scan-update
//! sequence cannot race another writer. When several stored rows qualify, the
//! choice between them is arbitrary (lowest id); ambiguity is never an error.

use crate::models::{AccountEntity, ListEntity, NewAccountEntity, NewListEntity};
use crate::paths::{self, CanonicalDir};
use crate::queries;
use crate::{Database, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

impl Database {
    /// Resolve `(account_id, dir)` to a stored account root, following a
    /// relocation when the marker file says one happened.
    ///
    /// Returns `None` when nothing matches; this path never inserts.
    pub fn locate_account_entity(
        &self,
        account_id: i64,
        dir: impl AsRef<Path>,
    ) -> Result<Option<AccountEntity>> {
        let dir = CanonicalDir::new(dir)?;
        self.with_tx(|conn| reconcile_account_entity(conn, account_id, &dir, None))
    }

    /// Like [`Database::locate_account_entity`], but a relocated row also takes
    /// the caller's name, and a new row is inserted when nothing matches.
    pub fn create_or_reconcile_account_entity(
        &self,
        candidate: &NewAccountEntity,
    ) -> Result<AccountEntity> {
        let dir = CanonicalDir::new(&candidate.parent_dir)?;
        self.with_tx(|conn| {
            let name = Some(candidate.name.as_str());
            if let Some(entity) = reconcile_account_entity(conn, candidate.account_id, &dir, name)? {
                return Ok(entity);
            }

            let entity =
                queries::insert_account_entity(conn, candidate.account_id, &candidate.name, &dir)?;
            debug!(
                account_id = candidate.account_id,
                entity_id = entity.id,
                dir = %dir,
                "new account root"
            );
            Ok(entity)
        })
    }

    /// Resolve `(list_id, dir)` to a stored list root.
    ///
    /// Falls back to adopting the first stored root of the list as soon as
    /// `dir` exists on disk, whatever its name. The create path below also
    /// requires the names to agree. Both behaviours are kept as they are.
    pub fn locate_list_entity(
        &self,
        list_id: i64,
        dir: impl AsRef<Path>,
    ) -> Result<Option<ListEntity>> {
        let dir = CanonicalDir::new(dir)?;
        self.with_tx(|conn| {
            if let Some(entity) = queries::query_list_entity_at(conn, list_id, &dir)? {
                debug!(list_id, entity_id = entity.id, "list root unchanged");
                return Ok(Some(entity));
            }
            adopt_list_entity(conn, list_id, &dir, |_| true)
        })
    }

    /// Exact match, then a name-checked adoption of an existing root, then insert.
    pub fn create_or_reconcile_list_entity(&self, candidate: &NewListEntity) -> Result<ListEntity> {
        let dir = CanonicalDir::new(&candidate.parent_dir)?;
        self.with_tx(|conn| {
            if let Some(entity) = queries::query_list_entity_at(conn, candidate.list_id, &dir)? {
                debug!(list_id = candidate.list_id, entity_id = entity.id, "list root unchanged");
                return Ok(entity);
            }

            let adopted = adopt_list_entity(conn, candidate.list_id, &dir, |existing| {
                names_match(&existing.name, &candidate.name)
            })?;
            if let Some(entity) = adopted {
                return Ok(entity);
            }

            let entity =
                queries::insert_list_entity(conn, candidate.list_id, &candidate.name, &dir)?;
            debug!(
                list_id = candidate.list_id,
                entity_id = entity.id,
                dir = %dir,
                "new list root"
            );
            Ok(entity)
        })
    }
}

fn reconcile_account_entity(
    conn: &Connection,
    account_id: i64,
    dir: &CanonicalDir,
    name: Option<&str>,
) -> Result<Option<AccountEntity>> {
    // A marker in the candidate means one of this account's roots moved here.
    // Which one is not recorded, so any of them will do.
    if dir.has_marker()? {
        let mut candidates = queries::query_account_entities(conn, account_id)?;
        if !candidates.is_empty() {
            let pick = candidates
                .iter()
                .position(|e| dir.matches(&e.parent_dir))
                .unwrap_or(0);
            let entity = candidates.swap_remove(pick);
            return relocate_account_entity(conn, entity, dir, name).map(Some);
        }
    }

    if let Some(entity) = queries::query_account_entity_at(conn, account_id, dir)? {
        debug!(account_id, entity_id = entity.id, "account root unchanged");
        return Ok(Some(entity));
    }

    // An old root still carrying its marker is merged into the candidate even
    // if it was never abandoned.
    for entity in queries::query_account_entities(conn, account_id)? {
        if paths::has_marker(&entity.parent_dir)? {
            return relocate_account_entity(conn, entity, dir, name).map(Some);
        }
    }

    Ok(None)
}

fn relocate_account_entity(
    conn: &Connection,
    mut entity: AccountEntity,
    dir: &CanonicalDir,
    name: Option<&str>,
) -> Result<AccountEntity> {
    if !dir.matches(&entity.parent_dir) {
        info!(
            account_id = entity.account_id,
            entity_id = entity.id,
            "account download root moved from '{}' to '{}'",
            entity.parent_dir.display(),
            dir
        );
    }

    queries::relocate_account_entity(conn, entity.id, dir, name)?;

    entity.parent_dir = dir.to_path_buf();
    if let Some(name) = name {
        entity.name = name.to_owned();
    }
    Ok(entity)
}

/// Take over the first stored root of `list_id` that `accept` allows, provided
/// `dir` itself exists. Existence of the new directory is the only evidence.
fn adopt_list_entity(
    conn: &Connection,
    list_id: i64,
    dir: &CanonicalDir,
    accept: impl Fn(&ListEntity) -> bool,
) -> Result<Option<ListEntity>> {
    let candidates = queries::query_list_entities(conn, list_id)?;
    if candidates.is_empty() || !dir.exists()? {
        return Ok(None);
    }

    let Some(mut entity) = candidates.into_iter().find(|e| accept(e)) else {
        return Ok(None);
    };

    info!(
        list_id,
        entity_id = entity.id,
        "list download root moved from '{}' to '{}'",
        entity.parent_dir.display(),
        dir
    );
    queries::relocate_list_entity(conn, entity.id, dir)?;
    entity.parent_dir = dir.to_path_buf();
    Ok(Some(entity))
}

/// Case-insensitive name equality under simple Unicode case folding: each
/// char folds to one char, so "ß" never equals "ss" but "ς", "σ" and "Σ" agree.
fn names_match(a: &str, b: &str) -> bool {
    a.chars().map(fold).eq(b.chars().map(fold))
}

fn fold(c: char) -> char {
    match c {
        // Folds that lowercasing alone misses.
        'ς' => 'σ',
        'ſ' => 's',
        'ϐ' => 'β',
        'ϑ' => 'θ',
        'ϕ' => 'φ',
        'ϖ' => 'π',
        'ϰ' => 'κ',
        'ϱ' => 'ρ',
        'ϵ' => 'ε',
        'ẛ' => 'ṡ',
        '\u{0345}' | '\u{1FBE}' => 'ι',
        _ => {
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) => l,
                _ => c,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_names_ignore_case() {
        assert!(names_match("Artists", "aRTISTS"));
        assert!(!names_match("artists", "artist"));
    }

    #[test]
    fn sigma_forms_fold_together() {
        assert!(names_match("ΟΔΟΣ", "οδος"));
        assert!(names_match("οδοσ", "οδος"));
    }

    #[test]
    fn no_multi_char_expansion() {
        assert!(names_match("STRAẞE", "straße"));
        assert!(!names_match("straße", "strasse"));
    }
}
