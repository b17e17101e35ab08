// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Givechain

//! Embedded donation ledger backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `projects`: project_id → serialized Project
//! - `donations`: donation_id → serialized Donation
//! - `donations_by_tx`: canonical transaction id → donation_id (unique index,
//!   the idempotency key)
//! - `project_donation_index`: composite key (project_id|!timestamp|donation_id)
//!   → donation_id for descending-time listings
//!
//! ## Consistency
//!
//! [`DonationLedger::apply_settlement`] performs the existence check, the
//! donation row write, and the project aggregate credit inside one write
//! transaction. redb admits a single write transaction at a time, so
//! concurrent duplicate submissions for the same identifier serialize here:
//! the second one finds the first one's row and leaves it untouched. A crash
//! between the row write and the credit cannot happen — both commit or
//! neither does.

use std::path::Path;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use uuid::Uuid;

use super::donations::{Donation, DonationStatus, RecordOutcome, SettlementRecord};
use super::projects::Project;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary project table: project_id → serialized Project (JSON bytes).
const PROJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("projects");

/// Primary donation table: donation_id → serialized Donation (JSON bytes).
const DONATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("donations");

/// Unique index: canonical transaction id → donation_id.
const DONATIONS_BY_TX: TableDefinition<&str, &str> = TableDefinition::new("donations_by_tx");

/// Index: composite key → donation_id.
/// Key format: `project_id|!timestamp_be|donation_id` for descending-time
/// range scans.
const PROJECT_DONATION_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("project_donation_index");

// =============================================================================
// Error Type
// =============================================================================

/// Local write/read failures. Never retried automatically: by the time these
/// fire a transfer may already have been submitted, and resubmitting it would
/// double-spend. Surfaced for manual reconciliation instead.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("donation index points at missing row {0}")]
    IndexCorrupt(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the project_donation_index table.
///
/// The inverted timestamp ensures newest-first ordering when scanning forward.
fn make_index_key(project_id: &Uuid, timestamp: i64, donation_id: &str) -> Vec<u8> {
    let project = project_id.to_string();
    let mut key = Vec::with_capacity(project.len() + 1 + 8 + 1 + donation_id.len());
    key.extend_from_slice(project.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!timestamp as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(donation_id.as_bytes());
    key
}

/// Build a prefix key for range scanning all donations of a project.
fn make_prefix(project_id: &Uuid) -> Vec<u8> {
    let project = project_id.to_string();
    let mut prefix = Vec::with_capacity(project.len() + 1);
    prefix.extend_from_slice(project.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Build the upper bound for a range scan (prefix with 0xFF bytes appended).
fn make_prefix_end(project_id: &Uuid) -> Vec<u8> {
    let mut end = make_prefix(project_id);
    end.extend_from_slice(&[0xFF; 16]);
    end
}

// =============================================================================
// DonationLedger
// =============================================================================

/// Embedded ACID donation ledger.
pub struct DonationLedger {
    db: Database,
}

impl DonationLedger {
    /// Open (or create) the ledger at the given path.
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PROJECTS)?;
            let _ = write_txn.open_table(DONATIONS)?;
            let _ = write_txn.open_table(DONATIONS_BY_TX)?;
            let _ = write_txn.open_table(PROJECT_DONATION_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Persist a new project.
    pub fn create_project(&self, project: &Project) -> PersistenceResult<()> {
        let key = project.project_id.to_string();
        let json = serde_json::to_vec(project)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PROJECTS)?;
            table.insert(key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a project by id.
    pub fn get_project(&self, project_id: &Uuid) -> PersistenceResult<Option<Project>> {
        let key = project_id.to_string();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROJECTS)?;
        match table.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List projects, optionally only verified ones, newest first.
    pub fn list_projects(&self, verified_only: bool) -> PersistenceResult<Vec<Project>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROJECTS)?;

        let mut projects = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let project: Project = serde_json::from_slice(value.value())?;
            if !verified_only || project.verified {
                projects.push(project);
            }
        }

        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    /// Set the verified flag on a project.
    pub fn mark_verified(&self, project_id: &Uuid) -> PersistenceResult<Project> {
        let key = project_id.to_string();
        let write_txn = self.db.begin_write()?;
        let project = {
            let mut table = write_txn.open_table(PROJECTS)?;

            let existing_bytes = {
                let existing = table
                    .get(key.as_str())?
                    .ok_or(PersistenceError::ProjectNotFound(*project_id))?;
                existing.value().to_vec()
            };

            let mut project: Project = serde_json::from_slice(&existing_bytes)?;
            project.verified = true;
            project.updated_at = Utc::now();

            let json = serde_json::to_vec(&project)?;
            table.insert(key.as_str(), json.as_slice())?;
            project
        };
        write_txn.commit()?;
        Ok(project)
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    /// Apply a classified settlement outcome, idempotently on the transaction
    /// identifier.
    ///
    /// Semantics, all inside one write transaction:
    /// - no row for the identifier → insert it; credit the project aggregate
    ///   iff the row is `completed`
    /// - existing `completed` row → return it unchanged (no re-credit)
    /// - existing `failed` row and the new outcome is `completed` → promote
    ///   it and credit the aggregate (the correction came from the
    ///   authoritative submission result for the same identifier)
    /// - existing `failed` row and the new outcome is `failed` → unchanged
    pub fn apply_settlement(
        &self,
        record: &SettlementRecord,
    ) -> PersistenceResult<(Donation, RecordOutcome)> {
        let write_txn = self.db.begin_write()?;
        let applied = {
            let mut donations = write_txn.open_table(DONATIONS)?;
            let mut by_tx = write_txn.open_table(DONATIONS_BY_TX)?;
            let mut index = write_txn.open_table(PROJECT_DONATION_INDEX)?;
            let mut projects = write_txn.open_table(PROJECTS)?;

            let existing_id = {
                let found = by_tx.get(record.transaction_id.as_str())?;
                found.map(|guard| guard.value().to_string())
            };

            match existing_id {
                Some(donation_id) => {
                    let bytes = {
                        let row = donations
                            .get(donation_id.as_str())?
                            .ok_or_else(|| PersistenceError::IndexCorrupt(donation_id.clone()))?;
                        row.value().to_vec()
                    };
                    let mut donation: Donation = serde_json::from_slice(&bytes)?;

                    if donation.status == DonationStatus::Completed
                        || record.status != DonationStatus::Completed
                    {
                        (donation, RecordOutcome::AlreadyRecorded)
                    } else {
                        donation.status = DonationStatus::Completed;
                        donation.updated_at = Utc::now();
                        let json = serde_json::to_vec(&donation)?;
                        donations.insert(donation_id.as_str(), json.as_slice())?;
                        credit_project(&mut projects, &donation.project_id, donation.amount_tinybars)?;
                        (donation, RecordOutcome::Corrected)
                    }
                }
                None => {
                    let now = Utc::now();
                    let donation = Donation {
                        donation_id: Uuid::new_v4(),
                        project_id: record.project_id,
                        donor_id: record.donor_id,
                        amount_tinybars: record.amount_tinybars,
                        transaction_id: Some(record.transaction_id.clone()),
                        status: record.status,
                        created_at: now,
                        updated_at: now,
                    };

                    let key = donation.donation_id.to_string();
                    let json = serde_json::to_vec(&donation)?;
                    donations.insert(key.as_str(), json.as_slice())?;
                    by_tx.insert(record.transaction_id.as_str(), key.as_str())?;
                    let idx_key = make_index_key(&record.project_id, now.timestamp(), &key);
                    index.insert(idx_key.as_slice(), key.as_str())?;

                    if donation.status == DonationStatus::Completed {
                        credit_project(&mut projects, &record.project_id, record.amount_tinybars)?;
                    }

                    (donation, RecordOutcome::Created)
                }
            }
        };
        write_txn.commit()?;
        Ok(applied)
    }

    /// Record a submission that was rejected before the network assigned a
    /// transaction identifier. The row carries no idempotency key and never
    /// credits the aggregate.
    pub fn record_failed_submission(
        &self,
        project_id: Uuid,
        donor_id: Uuid,
        amount_tinybars: i64,
    ) -> PersistenceResult<Donation> {
        let now = Utc::now();
        let donation = Donation {
            donation_id: Uuid::new_v4(),
            project_id,
            donor_id,
            amount_tinybars,
            transaction_id: None,
            status: DonationStatus::Failed,
            created_at: now,
            updated_at: now,
        };

        let key = donation.donation_id.to_string();
        let json = serde_json::to_vec(&donation)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut donations = write_txn.open_table(DONATIONS)?;
            donations.insert(key.as_str(), json.as_slice())?;

            let mut index = write_txn.open_table(PROJECT_DONATION_INDEX)?;
            let idx_key = make_index_key(&project_id, now.timestamp(), &key);
            index.insert(idx_key.as_slice(), key.as_str())?;
        }
        write_txn.commit()?;
        Ok(donation)
    }

    // =========================================================================
    // Donation reads
    // =========================================================================

    /// Look up a donation by its canonical transaction identifier.
    pub fn donation_by_tx(&self, transaction_id: &str) -> PersistenceResult<Option<Donation>> {
        let read_txn = self.db.begin_read()?;
        let by_tx = read_txn.open_table(DONATIONS_BY_TX)?;
        let donations = read_txn.open_table(DONATIONS)?;

        let donation_id = match by_tx.get(transaction_id)? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };

        match donations.get(donation_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Err(PersistenceError::IndexCorrupt(donation_id)),
        }
    }

    /// Look up a donation by id.
    pub fn get_donation(&self, donation_id: &Uuid) -> PersistenceResult<Option<Donation>> {
        let key = donation_id.to_string();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DONATIONS)?;
        match table.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List a project's donations, newest first.
    pub fn donations_for_project(&self, project_id: &Uuid) -> PersistenceResult<Vec<Donation>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(PROJECT_DONATION_INDEX)?;
        let donations = read_txn.open_table(DONATIONS)?;

        let prefix = make_prefix(project_id);
        let prefix_end = make_prefix_end(project_id);

        let mut results = Vec::new();
        for entry in index.range(prefix.as_slice()..prefix_end.as_slice())? {
            let entry = entry?;
            let donation_id = entry.1.value().to_string();
            match donations.get(donation_id.as_str())? {
                Some(value) => results.push(serde_json::from_slice(value.value())?),
                None => return Err(PersistenceError::IndexCorrupt(donation_id)),
            }
        }
        Ok(results)
    }
}

/// Add `amount` tinybars to a project's raised aggregate, inside the caller's
/// write transaction.
fn credit_project(
    projects: &mut redb::Table<'_, &'static str, &'static [u8]>,
    project_id: &Uuid,
    amount: i64,
) -> PersistenceResult<()> {
    let key = project_id.to_string();

    let existing_bytes = {
        let existing = projects
            .get(key.as_str())?
            .ok_or(PersistenceError::ProjectNotFound(*project_id))?;
        existing.value().to_vec()
    };

    let mut project: Project = serde_json::from_slice(&existing_bytes)?;
    project.amount_raised_tinybars += amount;
    project.updated_at = Utc::now();

    let json = serde_json::to_vec(&project)?;
    projects.insert(key.as_str(), json.as_slice())?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::projects::NewProject;

    fn temp_ledger() -> (DonationLedger, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DonationLedger::open(&dir.path().join("test.redb")).unwrap();
        (ledger, dir)
    }

    fn sample_project(ledger: &DonationLedger) -> Project {
        let project = Project::create(
            NewProject {
                title: "Clean water".to_string(),
                description: "Wells for the valley".to_string(),
                category: "infrastructure".to_string(),
                target_amount_tinybars: 10_000_000_000,
                location: "Naivasha".to_string(),
            },
            "0.0.5011".to_string(),
        );
        ledger.create_project(&project).unwrap();
        project
    }

    fn record(
        project: &Project,
        tx: &str,
        amount: i64,
        status: DonationStatus,
    ) -> SettlementRecord {
        SettlementRecord {
            project_id: project.project_id,
            donor_id: Uuid::new_v4(),
            amount_tinybars: amount,
            transaction_id: tx.to_string(),
            status,
        }
    }

    fn raised(ledger: &DonationLedger, project: &Project) -> i64 {
        ledger
            .get_project(&project.project_id)
            .unwrap()
            .unwrap()
            .amount_raised_tinybars
    }

    #[test]
    fn settled_transfer_creates_completed_donation_and_credits_project() {
        let (ledger, _dir) = temp_ledger();
        let project = sample_project(&ledger);

        let (donation, outcome) = ledger
            .apply_settlement(&record(
                &project,
                "0.0.4886-1693219282.762992295",
                500_000_000,
                DonationStatus::Completed,
            ))
            .unwrap();

        assert_eq!(outcome, RecordOutcome::Created);
        assert_eq!(donation.status, DonationStatus::Completed);
        assert_eq!(donation.amount_tinybars, 500_000_000);
        assert_eq!(raised(&ledger, &project), 500_000_000);
    }

    #[test]
    fn duplicate_settlement_is_idempotent() {
        let (ledger, _dir) = temp_ledger();
        let project = sample_project(&ledger);
        let rec = record(
            &project,
            "0.0.4886-1693219282.762992295",
            500_000_000,
            DonationStatus::Completed,
        );

        let (first, _) = ledger.apply_settlement(&rec).unwrap();
        let (second, outcome) = ledger.apply_settlement(&rec).unwrap();

        assert_eq!(outcome, RecordOutcome::AlreadyRecorded);
        assert_eq!(second.donation_id, first.donation_id);
        // Exactly one row, exactly one credit
        assert_eq!(
            ledger.donations_for_project(&project.project_id).unwrap().len(),
            1
        );
        assert_eq!(raised(&ledger, &project), 500_000_000);
    }

    #[test]
    fn rejected_transfer_records_failed_without_credit() {
        let (ledger, _dir) = temp_ledger();
        let project = sample_project(&ledger);

        let (donation, outcome) = ledger
            .apply_settlement(&record(
                &project,
                "0.0.4886-1693219300.1",
                300_000_000,
                DonationStatus::Failed,
            ))
            .unwrap();

        assert_eq!(outcome, RecordOutcome::Created);
        assert_eq!(donation.status, DonationStatus::Failed);
        assert_eq!(raised(&ledger, &project), 0);
    }

    #[test]
    fn failed_row_is_corrected_by_settled_resurfacing_of_same_identifier() {
        let (ledger, _dir) = temp_ledger();
        let project = sample_project(&ledger);
        let tx = "0.0.4886-1693219282.762992295";

        ledger
            .apply_settlement(&record(&project, tx, 500_000_000, DonationStatus::Failed))
            .unwrap();
        assert_eq!(raised(&ledger, &project), 0);

        let (donation, outcome) = ledger
            .apply_settlement(&record(&project, tx, 500_000_000, DonationStatus::Completed))
            .unwrap();

        assert_eq!(outcome, RecordOutcome::Corrected);
        assert_eq!(donation.status, DonationStatus::Completed);
        assert_eq!(raised(&ledger, &project), 500_000_000);

        // The correction itself is idempotent
        let (_, again) = ledger
            .apply_settlement(&record(&project, tx, 500_000_000, DonationStatus::Completed))
            .unwrap();
        assert_eq!(again, RecordOutcome::AlreadyRecorded);
        assert_eq!(raised(&ledger, &project), 500_000_000);
    }

    #[test]
    fn completed_row_is_never_downgraded() {
        let (ledger, _dir) = temp_ledger();
        let project = sample_project(&ledger);
        let tx = "0.0.4886-1693219282.762992295";

        ledger
            .apply_settlement(&record(&project, tx, 500_000_000, DonationStatus::Completed))
            .unwrap();

        let (donation, outcome) = ledger
            .apply_settlement(&record(&project, tx, 500_000_000, DonationStatus::Failed))
            .unwrap();

        assert_eq!(outcome, RecordOutcome::AlreadyRecorded);
        assert_eq!(donation.status, DonationStatus::Completed);
        assert_eq!(raised(&ledger, &project), 500_000_000);
    }

    #[test]
    fn aggregate_equals_sum_of_completed_donations() {
        let (ledger, _dir) = temp_ledger();
        let project = sample_project(&ledger);

        let sequence = [
            ("0.0.1-1.1", 100_000_000, DonationStatus::Completed),
            ("0.0.1-2.2", 250_000_000, DonationStatus::Failed),
            ("0.0.1-3.3", 300_000_000, DonationStatus::Completed),
            // client retry of the first transfer
            ("0.0.1-1.1", 100_000_000, DonationStatus::Completed),
            // the failed one resurfaces as settled
            ("0.0.1-2.2", 250_000_000, DonationStatus::Completed),
        ];
        for (tx, amount, status) in sequence {
            ledger
                .apply_settlement(&record(&project, tx, amount, status))
                .unwrap();
        }

        let donations = ledger.donations_for_project(&project.project_id).unwrap();
        let completed_sum: i64 = donations
            .iter()
            .filter(|d| d.status == DonationStatus::Completed)
            .map(|d| d.amount_tinybars)
            .sum();

        assert_eq!(donations.len(), 3);
        assert_eq!(completed_sum, 650_000_000);
        assert_eq!(raised(&ledger, &project), completed_sum);
    }

    #[test]
    fn settlement_against_missing_project_leaves_no_partial_row() {
        let (ledger, _dir) = temp_ledger();
        let ghost = Project::create(
            NewProject {
                title: "ghost".to_string(),
                description: String::new(),
                category: String::new(),
                target_amount_tinybars: 0,
                location: String::new(),
            },
            "0.0.9999".to_string(),
        );
        // never persisted

        let result = ledger.apply_settlement(&record(
            &ghost,
            "0.0.9-9.9",
            100,
            DonationStatus::Completed,
        ));
        assert!(matches!(result, Err(PersistenceError::ProjectNotFound(_))));

        // The aborted transaction must not leave the donation row behind
        assert!(ledger.donation_by_tx("0.0.9-9.9").unwrap().is_none());
    }

    #[test]
    fn failed_submission_row_has_no_identifier() {
        let (ledger, _dir) = temp_ledger();
        let project = sample_project(&ledger);

        let donation = ledger
            .record_failed_submission(project.project_id, Uuid::new_v4(), 200_000_000)
            .unwrap();

        assert_eq!(donation.status, DonationStatus::Failed);
        assert!(donation.transaction_id.is_none());
        assert_eq!(raised(&ledger, &project), 0);
        assert_eq!(
            ledger.donations_for_project(&project.project_id).unwrap().len(),
            1
        );
    }

    #[test]
    fn donation_lookups_by_tx_and_id() {
        let (ledger, _dir) = temp_ledger();
        let project = sample_project(&ledger);
        let tx = "0.0.4886-1693219282.762992295";

        let (created, _) = ledger
            .apply_settlement(&record(&project, tx, 500_000_000, DonationStatus::Completed))
            .unwrap();

        let by_tx = ledger.donation_by_tx(tx).unwrap().unwrap();
        assert_eq!(by_tx.donation_id, created.donation_id);

        let by_id = ledger.get_donation(&created.donation_id).unwrap().unwrap();
        assert_eq!(by_id.transaction_id.as_deref(), Some(tx));

        assert!(ledger.donation_by_tx("0.0.0-0.0").unwrap().is_none());
    }

    #[test]
    fn donations_listed_newest_first() {
        let (ledger, _dir) = temp_ledger();
        let project = sample_project(&ledger);

        for i in 0..3 {
            ledger
                .apply_settlement(&record(
                    &project,
                    &format!("0.0.1-{i}.0"),
                    100_000_000,
                    DonationStatus::Completed,
                ))
                .unwrap();
            // distinct index timestamps
            std::thread::sleep(std::time::Duration::from_millis(1100));
        }

        let donations = ledger.donations_for_project(&project.project_id).unwrap();
        assert_eq!(donations.len(), 3);
        assert!(donations
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[test]
    fn verify_flag_round_trip() {
        let (ledger, _dir) = temp_ledger();
        let project = sample_project(&ledger);

        assert!(ledger.list_projects(true).unwrap().is_empty());

        let verified = ledger.mark_verified(&project.project_id).unwrap();
        assert!(verified.verified);

        let listed = ledger.list_projects(true).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].project_id, project.project_id);

        let missing = ledger.mark_verified(&Uuid::new_v4());
        assert!(matches!(missing, Err(PersistenceError::ProjectNotFound(_))));
    }
}
