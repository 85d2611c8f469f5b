//! Snapshot audit: dry-run validation plus a full balance replay.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::ledger::{
    Account, BalanceDrift, LedgerError, LedgerValidator, PermissionTable, RecalculationEngine,
    RecalculationSummary, Transaction,
};
use tally_shared::types::{TenantId, TransactionId};
use tracing::{info, warn};

/// One tenant's accounts and transaction log, as exported by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    /// Tenant the snapshot belongs to.
    pub tenant_id: TenantId,
    /// Chart of accounts with stored balances.
    pub accounts: Vec<Account>,
    /// Every transaction regardless of status.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// A posted transaction that would not pass validation today.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// Offending transaction.
    pub transaction_id: TransactionId,
    /// Machine-readable error code.
    pub code: &'static str,
    /// Human-readable reason.
    pub message: String,
}

/// Outcome of auditing a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Tenant audited.
    pub tenant_id: TenantId,
    /// Totals after replay.
    pub summary: RecalculationSummary,
    /// Accounts whose stored balance differs from the replayed one.
    pub drift: Vec<BalanceDrift>,
    /// Posted transactions that fail validation.
    pub rejected: Vec<Rejection>,
}

impl ReplayReport {
    /// True when nothing drifted and every posted transaction validates.
    pub fn is_clean(&self) -> bool {
        self.drift.is_empty() && self.rejected.is_empty()
    }
}

/// Audit `snapshot` against `permissions`.
///
/// Nothing in the snapshot is modified; the replayed balances are only
/// compared against the stored ones.
///
/// # Errors
///
/// Returns `AccountNotFound` when a posted transaction references an
/// account the snapshot does not contain.
pub fn audit(
    snapshot: &Snapshot,
    permissions: &PermissionTable,
    tolerance: Decimal,
) -> Result<ReplayReport, LedgerError> {
    let validator = LedgerValidator::new(permissions)
        .with_tolerance(tolerance)
        .for_history();

    let rejected: Vec<Rejection> = snapshot
        .transactions
        .iter()
        .filter(|t| t.is_posted())
        .filter_map(|t| {
            validator
                .validate(t.tenant_id, t.transaction_type, &t.entries, &snapshot.accounts)
                .err()
                .map(|err| Rejection {
                    transaction_id: t.id,
                    code: err.error_code(),
                    message: err.to_string(),
                })
        })
        .collect();

    for rejection in &rejected {
        warn!(
            transaction_id = %rejection.transaction_id,
            code = rejection.code,
            "Posted transaction fails validation"
        );
    }

    let replayed = RecalculationEngine::recalculate(&snapshot.accounts, &snapshot.transactions)?;
    let drift = RecalculationEngine::drift(&snapshot.accounts, &replayed.accounts);

    info!(
        tenant_id = %snapshot.tenant_id,
        drifted = drift.len(),
        rejected = rejected.len(),
        "Snapshot audited"
    );

    Ok(ReplayReport {
        tenant_id: snapshot.tenant_id,
        summary: replayed.summary,
        drift,
        rejected,
    })
}
