//! Estimate workflow and conversion into invoices.

use chrono::{DateTime, NaiveDate, Utc};
use tally_shared::types::{EstimateId, TenantId};
use tracing::info;

use super::error::WorkflowError;
use super::invoice::InvoiceWorkflow;
use super::ledger::LedgerService;
use super::ports::{AccountStore, DocumentStore, TransactionStore};
use crate::document::{Document, Estimate, EstimateStatus, Invoice, PaymentTerms};

/// Orchestrates estimates; conversion goes through the invoice workflow.
pub struct EstimateWorkflow<S> {
    ledger: LedgerService<S>,
}

impl<S> EstimateWorkflow<S>
where
    S: AccountStore + TransactionStore + DocumentStore<Estimate> + DocumentStore<Invoice>,
{
    /// Create a workflow on top of `ledger`.
    #[must_use]
    pub fn new(ledger: LedgerService<S>) -> Self {
        Self { ledger }
    }

    fn save(&self, estimate: &Estimate) -> Result<(), WorkflowError> {
        Ok(DocumentStore::<Estimate>::save(self.ledger.store(), estimate)?)
    }

    /// Fetch one estimate.
    ///
    /// # Errors
    ///
    /// `DocumentNotFound`, or a store error.
    pub fn estimate(&self, tenant_id: TenantId, id: EstimateId) -> Result<Estimate, WorkflowError> {
        DocumentStore::<Estimate>::document(self.ledger.store(), tenant_id, id)?
            .ok_or_else(|| WorkflowError::document_not_found(Estimate::KIND, id))
    }

    /// Store a new estimate.
    ///
    /// # Errors
    ///
    /// Store errors.
    pub fn create(&self, estimate: Estimate) -> Result<Estimate, WorkflowError> {
        self.save(&estimate)?;
        info!(
            tenant_id = %estimate.tenant_id,
            estimate_id = %estimate.id,
            total = %estimate.total,
            "Estimate created"
        );
        Ok(estimate)
    }

    /// Plain status change; estimates have no ledger effect.
    ///
    /// # Errors
    ///
    /// Transition or store errors.
    pub fn change_status(
        &self,
        tenant_id: TenantId,
        id: EstimateId,
        to: EstimateStatus,
        now: DateTime<Utc>,
    ) -> Result<Estimate, WorkflowError> {
        let mut estimate = self.estimate(tenant_id, id)?;
        let transition = estimate.transition(to, now)?;
        self.save(&estimate)?;
        info!(
            tenant_id = %tenant_id,
            estimate_id = %id,
            from = %transition.from,
            to = %transition.to,
            "Estimate status changed"
        );
        Ok(estimate)
    }

    /// Move every sent estimate past its expiration date to `expired`.
    ///
    /// # Errors
    ///
    /// Store errors.
    pub fn expire_stale(
        &self,
        tenant_id: TenantId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<EstimateId>, WorkflowError> {
        let mut expired = Vec::new();
        for mut estimate in DocumentStore::<Estimate>::documents(self.ledger.store(), tenant_id)? {
            if estimate.is_expired(today) {
                estimate.transition(EstimateStatus::Expired, now)?;
                self.save(&estimate)?;
                expired.push(estimate.id);
            }
        }
        Ok(expired)
    }

    /// Turn an accepted estimate into a draft invoice.
    ///
    /// The invoice is created through [`InvoiceWorkflow::create`] (so its
    /// draft sale is validated and stored), then the estimate moves to
    /// `converted` and records the invoice id.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless accepted; invoice creation errors. Nothing
    /// is stored on failure.
    pub fn convert_to_invoice(
        &self,
        tenant_id: TenantId,
        id: EstimateId,
        invoice_date: NaiveDate,
        payment_terms: PaymentTerms,
        now: DateTime<Utc>,
    ) -> Result<(Estimate, Invoice), WorkflowError> {
        let estimate = self.estimate(tenant_id, id)?;
        let invoice = estimate.to_invoice(invoice_date, payment_terms, now)?;
        let mut converted = estimate;
        converted.mark_converted(invoice.id, now)?;

        let invoice = InvoiceWorkflow::new(self.ledger.clone()).create(invoice, now)?;
        self.save(&converted)?;

        info!(
            tenant_id = %tenant_id,
            estimate_id = %id,
            invoice_id = %invoice.id,
            "Estimate converted to invoice"
        );
        Ok((converted, invoice))
    }
}
