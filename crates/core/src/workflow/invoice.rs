//! Invoice workflow: keeps an invoice and its ledger transactions in step.
//!
//! | Status change                 | Ledger effect                                   |
//! |-------------------------------|-------------------------------------------------|
//! | create                        | draft `sales_invoice` transaction               |
//! | draft -> sent                 | post the linked transaction                     |
//! | any -> draft                  | void the linked transaction, link a fresh draft |
//! | any -> void / cancelled       | void the linked transaction                     |
//! | payment                       | post a `payment` transaction                    |
//!
//! Payments stay posted when the invoice is voided or returned to draft;
//! they are only removed when the invoice is deleted.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{AccountId, InvoiceId, PaymentId, TenantId};
use tracing::info;

use super::error::WorkflowError;
use super::ledger::LedgerService;
use super::ports::{AccountStore, DocumentStore, TransactionStore};
use crate::document::{Document, Invoice, InvoiceStatus, Payment};
use crate::ledger::{
    DeleteScope, SourceDocument, SystemAccounts, Transaction, TransactionEntry, TransactionStatus,
    TransactionType,
};

/// Orchestrates invoices over the ledger.
pub struct InvoiceWorkflow<S> {
    ledger: LedgerService<S>,
}

impl<S> InvoiceWorkflow<S>
where
    S: AccountStore + TransactionStore + DocumentStore<Invoice>,
{
    /// Create a workflow on top of `ledger`.
    #[must_use]
    pub fn new(ledger: LedgerService<S>) -> Self {
        Self { ledger }
    }

    /// The ledger service in use.
    #[must_use]
    pub fn ledger(&self) -> &LedgerService<S> {
        &self.ledger
    }

    /// Entries for an invoice's sale.
    ///
    /// Accounts receivable is debited the invoice total and each income
    /// account is credited its lines. Inventory lines also move their cost
    /// from Inventory to Cost of Goods Sold.
    #[must_use]
    pub fn sales_entries(invoice: &Invoice, system: &SystemAccounts) -> Vec<TransactionEntry> {
        let mut income: BTreeMap<AccountId, Decimal> = BTreeMap::new();
        let mut cost = Decimal::ZERO;
        for line in &invoice.line_items {
            let account = line.income_account_id.unwrap_or(system.income);
            *income.entry(account).or_default() += line.amount();
            cost += line.cost_amount().unwrap_or_default();
        }

        let mut entries =
            vec![TransactionEntry::debit(system.accounts_receivable, invoice.total)
                .with_description("Accounts receivable")];
        entries.extend(
            income
                .into_iter()
                .filter(|(_, amount)| !amount.is_zero())
                .map(|(account, amount)| {
                    TransactionEntry::credit(account, amount).with_description("Sales income")
                }),
        );
        if cost > Decimal::ZERO {
            entries.push(
                TransactionEntry::debit(system.cost_of_goods_sold, cost)
                    .with_description("Cost of goods sold"),
            );
            entries.push(
                TransactionEntry::credit(system.inventory, cost).with_description("Inventory"),
            );
        }
        entries
    }

    fn load(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Invoice, WorkflowError> {
        self.ledger
            .store()
            .document(tenant_id, id)?
            .ok_or_else(|| WorkflowError::document_not_found(Invoice::KIND, id))
    }

    /// A validated, unsaved draft sale for `invoice`.
    fn draft_sale(
        &self,
        invoice: &Invoice,
        now: DateTime<Utc>,
    ) -> Result<Transaction, WorkflowError> {
        let accounts = self.ledger.store().accounts(invoice.tenant_id)?;
        let system = SystemAccounts::resolve(&accounts)?;
        let draft = Transaction::draft(
            invoice.tenant_id,
            TransactionType::SalesInvoice,
            invoice.invoice_date,
            format!("Invoice for {}", invoice.customer_name),
            Self::sales_entries(invoice, &system),
            now,
        )
        .with_source(SourceDocument::Invoice {
            invoice_id: invoice.id,
        });
        self.ledger
            .validate(draft.tenant_id, draft.transaction_type, &draft.entries)?;
        Ok(draft)
    }

    /// Store a new draft invoice together with its draft sale.
    ///
    /// # Errors
    ///
    /// Ledger validation errors (nothing is stored) or store errors.
    pub fn create(&self, mut invoice: Invoice, now: DateTime<Utc>) -> Result<Invoice, WorkflowError> {
        let draft = self.draft_sale(&invoice, now)?;
        invoice.transaction_id = Some(draft.id);

        self.ledger.store().append(&draft)?;
        self.ledger.store().save(&invoice)?;
        info!(
            tenant_id = %invoice.tenant_id,
            invoice_id = %invoice.id,
            transaction_id = %draft.id,
            total = %invoice.total,
            "Invoice created"
        );
        Ok(invoice)
    }

    /// Fetch one invoice.
    ///
    /// # Errors
    ///
    /// `DocumentNotFound`, or a store error.
    pub fn invoice(&self, tenant_id: TenantId, id: InvoiceId) -> Result<Invoice, WorkflowError> {
        self.load(tenant_id, id)
    }

    /// Change an invoice's status and apply the ledger effect.
    ///
    /// Payment statuses are rejected here; use
    /// [`InvoiceWorkflow::record_payment`].
    ///
    /// # Errors
    ///
    /// Transition errors (nothing changes), ledger or store errors.
    pub fn change_status(
        &self,
        tenant_id: TenantId,
        id: InvoiceId,
        to: InvoiceStatus,
        void_reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Invoice, WorkflowError> {
        let invoice = self.load(tenant_id, id)?;
        let from = invoice.status();
        let mut updated = invoice.clone();
        updated.transition(to, now, void_reason)?;

        let linked = invoice
            .transaction_id
            .map(|tx_id| self.ledger.transaction(tenant_id, tx_id))
            .transpose()?;
        let live = linked.filter(|tx| tx.status != TransactionStatus::Void);

        match to {
            InvoiceStatus::Draft => {
                let fresh = self.draft_sale(&updated, now)?;
                if let Some(tx) = live {
                    self.ledger
                        .void(tenant_id, tx.id, "Invoice returned to draft", now)?;
                }
                self.ledger.store().append(&fresh)?;
                updated.transaction_id = Some(fresh.id);
            }
            InvoiceStatus::Void | InvoiceStatus::Cancelled => {
                if let Some(tx) = live {
                    let reason = void_reason
                        .map(str::trim)
                        .filter(|r| !r.is_empty())
                        .unwrap_or("Invoice cancelled");
                    self.ledger.void(tenant_id, tx.id, reason, now)?;
                }
            }
            _ if to.is_active() && !from.is_active() => {
                let tx = live.ok_or_else(|| WorkflowError::MissingTransactionLink {
                    kind: Invoice::KIND,
                    id: id.to_string(),
                })?;
                if tx.status == TransactionStatus::Draft {
                    self.ledger.post(tenant_id, tx.id, now)?;
                }
            }
            _ => {}
        }

        self.ledger.store().save(&updated)?;
        info!(
            tenant_id = %tenant_id,
            invoice_id = %id,
            from = %from,
            to = %to,
            "Invoice status changed"
        );
        Ok(updated)
    }

    /// Record a customer payment.
    ///
    /// Posts a `payment` transaction (deposit account debit, accounts
    /// receivable credit) and moves the invoice to `paid` or
    /// `partially_paid`.
    ///
    /// # Errors
    ///
    /// `InvalidPaymentAmount`, `PaymentExceedsBalance`, transition errors,
    /// ledger validation errors, or store errors.
    pub fn record_payment(
        &self,
        tenant_id: TenantId,
        id: InvoiceId,
        amount: Decimal,
        deposit_account_id: AccountId,
        payment_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Invoice, WorkflowError> {
        let invoice = self.load(tenant_id, id)?;
        invoice.payment_target(amount)?;

        let accounts = self.ledger.store().accounts(tenant_id)?;
        let system = SystemAccounts::resolve(&accounts)?;
        let payment_id = PaymentId::new();
        let draft = Transaction::draft(
            tenant_id,
            TransactionType::Payment,
            payment_date,
            format!("Payment from {}", invoice.customer_name),
            vec![
                TransactionEntry::debit(deposit_account_id, amount),
                TransactionEntry::credit(system.accounts_receivable, amount),
            ],
            now,
        )
        .with_source(SourceDocument::InvoicePayment {
            invoice_id: id,
            payment_id,
        });

        let mut updated = invoice;
        let status = updated.record_payment(
            Payment {
                id: payment_id,
                amount,
                payment_date,
                deposit_account_id,
                transaction_id: draft.id,
                recorded_at: now,
            },
            now,
        )?;
        self.ledger.record_posted(&draft, now)?;
        self.ledger.store().save(&updated)?;

        info!(
            tenant_id = %tenant_id,
            invoice_id = %id,
            payment_id = %payment_id,
            amount = %amount,
            balance_due = %updated.balance_due,
            status = %status,
            "Payment recorded"
        );
        Ok(updated)
    }

    /// Move every open invoice past its due date to `overdue`.
    ///
    /// Returns the invoices that changed.
    ///
    /// # Errors
    ///
    /// Store errors.
    pub fn mark_overdue(
        &self,
        tenant_id: TenantId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<InvoiceId>, WorkflowError> {
        let mut changed = Vec::new();
        for mut invoice in self.ledger.store().documents(tenant_id)? {
            if !invoice.is_overdue(today) {
                continue;
            }
            invoice.transition(InvoiceStatus::Overdue, now, None)?;
            self.ledger.store().save(&invoice)?;
            changed.push(invoice.id);
        }
        if !changed.is_empty() {
            info!(tenant_id = %tenant_id, count = changed.len(), "Invoices marked overdue");
        }
        Ok(changed)
    }

    /// Delete a draft or void invoice and every transaction it produced.
    ///
    /// Posted effects (typically payments) are reversed before their
    /// transactions are removed. Either every owned transaction goes or
    /// none does.
    ///
    /// # Errors
    ///
    /// `NotDeletable` for other statuses, ledger or store errors.
    pub fn delete(&self, tenant_id: TenantId, id: InvoiceId) -> Result<(), WorkflowError> {
        let invoice = self.load(tenant_id, id)?;
        invoice.ensure_deletable()?;

        let owned: Vec<Transaction> = self
            .ledger
            .store()
            .transactions(tenant_id)?
            .into_iter()
            .filter(|tx| tx.source.is_some_and(|s| s.invoice_id() == id))
            .collect();
        self.ledger
            .delete_all(tenant_id, &owned, DeleteScope::WithDocument)?;
        self.ledger.store().delete_document(tenant_id, id)?;

        info!(
            tenant_id = %tenant_id,
            invoice_id = %id,
            transactions = owned.len(),
            "Invoice deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::document::{DocumentError, LineItem, PaymentTerms};
    use crate::ledger::LedgerError;
    use crate::lifecycle::{Milestone, TransitionError};
    use crate::workflow::fixtures::{Books, day, now};
    use crate::workflow::memory::MemoryStore;

    fn workflow(books: &Books) -> InvoiceWorkflow<MemoryStore> {
        InvoiceWorkflow::new(books.ledger.clone())
    }

    /// $500 total: $300 of stock (cost $180) plus $200 of consulting.
    fn create(books: &Books) -> Invoice {
        let invoice = Invoice::new(
            books.tenant,
            "Acme Corp",
            day(1),
            PaymentTerms::Net30,
            vec![
                LineItem::new("Widgets", dec!(3), dec!(100)).with_cost(dec!(60)),
                LineItem::new("Setup", dec!(2), dec!(100)).with_income_account(books.consulting),
            ],
            now(),
        )
        .unwrap();
        workflow(books).create(invoice, now()).unwrap()
    }

    fn sent(books: &Books) -> Invoice {
        let invoice = create(books);
        workflow(books)
            .change_status(books.tenant, invoice.id, InvoiceStatus::Sent, None, now())
            .unwrap()
    }

    #[test]
    fn test_create_links_draft_sale_without_balance_effect() {
        let books = Books::new();
        let invoice = create(&books);

        let tx = books
            .ledger
            .transaction(books.tenant, invoice.transaction_id.unwrap())
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Draft);
        assert_eq!(tx.transaction_type, TransactionType::SalesInvoice);
        assert_eq!(tx.total_amount, dec!(680));
        assert_eq!(tx.entries.len(), 5);
        assert_eq!(books.balance(books.receivable), dec!(0));
        assert_eq!(books.balance(books.inventory), dec!(800));
    }

    #[test]
    fn test_send_posts_sale() {
        let books = Books::new();
        let invoice = sent(&books);

        assert_eq!(invoice.status(), InvoiceStatus::Sent);
        assert!(invoice.lifecycle.milestones.contains(Milestone::Sent));
        assert_eq!(books.balance(books.receivable), dec!(500));
        assert_eq!(books.balance(books.sales), dec!(300));
        assert_eq!(books.balance(books.consulting), dec!(200));
        assert_eq!(books.balance(books.cogs), dec!(180));
        assert_eq!(books.balance(books.inventory), dec!(620));
        books.assert_replay_matches();
    }

    #[test]
    fn test_payments_settle_receivable() {
        let books = Books::new();
        let invoice = sent(&books);
        let wf = workflow(&books);

        let partial = wf
            .record_payment(books.tenant, invoice.id, dec!(200), books.checking, day(10), now())
            .unwrap();
        assert_eq!(partial.status(), InvoiceStatus::PartiallyPaid);
        assert_eq!(partial.balance_due, dec!(300));

        let paid = wf
            .record_payment(books.tenant, invoice.id, dec!(300), books.checking, day(12), now())
            .unwrap();
        assert_eq!(paid.status(), InvoiceStatus::Paid);
        assert_eq!(paid.payments.len(), 2);
        assert_eq!(books.balance(books.receivable), dec!(0));
        assert_eq!(books.balance(books.checking), dec!(5500));

        let payment_tx = books
            .ledger
            .transaction(books.tenant, paid.payments[0].transaction_id)
            .unwrap();
        assert_eq!(payment_tx.status, TransactionStatus::Posted);
        books.assert_replay_matches();
    }

    #[test]
    fn test_overpayment_changes_nothing() {
        let books = Books::new();
        let invoice = sent(&books);

        let err = workflow(&books)
            .record_payment(books.tenant, invoice.id, dec!(900), books.checking, day(10), now())
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Document(DocumentError::PaymentExceedsBalance { .. })
        ));
        assert_eq!(books.balance(books.checking), dec!(5000));
        assert_eq!(books.store().transactions(books.tenant).unwrap().len(), 1);
    }

    #[test]
    fn test_back_to_draft_replaces_link() {
        let books = Books::new();
        let invoice = sent(&books);
        let original = invoice.transaction_id.unwrap();

        let draft = workflow(&books)
            .change_status(books.tenant, invoice.id, InvoiceStatus::Draft, None, now())
            .unwrap();

        let fresh = draft.transaction_id.unwrap();
        assert_ne!(fresh, original);
        assert_eq!(
            books.ledger.transaction(books.tenant, original).unwrap().status,
            TransactionStatus::Void
        );
        assert_eq!(
            books.ledger.transaction(books.tenant, fresh).unwrap().status,
            TransactionStatus::Draft
        );
        assert_eq!(books.balance(books.receivable), dec!(0));
        assert_eq!(books.balance(books.inventory), dec!(800));

        let resent = workflow(&books)
            .change_status(books.tenant, invoice.id, InvoiceStatus::Sent, None, now())
            .unwrap();
        assert_eq!(
            resent.lifecycle.milestone(Milestone::Sent),
            invoice.lifecycle.milestone(Milestone::Sent)
        );
        assert_eq!(books.balance(books.receivable), dec!(500));
        books.assert_replay_matches();
    }

    #[test]
    fn test_void_requires_reason_and_keeps_payments() {
        let books = Books::new();
        let invoice = sent(&books);
        let wf = workflow(&books);
        wf.record_payment(books.tenant, invoice.id, dec!(100), books.checking, day(5), now())
            .unwrap();

        let err = wf
            .change_status(books.tenant, invoice.id, InvoiceStatus::Void, Some("  "), now())
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Document(DocumentError::Transition(
                TransitionError::MissingVoidReason
            ))
        );
        assert_eq!(books.balance(books.receivable), dec!(400));

        let voided = wf
            .change_status(
                books.tenant,
                invoice.id,
                InvoiceStatus::Void,
                Some("Customer dispute"),
                now(),
            )
            .unwrap();
        assert_eq!(voided.lifecycle.void_reason.as_deref(), Some("Customer dispute"));
        assert_eq!(books.balance(books.receivable), dec!(-100));
        assert_eq!(books.balance(books.checking), dec!(5100));
        books.assert_replay_matches();
    }

    #[test]
    fn test_payment_status_needs_payment() {
        let books = Books::new();
        let invoice = sent(&books);

        let err = workflow(&books)
            .change_status(books.tenant, invoice.id, InvoiceStatus::Paid, None, now())
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Document(DocumentError::Transition(
                TransitionError::ActionRequired { .. }
            ))
        ));
    }

    #[test]
    fn test_mark_overdue() {
        let books = Books::new();
        let open = sent(&books);
        let draft = create(&books);
        let wf = workflow(&books);

        assert!(wf.mark_overdue(books.tenant, day(30), now()).unwrap().is_empty());

        let changed = wf
            .mark_overdue(books.tenant, open.due_date.succ_opt().unwrap(), now())
            .unwrap();
        assert_eq!(changed, vec![open.id]);
        assert_eq!(
            wf.invoice(books.tenant, open.id).unwrap().status(),
            InvoiceStatus::Overdue
        );
        assert_eq!(
            wf.invoice(books.tenant, draft.id).unwrap().status(),
            InvoiceStatus::Draft
        );
    }

    #[test]
    fn test_delete_void_invoice_removes_everything() {
        let books = Books::new();
        let invoice = sent(&books);
        let wf = workflow(&books);
        wf.record_payment(books.tenant, invoice.id, dec!(150), books.checking, day(5), now())
            .unwrap();
        wf.change_status(books.tenant, invoice.id, InvoiceStatus::Void, Some("Duplicate"), now())
            .unwrap();

        wf.delete(books.tenant, invoice.id).unwrap();

        assert!(books.store().transactions(books.tenant).unwrap().is_empty());
        assert_eq!(books.balance(books.receivable), dec!(0));
        assert_eq!(books.balance(books.checking), dec!(5000));
        assert_eq!(books.balance(books.inventory), dec!(800));
        assert!(matches!(
            wf.invoice(books.tenant, invoice.id),
            Err(WorkflowError::DocumentNotFound { .. })
        ));
        books.assert_replay_matches();
    }

    #[test]
    fn test_delete_keeps_everything_when_a_reversal_fails() {
        let books = Books::new();
        let invoice = sent(&books);
        let wf = workflow(&books);
        wf.record_payment(books.tenant, invoice.id, dec!(100), books.checking, day(5), now())
            .unwrap();
        wf.change_status(books.tenant, invoice.id, InvoiceStatus::Void, Some("Duplicate"), now())
            .unwrap();
        let receivable = books.balance(books.receivable);
        books.store().remove_account(books.checking).unwrap();

        let err = wf.delete(books.tenant, invoice.id).unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Ledger(LedgerError::PostingAccountMissing(_))
        ));
        assert_eq!(books.store().transactions(books.tenant).unwrap().len(), 2);
        assert_eq!(books.balance(books.receivable), receivable);
        assert_eq!(
            wf.invoice(books.tenant, invoice.id).unwrap().status(),
            InvoiceStatus::Void
        );
    }

    #[test]
    fn test_delete_sent_invoice_refused() {
        let books = Books::new();
        let invoice = sent(&books);

        let err = workflow(&books).delete(books.tenant, invoice.id).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Document(DocumentError::NotDeletable { .. })
        ));
        assert_eq!(books.balance(books.receivable), dec!(500));
    }

    #[test]
    fn test_missing_system_account_stores_nothing() {
        let books = Books::new();
        let stranger = TenantId::new();

        let invoice = Invoice::new(
            stranger,
            "Nobody",
            day(1),
            PaymentTerms::DueOnReceipt,
            vec![LineItem::new("Thing", dec!(1), dec!(10))],
            now(),
        )
        .unwrap();
        let err = workflow(&books).create(invoice, now()).unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Ledger(LedgerError::MissingSystemAccount(_))
        ));
        assert!(books.store().transactions(stranger).unwrap().is_empty());
    }
}
