//! Priced line items shared by invoices and estimates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, LineItemId};

use super::error::DocumentError;

/// A priced line on an invoice or estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Line identifier.
    pub id: LineItemId,
    /// Product or service description.
    pub description: String,
    /// Quantity sold.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Cost per unit for inventory items; drives the COGS entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Decimal>,
    /// Income account override; the tenant default is used otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_account_id: Option<AccountId>,
}

impl LineItem {
    /// A service line.
    #[must_use]
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            id: LineItemId::new(),
            description: description.into(),
            quantity,
            unit_price,
            cost_price: None,
            income_account_id: None,
        }
    }

    /// Mark as an inventory item with the given unit cost.
    #[must_use]
    pub fn with_cost(mut self, cost_price: Decimal) -> Self {
        self.cost_price = Some(cost_price);
        self
    }

    /// Book the line to a specific income account.
    #[must_use]
    pub fn with_income_account(mut self, account_id: AccountId) -> Self {
        self.income_account_id = Some(account_id);
        self
    }

    /// `quantity * unit_price`, rounded to cents (banker's rounding).
    #[must_use]
    pub fn amount(&self) -> Decimal {
        (self.quantity * self.unit_price).round_dp(2)
    }

    /// `quantity * cost_price` for inventory items.
    #[must_use]
    pub fn cost_amount(&self) -> Option<Decimal> {
        self.cost_price.map(|cost| (self.quantity * cost).round_dp(2))
    }

    /// Check quantity and prices.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for a non-positive quantity, `InvalidUnitPrice` for
    /// a negative price or cost.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.quantity <= Decimal::ZERO {
            return Err(DocumentError::InvalidQuantity {
                line_item_id: self.id,
                quantity: self.quantity,
            });
        }
        if let Some(price) = [Some(self.unit_price), self.cost_price]
            .into_iter()
            .flatten()
            .find(|p| p.is_sign_negative() && !p.is_zero())
        {
            return Err(DocumentError::InvalidUnitPrice {
                line_item_id: self.id,
                unit_price: price,
            });
        }
        Ok(())
    }
}

/// Validate `items` and return their total.
///
/// # Errors
///
/// `NoLineItems`, any line error, or `NonPositiveTotal`.
pub fn priced_total(items: &[LineItem]) -> Result<Decimal, DocumentError> {
    if items.is_empty() {
        return Err(DocumentError::NoLineItems);
    }
    for item in items {
        item.validate()?;
    }
    let total: Decimal = items.iter().map(LineItem::amount).sum();
    if total <= Decimal::ZERO {
        return Err(DocumentError::NonPositiveTotal(total));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_amount_rounds_to_cents() {
        let item = LineItem::new("Widget", dec!(3), dec!(0.335));
        assert_eq!(item.amount(), dec!(1.00));
    }

    #[test]
    fn test_cost_amount() {
        let item = LineItem::new("Widget", dec!(4), dec!(25)).with_cost(dec!(10));
        assert_eq!(item.cost_amount(), Some(dec!(40)));
        assert_eq!(LineItem::new("Consulting", dec!(1), dec!(90)).cost_amount(), None);
    }

    #[test]
    fn test_priced_total() {
        let items = vec![
            LineItem::new("Widget", dec!(2), dec!(100)),
            LineItem::new("Setup", dec!(1), dec!(50)),
        ];
        assert_eq!(priced_total(&items).unwrap(), dec!(250));
        assert_eq!(priced_total(&[]), Err(DocumentError::NoLineItems));
    }

    #[test]
    fn test_invalid_lines() {
        let zero_qty = LineItem::new("Widget", dec!(0), dec!(100));
        assert!(matches!(
            zero_qty.validate(),
            Err(DocumentError::InvalidQuantity { .. })
        ));

        let negative = LineItem::new("Widget", dec!(1), dec!(100)).with_cost(dec!(-1));
        assert!(matches!(
            negative.validate(),
            Err(DocumentError::InvalidUnitPrice { .. })
        ));

        let free = vec![LineItem::new("Sample", dec!(1), dec!(0))];
        assert_eq!(priced_total(&free), Err(DocumentError::NonPositiveTotal(dec!(0))));
    }
}
