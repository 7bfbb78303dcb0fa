//! Value objects for the order domain.

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderError;
use crate::money::Money;

/// Public order number customers quote, e.g. `ORD-20240315-9F3A61C2`.
///
/// Distinct from the storage id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generates a fresh order number dated `now`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string()[..8].to_ascii_uppercase();
        Self(format!("ORD-{}-{}", now.format("%Y%m%d"), suffix))
    }

    /// Wraps an existing order number without checking its shape.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Snapshot of one purchased product, captured at placement.
///
/// Never re-read from the live product; `product_id` is only used for
/// enrichment joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl LineItem {
    /// Creates a new line item snapshot.
    pub fn new(
        product_id: ProductId,
        name: impl Into<String>,
        price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            name: name.into(),
            price,
            quantity,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Returns price × quantity, or `None` if it overflows.
    pub fn total_price(&self) -> Option<Money> {
        self.price.checked_mul(self.quantity)
    }

    pub(crate) fn validate(&self) -> Result<(), OrderError> {
        if self.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                product_id: self.product_id,
                quantity: self.quantity,
            });
        }
        if self.price.is_negative() {
            return Err(OrderError::InvalidPrice {
                product_id: self.product_id,
                price: self.price.cents(),
            });
        }
        if self.total_price().is_none() {
            return Err(OrderError::AmountOverflow { field: "line_total" });
        }
        Ok(())
    }
}

/// Where the order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
}

impl ShippingAddress {
    pub(crate) fn validate(&self) -> Result<(), OrderError> {
        let required = [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("pincode", &self.pincode),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(OrderError::InvalidShippingAddress { field });
            }
        }
        Ok(())
    }
}

/// Payment method name as chosen at checkout. Opaque except for
/// cash on delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    pub const CASH_ON_DELIVERY: &'static str = "cash-on-delivery";

    pub fn new(method: impl Into<String>) -> Self {
        Self(method.into())
    }

    pub fn cash_on_delivery() -> Self {
        Self(Self::CASH_ON_DELIVERY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `cash-on-delivery` and its short form `cod`, in any case.
    pub fn is_cash_on_delivery(&self) -> bool {
        let method = self.0.trim();
        method.eq_ignore_ascii_case(Self::CASH_ON_DELIVERY) || method.eq_ignore_ascii_case("cod")
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PaymentMethod {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Monetary breakdown supplied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    #[serde(default)]
    pub shipping_charges: Money,
    #[serde(default)]
    pub tax: Money,
    #[serde(default)]
    pub discount: Money,
    pub total_amount: Money,
}

impl PriceBreakdown {
    /// Builds a consistent breakdown for `items`.
    pub fn for_items(
        items: &[LineItem],
        shipping_charges: Money,
        tax: Money,
        discount: Money,
    ) -> Result<Self, OrderError> {
        let subtotal = items_subtotal(items)?;
        Ok(Self {
            subtotal,
            shipping_charges,
            tax,
            discount,
            total_amount: total_of(subtotal, shipping_charges, tax, discount)?,
        })
    }

    /// Rejects negative amounts and line totals that overflow. When
    /// `verify_totals` is set, also rejects a subtotal or total that does
    /// not add up.
    pub(crate) fn validate(&self, items: &[LineItem], verify_totals: bool) -> Result<(), OrderError> {
        let amounts = [
            ("subtotal", self.subtotal),
            ("shipping_charges", self.shipping_charges),
            ("tax", self.tax),
            ("discount", self.discount),
            ("total_amount", self.total_amount),
        ];
        for (field, amount) in amounts {
            if amount.is_negative() {
                return Err(OrderError::NegativeAmount {
                    field,
                    cents: amount.cents(),
                });
            }
        }

        let expected_subtotal = items_subtotal(items)?;
        if !verify_totals {
            return Ok(());
        }

        if self.subtotal != expected_subtotal {
            return Err(OrderError::TotalsMismatch {
                field: "subtotal",
                expected: expected_subtotal,
                actual: self.subtotal,
            });
        }

        let expected_total =
            total_of(self.subtotal, self.shipping_charges, self.tax, self.discount)?;
        if self.total_amount != expected_total {
            return Err(OrderError::TotalsMismatch {
                field: "total_amount",
                expected: expected_total,
                actual: self.total_amount,
            });
        }
        Ok(())
    }
}

fn items_subtotal(items: &[LineItem]) -> Result<Money, OrderError> {
    let totals = items.iter().map(LineItem::total_price);
    totals
        .collect::<Option<Vec<_>>>()
        .and_then(Money::checked_sum)
        .ok_or(OrderError::AmountOverflow { field: "subtotal" })
}

fn total_of(subtotal: Money, shipping: Money, tax: Money, discount: Money) -> Result<Money, OrderError> {
    subtotal
        .checked_add(shipping)
        .and_then(|m| m.checked_add(tax))
        .and_then(|m| m.checked_sub(discount))
        .ok_or(OrderError::AmountOverflow {
            field: "total_amount",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: u32) -> LineItem {
        LineItem::new(ProductId::new(), "Tote", Money::from_cents(price), quantity)
    }

    #[test]
    fn test_line_item_total() {
        assert_eq!(item(2500, 3).total_price(), Some(Money::from_cents(7500)));
    }

    #[test]
    fn test_line_item_rejects_zero_quantity() {
        assert!(matches!(
            item(100, 0).validate(),
            Err(OrderError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[test]
    fn test_order_number_format() {
        let now = "2024-03-15T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let number = OrderNumber::generate(now);
        let s = number.as_str();
        assert!(s.starts_with("ORD-20240315-"));
        assert_eq!(s.len(), "ORD-20240315-".len() + 8);
        assert!(s[13..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(OrderNumber::generate(now), number);
    }

    #[test]
    fn test_cash_on_delivery_synonyms() {
        assert!(PaymentMethod::new("cash-on-delivery").is_cash_on_delivery());
        assert!(PaymentMethod::new("COD").is_cash_on_delivery());
        assert!(PaymentMethod::new("cod").is_cash_on_delivery());
        assert!(!PaymentMethod::new("card").is_cash_on_delivery());
        assert!(!PaymentMethod::new("upi").is_cash_on_delivery());
    }

    #[test]
    fn test_breakdown_for_items_adds_up() {
        let items = vec![item(10000, 2), item(500, 1)];
        let pricing = PriceBreakdown::for_items(
            &items,
            Money::from_cents(99),
            Money::from_cents(150),
            Money::from_cents(49),
        )
        .unwrap();
        assert_eq!(pricing.subtotal, Money::from_cents(20500));
        assert_eq!(pricing.total_amount, Money::from_cents(20700));
        assert!(pricing.validate(&items, true).is_ok());
    }

    #[test]
    fn test_breakdown_rejects_mismatched_total() {
        let items = vec![item(10000, 2)];
        let mut pricing =
            PriceBreakdown::for_items(&items, Money::zero(), Money::zero(), Money::zero()).unwrap();
        pricing.total_amount = Money::from_cents(1);

        assert!(matches!(
            pricing.validate(&items, true),
            Err(OrderError::TotalsMismatch { field: "total_amount", .. })
        ));
        assert!(pricing.validate(&items, false).is_ok());
    }

    #[test]
    fn test_breakdown_rejects_negative_amounts_even_unverified() {
        let items = vec![item(100, 1)];
        let mut pricing =
            PriceBreakdown::for_items(&items, Money::zero(), Money::zero(), Money::zero()).unwrap();
        pricing.discount = Money::from_cents(-5);
        assert!(matches!(
            pricing.validate(&items, false),
            Err(OrderError::NegativeAmount { field: "discount", .. })
        ));
    }

    #[test]
    fn test_overflowing_line_total_is_rejected() {
        let items = vec![item((1 << 62) + 1, 4)];
        assert_eq!(
            items[0].validate(),
            Err(OrderError::AmountOverflow { field: "line_total" })
        );

        // A wrapped product of 4 must not slip through as a matching subtotal.
        let crafted = PriceBreakdown {
            subtotal: Money::from_cents(4),
            total_amount: Money::from_cents(4),
            ..Default::default()
        };
        assert_eq!(
            crafted.validate(&items, true),
            Err(OrderError::AmountOverflow { field: "subtotal" })
        );
        assert_eq!(
            crafted.validate(&items, false),
            Err(OrderError::AmountOverflow { field: "subtotal" })
        );
        assert!(PriceBreakdown::for_items(&items, Money::zero(), Money::zero(), Money::zero()).is_err());
    }

    #[test]
    fn test_overflowing_subtotal_and_total_are_rejected() {
        let items = vec![item(i64::MAX / 2 + 1, 1), item(i64::MAX / 2 + 1, 1)];
        assert!(items.iter().all(|i| i.validate().is_ok()));
        assert_eq!(
            PriceBreakdown::for_items(&items, Money::zero(), Money::zero(), Money::zero()),
            Err(OrderError::AmountOverflow { field: "subtotal" })
        );

        let items = vec![item(i64::MAX, 1)];
        let pricing = PriceBreakdown {
            subtotal: Money::from_cents(i64::MAX),
            shipping_charges: Money::from_cents(1),
            total_amount: Money::from_cents(i64::MAX),
            ..Default::default()
        };
        assert_eq!(
            pricing.validate(&items, true),
            Err(OrderError::AmountOverflow {
                field: "total_amount"
            })
        );
    }

    #[test]
    fn test_address_requires_fields() {
        let address = ShippingAddress {
            full_name: None,
            phone: None,
            street: "12 MG Road".to_string(),
            city: " ".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            country: "India".to_string(),
        };
        assert_eq!(
            address.validate(),
            Err(OrderError::InvalidShippingAddress { field: "city" })
        );
    }
}
