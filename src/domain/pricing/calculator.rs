use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::errors::PricingError;
use crate::domain::catalog::{CatalogItem, ItemKind};

const SECONDS_PER_NIGHT: i64 = 86_400;

/// Largest unit count a single line may carry.
pub const MAX_LINE_QUANTITY: i64 = 10_000;

/// What the customer picked on top of the item itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineSelection {
    Dish,
    Variant {
        size: Option<String>,
        color: Option<String>,
    },
    Stay {
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
        guests: u32,
    },
}

impl LineSelection {
    pub fn is_stay(&self) -> bool {
        matches!(self, LineSelection::Stay { .. })
    }
}

/// Everything needed to price a line, resolved from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTerms {
    pub kind: ItemKind,
    pub unit_price: Decimal,
    pub quantity: i64,
    /// Set for rooms only
    pub nights: Option<i64>,
    pub tax_rate: Decimal,
    pub delivery_charge: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    pub line_price: Decimal,
    pub tax: Decimal,
    pub delivery_charge: Decimal,
    pub commission: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_charge: Decimal,
    pub commission: Decimal,
    pub total_price: Decimal,
}

impl PriceBreakdown {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a LineAmounts>) -> Self {
        let mut totals = Self::default();
        for line in lines {
            totals.subtotal += line.line_price;
            totals.tax += line.tax;
            totals.delivery_charge += line.delivery_charge;
            totals.commission += line.commission;
        }
        totals.total_price = totals.subtotal + totals.tax + totals.delivery_charge + totals.commission;
        totals
    }
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount * percent / 100`, rounded to cents.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_money(amount * percent / Decimal::ONE_HUNDRED)
}

/// Partial nights count as a full night.
pub fn nights_between(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> i64 {
    let seconds = (check_out - check_in).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    (seconds + SECONDS_PER_NIGHT - 1) / SECONDS_PER_NIGHT
}

pub fn resolve_terms(
    item: &CatalogItem,
    selection: &LineSelection,
    quantity: i64,
    tax_rate: Decimal,
) -> Result<LineTerms, PricingError> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(PricingError::InvalidQuantity(quantity));
    }

    let (unit_price, nights) = match (item.kind, selection) {
        (ItemKind::Food, LineSelection::Dish) => (item.base_price, None),
        (ItemKind::Product, LineSelection::Variant { size, color }) => {
            let variant = item
                .find_variant(size.as_deref(), color.as_deref())
                .ok_or_else(|| PricingError::VariantNotFound {
                    size: size.clone(),
                    color: color.clone(),
                })?;
            (variant.price, None)
        }
        (
            ItemKind::Room,
            LineSelection::Stay {
                check_in,
                check_out,
                guests,
            },
        ) => {
            if quantity != 1 {
                return Err(PricingError::InvalidQuantity(quantity));
            }
            let max = item.max_guests.unwrap_or(u32::MAX);
            if *guests == 0 || *guests > max {
                return Err(PricingError::InvalidGuests { guests: *guests, max });
            }
            let nights = nights_between(*check_in, *check_out);
            if nights <= 0 {
                return Err(PricingError::InvalidDates);
            }
            (item.base_price, Some(nights))
        }
        (ItemKind::Food, _) => return Err(PricingError::SelectionMismatch("food")),
        (ItemKind::Product, _) => return Err(PricingError::SelectionMismatch("product")),
        (ItemKind::Room, _) => return Err(PricingError::SelectionMismatch("room")),
    };

    if unit_price <= Decimal::ZERO {
        return Err(PricingError::InvalidPrice);
    }

    let delivery_charge = if item.kind.needs_delivery() {
        item.delivery_charge.max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    Ok(LineTerms {
        kind: item.kind,
        unit_price,
        quantity,
        nights,
        tax_rate,
        delivery_charge,
    })
}

pub fn price_line(terms: &LineTerms, commission_rate: Decimal) -> LineAmounts {
    let units = Decimal::from(terms.quantity) * Decimal::from(terms.nights.unwrap_or(1));
    let line_price = round_money(terms.unit_price * units);

    LineAmounts {
        line_price,
        tax: percent_of(line_price, terms.tax_rate),
        delivery_charge: if terms.kind.needs_delivery() {
            terms.delivery_charge
        } else {
            Decimal::ZERO
        },
        commission: percent_of(line_price, commission_rate),
    }
}
