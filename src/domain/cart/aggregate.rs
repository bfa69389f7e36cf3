use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::CartCommand;
use super::errors::CartError;
use super::events::CartEvent;
use super::value_objects::{Address, CartLine, CartOwner, ClearReason};
use crate::domain::pricing::{price_line, LineSelection, LineTerms, PriceBreakdown, MAX_LINE_QUANTITY};
use crate::event_sourcing::Aggregate;

// ============================================================================
// Cart Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub version: i64,
    pub owner: CartOwner,
    /// All lines belong to this business; None while empty
    pub business_id: Option<Uuid>,
    pub lines: Vec<CartLine>,
    pub delivery_address: Option<Address>,
    /// Rate the current totals were computed with
    pub commission_rate: Decimal,
    pub totals: PriceBreakdown,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// First event of every cart.
    pub fn open(owner: CartOwner, now: DateTime<Utc>) -> CartEvent {
        CartEvent::Opened {
            cart_id: owner.cart_id(),
            owner,
            at: now,
        }
    }

    /// Unsaved empty cart, returned when the owner has none yet.
    pub fn empty(owner: CartOwner, now: DateTime<Utc>) -> Self {
        Self {
            id: owner.cart_id(),
            version: 0,
            owner,
            business_id: None,
            lines: Vec::new(),
            delivery_address: None,
            commission_rate: Decimal::ZERO,
            totals: PriceBreakdown::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, line_id: Uuid) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    pub fn needs_delivery(&self) -> bool {
        self.lines.iter().any(|l| l.terms.kind.needs_delivery())
    }

    /// Re-price every line and rebuild the totals. Full and idempotent.
    pub fn recompute(&mut self) {
        for line in &mut self.lines {
            line.amounts = price_line(&line.terms, self.commission_rate);
        }
        self.totals = PriceBreakdown::from_lines(self.lines.iter().map(|l| &l.amounts));
        self.business_id = self.lines.first().map(|l| l.business_id);
    }

    fn line_mut(&mut self, line_id: Uuid) -> Result<&mut CartLine, CartError> {
        self.lines
            .iter_mut()
            .find(|l| l.line_id == line_id)
            .ok_or(CartError::LineNotFound(line_id))
    }

    fn ensure_line(&self, line_id: Uuid) -> Result<&CartLine, CartError> {
        self.line(line_id).ok_or(CartError::LineNotFound(line_id))
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_add_line(
        &self,
        item_id: Uuid,
        business_id: Uuid,
        name: &str,
        selection: &LineSelection,
        terms: &LineTerms,
        delivery_address: &Option<Address>,
        commission_rate: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Vec<CartEvent>, CartError> {
        if let Some(current) = self.business_id {
            if current != business_id && !self.lines.is_empty() {
                return Err(CartError::BusinessMismatch {
                    current,
                    requested: business_id,
                });
            }
        }

        if !(1..=MAX_LINE_QUANTITY).contains(&terms.quantity) {
            return Err(CartError::InvalidQuantity(terms.quantity));
        }

        if terms.kind.needs_delivery()
            && delivery_address.is_none()
            && self.delivery_address.is_none()
        {
            return Err(CartError::AddressRequired);
        }

        if let LineSelection::Stay {
            check_in,
            check_out,
            ..
        } = selection
        {
            if *check_in < now || *check_out < now || check_in >= check_out {
                return Err(CartError::InvalidDates);
            }
        }

        let mut events = Vec::new();
        if let Some(address) = delivery_address {
            if self.delivery_address.as_ref() != Some(address) {
                events.push(CartEvent::DeliveryAddressSet {
                    address: address.clone(),
                    at: now,
                });
            }
        }

        let existing = self.lines.iter().find(|l| l.same_offer(item_id, selection));
        let new_line = |line_id: Uuid| CartLine {
            line_id,
            item_id,
            business_id,
            name: name.to_string(),
            selection: selection.clone(),
            terms: terms.clone(),
            amounts: price_line(terms, commission_rate),
        };

        events.push(match existing {
            Some(line) if selection.is_stay() => CartEvent::LineReplaced {
                line: new_line(line.line_id),
                commission_rate,
                at: now,
            },
            Some(line) => {
                let mut merged = terms.clone();
                merged.quantity = line
                    .quantity()
                    .checked_add(terms.quantity)
                    .filter(|q| *q <= MAX_LINE_QUANTITY)
                    .ok_or(CartError::InvalidQuantity(terms.quantity))?;
                CartEvent::LineMerged {
                    line_id: line.line_id,
                    terms: merged,
                    commission_rate,
                    at: now,
                }
            }
            None => CartEvent::LineAdded {
                line: new_line(Uuid::new_v4()),
                commission_rate,
                at: now,
            },
        });

        Ok(events)
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Cart {
    type Event = CartEvent;
    type Command = CartCommand;
    type Error = CartError;

    const AGGREGATE_TYPE: &'static str = "cart";

    fn apply_first_event(event: &CartEvent) -> Result<Self, CartError> {
        match event {
            CartEvent::Opened { cart_id, owner, at } => {
                let mut cart = Cart::empty(owner.clone(), *at);
                cart.id = *cart_id;
                Ok(cart)
            }
            _ => Err(CartError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &CartEvent) -> Result<(), CartError> {
        if let Some(rate) = event.commission_rate() {
            self.commission_rate = rate;
        }

        match event {
            CartEvent::Opened { .. } => {}
            CartEvent::LineAdded { line, .. } => self.lines.push(line.clone()),
            CartEvent::LineMerged { line_id, terms, .. } => {
                self.line_mut(*line_id)?.terms = terms.clone();
            }
            CartEvent::LineReplaced { line, .. } => {
                *self.line_mut(line.line_id)? = line.clone();
            }
            CartEvent::LineQuantityChanged {
                line_id, quantity, ..
            } => {
                self.line_mut(*line_id)?.terms.quantity = *quantity;
            }
            CartEvent::LineRemoved { line_id, .. } => {
                self.lines.retain(|l| l.line_id != *line_id);
            }
            CartEvent::DeliveryAddressSet { address, .. } => {
                self.delivery_address = Some(address.clone());
            }
            CartEvent::Cleared { .. } => {
                self.lines.clear();
            }
        }

        self.updated_at = event.at();
        self.recompute();
        Ok(())
    }

    fn handle_command(&self, command: &CartCommand) -> Result<Vec<CartEvent>, CartError> {
        match command {
            CartCommand::AddLine {
                item_id,
                business_id,
                name,
                selection,
                terms,
                delivery_address,
                commission_rate,
                now,
            } => self.handle_add_line(
                *item_id,
                *business_id,
                name,
                selection,
                terms,
                delivery_address,
                *commission_rate,
                *now,
            ),

            CartCommand::UpdateLine {
                line_id,
                quantity,
                commission_rate,
                now,
            } => {
                let line = self.ensure_line(*line_id)?;
                let in_range = (1..=MAX_LINE_QUANTITY).contains(quantity);
                if !in_range || (line.selection.is_stay() && *quantity != 1) {
                    return Err(CartError::InvalidQuantity(*quantity));
                }
                Ok(vec![CartEvent::LineQuantityChanged {
                    line_id: *line_id,
                    quantity: *quantity,
                    commission_rate: *commission_rate,
                    at: *now,
                }])
            }

            CartCommand::RemoveLine {
                line_id,
                commission_rate,
                now,
            } => {
                self.ensure_line(*line_id)?;
                Ok(vec![CartEvent::LineRemoved {
                    line_id: *line_id,
                    commission_rate: *commission_rate,
                    at: *now,
                }])
            }

            CartCommand::Clear { reason, now } => {
                if self.lines.is_empty() && *reason == ClearReason::Requested {
                    return Ok(vec![]);
                }
                Ok(vec![CartEvent::Cleared {
                    reason: reason.clone(),
                    at: *now,
                }])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ItemKind;
    use crate::error::Classify;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap()
    }

    fn address() -> Address {
        Address {
            recipient: "Ada".into(),
            line1: "1 Main St".into(),
            line2: None,
            city: "Springfield".into(),
            postal_code: "12345".into(),
            country: "US".into(),
            phone: None,
        }
    }

    fn cart() -> Cart {
        Cart::apply_first_event(&Cart::open(CartOwner::User(Uuid::new_v4()), now())).unwrap()
    }

    fn food_terms(price: i64, quantity: i64) -> LineTerms {
        LineTerms {
            kind: ItemKind::Food,
            unit_price: Decimal::from(price),
            quantity,
            nights: None,
            tax_rate: Decimal::from(10),
            delivery_charge: Decimal::from(3),
        }
    }

    fn add_food(item_id: Uuid, business_id: Uuid, quantity: i64) -> CartCommand {
        CartCommand::AddLine {
            item_id,
            business_id,
            name: "Soup".into(),
            selection: LineSelection::Dish,
            terms: food_terms(8, quantity),
            delivery_address: Some(address()),
            commission_rate: Decimal::from(5),
            now: now(),
        }
    }

    fn stay_command(item_id: Uuid, business_id: Uuid, from: DateTime<Utc>, nights: i64) -> CartCommand {
        CartCommand::AddLine {
            item_id,
            business_id,
            name: "Suite".into(),
            selection: LineSelection::Stay {
                check_in: from,
                check_out: from + Duration::days(nights),
                guests: 2,
            },
            terms: LineTerms {
                kind: ItemKind::Room,
                unit_price: Decimal::from(100),
                quantity: 1,
                nights: Some(nights),
                tax_rate: Decimal::from(10),
                delivery_charge: Decimal::ZERO,
            },
            delivery_address: None,
            commission_rate: Decimal::from(5),
            now: now(),
        }
    }

    #[test]
    fn test_same_item_merges_quantity() {
        let mut cart = cart();
        let item = Uuid::new_v4();
        let business = Uuid::new_v4();

        cart.execute(&add_food(item, business, 1)).unwrap();
        cart.execute(&add_food(item, business, 2)).unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity(), 3);
        assert_eq!(cart.totals.subtotal, Decimal::from(24));
        assert_eq!(cart.totals.delivery_charge, Decimal::from(3));
    }

    #[test]
    fn test_merge_past_line_limit_rejected() {
        let mut cart = cart();
        let item = Uuid::new_v4();
        let business = Uuid::new_v4();

        cart.execute(&add_food(item, business, MAX_LINE_QUANTITY)).unwrap();
        let err = cart.execute(&add_food(item, business, 1)).unwrap_err();
        assert_eq!(err.code(), "INVALID_QUANTITY");

        let err = cart.execute(&add_food(item, business, i64::MAX)).unwrap_err();
        assert_eq!(err.code(), "INVALID_QUANTITY");
        assert_eq!(cart.lines[0].quantity(), MAX_LINE_QUANTITY);
        assert_eq!(cart.totals.subtotal, Decimal::from(8 * MAX_LINE_QUANTITY));
    }

    #[test]
    fn test_room_line_replaced_wholesale() {
        let mut cart = cart();
        let room = Uuid::new_v4();
        let hotel = Uuid::new_v4();
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        cart.execute(&stay_command(room, hotel, first, 2)).unwrap();
        let line_id = cart.lines[0].line_id;
        cart.execute(&stay_command(room, hotel, first, 3)).unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].line_id, line_id);
        assert_eq!(cart.totals.subtotal, Decimal::from(300));
        assert_eq!(cart.totals.delivery_charge, Decimal::ZERO);
    }

    #[test]
    fn test_food_without_address_rejected() {
        let cart = cart();
        let mut command = add_food(Uuid::new_v4(), Uuid::new_v4(), 1);
        if let CartCommand::AddLine { delivery_address, .. } = &mut command {
            *delivery_address = None;
        }

        assert!(matches!(cart.handle_command(&command), Err(CartError::AddressRequired)));
    }

    #[test]
    fn test_past_stay_rejected() {
        let cart = cart();
        let yesterday = now() - Duration::days(1);

        let result = cart.handle_command(&stay_command(Uuid::new_v4(), Uuid::new_v4(), yesterday, 2));

        assert!(matches!(result, Err(CartError::InvalidDates)));
    }

    #[test]
    fn test_second_business_rejected() {
        let mut cart = cart();
        cart.execute(&add_food(Uuid::new_v4(), Uuid::new_v4(), 1)).unwrap();

        let result = cart.handle_command(&add_food(Uuid::new_v4(), Uuid::new_v4(), 1));

        assert!(matches!(result, Err(CartError::BusinessMismatch { .. })));
    }

    #[test]
    fn test_room_quantity_cannot_change() {
        let mut cart = cart();
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        cart.execute(&stay_command(Uuid::new_v4(), Uuid::new_v4(), first, 2)).unwrap();
        let line_id = cart.lines[0].line_id;

        let result = cart.handle_command(&CartCommand::UpdateLine {
            line_id,
            quantity: 2,
            commission_rate: Decimal::from(5),
            now: now(),
        });

        assert!(matches!(result, Err(CartError::InvalidQuantity(2))));
    }

    #[test]
    fn test_unknown_line_rejected() {
        let cart = cart();
        let result = cart.handle_command(&CartCommand::RemoveLine {
            line_id: Uuid::new_v4(),
            commission_rate: Decimal::ZERO,
            now: now(),
        });

        assert!(matches!(result, Err(CartError::LineNotFound(_))));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut cart = cart();
        cart.execute(&add_food(Uuid::new_v4(), Uuid::new_v4(), 3)).unwrap();
        let before = cart.totals.clone();

        cart.recompute();
        cart.recompute();

        assert_eq!(cart.totals, before);
        assert_eq!(
            cart.totals.total_price,
            cart.totals.subtotal + cart.totals.tax + cart.totals.delivery_charge + cart.totals.commission
        );
    }

    #[test]
    fn test_new_rate_reprices_existing_lines() {
        let mut cart = cart();
        let item = Uuid::new_v4();
        let business = Uuid::new_v4();
        cart.execute(&add_food(item, business, 5)).unwrap();
        assert_eq!(cart.totals.commission, Decimal::from(2));

        let line_id = cart.lines[0].line_id;
        cart.execute(&CartCommand::UpdateLine {
            line_id,
            quantity: 5,
            commission_rate: Decimal::from(10),
            now: now(),
        })
        .unwrap();

        assert_eq!(cart.totals.commission, Decimal::from(4));
    }

    #[test]
    fn test_clear_empties_lines_and_totals() {
        let mut cart = cart();
        cart.execute(&add_food(Uuid::new_v4(), Uuid::new_v4(), 2)).unwrap();

        cart.execute(&CartCommand::Clear {
            reason: ClearReason::Requested,
            now: now(),
        })
        .unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.totals, PriceBreakdown::default());
        assert_eq!(cart.business_id, None);
    }
}
