use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::aggregate::Cart;
use super::commands::CartCommand;
use super::errors::CartError;
use super::value_objects::{Address, CartOwner, ClearReason};
use crate::clock::Clock;
use crate::domain::catalog::{CatalogItem, CatalogStore, ItemKind, RateProvider};
use crate::domain::pricing::{resolve_terms, LineSelection};
use crate::event_sourcing::{Aggregate, CommitContext, Repository};

// ============================================================================
// Cart Service
// ============================================================================
//
// Orchestrates: catalog lookup -> term resolution -> lock -> load (or open)
// -> command -> commit. Cart mutations send no notifications.
//
// ============================================================================

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddLineRequest {
    pub item_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub check_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub check_out: Option<DateTime<Utc>>,
    #[serde(default)]
    pub guests: Option<u32>,
    #[serde(default)]
    pub delivery_address: Option<Address>,
}

impl AddLineRequest {
    pub fn new(item_id: Uuid, quantity: i64) -> Self {
        Self {
            item_id,
            quantity,
            size: None,
            color: None,
            check_in: None,
            check_out: None,
            guests: None,
            delivery_address: None,
        }
    }

    pub fn variant(mut self, size: Option<&str>, color: Option<&str>) -> Self {
        self.size = size.map(str::to_string);
        self.color = color.map(str::to_string);
        self
    }

    pub fn stay(mut self, check_in: DateTime<Utc>, check_out: DateTime<Utc>, guests: u32) -> Self {
        self.check_in = Some(check_in);
        self.check_out = Some(check_out);
        self.guests = Some(guests);
        self
    }

    pub fn deliver_to(mut self, address: Address) -> Self {
        self.delivery_address = Some(address);
        self
    }

    fn selection_for(&self, item: &CatalogItem) -> Result<LineSelection, CartError> {
        match item.kind {
            ItemKind::Food => Ok(LineSelection::Dish),
            ItemKind::Product => Ok(LineSelection::Variant {
                size: self.size.clone(),
                color: self.color.clone(),
            }),
            ItemKind::Room => match (self.check_in, self.check_out) {
                (Some(check_in), Some(check_out)) => Ok(LineSelection::Stay {
                    check_in,
                    check_out,
                    guests: self.guests.unwrap_or(1),
                }),
                _ => Err(CartError::InvalidDates),
            },
        }
    }
}

pub struct CartService {
    carts: Arc<Repository<Cart>>,
    catalog: Arc<dyn CatalogStore>,
    rates: Arc<dyn RateProvider>,
    clock: Arc<dyn Clock>,
}

impl CartService {
    pub fn new(
        carts: Arc<Repository<Cart>>,
        catalog: Arc<dyn CatalogStore>,
        rates: Arc<dyn RateProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            carts,
            catalog,
            rates,
            clock,
        }
    }

    pub async fn add_line(&self, owner: &CartOwner, request: AddLineRequest) -> Result<Cart, CartError> {
        let item = self
            .catalog
            .item(request.item_id)
            .await?
            .ok_or(CartError::ItemNotFound(request.item_id))?;

        let tax_rate = match self.catalog.tax_rate(item.category_id).await? {
            Some(rate) => rate,
            None => {
                tracing::warn!(
                    item_id = %item.id,
                    category_id = %item.category_id,
                    "Item category missing, pricing without tax"
                );
                Decimal::ZERO
            }
        };

        let selection = request.selection_for(&item)?;
        let terms = resolve_terms(&item, &selection, request.quantity, tax_rate)?;

        let cart = self
            .mutate(owner, true, |commission_rate, now| CartCommand::AddLine {
                item_id: item.id,
                business_id: item.business_id,
                name: item.name.clone(),
                selection,
                terms,
                delivery_address: request.delivery_address,
                commission_rate,
                now,
            })
            .await?;

        tracing::info!(
            cart_id = %cart.id,
            item_id = %item.id,
            lines = cart.lines.len(),
            total = %cart.totals.total_price,
            "Cart line added"
        );
        Ok(cart)
    }

    pub async fn update_line(&self, owner: &CartOwner, line_id: Uuid, quantity: i64) -> Result<Cart, CartError> {
        let cart = self
            .mutate(owner, false, |commission_rate, now| CartCommand::UpdateLine {
                line_id,
                quantity,
                commission_rate,
                now,
            })
            .await?;

        tracing::info!(cart_id = %cart.id, line_id = %line_id, quantity, "Cart line updated");
        Ok(cart)
    }

    pub async fn remove_line(&self, owner: &CartOwner, line_id: Uuid) -> Result<Cart, CartError> {
        let cart = self
            .mutate(owner, false, |commission_rate, now| CartCommand::RemoveLine {
                line_id,
                commission_rate,
                now,
            })
            .await?;

        tracing::info!(cart_id = %cart.id, line_id = %line_id, "Cart line removed");
        Ok(cart)
    }

    pub async fn clear(&self, owner: &CartOwner) -> Result<Cart, CartError> {
        match self
            .mutate(owner, false, |_, now| CartCommand::Clear {
                reason: ClearReason::Requested,
                now,
            })
            .await
        {
            Err(CartError::NotFound(_)) => Ok(Cart::empty(owner.clone(), self.clock.now())),
            other => other,
        }
    }

    pub async fn get(&self, owner: &CartOwner) -> Result<Cart, CartError> {
        Ok(self
            .carts
            .load(owner.cart_id())
            .await?
            .unwrap_or_else(|| Cart::empty(owner.clone(), self.clock.now())))
    }

    async fn mutate<F>(&self, owner: &CartOwner, open_if_missing: bool, build: F) -> Result<Cart, CartError>
    where
        F: FnOnce(Decimal, DateTime<Utc>) -> CartCommand,
    {
        let cart_id = owner.cart_id();
        let _guard = self.carts.lock(cart_id).await;

        let now = self.clock.now();
        let commission_rate = self.rates.commission_rate().await?;

        let (mut cart, mut events) = match self.carts.load(cart_id).await? {
            Some(cart) => (cart, Vec::new()),
            None if open_if_missing => {
                let opened = Cart::open(owner.clone(), now);
                (Cart::apply_first_event(&opened)?, vec![opened])
            }
            None => return Err(CartError::NotFound(cart_id)),
        };

        let command = build(commission_rate, now);
        match cart.execute(&command) {
            Ok(produced) => events.extend(produced),
            Err(err) => {
                tracing::debug!(cart_id = %cart_id, error = %err, "Cart command rejected");
                return Err(err);
            }
        }

        self.carts
            .commit(&mut cart, events, &CommitContext::new(owner.user_id(), now))
            .await?;
        Ok(cart)
    }
}
