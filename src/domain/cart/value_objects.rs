use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pricing::{LineAmounts, LineSelection, LineTerms};

/// Namespace for deriving guest cart ids from session tokens.
const GUEST_CART_NAMESPACE: Uuid = Uuid::from_u128(0x8c1e_52b0_7f4d_4a57_9b1e_3d2c_6a90_f1e4);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum CartOwner {
    User(Uuid),
    Guest(String),
}

impl CartOwner {
    /// A user has exactly one cart, keyed by their id; guests get a stable
    /// id derived from their token.
    pub fn cart_id(&self) -> Uuid {
        match self {
            CartOwner::User(user_id) => *user_id,
            CartOwner::Guest(token) => Uuid::new_v5(&GUEST_CART_NAMESPACE, token.as_bytes()),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            CartOwner::User(user_id) => Some(*user_id),
            CartOwner::Guest(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub recipient: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: Uuid,
    pub item_id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub selection: LineSelection,
    pub terms: LineTerms,
    pub amounts: LineAmounts,
}

impl CartLine {
    pub fn quantity(&self) -> i64 {
        self.terms.quantity
    }

    /// Same item with the same size/color (or any stay of the same room).
    pub fn same_offer(&self, item_id: Uuid, selection: &LineSelection) -> bool {
        if self.item_id != item_id {
            return false;
        }
        match (&self.selection, selection) {
            (LineSelection::Stay { .. }, LineSelection::Stay { .. }) => true,
            (current, requested) => current == requested,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClearReason {
    Requested,
    CheckedOut { order_id: Uuid },
}
