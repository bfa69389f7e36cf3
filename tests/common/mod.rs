#![allow(dead_code)]

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use marketplace_orders::app::{AppContext, Dependencies, Stores};
use marketplace_orders::clock::FixedClock;
use marketplace_orders::domain::cart::{AddLineRequest, Address, CartOwner};
use marketplace_orders::domain::catalog::{
    Business, BusinessType, CatalogItem, Category, InMemoryCatalog, ItemKind, OperatingHours, SettingsRateProvider,
    Variant,
};
use marketplace_orders::domain::order::{Actor, CheckoutRequest, Order, OrderStatus, PaymentMethod};
use marketplace_orders::metrics::Metrics;
use marketplace_orders::notifications::{Notification, Notifier, Topic};
use marketplace_orders::scheduler::EscalationConfig;

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

impl RecordingNotifier {
    pub fn count(&self, topic: Topic) -> usize {
        self.sent.lock().unwrap().iter().filter(|n| n.topic == topic).count()
    }
}

pub struct World {
    pub ctx: AppContext,
    pub clock: Arc<FixedClock>,
    pub catalog: Arc<InMemoryCatalog>,
    pub rates: Arc<SettingsRateProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub partner_id: Uuid,
    pub hotel_id: Uuid,
    pub room_id: Uuid,
    pub restaurant_id: Uuid,
    pub shop_id: Uuid,
    pub shirt_id: Uuid,
}

pub fn address() -> Address {
    Address {
        recipient: "Noor".into(),
        line1: "12 Canal St".into(),
        line2: None,
        city: "Utrecht".into(),
        postal_code: "3511".into(),
        country: "NL".into(),
        phone: Some("+31 30 000 0000".into()),
    }
}

fn hours(weekday: Weekday) -> OperatingHours {
    OperatingHours {
        weekday,
        opens_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        closes_at: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
    }
}

/// A partner with a hotel (100/night room), a restaurant open 09:00-22:00
/// every day, and a shop selling one shirt variant. Tax 10%, commission 5%.
pub async fn world(now: DateTime<Utc>) -> World {
    let partner_id = Uuid::new_v4();
    let hotel_id = Uuid::new_v4();
    let restaurant_id = Uuid::new_v4();
    let shop_id = Uuid::new_v4();
    let room_id = Uuid::new_v4();
    let shirt_id = Uuid::new_v4();
    let rooms = Uuid::new_v4();
    let apparel = Uuid::new_v4();
    let shirts = Uuid::new_v4();

    let catalog = Arc::new(InMemoryCatalog::new());
    catalog.add_partner(partner_id).await;
    for (id, name, business_type, reservations_enabled) in [
        (hotel_id, "Canal House", BusinessType::Hotel, false),
        (restaurant_id, "De Kas", BusinessType::Restaurant, true),
        (shop_id, "Stof", BusinessType::Shop, false),
    ] {
        catalog
            .put_business(Business {
                id,
                partner_id,
                name: name.into(),
                business_type,
                reservations_enabled,
                operating_hours: [
                    Weekday::Mon,
                    Weekday::Tue,
                    Weekday::Wed,
                    Weekday::Thu,
                    Weekday::Fri,
                    Weekday::Sat,
                    Weekday::Sun,
                ]
                .into_iter()
                .map(hours)
                .collect(),
            })
            .await;
    }

    catalog
        .put_category(Category {
            id: rooms,
            name: "Rooms".into(),
            tax_rate: Decimal::from(10),
            inherits_tax: false,
            parent_id: None,
        })
        .await;
    catalog
        .put_category(Category {
            id: apparel,
            name: "Apparel".into(),
            tax_rate: Decimal::from(10),
            inherits_tax: false,
            parent_id: None,
        })
        .await;
    // Shirts inherit apparel's rate; their own 25% is ignored
    catalog
        .put_category(Category {
            id: shirts,
            name: "Shirts".into(),
            tax_rate: Decimal::from(25),
            inherits_tax: true,
            parent_id: Some(apparel),
        })
        .await;

    catalog
        .put_item(CatalogItem {
            id: room_id,
            business_id: hotel_id,
            name: "Double room".into(),
            kind: ItemKind::Room,
            category_id: rooms,
            base_price: Decimal::from(100),
            delivery_charge: Decimal::ZERO,
            variants: Vec::new(),
            max_guests: Some(2),
        })
        .await;
    catalog
        .put_item(CatalogItem {
            id: shirt_id,
            business_id: shop_id,
            name: "Oxford shirt".into(),
            kind: ItemKind::Product,
            category_id: shirts,
            base_price: Decimal::ZERO,
            delivery_charge: Decimal::from(5),
            variants: vec![Variant {
                size: Some("M".into()),
                color: Some("blue".into()),
                price: Decimal::from(30),
            }],
            max_guests: None,
        })
        .await;

    let clock = Arc::new(FixedClock::new(now));
    let rates = Arc::new(SettingsRateProvider::new(Decimal::from(5)));
    let notifier = Arc::new(RecordingNotifier::default());

    let ctx = AppContext::new(Dependencies {
        stores: Stores::memory(),
        catalog: catalog.clone(),
        rates: rates.clone(),
        clock: clock.clone(),
        notifier: notifier.clone(),
        metrics: Arc::new(Metrics::new().unwrap()),
        escalation: EscalationConfig::default(),
    })
    .await
    .unwrap();

    World {
        ctx,
        clock,
        catalog,
        rates,
        notifier,
        partner_id,
        hotel_id,
        room_id,
        restaurant_id,
        shop_id,
        shirt_id,
    }
}

impl World {
    pub fn partner(&self) -> Actor {
        Actor::Partner(self.partner_id)
    }

    /// Put one shirt in the user's cart and check out.
    pub async fn order_shirt(&self, user_id: Uuid) -> Order {
        self.ctx
            .carts
            .add_line(
                &CartOwner::User(user_id),
                AddLineRequest::new(self.shirt_id, 1)
                    .variant(Some("M"), Some("blue"))
                    .deliver_to(address()),
            )
            .await
            .unwrap();
        self.checkout(user_id).await
    }

    pub async fn checkout(&self, user_id: Uuid) -> Order {
        self.ctx
            .orders
            .create(CheckoutRequest {
                user_id,
                cart_id: None,
                payment_method: PaymentMethod::Card,
                note: None,
                delivery_address: None,
            })
            .await
            .unwrap()
    }

    /// Accept and walk the order all the way to delivered.
    pub async fn deliver(&self, order_id: Uuid) -> Order {
        self.ctx
            .orders
            .partner_respond(order_id, self.partner_id, true)
            .await
            .unwrap();
        let mut order = None;
        for to in [OrderStatus::Processing, OrderStatus::OutForDelivery, OrderStatus::Delivered] {
            order = Some(self.ctx.orders.update_status(order_id, to, self.partner()).await.unwrap());
        }
        order.unwrap()
    }
}
