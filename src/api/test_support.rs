use chrono::{NaiveTime, TimeZone, Utc, Weekday};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::app::{AppContext, Dependencies, Stores};
use crate::clock::FixedClock;
use crate::domain::catalog::{
    Business, BusinessType, CatalogItem, Category, InMemoryCatalog, ItemKind, OperatingHours, SettingsRateProvider,
    Variant,
};
use crate::metrics::Metrics;
use crate::notifications::{Notification, Notifier};
use crate::scheduler::EscalationConfig;

struct Silent;

impl Notifier for Silent {
    fn notify(&self, _notification: Notification) {}
}

pub(crate) struct Seed {
    pub partner_id: Uuid,
    pub restaurant_id: Uuid,
    pub shop_id: Uuid,
    pub pasta_id: Uuid,
    pub shirt_id: Uuid,
}

impl Seed {
    pub fn address_json(&self) -> Value {
        json!({
            "recipient": "Sam",
            "line1": "4 Harbour Way",
            "city": "Porto",
            "postal_code": "4000",
            "country": "PT"
        })
    }
}

/// One partner running a restaurant (reservations on, open daily 09-22)
/// and a shop, over in-memory stores.
pub(crate) async fn seeded_context() -> (AppContext, Seed) {
    let partner_id = Uuid::new_v4();
    let restaurant_id = Uuid::new_v4();
    let shop_id = Uuid::new_v4();
    let food_category = Uuid::new_v4();
    let apparel_category = Uuid::new_v4();
    let pasta_id = Uuid::new_v4();
    let shirt_id = Uuid::new_v4();

    let catalog = InMemoryCatalog::new();
    catalog.add_partner(partner_id).await;

    let daily = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
    .into_iter()
    .map(|weekday| OperatingHours {
        weekday,
        opens_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        closes_at: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
    })
    .collect();

    catalog
        .put_business(Business {
            id: restaurant_id,
            partner_id,
            name: "Osteria".into(),
            business_type: BusinessType::Restaurant,
            reservations_enabled: true,
            operating_hours: daily,
        })
        .await;
    catalog
        .put_business(Business {
            id: shop_id,
            partner_id,
            name: "Outfitters".into(),
            business_type: BusinessType::Shop,
            reservations_enabled: false,
            operating_hours: Vec::new(),
        })
        .await;
    for (id, name) in [(food_category, "Mains"), (apparel_category, "Apparel")] {
        catalog
            .put_category(Category {
                id,
                name: name.into(),
                tax_rate: Decimal::from(10),
                inherits_tax: false,
                parent_id: None,
            })
            .await;
    }
    catalog
        .put_item(CatalogItem {
            id: pasta_id,
            business_id: restaurant_id,
            name: "Tagliatelle".into(),
            kind: ItemKind::Food,
            category_id: food_category,
            base_price: Decimal::from(12),
            delivery_charge: Decimal::from(3),
            variants: Vec::new(),
            max_guests: None,
        })
        .await;
    catalog
        .put_item(CatalogItem {
            id: shirt_id,
            business_id: shop_id,
            name: "Linen shirt".into(),
            kind: ItemKind::Product,
            category_id: apparel_category,
            base_price: Decimal::ZERO,
            delivery_charge: Decimal::from(4),
            variants: vec![Variant {
                size: Some("L".into()),
                color: Some("white".into()),
                price: Decimal::from(40),
            }],
            max_guests: None,
        })
        .await;

    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
    let ctx = AppContext::new(Dependencies {
        stores: Stores::memory(),
        catalog: Arc::new(catalog),
        rates: Arc::new(SettingsRateProvider::new(Decimal::from(5))),
        clock,
        notifier: Arc::new(Silent),
        metrics: Arc::new(Metrics::new().unwrap()),
        escalation: EscalationConfig::default(),
    })
    .await
    .unwrap();

    (
        ctx,
        Seed {
            partner_id,
            restaurant_id,
            shop_id,
            pasta_id,
            shirt_id,
        },
    )
}
