use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Food,
    Room,
    Product,
}

impl ItemKind {
    /// Food and products are shipped; rooms are not.
    pub fn needs_delivery(self) -> bool {
        !matches!(self, ItemKind::Room)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Restaurant,
    Hotel,
    Shop,
}

impl BusinessType {
    pub fn as_str(self) -> &'static str {
        match self {
            BusinessType::Restaurant => "restaurant",
            BusinessType::Hotel => "hotel",
            BusinessType::Shop => "shop",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub size: Option<String>,
    pub color: Option<String>,
    pub price: Decimal,
}

impl Variant {
    pub fn matches(&self, size: Option<&str>, color: Option<&str>) -> bool {
        self.size.as_deref() == size && self.color.as_deref() == color
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub kind: ItemKind,
    pub category_id: Uuid,
    /// Dish price for food, nightly rate for rooms. Unused for products.
    #[serde(default)]
    pub base_price: Decimal,
    #[serde(default)]
    pub delivery_charge: Decimal,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub max_guests: Option<u32>,
}

impl CatalogItem {
    pub fn find_variant(&self, size: Option<&str>, color: Option<&str>) -> Option<&Variant> {
        self.variants.iter().find(|v| v.matches(size, color))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Percentage, e.g. 10 for 10%
    pub tax_rate: Decimal,
    /// When set, the parent's resolved rate applies instead of `tax_rate`
    #[serde(default)]
    pub inherits_tax: bool,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingHours {
    pub weekday: Weekday,
    pub opens_at: NaiveTime,
    /// Earlier than `opens_at` for windows that run past midnight
    pub closes_at: NaiveTime,
}

impl OperatingHours {
    fn overnight(&self) -> bool {
        self.closes_at <= self.opens_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub name: String,
    pub business_type: BusinessType,
    #[serde(default)]
    pub reservations_enabled: bool,
    #[serde(default)]
    pub operating_hours: Vec<OperatingHours>,
}

impl Business {
    /// Whether a business-local date-time falls inside an operating window.
    /// Windows are half open: the closing minute itself is outside.
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        let day = at.weekday();
        let time = at.time();

        self.operating_hours.iter().any(|hours| {
            if hours.overnight() {
                (hours.weekday == day && time >= hours.opens_at)
                    || (hours.weekday == day.pred() && time < hours.closes_at)
            } else {
                hours.weekday == day && time >= hours.opens_at && time < hours.closes_at
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn business(hours: Vec<OperatingHours>) -> Business {
        Business {
            id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            name: "Trattoria".into(),
            business_type: BusinessType::Restaurant,
            reservations_enabled: true,
            operating_hours: hours,
        }
    }

    fn hours(weekday: Weekday, open: u32, close: u32) -> OperatingHours {
        OperatingHours {
            weekday,
            opens_at: NaiveTime::from_hms_opt(open, 0, 0).unwrap(),
            closes_at: NaiveTime::from_hms_opt(close, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_open_within_daytime_window() {
        // 2024-01-05 is a Friday
        let b = business(vec![hours(Weekday::Fri, 9, 22)]);

        assert!(b.is_open_at(at(2024, 1, 5, 9, 0)));
        assert!(b.is_open_at(at(2024, 1, 5, 19, 30)));
        assert!(!b.is_open_at(at(2024, 1, 5, 22, 0)));
        assert!(!b.is_open_at(at(2024, 1, 5, 8, 59)));
        assert!(!b.is_open_at(at(2024, 1, 6, 12, 0)));
    }

    #[test]
    fn test_overnight_window_spills_into_next_day() {
        let b = business(vec![hours(Weekday::Fri, 18, 2)]);

        assert!(b.is_open_at(at(2024, 1, 5, 23, 0)));
        assert!(b.is_open_at(at(2024, 1, 6, 1, 30)));
        assert!(!b.is_open_at(at(2024, 1, 6, 2, 0)));
        assert!(!b.is_open_at(at(2024, 1, 5, 1, 0)));
    }

    #[test]
    fn test_variant_match_requires_both_fields() {
        let v = Variant {
            size: Some("M".into()),
            color: Some("red".into()),
            price: Decimal::new(2500, 2),
        };

        assert!(v.matches(Some("M"), Some("red")));
        assert!(!v.matches(Some("M"), None));
        assert!(!v.matches(Some("L"), Some("red")));
    }

    #[test]
    fn test_item_kind_serialization() {
        let json = serde_json::to_string(&ItemKind::Room).unwrap();
        assert_eq!(json, "\"room\"");
    }
}
