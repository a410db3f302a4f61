//! Customer account rows: profile, addresses, saved items, appointments and orders.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use apothecary_core::{
    AddressId, AppointmentId, AppointmentKind, AppointmentStatus, OrderId, OrderStatus, Price,
    ProductId, SavedItemId, UserId,
};

use super::catalog::Product;

/// A user's profile, keyed by the identity provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Identity data written on every sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSeed {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Fields the user edits on the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// A shipping address.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: String,
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Single-line rendering for lists.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2);
        }
        parts.extend([
            self.city.as_str(),
            self.region.as_str(),
            self.postal_code.as_str(),
            self.country.as_str(),
        ]);
        parts.retain(|p| !p.is_empty());
        parts.join(", ")
    }
}

/// Fields for creating or updating an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInput {
    pub label: String,
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
}

impl AddressInput {
    /// First missing required field, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("recipient", &self.recipient),
            ("line1", &self.line1),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// A saved product joined with the product row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SavedItem {
    #[sqlx(rename = "saved_id")]
    pub id: SavedItemId,
    pub saved_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub product: Product,
}

/// A booked pharmacy appointment.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Appointment {
    pub id: AppointmentId,
    pub user_id: UserId,
    pub kind: AppointmentKind,
    pub scheduled_for: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    #[must_use]
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.status == AppointmentStatus::Scheduled && self.scheduled_for > now
    }

    #[must_use]
    pub fn when(&self) -> String {
        self.scheduled_for.format("%a %d %b %Y, %H:%M").to_string()
    }
}

/// Booking form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub kind: AppointmentKind,
    pub scheduled_for: DateTime<Utc>,
    pub notes: Option<String>,
}

/// An order recorded when a signed-in user is handed off to the payment page.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Human-facing reference, `ORD-` followed by 8 hex digits.
    pub reference: String,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i32,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_link: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::usd(self.total)
    }

    #[must_use]
    pub fn placed_on(&self) -> String {
        self.created_at.format("%d %b %Y").to_string()
    }
}

/// Data for a pending checkout handoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub total: Decimal,
    pub payment_link: String,
}

/// Generate an order reference such as `ORD-3FA81C09`.
#[must_use]
pub fn order_reference() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    let hex: String = raw.chars().take(8).collect();
    format!("ORD-{}", hex.to_uppercase())
}
