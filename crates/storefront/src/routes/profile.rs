//! Profile route handlers.
//!
//! These routes require authentication. Writes follow post/redirect/get and
//! report the outcome with a toast; a failed store call shows a generic
//! error toast rather than an error page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use apothecary_core::{AddressId, AppointmentId, AppointmentKind, ProductId};

use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{
    Address, AddressInput, Appointment, CurrentUser, NewAppointment, Order, ProfileUpdate,
    SavedItem, Toast, UserProfile,
};
use crate::routes::forms::{checked, non_empty, redirect_with_toast};
use crate::routes::views::{ProductCard, product_cards};
use crate::session_state::{self, PageContext};
use crate::state::AppState;

/// Orders shown on the overview.
const RECENT_ORDERS: usize = 3;

/// Toast for a store call that came back empty.
const SAVE_FAILED: &str = "We could not save your changes. Please try again.";

// =============================================================================
// Overview
// =============================================================================

/// Profile overview and edit form.
#[derive(Template, WebTemplate)]
#[template(path = "profile/index.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub user: CurrentUser,
    pub profile: Option<UserProfile>,
    pub date_of_birth: String,
    pub default_address: Option<Address>,
    pub upcoming: Vec<Appointment>,
    pub recent_orders: Vec<Order>,
}

/// Display the profile overview.
///
/// A profile that cannot be loaded in time renders the page without the
/// edit form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: PageContext,
) -> impl IntoResponse {
    let profiles = state.profiles();
    let (profile, addresses, appointments, mut orders) = tokio::join!(
        profiles.fetch_profile(user.id),
        profiles.addresses(user.id),
        profiles.appointments(user.id),
        profiles.orders(user.id),
    );

    let now = Utc::now();
    orders.truncate(RECENT_ORDERS);

    ProfileTemplate {
        ctx,
        date_of_birth: profile
            .as_ref()
            .and_then(|p| p.date_of_birth)
            .map(|d| d.to_string())
            .unwrap_or_default(),
        profile,
        default_address: addresses.into_iter().find(|a| a.is_default),
        upcoming: appointments
            .into_iter()
            .filter(|a| a.is_upcoming(now))
            .collect(),
        recent_orders: orders,
        user,
    }
}

/// Profile edit form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
}

impl ProfileForm {
    /// `None` when the date of birth is present but not `YYYY-MM-DD`.
    fn into_update(self) -> Option<ProfileUpdate> {
        let date_of_birth = match non_empty(self.date_of_birth) {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok()?),
            None => None,
        };
        Some(ProfileUpdate {
            full_name: non_empty(self.full_name),
            phone: non_empty(self.phone),
            date_of_birth,
        })
    }
}

/// Save profile changes.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    RequireAuth(mut user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Response {
    let Some(update) = form.into_update() else {
        let toast = Toast::error("Please enter your date of birth as YYYY-MM-DD.");
        return redirect_with_toast(&session, toast, "/profile").await;
    };

    let Some(profile) = state.profiles().update_profile(user.id, &update).await else {
        return redirect_with_toast(&session, Toast::error(SAVE_FAILED), "/profile").await;
    };

    // Keep the header greeting in step with the new name
    user.display_name = profile.display_name().to_string();
    if let Err(e) = session_state::set_current_user(&session, &user).await {
        tracing::warn!(error = %e, "Failed to refresh session user");
    }

    redirect_with_toast(&session, Toast::success("Profile updated"), "/profile").await
}

// =============================================================================
// Addresses
// =============================================================================

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/addresses.html")]
pub struct AddressesTemplate {
    pub ctx: PageContext,
    pub addresses: Vec<AddressView>,
    pub blank: AddressFormValues,
}

/// Address fields as shown in a form.
#[derive(Debug, Clone, Default)]
pub struct AddressFormValues {
    pub label: String,
    pub recipient: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub is_default: bool,
}

impl From<&Address> for AddressFormValues {
    fn from(address: &Address) -> Self {
        Self {
            label: address.label.clone(),
            recipient: address.recipient.clone(),
            line1: address.line1.clone(),
            line2: address.line2.clone().unwrap_or_default(),
            city: address.city.clone(),
            region: address.region.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            phone: address.phone.clone().unwrap_or_default(),
            is_default: address.is_default,
        }
    }
}

/// A saved address with its edit form values.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub address: Address,
    pub values: AddressFormValues,
}

/// Address form data.
#[derive(Debug, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub label: String,
    pub recipient: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub region: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: Option<String>,
}

impl From<AddressForm> for AddressInput {
    fn from(form: AddressForm) -> Self {
        let label = form.label.trim();
        Self {
            label: if label.is_empty() { "Home" } else { label }.to_string(),
            recipient: form.recipient.trim().to_string(),
            line1: form.line1.trim().to_string(),
            line2: non_empty(form.line2),
            city: form.city.trim().to_string(),
            region: form.region.trim().to_string(),
            postal_code: form.postal_code.trim().to_string(),
            country: form.country.trim().to_string(),
            phone: non_empty(form.phone),
            is_default: checked(form.is_default.as_deref()),
        }
    }
}

/// List saved addresses with an add form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn addresses(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: PageContext,
) -> impl IntoResponse {
    let addresses = state.profiles().addresses(user.id).await;
    AddressesTemplate {
        ctx,
        blank: AddressFormValues {
            is_default: addresses.is_empty(),
            ..AddressFormValues::default()
        },
        addresses: addresses
            .into_iter()
            .map(|address| AddressView {
                values: AddressFormValues::from(&address),
                address,
            })
            .collect(),
    }
}

/// Add an address.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_address(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddressForm>,
) -> Response {
    let input = AddressInput::from(form);
    if let Some(field) = input.missing_field() {
        let toast = Toast::error(format!("Please fill in {}.", field.replace('_', " ")));
        return redirect_with_toast(&session, toast, "/profile/addresses").await;
    }

    let toast = match state.profiles().create_address(user.id, &input).await {
        Some(_) => Toast::success("Address added"),
        None => Toast::error(SAVE_FAILED),
    };
    redirect_with_toast(&session, toast, "/profile/addresses").await
}

/// Update an address.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn update_address(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<AddressId>,
    session: Session,
    Form(form): Form<AddressForm>,
) -> Response {
    let input = AddressInput::from(form);
    if let Some(field) = input.missing_field() {
        let toast = Toast::error(format!("Please fill in {}.", field.replace('_', " ")));
        return redirect_with_toast(&session, toast, "/profile/addresses").await;
    }

    let toast = match state.profiles().update_address(user.id, id, &input).await {
        Some(_) => Toast::success("Address updated"),
        None => Toast::error(SAVE_FAILED),
    };
    redirect_with_toast(&session, toast, "/profile/addresses").await
}

/// Delete an address.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn delete_address(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<AddressId>,
    session: Session,
) -> Response {
    let toast = if state.profiles().delete_address(user.id, id).await {
        Toast::success("Address removed")
    } else {
        Toast::error(SAVE_FAILED)
    };
    redirect_with_toast(&session, toast, "/profile/addresses").await
}

/// Make an address the default.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn set_default_address(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<AddressId>,
    session: Session,
) -> Response {
    let toast = if state.profiles().set_default_address(user.id, id).await {
        Toast::success("Default address updated")
    } else {
        Toast::error(SAVE_FAILED)
    };
    redirect_with_toast(&session, toast, "/profile/addresses").await
}

// =============================================================================
// Saved items
// =============================================================================

/// Saved items template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/saved.html")]
pub struct SavedTemplate {
    pub ctx: PageContext,
    pub items: Vec<SavedItemView>,
}

/// A saved product with when it was saved.
#[derive(Debug, Clone)]
pub struct SavedItemView {
    pub card: ProductCard,
    pub saved_on: String,
}

/// Display saved products, most recent first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn saved(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> impl IntoResponse {
    let saved: Vec<SavedItem> = state.profiles().saved_items(user.id).await;
    let wishlist = session_state::wishlist(&session).await;
    let products: Vec<_> = saved.iter().map(|s| s.product.clone()).collect();

    SavedTemplate {
        ctx,
        items: product_cards(&products, &wishlist)
            .into_iter()
            .zip(&saved)
            .map(|(card, item)| SavedItemView {
                card,
                saved_on: item.saved_at.format("%d %b %Y").to_string(),
            })
            .collect(),
    }
}

/// Remove a saved product, and from the session wishlist too.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %product_id))]
pub async fn remove_saved(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    session: Session,
) -> Response {
    let removed = state.profiles().remove_saved_item(user.id, product_id).await;
    if let Err(e) = session_state::remove_from_wishlist(&session, product_id).await {
        tracing::warn!(error = %e, "Failed to update session wishlist");
    }

    let toast = if removed {
        Toast::success("Removed from saved items")
    } else {
        Toast::error(SAVE_FAILED)
    };
    redirect_with_toast(&session, toast, "/profile/saved").await
}

// =============================================================================
// Appointments
// =============================================================================

/// Appointment kind option for the booking form.
#[derive(Debug, Clone)]
pub struct KindOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Appointments template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/appointments.html")]
pub struct AppointmentsTemplate {
    pub ctx: PageContext,
    pub upcoming: Vec<Appointment>,
    pub past: Vec<Appointment>,
    pub kinds: Vec<KindOption>,
    pub min_date: String,
}

/// Booking form data. Date and time are the visitor's wall clock, stored as UTC.
#[derive(Debug, Deserialize)]
pub struct AppointmentForm {
    pub kind: String,
    pub date: String,
    pub time: String,
    pub notes: Option<String>,
}

impl AppointmentForm {
    fn into_new(self) -> Option<NewAppointment> {
        let kind = self.kind.parse::<AppointmentKind>().ok()?;
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(self.time.trim(), "%H:%M").ok()?;
        Some(NewAppointment {
            kind,
            scheduled_for: date.and_time(time).and_utc(),
            notes: non_empty(self.notes),
        })
    }
}

/// Display upcoming and past appointments with a booking form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn appointments(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: PageContext,
) -> impl IntoResponse {
    let now = Utc::now();
    let (upcoming, past) = state
        .profiles()
        .appointments(user.id)
        .await
        .into_iter()
        .partition(|a| a.is_upcoming(now));

    AppointmentsTemplate {
        ctx,
        upcoming,
        past,
        kinds: AppointmentKind::ALL
            .iter()
            .map(|k| KindOption {
                value: k.as_str(),
                label: k.label(),
            })
            .collect(),
        min_date: now.date_naive().to_string(),
    }
}

/// Book an appointment.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn book_appointment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AppointmentForm>,
) -> Response {
    let Some(input) = form.into_new() else {
        let toast = Toast::error("Please choose a service, date and time.");
        return redirect_with_toast(&session, toast, "/profile/appointments").await;
    };
    if input.scheduled_for <= Utc::now() {
        let toast = Toast::error("Please choose a time in the future.");
        return redirect_with_toast(&session, toast, "/profile/appointments").await;
    }

    let toast = match state.profiles().book_appointment(user.id, &input).await {
        Some(appointment) => Toast::success(format!(
            "{} booked for {}",
            appointment.kind.label(),
            appointment.when()
        )),
        None => Toast::error(SAVE_FAILED),
    };
    redirect_with_toast(&session, toast, "/profile/appointments").await
}

/// Cancel an appointment.
#[instrument(skip_all, fields(user_id = %user.id, appointment_id = %id))]
pub async fn cancel_appointment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<AppointmentId>,
    session: Session,
) -> Response {
    let toast = if state.profiles().cancel_appointment(user.id, id).await {
        Toast::success("Appointment cancelled")
    } else {
        Toast::error(SAVE_FAILED)
    };
    redirect_with_toast(&session, toast, "/profile/appointments").await
}

// =============================================================================
// Orders
// =============================================================================

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<Order>,
}

/// Display order history, newest first.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: PageContext,
) -> impl IntoResponse {
    OrdersTemplate {
        ctx,
        orders: state.profiles().orders(user.id).await,
    }
}
