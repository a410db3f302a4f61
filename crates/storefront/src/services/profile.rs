//! Profile service: the signed-in user's account data.

use std::time::Duration;

use chrono::Utc;
use tracing::instrument;

use apothecary_core::{AddressId, AppointmentId, OrderId, ProductId, UserId};

use super::OrLog;
use crate::db::{AddressStore, AppointmentStore, OrderStore, ProfileStore, SavedItemStore};
use crate::models::{
    Address, AddressInput, Appointment, NewAppointment, NewOrder, Order, Product, ProfileSeed,
    ProfileUpdate, SavedItem, UserProfile, Wishlist,
};

/// Account operations for one store.
///
/// Each `impl` block only needs the store traits it touches, so a handler
/// that lists addresses does not need a full [`crate::db::Store`].
pub struct ProfileService<'a, S: ?Sized> {
    store: &'a S,
    fetch_timeout: Duration,
}

impl<'a, S: ?Sized> ProfileService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, fetch_timeout: Duration) -> Self {
        Self {
            store,
            fetch_timeout,
        }
    }
}

// =============================================================================
// Profile
// =============================================================================

impl<S: ProfileStore + ?Sized> ProfileService<'_, S> {
    /// Load a profile, giving up after the configured timeout.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn fetch_profile(&self, id: UserId) -> Option<UserProfile> {
        match tokio::time::timeout(self.fetch_timeout, self.store.get_profile(id)).await {
            Ok(result) => result.or_log("profile", "get").flatten(),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.fetch_timeout.as_millis(),
                    "Profile fetch timed out"
                );
                None
            }
        }
    }

    /// Create or refresh the profile after a sign-in.
    #[instrument(skip(self, seed), fields(user_id = %seed.id))]
    pub async fn sync_profile(&self, seed: &ProfileSeed) -> Option<UserProfile> {
        self.store
            .upsert_profile(seed)
            .await
            .or_log("profile", "upsert")
    }

    #[instrument(skip(self, update), fields(user_id = %id))]
    pub async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> Option<UserProfile> {
        if update
            .date_of_birth
            .is_some_and(|dob| dob > Utc::now().date_naive())
        {
            tracing::warn!("Rejected date of birth in the future");
            return None;
        }
        self.store
            .update_profile(id, update)
            .await
            .or_log("profile", "update")
    }

    pub async fn count_profiles(&self) -> i64 {
        self.store
            .count_profiles()
            .await
            .or_log("profile", "count")
            .unwrap_or_default()
    }
}

// =============================================================================
// Addresses
// =============================================================================

impl<S: AddressStore + ?Sized> ProfileService<'_, S> {
    pub async fn addresses(&self, user: UserId) -> Vec<Address> {
        self.store
            .list_addresses(user)
            .await
            .or_log("address", "list")
            .unwrap_or_default()
    }

    pub async fn address(&self, user: UserId, id: AddressId) -> Option<Address> {
        self.store
            .get_address(user, id)
            .await
            .or_log("address", "get")
            .flatten()
    }

    #[instrument(skip(self, input), fields(user_id = %user))]
    pub async fn create_address(&self, user: UserId, input: &AddressInput) -> Option<Address> {
        if let Some(field) = input.missing_field() {
            tracing::warn!(field, "Rejected address with missing field");
            return None;
        }
        self.store
            .create_address(user, input)
            .await
            .or_log("address", "create")
    }

    #[instrument(skip(self, input), fields(user_id = %user))]
    pub async fn update_address(
        &self,
        user: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Option<Address> {
        if let Some(field) = input.missing_field() {
            tracing::warn!(field, "Rejected address with missing field");
            return None;
        }
        self.store
            .update_address(user, id, input)
            .await
            .or_log("address", "update")
    }

    pub async fn delete_address(&self, user: UserId, id: AddressId) -> bool {
        self.store
            .delete_address(user, id)
            .await
            .or_log("address", "delete")
            .unwrap_or(false)
    }

    pub async fn set_default_address(&self, user: UserId, id: AddressId) -> bool {
        self.store
            .set_default_address(user, id)
            .await
            .or_log("address", "set_default")
            .unwrap_or(false)
    }
}

// =============================================================================
// Saved items
// =============================================================================

impl<S: SavedItemStore + ?Sized> ProfileService<'_, S> {
    pub async fn saved_items(&self, user: UserId) -> Vec<SavedItem> {
        self.store
            .list_saved_items(user)
            .await
            .or_log("saved_item", "list")
            .unwrap_or_default()
    }

    pub async fn save_item(&self, user: UserId, product: ProductId) -> bool {
        self.store
            .add_saved_item(user, product)
            .await
            .or_log("saved_item", "add")
            .unwrap_or(false)
    }

    pub async fn remove_saved_item(&self, user: UserId, product: ProductId) -> bool {
        self.store
            .remove_saved_item(user, product)
            .await
            .or_log("saved_item", "remove")
            .unwrap_or(false)
    }

    pub async fn is_saved(&self, user: UserId, product: ProductId) -> bool {
        self.store
            .is_saved(user, product)
            .await
            .or_log("saved_item", "contains")
            .unwrap_or(false)
    }

    /// Copy a guest wishlist into the user's saved items.
    /// Returns the number of products newly saved.
    #[instrument(skip(self, wishlist), fields(user_id = %user, entries = wishlist.len()))]
    pub async fn merge_wishlist(&self, user: UserId, wishlist: &Wishlist) -> u64 {
        if wishlist.is_empty() {
            return 0;
        }
        self.store
            .add_saved_items(user, wishlist.oldest_first())
            .await
            .or_log("saved_item", "merge")
            .unwrap_or_default()
    }
}

// =============================================================================
// Appointments
// =============================================================================

impl<S: AppointmentStore + ?Sized> ProfileService<'_, S> {
    pub async fn appointments(&self, user: UserId) -> Vec<Appointment> {
        self.store
            .list_appointments(user)
            .await
            .or_log("appointment", "list")
            .unwrap_or_default()
    }

    #[instrument(skip(self, input), fields(user_id = %user, kind = input.kind.as_str()))]
    pub async fn book_appointment(
        &self,
        user: UserId,
        input: &NewAppointment,
    ) -> Option<Appointment> {
        if input.scheduled_for <= Utc::now() {
            tracing::warn!("Rejected appointment in the past");
            return None;
        }
        self.store
            .create_appointment(user, input)
            .await
            .or_log("appointment", "create")
    }

    pub async fn cancel_appointment(&self, user: UserId, id: AppointmentId) -> bool {
        self.store
            .cancel_appointment(user, id)
            .await
            .or_log("appointment", "cancel")
            .unwrap_or(false)
    }
}

// =============================================================================
// Orders
// =============================================================================

impl<S: OrderStore + ?Sized> ProfileService<'_, S> {
    pub async fn orders(&self, user: UserId) -> Vec<Order> {
        self.store
            .list_orders(user)
            .await
            .or_log("order", "list")
            .unwrap_or_default()
    }

    pub async fn order(&self, user: UserId, id: OrderId) -> Option<Order> {
        self.store
            .get_order(user, id)
            .await
            .or_log("order", "get")
            .flatten()
    }

    /// Record a pending order for a checkout handoff of one unit of `product`.
    ///
    /// Returns `None` when the product cannot be checked out or the insert fails;
    /// the caller still redirects to the payment page.
    #[instrument(skip(self, product), fields(user_id = %user, product_id = %product.id))]
    pub async fn record_checkout(&self, user: UserId, product: &Product) -> Option<Order> {
        let payment_link = product.payment_link.clone().filter(|_| product.can_checkout())?;
        let order = NewOrder {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: 1,
            total: product.effective_price().amount,
            payment_link,
        };
        let order = self
            .store
            .create_pending_order(user, &order)
            .await
            .or_log("order", "create_pending")?;
        tracing::info!(reference = %order.reference, "Recorded checkout handoff");
        Some(order)
    }

    pub async fn count_orders(&self) -> i64 {
        self.store
            .count_orders()
            .await
            .or_log("order", "count")
            .unwrap_or_default()
    }
}
