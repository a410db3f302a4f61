//! Account stores: profiles, addresses, saved items, appointments and orders.
//!
//! Every per-user query is scoped by `user_id`, so a guessed row id never
//! reaches another user's data.

use async_trait::async_trait;

use apothecary_core::{AddressId, AppointmentId, AppointmentStatus, OrderId, ProductId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::account::order_reference;
use crate::models::{
    Address, AddressInput, Appointment, NewAppointment, NewOrder, Order, ProfileSeed,
    ProfileUpdate, SavedItem, UserProfile,
};

const PROFILE_COLUMNS: &str =
    "id, email, full_name, phone, date_of_birth, avatar_url, is_admin, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, user_id, label, recipient, line1, line2, city, region, \
     postal_code, country, phone, is_default, created_at";

const APPOINTMENT_COLUMNS: &str = "id, user_id, kind, scheduled_for, notes, status, created_at";

const ORDER_COLUMNS: &str = "id, user_id, reference, product_id, product_name, quantity, total, \
     status, payment_link, created_at";

/// Profile persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError>;

    /// Create the profile on first sign-in, refresh email and avatar afterwards.
    /// A name the user already edited is kept.
    async fn upsert_profile(&self, seed: &ProfileSeed) -> Result<UserProfile, RepositoryError>;

    /// # Errors
    ///
    /// `NotFound` when the profile does not exist.
    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, RepositoryError>;

    /// Set the admin flag on every profile with this email (case-insensitive).
    /// Returns the number of profiles changed.
    async fn set_admin_by_email(&self, email: &str, is_admin: bool)
    -> Result<u64, RepositoryError>;

    async fn count_profiles(&self) -> Result<i64, RepositoryError>;
}

/// Address persistence. At most one address per user is the default.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// The default address first, then newest first.
    async fn list_addresses(&self, user: UserId) -> Result<Vec<Address>, RepositoryError>;

    async fn get_address(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError>;

    /// A user's first address always becomes the default.
    async fn create_address(
        &self,
        user: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError>;

    async fn update_address(
        &self,
        user: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError>;

    /// Deleting the default promotes the newest remaining address.
    async fn delete_address(&self, user: UserId, id: AddressId) -> Result<bool, RepositoryError>;

    async fn set_default_address(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError>;
}

/// Saved product persistence.
#[async_trait]
pub trait SavedItemStore: Send + Sync {
    /// Saved products, most recently saved first.
    async fn list_saved_items(&self, user: UserId) -> Result<Vec<SavedItem>, RepositoryError>;

    /// Idempotent. Returns `true` when a new row was written.
    async fn add_saved_item(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError>;

    /// Save several products at once, skipping unknown and already saved ones.
    /// Rows are written in slice order, so the last entry lists first.
    /// Returns the number of rows written.
    async fn add_saved_items(
        &self,
        user: UserId,
        products: &[ProductId],
    ) -> Result<u64, RepositoryError>;

    async fn remove_saved_item(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError>;

    async fn is_saved(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError>;
}

/// Appointment persistence.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Upcoming scheduled appointments first (soonest first), then the rest.
    async fn list_appointments(&self, user: UserId) -> Result<Vec<Appointment>, RepositoryError>;

    async fn create_appointment(
        &self,
        user: UserId,
        input: &NewAppointment,
    ) -> Result<Appointment, RepositoryError>;

    /// Cancel a scheduled appointment owned by `user`. Returns `false` for
    /// unknown, foreign, or no longer scheduled appointments.
    async fn cancel_appointment(
        &self,
        user: UserId,
        id: AppointmentId,
    ) -> Result<bool, RepositoryError>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Newest first.
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError>;

    async fn get_order(&self, user: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Record a pending order with a fresh `ORD-` reference.
    async fn create_pending_order(
        &self,
        user: UserId,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError>;

    async fn count_orders(&self) -> Result<i64, RepositoryError>;
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM apothecary.profile WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn upsert_profile(&self, seed: &ProfileSeed) -> Result<UserProfile, RepositoryError> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "INSERT INTO apothecary.profile (id, email, full_name, avatar_url) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET \
                 email = EXCLUDED.email, \
                 full_name = COALESCE(apothecary.profile.full_name, EXCLUDED.full_name), \
                 avatar_url = COALESCE(EXCLUDED.avatar_url, apothecary.profile.avatar_url), \
                 updated_at = now() \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(seed.id)
        .bind(&seed.email)
        .bind(&seed.full_name)
        .bind(&seed.avatar_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, RepositoryError> {
        sqlx::query_as::<_, UserProfile>(&format!(
            "UPDATE apothecary.profile \
             SET full_name = $2, phone = $3, date_of_birth = $4, updated_at = now() \
             WHERE id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.full_name)
        .bind(&update.phone)
        .bind(update.date_of_birth)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn set_admin_by_email(
        &self,
        email: &str,
        is_admin: bool,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE apothecary.profile SET is_admin = $2, updated_at = now() \
             WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .bind(is_admin)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_profiles(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM apothecary.profile")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl AddressStore for PgStore {
    async fn list_addresses(&self, user: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM apothecary.address \
             WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC, id DESC"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(addresses)
    }

    async fn get_address(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM apothecary.address WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }

    async fn create_address(
        &self,
        user: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM apothecary.address WHERE user_id = $1",
        )
        .bind(user)
        .fetch_one(&mut *tx)
        .await?;
        let make_default = input.is_default || existing == 0;

        if make_default {
            sqlx::query("UPDATE apothecary.address SET is_default = FALSE WHERE user_id = $1")
                .bind(user)
                .execute(&mut *tx)
                .await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            "INSERT INTO apothecary.address \
                 (user_id, label, recipient, line1, line2, city, region, postal_code, country, \
                  phone, is_default) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user)
        .bind(&input.label)
        .bind(&input.recipient)
        .bind(&input.line1)
        .bind(&input.line2)
        .bind(&input.city)
        .bind(&input.region)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(&input.phone)
        .bind(make_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }

    async fn update_address(
        &self,
        user: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            sqlx::query(
                "UPDATE apothecary.address SET is_default = FALSE \
                 WHERE user_id = $1 AND id <> $2",
            )
            .bind(user)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        // Unticking "default" on the current default keeps it; a user with
        // addresses always has exactly one.
        let address = sqlx::query_as::<_, Address>(&format!(
            "UPDATE apothecary.address SET \
                 label = $3, recipient = $4, line1 = $5, line2 = $6, city = $7, region = $8, \
                 postal_code = $9, country = $10, phone = $11, is_default = is_default OR $12 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user)
        .bind(&input.label)
        .bind(&input.recipient)
        .bind(&input.line1)
        .bind(&input.line2)
        .bind(&input.city)
        .bind(&input.region)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(&input.phone)
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(address)
    }

    async fn delete_address(&self, user: UserId, id: AddressId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let Some(was_default) = sqlx::query_scalar::<_, bool>(
            "DELETE FROM apothecary.address WHERE id = $1 AND user_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(user)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(false);
        };

        if was_default {
            sqlx::query(
                "UPDATE apothecary.address SET is_default = TRUE WHERE id = ( \
                     SELECT id FROM apothecary.address WHERE user_id = $1 \
                     ORDER BY created_at DESC, id DESC LIMIT 1)",
            )
            .bind(user)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn set_default_address(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM apothecary.address WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user)
        .fetch_one(&mut *tx)
        .await?;
        if !owned {
            return Ok(false);
        }

        sqlx::query("UPDATE apothecary.address SET is_default = FALSE WHERE user_id = $1")
            .bind(user)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE apothecary.address SET is_default = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl SavedItemStore for PgStore {
    async fn list_saved_items(&self, user: UserId) -> Result<Vec<SavedItem>, RepositoryError> {
        let items = sqlx::query_as::<_, SavedItem>(
            "SELECT s.id AS saved_id, s.created_at AS saved_at, \
                    p.id, p.category_id, p.name, p.slug, p.description, p.price, p.sale_price, \
                    p.image_url, p.stock, p.is_featured, p.requires_prescription, \
                    p.payment_link, p.created_at, p.updated_at \
             FROM apothecary.saved_item s \
             JOIN apothecary.product p ON p.id = s.product_id \
             WHERE s.user_id = $1 \
             ORDER BY s.created_at DESC, s.id DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn add_saved_item(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO apothecary.saved_item (user_id, product_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(user)
        .bind(product)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_saved_items(
        &self,
        user: UserId,
        products: &[ProductId],
    ) -> Result<u64, RepositoryError> {
        if products.is_empty() {
            return Ok(0);
        }
        let raw: Vec<i32> = products.iter().map(ProductId::as_i32).collect();
        let result = sqlx::query(
            "INSERT INTO apothecary.saved_item (user_id, product_id) \
             SELECT $1, p.id \
             FROM unnest($2::int4[]) WITH ORDINALITY AS w(product_id, ord) \
             JOIN apothecary.product p ON p.id = w.product_id \
             ORDER BY w.ord \
             ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(user)
        .bind(raw)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn remove_saved_item(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM apothecary.saved_item WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user)
        .bind(product)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_saved(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        let saved = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM apothecary.saved_item \
                            WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user)
        .bind(product)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}

#[async_trait]
impl AppointmentStore for PgStore {
    async fn list_appointments(&self, user: UserId) -> Result<Vec<Appointment>, RepositoryError> {
        let appointments = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM apothecary.appointment \
             WHERE user_id = $1 \
             ORDER BY (status = $2 AND scheduled_for >= now()) DESC, \
                      CASE WHEN status = $2 AND scheduled_for >= now() \
                           THEN scheduled_for END ASC, \
                      scheduled_for DESC"
        ))
        .bind(user)
        .bind(AppointmentStatus::Scheduled)
        .fetch_all(&self.pool)
        .await?;
        Ok(appointments)
    }

    async fn create_appointment(
        &self,
        user: UserId,
        input: &NewAppointment,
    ) -> Result<Appointment, RepositoryError> {
        let appointment = sqlx::query_as::<_, Appointment>(&format!(
            "INSERT INTO apothecary.appointment (user_id, kind, scheduled_for, notes, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(user)
        .bind(input.kind)
        .bind(input.scheduled_for)
        .bind(&input.notes)
        .bind(AppointmentStatus::Scheduled)
        .fetch_one(&self.pool)
        .await?;
        Ok(appointment)
    }

    async fn cancel_appointment(
        &self,
        user: UserId,
        id: AppointmentId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE apothecary.appointment SET status = $3 \
             WHERE id = $1 AND user_id = $2 AND status = $4",
        )
        .bind(id)
        .bind(user)
        .bind(AppointmentStatus::Cancelled)
        .bind(AppointmentStatus::Scheduled)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM apothecary.\"order\" \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn get_order(&self, user: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM apothecary.\"order\" WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    async fn create_pending_order(
        &self,
        user: UserId,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO apothecary.\"order\" \
                 (user_id, reference, product_id, product_name, quantity, total, status, \
                  payment_link) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user)
        .bind(order_reference())
        .bind(order.product_id)
        .bind(&order.product_name)
        .bind(order.quantity)
        .bind(order.total)
        .bind(apothecary_core::OrderStatus::Pending)
        .bind(&order.payment_link)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "order reference collision"))
    }

    async fn count_orders(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM apothecary.\"order\"")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
