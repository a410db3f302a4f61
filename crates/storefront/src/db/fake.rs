//! In-memory store for service and handler tests.
//!
//! `fail` turns every call into a database error; `profile_delay` slows
//! profile lookups so timeouts can be exercised.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use apothecary_core::{
    AddressId, AppointmentId, AppointmentStatus, CategoryId, FeedbackId, OrderId, OrderStatus,
    ProductId, SavedItemId, SlideId, UserId,
};

use super::catalog::swapped_positions;
use super::{
    AddressStore, AppointmentStore, CarouselStore, CategoryStore, FeedbackStore, OrderStore,
    ProductStore, ProfileStore, RepositoryError, SavedItemStore, slug_or_fallback,
};
use crate::models::account::order_reference;
use crate::models::{
    Address, AddressInput, Appointment, CarouselSlide, Category, CategoryInput, Feedback,
    MoveDirection, NewAppointment, NewFeedback, NewOrder, Order, Product, ProductInput,
    ProductQuery, ProductSort, ProfileSeed, ProfileUpdate, SavedItem, SlideInput, UserProfile,
};

#[derive(Default)]
pub struct FakeData {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub slides: Vec<CarouselSlide>,
    pub profiles: Vec<UserProfile>,
    pub addresses: Vec<Address>,
    pub saved: Vec<(SavedItemId, UserId, ProductId, chrono::DateTime<Utc>)>,
    pub appointments: Vec<Appointment>,
    pub orders: Vec<Order>,
    pub feedback: Vec<Feedback>,
    next_id: i32,
}

impl FakeData {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub data: Mutex<FakeData>,
    pub fail: AtomicBool,
    pub calls: AtomicU64,
    pub profile_delay: Option<Duration>,
}

impl FakeStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub async fn insert_product(&self, product: Product) {
        let mut data = self.data.lock().await;
        data.next_id = data.next_id.max(product.id.as_i32());
        data.products.push(product);
    }

    pub async fn insert_profile(&self, profile: UserProfile) {
        self.data.lock().await.profiles.push(profile);
    }
}

fn matches_query(product: &Product, query: &ProductQuery) -> bool {
    if query.category_id.is_some() && product.category_id != query.category_id {
        return false;
    }
    query.search_term().is_none_or(|term| {
        let term = term.to_lowercase();
        product.name.to_lowercase().contains(&term)
            || product.description.to_lowercase().contains(&term)
    })
}

fn build_product(id: ProductId, input: &ProductInput, created_at: chrono::DateTime<Utc>) -> Product {
    Product {
        id,
        category_id: input.category_id,
        name: input.name.trim().to_string(),
        slug: slug_or_fallback(&input.name, "product"),
        description: input.description.clone(),
        price: input.price,
        sale_price: input.sale_price,
        image_url: input.image_url.clone(),
        stock: input.stock,
        is_featured: input.is_featured,
        requires_prescription: input.requires_prescription,
        payment_link: input.payment_link.clone(),
        created_at,
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl ProductStore for FakeStore {
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        let mut products: Vec<Product> = data
            .products
            .iter()
            .filter(|p| matches_query(p, query))
            .cloned()
            .collect();
        match query.sort {
            ProductSort::Newest => products.sort_by(|a, b| b.id.cmp(&a.id)),
            ProductSort::PriceAsc => {
                products.sort_by_key(|p| p.effective_price().amount);
            }
            ProductSort::PriceDesc => {
                products.sort_by_key(|p| std::cmp::Reverse(p.effective_price().amount));
            }
            ProductSort::Name => products.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        Ok(products.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_products(&self, query: &ProductQuery) -> Result<i64, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        let count = data.products.iter().filter(|p| matches_query(p, query)).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn featured_products(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .products
            .iter()
            .rev()
            .filter(|p| p.is_featured)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data.products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let slug = slug_or_fallback(&input.name, "product");
        if data.products.iter().any(|p| p.slug == slug) {
            return Err(RepositoryError::Conflict(
                "a product with this name already exists".to_string(),
            ));
        }
        let id = ProductId::new(data.next_id());
        let product = build_product(id, input, Utc::now());
        data.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let current = data
            .products
            .iter()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        let slug = if current.name == input.name.trim() {
            current.slug.clone()
        } else {
            slug_or_fallback(&input.name, "product")
        };
        if data.products.iter().any(|p| p.slug == slug && p.id != id) {
            return Err(RepositoryError::Conflict(
                "a product with this name already exists".to_string(),
            ));
        }
        let existing = data
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        *existing = Product {
            slug,
            ..build_product(id, input, existing.created_at)
        };
        Ok(existing.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let before = data.products.len();
        data.products.retain(|p| p.id != id);
        Ok(data.products.len() != before)
    }
}

#[async_trait]
impl CategoryStore for FakeStore {
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.check()?;
        let mut categories = self.data.lock().await.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let slug = slug_or_fallback(&input.name, "category");
        if data.categories.iter().any(|c| c.slug == slug) {
            return Err(RepositoryError::Conflict(
                "a category with this name already exists".to_string(),
            ));
        }
        let category = Category {
            id: CategoryId::new(data.next_id()),
            name: input.name.trim().to_string(),
            slug,
            description: input.description.clone(),
            image_url: input.image_url.clone(),
            created_at: Utc::now(),
        };
        data.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let category = data
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if category.name != input.name.trim() {
            category.name = input.name.trim().to_string();
            category.slug = slug_or_fallback(&input.name, "category");
        }
        category.description.clone_from(&input.description);
        category.image_url.clone_from(&input.image_url);
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let before = data.categories.len();
        data.categories.retain(|c| c.id != id);
        for product in &mut data.products {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }
        Ok(data.categories.len() != before)
    }
}

#[async_trait]
impl CarouselStore for FakeStore {
    async fn list_active_slides(&self) -> Result<Vec<CarouselSlide>, RepositoryError> {
        Ok(self
            .list_slides()
            .await?
            .into_iter()
            .filter(|s| s.is_active)
            .collect())
    }

    async fn list_slides(&self) -> Result<Vec<CarouselSlide>, RepositoryError> {
        self.check()?;
        let mut slides = self.data.lock().await.slides.clone();
        slides.sort_by_key(|s| (s.position, s.id));
        Ok(slides)
    }

    async fn get_slide(&self, id: SlideId) -> Result<Option<CarouselSlide>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data.slides.iter().find(|s| s.id == id).cloned())
    }

    async fn create_slide(&self, input: &SlideInput) -> Result<CarouselSlide, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let position = data.slides.iter().map(|s| s.position).max().unwrap_or(0) + 1;
        let slide = CarouselSlide {
            id: SlideId::new(data.next_id()),
            title: input.title.trim().to_string(),
            subtitle: input.subtitle.clone(),
            image_url: input.image_url.clone(),
            link_url: input.link_url.clone(),
            button_text: input.button_text.clone(),
            position,
            is_active: input.is_active,
            created_at: Utc::now(),
        };
        data.slides.push(slide.clone());
        Ok(slide)
    }

    async fn update_slide(
        &self,
        id: SlideId,
        input: &SlideInput,
    ) -> Result<CarouselSlide, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let slide = data
            .slides
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RepositoryError::NotFound)?;
        slide.title = input.title.trim().to_string();
        slide.subtitle.clone_from(&input.subtitle);
        slide.image_url.clone_from(&input.image_url);
        slide.link_url.clone_from(&input.link_url);
        slide.button_text.clone_from(&input.button_text);
        slide.is_active = input.is_active;
        Ok(slide.clone())
    }

    async fn set_slide_active(&self, id: SlideId, active: bool) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        Ok(data
            .slides
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| s.is_active = active)
            .is_some())
    }

    async fn move_slide(
        &self,
        id: SlideId,
        direction: MoveDirection,
    ) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let mut ordered: Vec<(i32, SlideId)> =
            data.slides.iter().map(|s| (s.position, s.id)).collect();
        ordered.sort_unstable();
        let Some(index) = ordered.iter().position(|(_, sid)| *sid == id) else {
            return Ok(false);
        };
        let neighbour_index = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => Some(index + 1).filter(|i| *i < ordered.len()),
        };
        let (Some(&(position, _)), Some(&(neighbour_position, neighbour_id))) = (
            ordered.get(index),
            neighbour_index.and_then(|i| ordered.get(i)),
        ) else {
            return Ok(false);
        };
        let (new_position, new_neighbour_position) =
            swapped_positions(position, neighbour_position, direction);
        for slide in &mut data.slides {
            if slide.id == id {
                slide.position = new_position;
            } else if slide.id == neighbour_id {
                slide.position = new_neighbour_position;
            }
        }
        Ok(true)
    }

    async fn delete_slide(&self, id: SlideId) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let before = data.slides.len();
        data.slides.retain(|s| s.id != id);
        Ok(data.slides.len() != before)
    }
}

#[async_trait]
impl ProfileStore for FakeStore {
    async fn get_profile(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        self.check()?;
        if let Some(delay) = self.profile_delay {
            tokio::time::sleep(delay).await;
        }
        let data = self.data.lock().await;
        Ok(data.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn upsert_profile(&self, seed: &ProfileSeed) -> Result<UserProfile, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let now = Utc::now();
        if let Some(profile) = data.profiles.iter_mut().find(|p| p.id == seed.id) {
            profile.email.clone_from(&seed.email);
            if profile.full_name.is_none() {
                profile.full_name.clone_from(&seed.full_name);
            }
            if seed.avatar_url.is_some() {
                profile.avatar_url.clone_from(&seed.avatar_url);
            }
            profile.updated_at = now;
            return Ok(profile.clone());
        }
        let profile = UserProfile {
            id: seed.id,
            email: seed.email.clone(),
            full_name: seed.full_name.clone(),
            phone: None,
            date_of_birth: None,
            avatar_url: seed.avatar_url.clone(),
            is_admin: false,
            created_at: now,
            updated_at: now,
        };
        data.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let profile = data
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        profile.full_name.clone_from(&update.full_name);
        profile.phone.clone_from(&update.phone);
        profile.date_of_birth = update.date_of_birth;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn set_admin_by_email(
        &self,
        email: &str,
        is_admin: bool,
    ) -> Result<u64, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let mut changed = 0;
        for profile in &mut data.profiles {
            if profile.email.eq_ignore_ascii_case(email) {
                profile.is_admin = is_admin;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn count_profiles(&self) -> Result<i64, RepositoryError> {
        self.check()?;
        Ok(i64::try_from(self.data.lock().await.profiles.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl AddressStore for FakeStore {
    async fn list_addresses(&self, user: UserId) -> Result<Vec<Address>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        let mut addresses: Vec<Address> = data
            .addresses
            .iter()
            .filter(|a| a.user_id == user)
            .cloned()
            .collect();
        addresses.sort_by(|a, b| b.is_default.cmp(&a.is_default).then(b.id.cmp(&a.id)));
        Ok(addresses)
    }

    async fn get_address(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .addresses
            .iter()
            .find(|a| a.id == id && a.user_id == user)
            .cloned())
    }

    async fn create_address(
        &self,
        user: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let make_default = input.is_default || !data.addresses.iter().any(|a| a.user_id == user);
        if make_default {
            for address in data.addresses.iter_mut().filter(|a| a.user_id == user) {
                address.is_default = false;
            }
        }
        let address = Address {
            id: AddressId::new(data.next_id()),
            user_id: user,
            label: input.label.clone(),
            recipient: input.recipient.clone(),
            line1: input.line1.clone(),
            line2: input.line2.clone(),
            city: input.city.clone(),
            region: input.region.clone(),
            postal_code: input.postal_code.clone(),
            country: input.country.clone(),
            phone: input.phone.clone(),
            is_default: make_default,
            created_at: Utc::now(),
        };
        data.addresses.push(address.clone());
        Ok(address)
    }

    async fn update_address(
        &self,
        user: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        if !data.addresses.iter().any(|a| a.id == id && a.user_id == user) {
            return Err(RepositoryError::NotFound);
        }
        if input.is_default {
            for address in data.addresses.iter_mut().filter(|a| a.user_id == user) {
                address.is_default = address.id == id;
            }
        }
        let address = data
            .addresses
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        address.label.clone_from(&input.label);
        address.recipient.clone_from(&input.recipient);
        address.line1.clone_from(&input.line1);
        address.line2.clone_from(&input.line2);
        address.city.clone_from(&input.city);
        address.region.clone_from(&input.region);
        address.postal_code.clone_from(&input.postal_code);
        address.country.clone_from(&input.country);
        address.phone.clone_from(&input.phone);
        Ok(address.clone())
    }

    async fn delete_address(&self, user: UserId, id: AddressId) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let Some(index) = data
            .addresses
            .iter()
            .position(|a| a.id == id && a.user_id == user)
        else {
            return Ok(false);
        };
        let removed = data.addresses.remove(index);
        if removed.is_default
            && let Some(newest) = data
                .addresses
                .iter_mut()
                .filter(|a| a.user_id == user)
                .max_by_key(|a| a.id)
        {
            newest.is_default = true;
        }
        Ok(true)
    }

    async fn set_default_address(
        &self,
        user: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        if !data.addresses.iter().any(|a| a.id == id && a.user_id == user) {
            return Ok(false);
        }
        for address in data.addresses.iter_mut().filter(|a| a.user_id == user) {
            address.is_default = address.id == id;
        }
        Ok(true)
    }
}

#[async_trait]
impl SavedItemStore for FakeStore {
    async fn list_saved_items(&self, user: UserId) -> Result<Vec<SavedItem>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .saved
            .iter()
            .rev()
            .filter(|(_, owner, _, _)| *owner == user)
            .filter_map(|(id, _, product_id, saved_at)| {
                data.products
                    .iter()
                    .find(|p| p.id == *product_id)
                    .map(|product| SavedItem {
                        id: *id,
                        saved_at: *saved_at,
                        product: product.clone(),
                    })
            })
            .collect())
    }

    async fn add_saved_item(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        self.add_saved_items(user, &[product]).await.map(|n| n > 0)
    }

    async fn add_saved_items(
        &self,
        user: UserId,
        products: &[ProductId],
    ) -> Result<u64, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let mut added = 0;
        for product in products {
            let known = data.products.iter().any(|p| p.id == *product);
            let saved = data
                .saved
                .iter()
                .any(|(_, owner, pid, _)| *owner == user && pid == product);
            if known && !saved {
                let id = SavedItemId::new(data.next_id());
                data.saved.push((id, user, *product, Utc::now()));
                added += 1;
            }
        }
        Ok(added)
    }

    async fn remove_saved_item(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let before = data.saved.len();
        data.saved
            .retain(|(_, owner, pid, _)| !(*owner == user && *pid == product));
        Ok(data.saved.len() != before)
    }

    async fn is_saved(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .saved
            .iter()
            .any(|(_, owner, pid, _)| *owner == user && *pid == product))
    }
}

#[async_trait]
impl AppointmentStore for FakeStore {
    async fn list_appointments(&self, user: UserId) -> Result<Vec<Appointment>, RepositoryError> {
        self.check()?;
        let now = Utc::now();
        let data = self.data.lock().await;
        let mut appointments: Vec<Appointment> = data
            .appointments
            .iter()
            .filter(|a| a.user_id == user)
            .cloned()
            .collect();
        appointments.sort_by(|a, b| {
            b.is_upcoming(now)
                .cmp(&a.is_upcoming(now))
                .then_with(|| {
                    if a.is_upcoming(now) {
                        a.scheduled_for.cmp(&b.scheduled_for)
                    } else {
                        b.scheduled_for.cmp(&a.scheduled_for)
                    }
                })
        });
        Ok(appointments)
    }

    async fn create_appointment(
        &self,
        user: UserId,
        input: &NewAppointment,
    ) -> Result<Appointment, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let appointment = Appointment {
            id: AppointmentId::new(data.next_id()),
            user_id: user,
            kind: input.kind,
            scheduled_for: input.scheduled_for,
            notes: input.notes.clone(),
            status: AppointmentStatus::Scheduled,
            created_at: Utc::now(),
        };
        data.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn cancel_appointment(
        &self,
        user: UserId,
        id: AppointmentId,
    ) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        Ok(data
            .appointments
            .iter_mut()
            .find(|a| a.id == id && a.user_id == user && a.status == AppointmentStatus::Scheduled)
            .map(|a| a.status = AppointmentStatus::Cancelled)
            .is_some())
    }
}

#[async_trait]
impl OrderStore for FakeStore {
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user)
            .cloned()
            .collect())
    }

    async fn get_order(&self, user: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .orders
            .iter()
            .find(|o| o.id == id && o.user_id == user)
            .cloned())
    }

    async fn create_pending_order(
        &self,
        user: UserId,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let order = Order {
            id: OrderId::new(data.next_id()),
            user_id: user,
            reference: order_reference(),
            product_id: Some(order.product_id),
            product_name: order.product_name.clone(),
            quantity: order.quantity,
            total: order.total,
            status: OrderStatus::Pending,
            payment_link: order.payment_link.clone(),
            created_at: Utc::now(),
        };
        data.orders.push(order.clone());
        Ok(order)
    }

    async fn count_orders(&self) -> Result<i64, RepositoryError> {
        self.check()?;
        Ok(i64::try_from(self.data.lock().await.orders.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl FeedbackStore for FakeStore {
    async fn create_feedback(&self, input: &NewFeedback) -> Result<Feedback, RepositoryError> {
        self.check()?;
        let mut data = self.data.lock().await;
        let feedback = Feedback {
            id: FeedbackId::new(data.next_id()),
            rating: input.rating,
            message: input.message.trim().to_string(),
            email: input.email.clone(),
            page: input.page.clone(),
            created_at: Utc::now(),
        };
        data.feedback.push(feedback.clone());
        Ok(feedback)
    }
}
