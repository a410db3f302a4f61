//! Domain models for the storefront.
//!
//! Row types map one-to-one onto tables in the `apothecary` schema and derive
//! `sqlx::FromRow`; input types carry what a form submits before validation.

pub mod account;
pub mod catalog;
pub mod feedback;
pub mod session;

pub use account::{
    Address, AddressInput, Appointment, NewAppointment, NewOrder, Order, ProfileSeed,
    ProfileUpdate, SavedItem, UserProfile,
};
pub use catalog::{
    CarouselSlide, Category, CategoryInput, MoveDirection, Product, ProductInput, ProductQuery,
    ProductSort, SlideInput,
};
pub use feedback::{Feedback, NewFeedback};
pub use session::{CurrentUser, SavedArticles, Toast, ToastKind, Wishlist, keys as session_keys};
