//! Admin access management.
//!
//! Admin rights are a flag on the user's profile, so the user has to have
//! signed in at least once before they can be granted access.

use apothecary_core::Email;
use apothecary_storefront::db::{PgStore, ProfileStore};

use super::{CommandError, connect};

/// Set or clear the admin flag for every profile with `email`.
///
/// # Errors
///
/// Returns an error for a malformed email, a database failure, or when no
/// profile has that email.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), CommandError> {
    let email = normalize_email(email)?;

    let store = PgStore::new(connect().await?);
    let changed = store.set_admin_by_email(&email, is_admin).await?;
    if changed == 0 {
        return Err(CommandError::UnknownProfile(email));
    }

    if is_admin {
        tracing::info!(%email, profiles = changed, "Admin access granted");
    } else {
        tracing::info!(%email, profiles = changed, "Admin access revoked");
    }
    Ok(())
}

/// Profiles store the lowercased form, so match on that.
fn normalize_email(email: &str) -> Result<String, CommandError> {
    Email::parse(email)
        .map(Email::into_inner)
        .map_err(|e| CommandError::InvalidEmail(email.trim().to_string(), e))
}
