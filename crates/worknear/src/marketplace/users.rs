use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::domain::{User, UserId, UserRole};
use super::error::{MarketplaceError, ValidationError};
use super::geo::GeoPoint;
use super::repository::UserRepository;

/// Profile fields collected at sign-up. Credentials are issued elsewhere.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRegistration {
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

pub struct UserDirectory<S> {
    store: Arc<S>,
}

impl<S> UserDirectory<S>
where
    S: UserRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn register(&self, registration: UserRegistration) -> Result<User, MarketplaceError> {
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty("name").into());
        }
        let phone = registration.phone.trim();
        if phone.is_empty() {
            return Err(ValidationError::Empty("phone").into());
        }
        let location = GeoPoint::new(registration.latitude, registration.longitude)?;

        let user = self.store.insert_user(User {
            id: UserId::new(),
            name: name.to_string(),
            phone: phone.to_string(),
            role: registration.role,
            location,
            rating_avg: 0.0,
            rating_count: 0,
            created_at: Utc::now(),
        })?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    pub fn get(&self, id: &UserId) -> Result<User, MarketplaceError> {
        self.store
            .fetch_user(id)?
            .ok_or(MarketplaceError::NotFound("user"))
    }
}
