//! Caller identity and the single authorization predicate shared by every
//! lifecycle manager.

use serde::{Deserialize, Serialize};

use super::domain::{Job, UserId, UserRole};
use super::error::MarketplaceError;

/// Authenticated principal supplied by the identity gateway. Trusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Caller {
    pub const fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub const fn employer(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Employer)
    }

    pub const fn worker(user_id: UserId) -> Self {
        Self::new(user_id, UserRole::Worker)
    }
}

/// Relationship a caller must hold to the target of an operation.
#[derive(Debug, Clone, Copy)]
pub enum Relationship<'a> {
    HasRole(UserRole),
    /// Posted the job.
    OwnsJob(&'a Job),
    /// Posted the job or is its assigned worker.
    ParticipatesIn(&'a Job),
}

pub fn authorize(caller: &Caller, relationship: Relationship<'_>) -> Result<(), MarketplaceError> {
    match relationship {
        Relationship::HasRole(role) if caller.role == role => Ok(()),
        Relationship::HasRole(role) => Err(MarketplaceError::forbidden(format!(
            "this action requires the {role} role"
        ))),
        Relationship::OwnsJob(job) if job.employer_id == caller.user_id => Ok(()),
        Relationship::OwnsJob(_) => Err(MarketplaceError::forbidden(
            "only the employer who posted this job may do that",
        )),
        Relationship::ParticipatesIn(job) if job.is_participant(&caller.user_id) => Ok(()),
        Relationship::ParticipatesIn(_) => Err(MarketplaceError::forbidden(
            "only participants of this job may do that",
        )),
    }
}
