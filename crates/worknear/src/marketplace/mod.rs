//! Gig-work marketplace core: job and application lifecycles, nearby search,
//! and the rating eligibility gate, plus the HTTP router that exposes them.
//!
//! Services are synchronous and storage-agnostic; they reach persistence only
//! through the ports in [`repository`]. [`memory::MemoryStore`] implements
//! every port for local runs and tests.

pub mod access;
pub mod applications;
pub mod domain;
pub mod error;
pub mod geo;
pub mod jobs;
pub mod memory;
pub mod ratings;
pub mod repository;
pub mod router;
pub mod search;
pub mod users;

#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use access::{authorize, Caller, Relationship};
pub use applications::ApplicationService;
pub use domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, JobStatus, JobView,
    JobWithDistance, Rating, RatingId, RatingSummary, User, UserId, UserRole,
};
pub use error::{MarketplaceError, ValidationError};
pub use geo::{distance_km, GeoPoint};
pub use jobs::{JobDraft, JobService};
pub use memory::MemoryStore;
pub use ratings::{RatingService, RatingSubmission};
pub use repository::{
    ApplicationRepository, HiringUnitOfWork, JobRepository, MarketplaceStore, RatingRepository,
    RepositoryError, UserRepository,
};
pub use router::{marketplace_router, ApiError};
pub use search::{NearbyQuery, NearbySearch, SearchPolicy};
pub use users::{UserDirectory, UserRegistration};

/// All marketplace services wired to one shared store.
pub struct Marketplace<S> {
    pub users: UserDirectory<S>,
    pub jobs: JobService<S>,
    pub applications: ApplicationService<S>,
    pub ratings: RatingService<S>,
    pub search: NearbySearch<S>,
}

impl<S> Marketplace<S>
where
    S: MarketplaceStore + 'static,
{
    pub fn new(store: Arc<S>, policy: SearchPolicy) -> Self {
        Self {
            users: UserDirectory::new(store.clone()),
            jobs: JobService::new(store.clone()),
            applications: ApplicationService::new(store.clone()),
            ratings: RatingService::new(store.clone()),
            search: NearbySearch::new(store, policy),
        }
    }
}
