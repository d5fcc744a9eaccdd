//! Rating eligibility gate and the post-commit aggregate update.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::access::{authorize, Caller, Relationship};
use super::domain::{Job, JobId, JobStatus, Rating, RatingId, UserId};
use super::error::{MarketplaceError, ValidationError};
use super::repository::{JobRepository, RatingRepository, RepositoryError, UserRepository};

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

/// Rating request body. The rater is the authenticated caller.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingSubmission {
    pub job_id: JobId,
    pub to_user_id: UserId,
    pub score: i64,
    #[serde(default)]
    pub comment: String,
}

/// Why a rating between two users on a job is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    JobNotDone(JobStatus),
    RaterNotParticipant,
    RateeNotCounterpart,
    AlreadyRated,
}

impl From<Ineligibility> for MarketplaceError {
    fn from(value: Ineligibility) -> Self {
        match value {
            Ineligibility::JobNotDone(status) => MarketplaceError::invalid_state(format!(
                "can only rate after job is completed (job is {status})"
            )),
            Ineligibility::RaterNotParticipant => {
                MarketplaceError::forbidden("only participants can rate")
            }
            Ineligibility::RateeNotCounterpart => {
                MarketplaceError::forbidden("can only rate the other participant")
            }
            Ineligibility::AlreadyRated => {
                MarketplaceError::conflict("you have already rated for this job")
            }
        }
    }
}

/// Job-state part of the gate: the job is done, `from` took part in it and
/// `to` is the other participant. Self-rating falls out of the counterpart rule.
pub fn check_participants(job: &Job, from: &UserId, to: &UserId) -> Result<(), Ineligibility> {
    if job.status != JobStatus::Done {
        return Err(Ineligibility::JobNotDone(job.status));
    }
    match job.counterpart_of(from) {
        None => Err(Ineligibility::RaterNotParticipant),
        Some(counterpart) if counterpart != *to => Err(Ineligibility::RateeNotCounterpart),
        Some(_) => Ok(()),
    }
}

/// Full gate including the one-rating-per-rater rule.
pub fn check_eligibility<F>(
    job: &Job,
    from: &UserId,
    to: &UserId,
    already_rated: F,
) -> Result<(), MarketplaceError>
where
    F: FnOnce(&JobId, &UserId) -> Result<bool, RepositoryError>,
{
    check_participants(job, from, to)?;
    if already_rated(&job.id, from)? {
        return Err(Ineligibility::AlreadyRated.into());
    }
    Ok(())
}

/// Whether each participant of a job has already rated the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatingFlags {
    pub employer_rated: bool,
    pub worker_rated: bool,
}

/// Derive the flags from a rating-existence lookup. Only done jobs can carry
/// ratings, so every other status short-circuits to all-false.
pub fn rating_flags<F>(job: &Job, mut has_rated: F) -> Result<RatingFlags, RepositoryError>
where
    F: FnMut(&JobId, &UserId) -> Result<bool, RepositoryError>,
{
    if job.status != JobStatus::Done {
        return Ok(RatingFlags::default());
    }

    let employer_rated = has_rated(&job.id, &job.employer_id)?;
    let worker_rated = match &job.assigned_worker_id {
        Some(worker) => has_rated(&job.id, worker)?,
        None => false,
    };
    Ok(RatingFlags {
        employer_rated,
        worker_rated,
    })
}

pub struct RatingService<S> {
    store: Arc<S>,
}

impl<S> RatingService<S>
where
    S: RatingRepository + JobRepository + UserRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record a rating from the caller, then refresh the ratee's aggregate.
    pub fn submit(
        &self,
        caller: &Caller,
        submission: RatingSubmission,
    ) -> Result<Rating, MarketplaceError> {
        let RatingSubmission {
            job_id,
            to_user_id,
            score,
            comment,
        } = submission;

        let score = validate_score(score)?;
        let job = self
            .store
            .fetch_job(&job_id)?
            .ok_or(MarketplaceError::NotFound("job"))?;

        check_eligibility(&job, &caller.user_id, &to_user_id, |job, from| {
            self.store.rating_exists(job, from)
        })?;

        let rating = self.store.insert_rating(Rating {
            id: RatingId::new(),
            job_id,
            from_user_id: caller.user_id,
            to_user_id,
            score,
            comment,
            created_at: Utc::now(),
        })?;

        info!(
            rating_id = %rating.id,
            job_id = %rating.job_id,
            from = %rating.from_user_id,
            to = %rating.to_user_id,
            score = rating.score,
            "rating recorded"
        );

        if let Err(err) = self.refresh_aggregate(&rating.to_user_id) {
            warn!(
                job_id = %rating.job_id,
                user_id = %rating.to_user_id,
                error = %err,
                "rating stored but aggregate refresh failed"
            );
        }

        Ok(rating)
    }

    /// Ratings left on a job, visible to its participants.
    pub fn for_job(&self, job_id: &JobId, caller: &Caller) -> Result<Vec<Rating>, MarketplaceError> {
        let job = self
            .store
            .fetch_job(job_id)?
            .ok_or(MarketplaceError::NotFound("job"))?;
        authorize(caller, Relationship::ParticipatesIn(&job))?;
        Ok(self.store.ratings_for_job(job_id)?)
    }

    fn refresh_aggregate(&self, user: &UserId) -> Result<(), RepositoryError> {
        let summary = self.store.rating_summary(user)?;
        self.store.update_rating(user, summary)
    }
}

fn validate_score(score: i64) -> Result<u8, ValidationError> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        u8::try_from(score).map_err(|_| ValidationError::ScoreOutOfRange(score))
    } else {
        Err(ValidationError::ScoreOutOfRange(score))
    }
}
