use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geo::GeoPoint;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Identifier for registered users.
    UserId
);
entity_id!(
    /// Identifier for posted jobs.
    JobId
);
entity_id!(
    /// Identifier for job applications.
    ApplicationId
);
entity_id!(
    /// Identifier for submitted ratings.
    RatingId
);

/// Marketplace side a user signed up for. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Employer,
    Worker,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Worker => "worker",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}', expected employer or worker")]
pub struct UnknownRole(pub String);

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "employer" => Ok(Self::Employer),
            "worker" => Ok(Self::Worker),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

/// Registered marketplace participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
    #[serde(flatten)]
    pub location: GeoPoint,
    pub rating_avg: f64,
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Average score and count over every rating a user has received.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Assigned,
    Done,
    Cancelled,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Assigned => "assigned",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Lifecycle edges: open -> assigned -> done, and open -> cancelled.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Assigned) | (Self::Assigned, Self::Done) | (Self::Open, Self::Cancelled)
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Gig posted by an employer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub employer_id: UserId,
    pub title: String,
    pub description: String,
    pub hourly_rate: f64,
    pub total_payment: f64,
    #[serde(flatten)]
    pub location: GeoPoint,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_worker_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn is_participant(&self, user: &UserId) -> bool {
        self.employer_id == *user || self.assigned_worker_id.as_ref() == Some(user)
    }

    /// The participant on the other side of the job from `user`, if `user` is one.
    pub fn counterpart_of(&self, user: &UserId) -> Option<UserId> {
        let worker = self.assigned_worker_id?;
        if *user == self.employer_id {
            Some(worker)
        } else if *user == worker {
            Some(self.employer_id)
        } else {
            None
        }
    }
}

/// Job as returned to readers, with rating flags derived on read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: Job,
    pub employer_rated: bool,
    pub worker_rated: bool,
}

/// Search hit annotated with its great-circle distance from the query point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobWithDistance {
    #[serde(flatten)]
    pub job: Job,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A worker's bid for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub worker_id: UserId,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// Score left by one participant of a finished job for the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub job_id: JobId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub score: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with_worker(worker: Option<UserId>) -> Job {
        Job {
            id: JobId::new(),
            employer_id: UserId::new(),
            title: "Move boxes".to_string(),
            description: String::new(),
            hourly_rate: 20.0,
            total_payment: 80.0,
            location: GeoPoint {
                latitude: 40.0,
                longitude: -73.0,
            },
            status: JobStatus::Done,
            assigned_worker_id: worker,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn job_status_only_follows_lifecycle_edges() {
        assert!(JobStatus::Open.can_transition_to(JobStatus::Assigned));
        assert!(JobStatus::Open.can_transition_to(JobStatus::Cancelled));
        assert!(JobStatus::Assigned.can_transition_to(JobStatus::Done));
        assert!(!JobStatus::Open.can_transition_to(JobStatus::Done));
        assert!(!JobStatus::Assigned.can_transition_to(JobStatus::Cancelled));
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Open));
        assert!(!JobStatus::Cancelled.can_transition_to(JobStatus::Assigned));
    }

    #[test]
    fn counterpart_requires_an_assigned_worker() {
        let worker = UserId::new();
        let job = job_with_worker(Some(worker));
        assert_eq!(job.counterpart_of(&job.employer_id), Some(worker));
        assert_eq!(job.counterpart_of(&worker), Some(job.employer_id));
        assert_eq!(job.counterpart_of(&UserId::new()), None);

        let unassigned = job_with_worker(None);
        assert_eq!(unassigned.counterpart_of(&unassigned.employer_id), None);
        assert!(unassigned.is_participant(&unassigned.employer_id));
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("Employer".parse::<UserRole>(), Ok(UserRole::Employer));
        assert_eq!(" worker ".parse::<UserRole>(), Ok(UserRole::Worker));
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn job_serializes_flat_location_and_lowercase_status() {
        let job = job_with_worker(None);
        let value = serde_json::to_value(&job).expect("job serializes");
        assert_eq!(value["latitude"], 40.0);
        assert_eq!(value["status"], "done");
        assert!(value.get("assigned_worker_id").is_none());
    }
}
