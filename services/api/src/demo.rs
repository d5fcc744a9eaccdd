use crate::infra::in_memory_marketplace;
use clap::Args;
use serde::Serialize;
use worknear::config::SearchConfig;
use worknear::error::AppError;
use worknear::marketplace::{
    Caller, Job, JobDraft, JobView, Marketplace, MemoryStore, NearbyQuery, Rating,
    RatingSubmission, User, UserRegistration, UserRole,
};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Latitude the worker searches from.
    #[arg(long, default_value_t = 40.0, allow_hyphen_values = true)]
    pub(crate) latitude: f64,
    /// Longitude the worker searches from.
    #[arg(long, default_value_t = -73.0, allow_hyphen_values = true)]
    pub(crate) longitude: f64,
    /// Requested search radius in kilometers (defaults to the configured default).
    #[arg(long)]
    pub(crate) radius: Option<f64>,
    /// Maximum search radius in kilometers.
    #[arg(long, default_value_t = 5.0, allow_hyphen_values = true, value_parser = parse_kilometers)]
    pub(crate) max_radius: f64,
    /// Print the final job and ratings as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            latitude: 40.0,
            longitude: -73.0,
            radius: None,
            max_radius: 5.0,
            json: false,
        }
    }
}

fn parse_kilometers(raw: &str) -> Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        Ok(_) => Err(format!("'{raw}' must be a positive number of kilometers")),
        Err(err) => Err(format!("failed to parse '{raw}' as kilometers ({err})")),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DemoTranscript {
    pub(crate) job: JobView,
    pub(crate) ratings: Vec<Rating>,
    pub(crate) employer: User,
    pub(crate) worker: User,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let search = SearchConfig {
        max_radius_km: args.max_radius,
        ..SearchConfig::default()
    };
    let marketplace = in_memory_marketplace(search);

    println!("Work-near-me hiring demo");
    let transcript = walk_through(&marketplace, &args)?;

    if args.json {
        match serde_json::to_string_pretty(&transcript) {
            Ok(json) => println!("\nFinal state:\n{json}"),
            Err(err) => println!("\nFinal state unavailable: {err}"),
        }
    } else {
        println!(
            "\nFinal state: job '{}' is {}, employer rated: {}, worker rated: {}",
            transcript.job.job.title,
            transcript.job.job.status,
            transcript.job.employer_rated,
            transcript.job.worker_rated
        );
        println!(
            "  {} now averages {:.1} over {} rating(s)",
            transcript.employer.name, transcript.employer.rating_avg, transcript.employer.rating_count
        );
        println!(
            "  {} now averages {:.1} over {} rating(s)",
            transcript.worker.name, transcript.worker.rating_avg, transcript.worker.rating_count
        );
    }

    Ok(())
}

pub(crate) fn walk_through(
    marketplace: &Marketplace<MemoryStore>,
    args: &DemoArgs,
) -> Result<DemoTranscript, AppError> {
    let employer = join(marketplace, "Erin Employer", "555-0100", UserRole::Employer)?;
    let worker = join(marketplace, "Wes Worker", "555-0101", UserRole::Worker)?;

    let job = marketplace.jobs.create(
        &employer,
        JobDraft {
            title: "Carry furniture upstairs".to_string(),
            description: "Two hours, third floor walk-up".to_string(),
            hourly_rate: 25.0,
            total_payment: 50.0,
            latitude: 40.0,
            longitude: -73.0,
        },
    )?;
    print_job("Posted", &job);

    let radius_km = marketplace.search.policy().effective_radius(args.radius);
    let nearby = marketplace.search.nearby(NearbyQuery {
        lat: args.latitude,
        lng: args.longitude,
        radius: args.radius,
    })?;
    println!(
        "\nNearby search from ({:.4}, {:.4}) within {:.1} km: {} open job(s)",
        args.latitude,
        args.longitude,
        radius_km,
        nearby.len()
    );
    for hit in &nearby {
        println!("  - {} at {:.2} km", hit.job.title, hit.distance);
    }

    let application = marketplace.applications.apply(&job.id, &worker)?;
    println!("\nApplication {} is {}", application.id, application.status);
    if let Err(err) = marketplace.applications.apply(&job.id, &worker) {
        println!("  Second application refused: {err}");
    }

    let accepted = marketplace.applications.accept(&application.id, &employer)?;
    println!("Application {} is {}", accepted.id, accepted.status);
    print_job("Assigned", &marketplace.jobs.get(&job.id)?.job);

    let done = marketplace.jobs.complete(&job.id, &employer)?;
    print_job("Completed", &done);

    println!("\nRatings");
    let rate = |from: &Caller, to: &Caller, score: i64, comment: &str| {
        marketplace.ratings.submit(
            from,
            RatingSubmission {
                job_id: job.id,
                to_user_id: to.user_id,
                score,
                comment: comment.to_string(),
            },
        )
    };
    let first = rate(&worker, &employer, 5, "Clear instructions")?;
    println!("  worker -> employer: {}", first.score);
    let second = rate(&employer, &worker, 4, "Careful with the stairs")?;
    println!("  employer -> worker: {}", second.score);
    if let Err(err) = rate(&worker, &employer, 1, "") {
        println!("  Repeat rating refused: {err}");
    }

    Ok(DemoTranscript {
        job: marketplace.jobs.get(&job.id)?,
        ratings: marketplace.ratings.for_job(&job.id, &employer)?,
        employer: marketplace.users.get(&employer.user_id)?,
        worker: marketplace.users.get(&worker.user_id)?,
    })
}

fn join(
    marketplace: &Marketplace<MemoryStore>,
    name: &str,
    phone: &str,
    role: UserRole,
) -> Result<Caller, AppError> {
    let user = marketplace.users.register(UserRegistration {
        name: name.to_string(),
        phone: phone.to_string(),
        role,
        latitude: 40.0,
        longitude: -73.0,
    })?;
    println!("Registered {} ({}) as {}", user.name, user.id, user.role);
    Ok(Caller::new(user.id, user.role))
}

fn print_job(label: &str, job: &Job) {
    println!(
        "{label} job '{}' [{}] at ({:.4}, {:.4}), status {}",
        job.title, job.id, job.location.latitude, job.location.longitude, job.status
    );
}
