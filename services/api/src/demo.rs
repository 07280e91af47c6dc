use chrono::{DateTime, Duration, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use vanguard::config::scoring_from_file;
use vanguard::error::AppError;
use vanguard::health::{
    compute_health_status, ledger_from_paths, ActivityEvent, ActivityKind, FeedbackCategory,
    FeedbackRecord, FeedbackSentiment, HealthService, HealthStatus, InMemoryEngagementStore,
    MentorId, ProjectId, ScoringConfig, SquadSummary, StudentProfile, TaskSnapshot, TaskStatus,
    UserId,
};

/// Peer ratings received by the demo's strongest student.
const SEED_RATINGS: [u8; 8] = [5, 5, 4, 4, 4, 3, 3, 2];

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Student whose rows are scored
    #[arg(long)]
    pub(crate) user: String,
    /// Activity CSV export (user_id,kind,timestamp)
    #[arg(long)]
    pub(crate) activity: PathBuf,
    /// Task CSV export (user_id,project_id,status,updated_at)
    #[arg(long)]
    pub(crate) tasks: Option<PathBuf>,
    /// Feedback CSV export (sender_id,receiver_id,rating,...,created_at)
    #[arg(long)]
    pub(crate) feedback: Option<PathBuf>,
    /// Evaluation instant, RFC 3339 or YYYY-MM-DD (defaults to now)
    #[arg(long, value_parser = crate::infra::parse_as_of)]
    pub(crate) as_of: Option<DateTime<Utc>>,
    /// JSON scoring config; omitted fields keep their defaults
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation instant, RFC 3339 or YYYY-MM-DD (defaults to now)
    #[arg(long, value_parser = crate::infra::parse_as_of)]
    pub(crate) as_of: Option<DateTime<Utc>>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        user,
        activity,
        tasks,
        feedback,
        as_of,
        config,
    } = args;

    let config = match config {
        Some(path) => scoring_from_file(&path)?,
        None => ScoringConfig::default(),
    };
    let as_of = as_of.unwrap_or_else(Utc::now);
    let user_id = UserId(user);

    let ledger = ledger_from_paths(&user_id, &activity, tasks.as_deref(), feedback.as_deref())?;
    let status = compute_health_status(
        &user_id,
        &ledger.activity,
        &ledger.tasks,
        &ledger.feedback,
        &config,
        as_of,
    )?;

    println!(
        "Engagement health for {} as of {}",
        user_id,
        as_of.to_rfc3339()
    );
    println!(
        "- ledger: {} activity events | {} tasks | {} feedback records",
        ledger.activity.len(),
        ledger.tasks.len(),
        ledger.feedback.len()
    );
    render_status(&status);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let mentor_id = MentorId::new("mentor-demo");

    let store = Arc::new(InMemoryEngagementStore::default());
    seed_demo_squad(&store, &mentor_id, as_of)?;
    let service = HealthService::new(store, ScoringConfig::default())?;

    println!("Engagement health demo (as of {})", as_of.to_rfc3339());
    let summary = service.recompute_squad(&mentor_id, as_of).await?;
    render_squad(&summary);
    Ok(())
}

fn render_status(status: &HealthStatus) {
    println!("- status: {}", status.status.label());
    println!(
        "- engagement {} | task completion {} | feedback {}",
        status.engagement_score, status.task_completion, status.feedback_score
    );
    match status.last_active {
        Some(last_active) => println!("- last active: {}", last_active.to_rfc3339()),
        None => println!("- last active: never"),
    }
    if status.flags.is_empty() {
        println!("- flags: none");
    } else {
        println!("- flags: {}", status.flag_labels().join(", "));
    }
}

fn render_squad(summary: &SquadSummary) {
    println!("\nSquad {} ({} students)", summary.mentor_id, summary.students.len());
    println!(
        "- averages: engagement {} | completion {} | feedback {}",
        summary.average_engagement, summary.average_completion, summary.average_feedback
    );
    println!(
        "- tiers: {} at risk | {} normal | {} excellent",
        summary.at_risk_count, summary.normal_count, summary.excellent_count
    );
    println!("Students (most urgent first):");
    for entry in &summary.students {
        let flags = if entry.flags.is_empty() {
            "-".to_string()
        } else {
            entry
                .flags
                .iter()
                .map(|flag| flag.label())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "  - {} [{}] engagement {} | completion {} | feedback {} | flags: {}",
            entry.name,
            entry.status_label,
            entry.engagement_score,
            entry.task_completion,
            entry.feedback_score,
            flags
        );
    }
}

fn seed_demo_squad(
    store: &InMemoryEngagementStore,
    mentor_id: &MentorId,
    as_of: DateTime<Utc>,
) -> Result<(), AppError> {
    let roster = [
        ("s-ada", "Ada Lovelace"),
        ("s-grace", "Grace Hopper"),
        ("s-alan", "Alan Turing"),
        ("s-linus", "Linus Torvalds"),
    ];
    for (id, name) in roster {
        store.add_student(StudentProfile {
            user_id: UserId::new(id),
            name: name.to_string(),
            mentor_id: mentor_id.clone(),
        })?;
    }

    let ada = UserId::new("s-ada");
    let ada_activity = [
        (ActivityKind::Login, 6),
        (ActivityKind::TaskUpdated, 4),
        (ActivityKind::TaskCompleted, 3),
        (ActivityKind::FeedbackSubmitted, 1),
        (ActivityKind::Comment, 2),
    ];
    for (kind, count) in ada_activity {
        for day in 0..count {
            store.record_activity(activity(&ada, kind, as_of - Duration::days(day)))?;
        }
    }
    record_tasks(store, &ada, as_of, 4, 1)?;
    for rating in SEED_RATINGS {
        store.record_feedback(peer_feedback(&ada, rating, as_of))?;
    }

    let grace = UserId::new("s-grace");
    let grace_activity = [
        (ActivityKind::Login, 4),
        (ActivityKind::TaskUpdated, 2),
        (ActivityKind::ResourceView, 2),
    ];
    for (kind, count) in grace_activity {
        for day in 0..count {
            store.record_activity(activity(&grace, kind, as_of - Duration::days(day + 1)))?;
        }
    }
    record_tasks(store, &grace, as_of, 2, 2)?;
    for rating in [4, 3] {
        store.record_feedback(peer_feedback(&grace, rating, as_of))?;
    }

    // Last seen before the lookback window opened.
    let alan = UserId::new("s-alan");
    store.record_activity(activity(&alan, ActivityKind::Login, as_of - Duration::days(12)))?;
    record_tasks(store, &alan, as_of, 0, 3)?;
    for rating in [2, 1] {
        store.record_feedback(peer_feedback(&alan, rating, as_of))?;
    }

    Ok(())
}

fn activity(user_id: &UserId, kind: ActivityKind, timestamp: DateTime<Utc>) -> ActivityEvent {
    ActivityEvent {
        user_id: user_id.clone(),
        kind,
        timestamp,
    }
}

fn record_tasks(
    store: &InMemoryEngagementStore,
    user_id: &UserId,
    as_of: DateTime<Utc>,
    done: usize,
    open: usize,
) -> Result<(), AppError> {
    let statuses = std::iter::repeat(TaskStatus::Done)
        .take(done)
        .chain(std::iter::repeat(TaskStatus::InProgress).take(open));
    for status in statuses {
        store.record_task(TaskSnapshot {
            user_id: user_id.clone(),
            project_id: ProjectId("portfolio-site".to_string()),
            status,
            updated_at: as_of - Duration::days(2),
        })?;
    }
    Ok(())
}

fn peer_feedback(receiver: &UserId, rating: u8, as_of: DateTime<Utc>) -> FeedbackRecord {
    FeedbackRecord {
        sender_id: UserId::new("s-peer"),
        receiver_id: receiver.clone(),
        rating,
        sentiment: if rating >= 4 {
            FeedbackSentiment::Positive
        } else {
            FeedbackSentiment::Constructive
        },
        category: FeedbackCategory::Collaboration,
        is_anonymous: false,
        created_at: as_of - Duration::days(3),
    }
}
