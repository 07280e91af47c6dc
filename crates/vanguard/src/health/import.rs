//! CSV ledger import for scoring exports outside the web application.
//!
//! Expected headers:
//! - students: `user_id,name,mentor_id`
//! - activity: `user_id,kind,timestamp`
//! - tasks: `user_id,project_id,status,updated_at`
//! - feedback: `sender_id,receiver_id,rating,sentiment,category,is_anonymous,created_at`
//!
//! Timestamps accept RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
//!
//! [`export_from_dir`] reads a whole export directory (`students.csv`,
//! `activity.csv`, `tasks.csv`, `feedback.csv`) to seed a store at startup.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::domain::{
    ActivityEvent, ActivityKind, FeedbackCategory, FeedbackRecord, FeedbackSentiment, MentorId,
    ProjectId, StudentProfile, TaskSnapshot, TaskStatus, UserId,
};
use super::scoring::UserLedger;

#[derive(Debug, thiserror::Error)]
pub enum LedgerImportError {
    #[error("failed to read ledger export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid ledger CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
    #[error("{file} in {dir}: {source}")]
    File {
        dir: String,
        file: &'static str,
        source: Box<LedgerImportError>,
    },
}

/// Every record of a multi-student export, unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerExport {
    pub students: Vec<StudentProfile>,
    pub activity: Vec<ActivityEvent>,
    pub tasks: Vec<TaskSnapshot>,
    pub feedback: Vec<FeedbackRecord>,
}

pub fn roster_from_reader<R: Read>(reader: R) -> Result<Vec<StudentProfile>, LedgerImportError> {
    let mut students = Vec::new();
    for (index, row) in csv_reader(reader).deserialize::<StudentRow>().enumerate() {
        let row = row?;
        if row.user_id.is_empty() || row.mentor_id.is_empty() {
            return Err(invalid(
                index + 2,
                "user_id and mentor_id are required".to_string(),
            ));
        }
        students.push(StudentProfile {
            user_id: UserId(row.user_id),
            name: row.name,
            mentor_id: MentorId(row.mentor_id),
        });
    }
    Ok(students)
}

pub fn activity_from_reader<R: Read>(reader: R) -> Result<Vec<ActivityEvent>, LedgerImportError> {
    let mut events = Vec::new();
    for (index, row) in csv_reader(reader).deserialize::<ActivityRow>().enumerate() {
        let row = row?;
        let line = index + 2;
        let kind = ActivityKind::from_code(&row.kind)
            .ok_or_else(|| invalid(line, format!("unknown event kind '{}'", row.kind)))?;
        events.push(ActivityEvent {
            user_id: UserId(row.user_id),
            kind,
            timestamp: parse_timestamp(line, &row.timestamp)?,
        });
    }
    events.sort_by_key(|event| event.timestamp);
    Ok(events)
}

pub fn tasks_from_reader<R: Read>(reader: R) -> Result<Vec<TaskSnapshot>, LedgerImportError> {
    let mut tasks = Vec::new();
    for (index, row) in csv_reader(reader).deserialize::<TaskRow>().enumerate() {
        let row = row?;
        let line = index + 2;
        let status = TaskStatus::from_code(&row.status)
            .ok_or_else(|| invalid(line, format!("unknown task status '{}'", row.status)))?;
        tasks.push(TaskSnapshot {
            user_id: UserId(row.user_id),
            project_id: ProjectId(row.project_id),
            status,
            updated_at: parse_timestamp(line, &row.updated_at)?,
        });
    }
    Ok(tasks)
}

pub fn feedback_from_reader<R: Read>(reader: R) -> Result<Vec<FeedbackRecord>, LedgerImportError> {
    let mut records = Vec::new();
    for (index, row) in csv_reader(reader).deserialize::<FeedbackRow>().enumerate() {
        let row = row?;
        let line = index + 2;
        if !(1..=5).contains(&row.rating) {
            return Err(invalid(line, format!("rating {} is outside 1-5", row.rating)));
        }
        records.push(FeedbackRecord {
            sender_id: UserId(row.sender_id),
            receiver_id: UserId(row.receiver_id),
            rating: row.rating,
            sentiment: row.sentiment.unwrap_or(FeedbackSentiment::Neutral),
            category: row.category.unwrap_or(FeedbackCategory::Other),
            is_anonymous: row.is_anonymous.unwrap_or(false),
            created_at: parse_timestamp(line, &row.created_at)?,
        });
    }
    Ok(records)
}

/// Load one user's ledger from export files, keeping only rows that belong to
/// `user_id` (activity and tasks it owns, feedback it received).
pub fn ledger_from_paths(
    user_id: &UserId,
    activity: &Path,
    tasks: Option<&Path>,
    feedback: Option<&Path>,
) -> Result<UserLedger, LedgerImportError> {
    let activity = activity_from_reader(File::open(activity)?)?
        .into_iter()
        .filter(|event| &event.user_id == user_id)
        .collect();

    let tasks = match tasks {
        Some(path) => tasks_from_reader(File::open(path)?)?
            .into_iter()
            .filter(|task| &task.user_id == user_id)
            .collect(),
        None => Vec::new(),
    };

    let feedback = match feedback {
        Some(path) => feedback_from_reader(File::open(path)?)?
            .into_iter()
            .filter(|record| &record.receiver_id == user_id)
            .collect(),
        None => Vec::new(),
    };

    Ok(UserLedger {
        activity,
        tasks,
        feedback,
    })
}

/// Load an export directory. `students.csv` is required; the ledger files
/// are optional and read as empty when absent.
pub fn export_from_dir(dir: &Path) -> Result<LedgerExport, LedgerImportError> {
    let students = read_export_file(dir, "students.csv", roster_from_reader)?;
    let activity = read_optional_export_file(dir, "activity.csv", activity_from_reader)?;
    let tasks = read_optional_export_file(dir, "tasks.csv", tasks_from_reader)?;
    let feedback = read_optional_export_file(dir, "feedback.csv", feedback_from_reader)?;

    Ok(LedgerExport {
        students,
        activity: activity.unwrap_or_default(),
        tasks: tasks.unwrap_or_default(),
        feedback: feedback.unwrap_or_default(),
    })
}

fn read_export_file<T>(
    dir: &Path,
    file: &'static str,
    parse: fn(File) -> Result<Vec<T>, LedgerImportError>,
) -> Result<Vec<T>, LedgerImportError> {
    File::open(dir.join(file))
        .map_err(LedgerImportError::from)
        .and_then(parse)
        .map_err(|source| LedgerImportError::File {
            dir: dir.display().to_string(),
            file,
            source: Box::new(source),
        })
}

fn read_optional_export_file<T>(
    dir: &Path,
    file: &'static str,
    parse: fn(File) -> Result<Vec<T>, LedgerImportError>,
) -> Result<Option<Vec<T>>, LedgerImportError> {
    if !dir.join(file).exists() {
        return Ok(None);
    }
    read_export_file(dir, file, parse).map(Some)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn invalid(row: usize, reason: String) -> LedgerImportError {
    LedgerImportError::InvalidRow { row, reason }
}

fn parse_timestamp(row: usize, value: &str) -> Result<DateTime<Utc>, LedgerImportError> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(invalid(row, format!("unparseable timestamp '{trimmed}'")))
}

#[derive(Debug, Deserialize)]
struct StudentRow {
    user_id: String,
    name: String,
    mentor_id: String,
}

#[derive(Debug, Deserialize)]
struct ActivityRow {
    user_id: String,
    kind: String,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct TaskRow {
    user_id: String,
    project_id: String,
    status: String,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct FeedbackRow {
    sender_id: String,
    receiver_id: String,
    rating: u8,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    sentiment: Option<FeedbackSentiment>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    category: Option<FeedbackCategory>,
    #[serde(default)]
    is_anonymous: Option<bool>,
    created_at: String,
}

fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            let upper = value.to_ascii_uppercase();
            T::deserialize(serde::de::value::StrDeserializer::<D::Error>::new(&upper)).map(Some)
        }
    }
}
