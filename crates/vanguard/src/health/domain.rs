use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for students (and any other scored user).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for mentors owning a squad.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentorId(pub String);

impl MentorId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl std::fmt::Display for MentorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

/// Kinds of engagement recorded in the activity ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    Login,
    TaskUpdated,
    TaskCompleted,
    FeedbackSubmitted,
    Comment,
    ResourceView,
    Logout,
}

impl ActivityKind {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Login,
            Self::TaskUpdated,
            Self::TaskCompleted,
            Self::FeedbackSubmitted,
            Self::Comment,
            Self::ResourceView,
            Self::Logout,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::TaskUpdated => "TASK_UPDATED",
            Self::TaskCompleted => "TASK_COMPLETED",
            Self::FeedbackSubmitted => "FEEDBACK_SUBMITTED",
            Self::Comment => "COMMENT",
            Self::ResourceView => "RESOURCE_VIEW",
            Self::Logout => "LOGOUT",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|kind| kind.code() == normalized)
    }
}

/// Append-only ledger entry describing one user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub user_id: UserId,
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    InReview,
    Done,
}

impl TaskStatus {
    pub const fn ordered() -> [Self; 4] {
        [Self::Todo, Self::InProgress, Self::InReview, Self::Done]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::InReview => "IN_REVIEW",
            Self::Done => "DONE",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|status| status.code() == normalized)
    }

    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Current state of one task owned by a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub user_id: UserId,
    pub project_id: ProjectId,
    pub status: TaskStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackSentiment {
    Positive,
    Neutral,
    Constructive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackCategory {
    Collaboration,
    Communication,
    Technical,
    Leadership,
    Other,
}

/// Peer feedback as submitted. Only `rating` feeds the receiver's score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub rating: u8,
    pub sentiment: FeedbackSentiment,
    pub category: FeedbackCategory,
    #[serde(default)]
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

/// Health tier, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthTier {
    Excellent,
    Normal,
    AtRisk,
}

impl HealthTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Normal => "Normal",
            Self::AtRisk => "At Risk",
        }
    }

    /// Higher values sort first in mentor-facing listings.
    pub const fn severity(self) -> u8 {
        match self {
            Self::Excellent => 0,
            Self::Normal => 1,
            Self::AtRisk => 2,
        }
    }
}

/// Diagnostic codes attached to at-risk students.
///
/// The serialized code is the stable contract; [`HealthFlag::label`] is only a
/// default rendering that presentation layers are free to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthFlag {
    LowEngagement,
    NoRecentUpdates,
    MissedDeadline,
    NeedsSupport,
}

impl HealthFlag {
    pub const fn code(self) -> &'static str {
        match self {
            Self::LowEngagement => "low_engagement",
            Self::NoRecentUpdates => "no_recent_updates",
            Self::MissedDeadline => "missed_deadline",
            Self::NeedsSupport => "needs_support",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::LowEngagement => "Low engagement",
            Self::NoRecentUpdates => "No recent updates",
            Self::MissedDeadline => "Missed deadline",
            Self::NeedsSupport => "Needs support",
        }
    }
}

/// Materialized per-user snapshot written by every recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub user_id: UserId,
    pub engagement_score: u8,
    pub task_completion: u8,
    pub feedback_score: u8,
    pub status: HealthTier,
    pub last_active: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flags: Vec<HealthFlag>,
}

impl HealthStatus {
    /// Snapshot reported for users that have never been recomputed.
    pub fn zero_default(user_id: UserId) -> Self {
        Self {
            user_id,
            engagement_score: 0,
            task_completion: 0,
            feedback_score: 0,
            status: HealthTier::Normal,
            last_active: None,
            flags: Vec::new(),
        }
    }

    pub fn flag_labels(&self) -> Vec<&'static str> {
        self.flags.iter().map(|flag| flag.label()).collect()
    }
}

/// Roster entry linking a student to their mentor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub user_id: UserId,
    pub name: String,
    pub mentor_id: MentorId,
}
