use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{HealthFlag, HealthStatus, HealthTier, MentorId, StudentProfile, UserId};

/// One row of a mentor's squad listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentHealthEntry {
    pub user_id: UserId,
    pub name: String,
    pub status: HealthTier,
    pub status_label: String,
    pub engagement_score: u8,
    pub task_completion: u8,
    pub feedback_score: u8,
    pub last_active: Option<DateTime<Utc>>,
    pub flags: Vec<HealthFlag>,
}

/// Mentor-facing rollup of the squad's latest snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadSummary {
    pub mentor_id: MentorId,
    pub average_engagement: u8,
    pub average_completion: u8,
    pub average_feedback: u8,
    pub at_risk_count: usize,
    pub normal_count: usize,
    pub excellent_count: usize,
    pub students: Vec<StudentHealthEntry>,
}

impl SquadSummary {
    pub fn empty(mentor_id: MentorId) -> Self {
        Self {
            mentor_id,
            average_engagement: 0,
            average_completion: 0,
            average_feedback: 0,
            at_risk_count: 0,
            normal_count: 0,
            excellent_count: 0,
            students: Vec::new(),
        }
    }
}

/// Roll up the mentor's students. Students without a stored status are
/// reported with [`HealthStatus::zero_default`].
pub fn aggregate_squad(
    mentor_id: &MentorId,
    roster: &[StudentProfile],
    statuses: &HashMap<UserId, HealthStatus>,
) -> SquadSummary {
    let mut students: Vec<StudentHealthEntry> = roster
        .iter()
        .filter(|student| &student.mentor_id == mentor_id)
        .map(|student| {
            let status = statuses
                .get(&student.user_id)
                .cloned()
                .unwrap_or_else(|| HealthStatus::zero_default(student.user_id.clone()));
            entry_for(student, status)
        })
        .collect();

    if students.is_empty() {
        return SquadSummary::empty(mentor_id.clone());
    }

    students.sort_by(|a, b| {
        b.status
            .severity()
            .cmp(&a.status.severity())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    let count_tier = |tier: HealthTier| {
        students
            .iter()
            .filter(|student| student.status == tier)
            .count()
    };

    SquadSummary {
        mentor_id: mentor_id.clone(),
        average_engagement: rounded_mean(students.iter().map(|s| s.engagement_score)),
        average_completion: rounded_mean(students.iter().map(|s| s.task_completion)),
        average_feedback: rounded_mean(students.iter().map(|s| s.feedback_score)),
        at_risk_count: count_tier(HealthTier::AtRisk),
        normal_count: count_tier(HealthTier::Normal),
        excellent_count: count_tier(HealthTier::Excellent),
        students,
    }
}

fn entry_for(student: &StudentProfile, status: HealthStatus) -> StudentHealthEntry {
    StudentHealthEntry {
        user_id: student.user_id.clone(),
        name: student.name.clone(),
        status: status.status,
        status_label: status.status.label().to_string(),
        engagement_score: status.engagement_score,
        task_completion: status.task_completion,
        feedback_score: status.feedback_score,
        last_active: status.last_active,
        flags: status.flags,
    }
}

fn rounded_mean(values: impl Iterator<Item = u8>) -> u8 {
    let (total, count) = values.fold((0u32, 0u32), |(total, count), value| {
        (total + u32::from(value), count + 1)
    });
    if count == 0 {
        return 0;
    }
    (f64::from(total) / f64::from(count)).round() as u8
}
