use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DateRange, GroupCount};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    /// Done and cancelled tasks are never overdue.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Todo | Self::InProgress)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todo => write!(f, "todo"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Done => write!(f, "done"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown task status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Sort weight; higher is more pressing.
    pub fn weight(self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }

    pub fn from_weight(weight: i64) -> Self {
        match weight {
            i64::MIN..=1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            _ => Self::Urgent,
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(format!("Unknown task priority: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_email: Option<String>,
    pub tags: Vec<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: String, user_id: String, title: String) -> Self {
        let now = super::utc_now();
        Self {
            id,
            user_id,
            title,
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            assignee_email: None,
            tags: Vec::new(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Change status, stamping `completed_at` on entry to done and clearing
    /// it on any other status.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        if status == TaskStatus::Done {
            if self.status != TaskStatus::Done || self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        self.status = status;
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.due_date.is_some_and(|due| due < now)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListTasksFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub due: DateRange,
    pub overdue: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: u64,
    pub by_status: Vec<GroupCount>,
    pub by_priority: Vec<GroupCount>,
    pub overdue: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_priority_weight_round_trip() {
        for priority in [
            TaskPriority::Low,
            TaskPriority::Medium,
            TaskPriority::High,
            TaskPriority::Urgent,
        ] {
            assert_eq!(TaskPriority::from_weight(priority.weight()), priority);
        }
        assert!(TaskPriority::Urgent.weight() > TaskPriority::Low.weight());
    }

    #[test]
    fn test_set_status_tracks_completion() {
        let now = Utc::now();
        let mut task = Task::new("t1".into(), "u1".into(), "Ship it".into());
        task.set_status(TaskStatus::Done, now);
        assert_eq!(task.completed_at, Some(now));

        let later = now + Duration::minutes(5);
        task.set_status(TaskStatus::Done, later);
        assert_eq!(task.completed_at, Some(now));

        task.set_status(TaskStatus::InProgress, later);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_overdue_only_for_open_tasks() {
        let now = Utc::now();
        let mut task = Task::new("t1".into(), "u1".into(), "Renew domain".into());
        assert!(!task.is_overdue(now));

        task.due_date = Some(now - Duration::days(1));
        assert!(task.is_overdue(now));

        task.set_status(TaskStatus::Cancelled, now);
        assert!(!task.is_overdue(now));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("blocked".parse::<TaskStatus>().is_err());
    }
}
