use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{ActorKind, ActorRef};

/// A task handed from its creator to a receiver, either of whom may be a
/// student or a lecturer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub receiver: ActorRef,
    pub creator: ActorRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input structure for creating or updating a task.
/// The creator is always the authenticated caller.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 1 and 255 characters.
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Maximum length of 5000 characters if provided.
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub receiver: ActorRef,
}

/// A task ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub receiver: ActorRef,
    pub creator: ActorRef,
}

/// Flat row shape of the `tasks` table.
#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub receiver_id: i32,
    pub receiver_type: ActorKind,
    pub creator_id: i32,
    pub creator_type: ActorKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            receiver: ActorRef::new(row.receiver_type, row.receiver_id),
            creator: ActorRef::new(row.creator_type, row.creator_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl NewTask {
    pub fn from_input(input: TaskInput, creator: ActorRef) -> Self {
        Self {
            title: input.title,
            description: input.description,
            receiver: input.receiver,
            creator,
        }
    }
}

impl Task {
    /// Creates a `Task` with `created_at` and `updated_at` set to now.
    pub fn new(id: i32, new: NewTask) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: new.title,
            description: new.description,
            receiver: new.receiver,
            creator: new.creator,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `actor` created or received this task.
    pub fn involves(&self, actor: ActorRef) -> bool {
        self.creator == actor || self.receiver == actor
    }

    pub fn apply(&mut self, input: TaskInput) {
        self.title = input.title;
        self.description = input.description;
        self.receiver = input.receiver;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: Some("Read chapter 3".to_string()),
            receiver: ActorRef::Student(2),
        }
    }

    #[test]
    fn test_task_creation() {
        let task = Task::new(1, NewTask::from_input(input("Homework"), ActorRef::Lecturer(1)));
        assert_eq!(task.title, "Homework");
        assert_eq!(task.creator, ActorRef::Lecturer(1));
        assert!(task.involves(ActorRef::Student(2)));
        assert!(task.involves(ActorRef::Lecturer(1)));
        assert!(!task.involves(ActorRef::Student(1)));
    }

    #[test]
    fn test_task_validation() {
        assert!(input("Valid Task").validate().is_ok());
        assert!(input("").validate().is_err());
        assert!(input(&"a".repeat(256)).validate().is_err());
    }

    #[test]
    fn test_row_conversion() {
        let now = Utc::now();
        let task: Task = TaskRow {
            id: 5,
            title: "t".to_string(),
            description: None,
            receiver_id: 3,
            receiver_type: ActorKind::Lecturer,
            creator_id: 4,
            creator_type: ActorKind::Student,
            created_at: now,
            updated_at: now,
        }
        .into();
        assert_eq!(task.receiver, ActorRef::Lecturer(3));
        assert_eq!(task.creator, ActorRef::Student(4));
    }
}
