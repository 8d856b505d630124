use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use validator::Validate;

use super::{ActorKind, ActorRef};
use crate::error::{Context, TaskError};

/// What a calendar entry stands for.
/// Corresponds to the `calendar_event_type` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "calendar_event_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Event,
    Task,
}

/// A calendar entry for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub event_type: EventType,
    pub participant: ActorRef,
    pub creator: ActorRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or replacing a calendar event.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CalendarInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub event_type: EventType,
    pub participant: ActorRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCalendarEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub event_type: EventType,
    pub participant: ActorRef,
    pub creator: ActorRef,
}

#[derive(Debug, FromRow)]
pub struct CalendarRow {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub event_type: EventType,
    pub participant_id: i32,
    pub participant_type: ActorKind,
    pub creator_id: i32,
    pub creator_type: ActorKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CalendarRow> for CalendarEvent {
    fn from(row: CalendarRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            start_time: row.start_time,
            end_time: row.end_time,
            event_type: row.event_type,
            participant: ActorRef::new(row.participant_type, row.participant_id),
            creator: ActorRef::new(row.creator_type, row.creator_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Rejects a schedule whose end precedes its start.
pub fn check_schedule(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<(), TaskError> {
    if end_time < start_time {
        let mut context = Context::new();
        context.insert("start_time".into(), json!(start_time));
        context.insert("end_time".into(), json!(end_time));
        return Err(TaskError::business_rule_violation(
            "end_time_before_start_time",
            context,
        ));
    }
    Ok(())
}

impl CalendarInput {
    pub fn check_schedule(&self) -> Result<(), TaskError> {
        check_schedule(self.start_time, self.end_time)
    }
}

impl NewCalendarEvent {
    pub fn from_input(input: CalendarInput, creator: ActorRef) -> Self {
        Self {
            title: input.title,
            description: input.description,
            start_time: input.start_time,
            end_time: input.end_time,
            event_type: input.event_type,
            participant: input.participant,
            creator,
        }
    }
}

impl CalendarEvent {
    pub fn new(id: i32, new: NewCalendarEvent) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: new.title,
            description: new.description,
            start_time: new.start_time,
            end_time: new.end_time,
            event_type: new.event_type,
            participant: new.participant,
            creator: new.creator,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn involves(&self, actor: ActorRef) -> bool {
        self.creator == actor || self.participant == actor
    }

    pub fn apply(&mut self, input: CalendarInput) {
        self.title = input.title;
        self.description = input.description;
        self.start_time = input.start_time;
        self.end_time = input.end_time;
        self.event_type = input.event_type;
        self.participant = input.participant;
        self.updated_at = Utc::now();
    }
}
