//! Random fixture generators for tasks and calendar events.
//!
//! Every call is an independent draw. The `_with` variants take the RNG
//! explicitly so callers can seed it; the plain variants use the thread RNG.

use chrono::{DateTime, Duration, Months, Utc};
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::Fake;
use rand::Rng;

use crate::models::{ActorKind, ActorRef, EventType, NewCalendarEvent, NewTask};

/// Lowest actor id a fixture refers to.
pub const MIN_ACTOR_ID: i32 = 1;

/// Highest actor id a fixture refers to.
pub const MAX_ACTOR_ID: i32 = 10;

pub fn fake_actor_ref<R: Rng>(rng: &mut R) -> ActorRef {
    let kind = if rng.random_bool(0.5) {
        ActorKind::Lecturer
    } else {
        ActorKind::Student
    };
    ActorRef::new(kind, rng.random_range(MIN_ACTOR_ID..=MAX_ACTOR_ID))
}

pub fn fake_task_with<R: Rng>(rng: &mut R) -> NewTask {
    NewTask {
        title: Sentence(3..7).fake_with_rng(rng),
        description: Some(Paragraph(2..4).fake_with_rng(rng)),
        receiver: fake_actor_ref(rng),
        creator: fake_actor_ref(rng),
    }
}

pub fn fake_task() -> NewTask {
    fake_task_with(&mut rand::rng())
}

/// Start falls within the next month; the event lasts up to two months.
pub fn fake_calendar_event_with<R: Rng>(rng: &mut R) -> NewCalendarEvent {
    let now = Utc::now();
    let start_limit = now
        .checked_add_months(Months::new(1))
        .unwrap_or(now + Duration::days(31));
    let start_time = between(rng, now, start_limit);

    let end_limit = start_time
        .checked_add_months(Months::new(2))
        .unwrap_or(start_time + Duration::days(62));
    let end_time = between(rng, start_time, end_limit);

    let event_type = if rng.random_bool(0.5) {
        EventType::Event
    } else {
        EventType::Task
    };

    NewCalendarEvent {
        title: Sentence(3..7).fake_with_rng(rng),
        description: Some(Paragraph(2..4).fake_with_rng(rng)),
        start_time,
        end_time,
        event_type,
        participant: fake_actor_ref(rng),
        creator: fake_actor_ref(rng),
    }
}

pub fn fake_calendar_event() -> NewCalendarEvent {
    fake_calendar_event_with(&mut rand::rng())
}

// Uniform instant in [from, to], second precision.
fn between<R: Rng>(rng: &mut R, from: DateTime<Utc>, to: DateTime<Utc>) -> DateTime<Utc> {
    let span = (to - from).num_seconds().max(0);
    from + Duration::seconds(rng.random_range(0..=span))
}
