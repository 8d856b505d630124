use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Lecturer, Student};

/// The two kinds of people who can sign in and be referenced by tasks and
/// calendar events. Corresponds to the `actor_type` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "actor_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Lecturer,
    Student,
}

impl ActorKind {
    pub const ALL: [ActorKind; 2] = [ActorKind::Lecturer, ActorKind::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Lecturer => "lecturer",
            ActorKind::Student => "student",
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polymorphic reference to a lecturer or a student.
///
/// Serialized as `{"type": "lecturer", "id": 3}`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ActorRef {
    Lecturer(i32),
    Student(i32),
}

impl ActorRef {
    pub fn new(kind: ActorKind, id: i32) -> Self {
        match kind {
            ActorKind::Lecturer => ActorRef::Lecturer(id),
            ActorKind::Student => ActorRef::Student(id),
        }
    }

    pub fn id(&self) -> i32 {
        match *self {
            ActorRef::Lecturer(id) | ActorRef::Student(id) => id,
        }
    }

    pub fn kind(&self) -> ActorKind {
        match self {
            ActorRef::Lecturer(_) => ActorKind::Lecturer,
            ActorRef::Student(_) => ActorKind::Student,
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.kind(), self.id())
    }
}

/// A loaded student or lecturer record.
#[derive(Debug, Clone, PartialEq)]
pub enum Actor {
    Student(Student),
    Lecturer(Lecturer),
}

impl Actor {
    pub fn reference(&self) -> ActorRef {
        match self {
            Actor::Student(s) => ActorRef::Student(s.id),
            Actor::Lecturer(l) => ActorRef::Lecturer(l.id),
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Actor::Student(s) => &s.password_hash,
            Actor::Lecturer(l) => &l.password_hash,
        }
    }
}
