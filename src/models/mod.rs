pub mod actor;
pub mod calendar;
pub mod lecturer;
pub mod student;
pub mod task;

use lazy_static::lazy_static;

pub use actor::{Actor, ActorKind, ActorRef};
pub use calendar::{CalendarEvent, CalendarInput, EventType, NewCalendarEvent};
pub use lecturer::{Lecturer, LecturerChanges, LecturerInput, LecturerUpdate, NewLecturer};
pub use student::{NewStudent, Student, StudentChanges, StudentInput, StudentUpdate};
pub use task::{NewTask, Task, TaskInput};

lazy_static! {
    // Student and lecturer codes: alphanumeric, underscores, hyphens
    pub(crate) static ref CODE_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}
