//! Persistence seams.
//!
//! Handlers only talk to these traits. [`MemoryRepository`] keeps everything
//! in process and backs the tests and database-less runs; [`PgRepository`]
//! stores the same records in PostgreSQL through `sqlx`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    ActorRef, CalendarEvent, CalendarInput, Lecturer, LecturerChanges, NewCalendarEvent,
    NewLecturer, NewStudent, NewTask, Student, StudentChanges, Task, TaskInput,
};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

pub type RepoResult<T> = Result<T, AppError>;

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<Student>>;

    async fn find(&self, id: i32) -> RepoResult<Option<Student>>;

    /// Case-insensitive lookup used by login.
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Student>>;

    /// Fails with `BadRequest` when the email is already taken.
    async fn create(&self, new: NewStudent) -> RepoResult<Student>;

    /// Returns `None` when no student has `id`.
    async fn update(&self, id: i32, changes: StudentChanges) -> RepoResult<Option<Student>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i32) -> RepoResult<bool>;
}

#[async_trait]
pub trait LecturerRepository: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<Lecturer>>;

    async fn find(&self, id: i32) -> RepoResult<Option<Lecturer>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Lecturer>>;

    async fn create(&self, new: NewLecturer) -> RepoResult<Lecturer>;

    async fn update(&self, id: i32, changes: LecturerChanges) -> RepoResult<Option<Lecturer>>;

    async fn delete(&self, id: i32) -> RepoResult<bool>;

    /// Flips `is_admin` in a single step and returns the updated lecturer.
    async fn toggle_admin(&self, id: i32) -> RepoResult<Option<Lecturer>>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Tasks created by or assigned to `actor`, newest first.
    async fn list_for(&self, actor: ActorRef) -> RepoResult<Vec<Task>>;

    async fn find(&self, id: i32) -> RepoResult<Option<Task>>;

    async fn create(&self, new: NewTask) -> RepoResult<Task>;

    async fn update(&self, id: i32, input: TaskInput) -> RepoResult<Option<Task>>;

    async fn delete(&self, id: i32) -> RepoResult<bool>;
}

#[async_trait]
pub trait CalendarRepository: Send + Sync {
    /// Events created by or scheduled for `actor`, by start time.
    async fn list_for(&self, actor: ActorRef) -> RepoResult<Vec<CalendarEvent>>;

    async fn find(&self, id: i32) -> RepoResult<Option<CalendarEvent>>;

    async fn create(&self, new: NewCalendarEvent) -> RepoResult<CalendarEvent>;

    async fn update(&self, id: i32, input: CalendarInput) -> RepoResult<Option<CalendarEvent>>;

    async fn delete(&self, id: i32) -> RepoResult<bool>;
}

pub(crate) fn email_taken() -> AppError {
    AppError::BadRequest("Email already registered".into())
}
