use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    email_taken, CalendarRepository, LecturerRepository, RepoResult, StudentRepository,
    TaskRepository,
};
use crate::error::AppError;
use crate::models::calendar::CalendarRow;
use crate::models::task::TaskRow;
use crate::models::{
    ActorRef, CalendarEvent, CalendarInput, Lecturer, LecturerChanges, NewCalendarEvent,
    NewLecturer, NewStudent, NewTask, Student, StudentChanges, Task, TaskInput,
};

const STUDENT_COLUMNS: &str = "id, student_code, full_name, email, phone, class_name, password_hash, created_at, updated_at";
const LECTURER_COLUMNS: &str = "id, lecturer_code, full_name, email, phone, department, is_admin, password_hash, created_at, updated_at";
const TASK_COLUMNS: &str = "id, title, description, receiver_id, receiver_type, creator_id, creator_type, created_at, updated_at";
const CALENDAR_COLUMNS: &str = "id, title, description, start_time, end_time, event_type, participant_id, participant_type, creator_id, creator_type, created_at, updated_at";

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Maps a failed student or lecturer write. The `email_in_use` pre-check can
/// race with a concurrent write, so a unique violation on an email index is
/// still reported as a taken email.
fn account_write_error(error: sqlx::Error) -> AppError {
    let classified = error
        .as_database_error()
        .and_then(|db| classify_unique_violation(db.code().as_deref(), db.constraint()));
    classified.unwrap_or_else(|| error.into())
}

fn classify_unique_violation(code: Option<&str>, constraint: Option<&str>) -> Option<AppError> {
    if code != Some(UNIQUE_VIOLATION) {
        return None;
    }
    Some(match constraint {
        Some(name) if name.contains("code") => {
            AppError::BadRequest("Code already registered".into())
        }
        _ => email_taken(),
    })
}

/// PostgreSQL-backed store. Expects the `students`, `lecturers`, `tasks` and
/// `calendars` tables plus the `actor_type` and `calendar_event_type` enums.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn email_in_use(&self, table: &str, email: &str, except_id: Option<i32>) -> RepoResult<bool> {
        let sql = format!(
            "SELECT id FROM {} WHERE LOWER(email) = LOWER($1) AND ($2::INT IS NULL OR id <> $2)",
            table
        );
        let existing = sqlx::query_as::<_, (i32,)>(&sql)
            .bind(email)
            .bind(except_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(existing.is_some())
    }

    async fn delete_from(&self, table: &str, id: i32) -> RepoResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StudentRepository for PgRepository {
    async fn list(&self) -> RepoResult<Vec<Student>> {
        let sql = format!("SELECT {} FROM students ORDER BY id", STUDENT_COLUMNS);
        Ok(sqlx::query_as::<_, Student>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find(&self, id: i32) -> RepoResult<Option<Student>> {
        let sql = format!("SELECT {} FROM students WHERE id = $1", STUDENT_COLUMNS);
        Ok(sqlx::query_as::<_, Student>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Student>> {
        let sql = format!(
            "SELECT {} FROM students WHERE LOWER(email) = LOWER($1)",
            STUDENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Student>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, new: NewStudent) -> RepoResult<Student> {
        if self.email_in_use("students", &new.email, None).await? {
            return Err(email_taken());
        }
        let sql = format!(
            "INSERT INTO students (student_code, full_name, email, phone, class_name, password_hash)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            STUDENT_COLUMNS
        );
        let student = sqlx::query_as::<_, Student>(&sql)
            .bind(&new.student_code)
            .bind(&new.full_name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.class_name)
            .bind(&new.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(account_write_error)?;
        log::info!("created student {} <{}>", student.id, student.email);
        Ok(student)
    }

    async fn update(&self, id: i32, changes: StudentChanges) -> RepoResult<Option<Student>> {
        if let Some(email) = &changes.email {
            if self.email_in_use("students", email, Some(id)).await? {
                return Err(email_taken());
            }
        }
        let sql = format!(
            "UPDATE students SET
                student_code = COALESCE($1, student_code),
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                class_name = COALESCE($5, class_name),
                password_hash = COALESCE($6, password_hash),
                updated_at = NOW()
             WHERE id = $7
             RETURNING {}",
            STUDENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Student>(&sql)
            .bind(changes.student_code)
            .bind(changes.full_name)
            .bind(changes.email)
            .bind(changes.phone)
            .bind(changes.class_name)
            .bind(changes.password_hash)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(account_write_error)?)
    }

    async fn delete(&self, id: i32) -> RepoResult<bool> {
        self.delete_from("students", id).await
    }
}

#[async_trait]
impl LecturerRepository for PgRepository {
    async fn list(&self) -> RepoResult<Vec<Lecturer>> {
        let sql = format!("SELECT {} FROM lecturers ORDER BY id", LECTURER_COLUMNS);
        Ok(sqlx::query_as::<_, Lecturer>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find(&self, id: i32) -> RepoResult<Option<Lecturer>> {
        let sql = format!("SELECT {} FROM lecturers WHERE id = $1", LECTURER_COLUMNS);
        Ok(sqlx::query_as::<_, Lecturer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Lecturer>> {
        let sql = format!(
            "SELECT {} FROM lecturers WHERE LOWER(email) = LOWER($1)",
            LECTURER_COLUMNS
        );
        Ok(sqlx::query_as::<_, Lecturer>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, new: NewLecturer) -> RepoResult<Lecturer> {
        if self.email_in_use("lecturers", &new.email, None).await? {
            return Err(email_taken());
        }
        let sql = format!(
            "INSERT INTO lecturers (lecturer_code, full_name, email, phone, department, is_admin, password_hash)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            LECTURER_COLUMNS
        );
        let lecturer = sqlx::query_as::<_, Lecturer>(&sql)
            .bind(&new.lecturer_code)
            .bind(&new.full_name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.department)
            .bind(new.is_admin)
            .bind(&new.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(account_write_error)?;
        log::info!("created lecturer {} <{}>", lecturer.id, lecturer.email);
        Ok(lecturer)
    }

    async fn update(&self, id: i32, changes: LecturerChanges) -> RepoResult<Option<Lecturer>> {
        if let Some(email) = &changes.email {
            if self.email_in_use("lecturers", email, Some(id)).await? {
                return Err(email_taken());
            }
        }
        let sql = format!(
            "UPDATE lecturers SET
                lecturer_code = COALESCE($1, lecturer_code),
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                department = COALESCE($5, department),
                password_hash = COALESCE($6, password_hash),
                updated_at = NOW()
             WHERE id = $7
             RETURNING {}",
            LECTURER_COLUMNS
        );
        Ok(sqlx::query_as::<_, Lecturer>(&sql)
            .bind(changes.lecturer_code)
            .bind(changes.full_name)
            .bind(changes.email)
            .bind(changes.phone)
            .bind(changes.department)
            .bind(changes.password_hash)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(account_write_error)?)
    }

    async fn delete(&self, id: i32) -> RepoResult<bool> {
        self.delete_from("lecturers", id).await
    }

    async fn toggle_admin(&self, id: i32) -> RepoResult<Option<Lecturer>> {
        let sql = format!(
            "UPDATE lecturers SET is_admin = NOT is_admin, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            LECTURER_COLUMNS
        );
        Ok(sqlx::query_as::<_, Lecturer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl TaskRepository for PgRepository {
    async fn list_for(&self, actor: ActorRef) -> RepoResult<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks
             WHERE (creator_type = $1 AND creator_id = $2)
                OR (receiver_type = $1 AND receiver_id = $2)
             ORDER BY created_at DESC, id DESC",
            TASK_COLUMNS
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(actor.kind())
            .bind(actor.id())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn find(&self, id: i32) -> RepoResult<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn create(&self, new: NewTask) -> RepoResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (title, description, receiver_id, receiver_type, creator_id, creator_type)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            TASK_COLUMNS
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(&new.title)
            .bind(&new.description)
            .bind(new.receiver.id())
            .bind(new.receiver.kind())
            .bind(new.creator.id())
            .bind(new.creator.kind())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, id: i32, input: TaskInput) -> RepoResult<Option<Task>> {
        let sql = format!(
            "UPDATE tasks
             SET title = $1, description = $2, receiver_id = $3, receiver_type = $4, updated_at = NOW()
             WHERE id = $5
             RETURNING {}",
            TASK_COLUMNS
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.receiver.id())
            .bind(input.receiver.kind())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn delete(&self, id: i32) -> RepoResult<bool> {
        self.delete_from("tasks", id).await
    }
}

#[async_trait]
impl CalendarRepository for PgRepository {
    async fn list_for(&self, actor: ActorRef) -> RepoResult<Vec<CalendarEvent>> {
        let sql = format!(
            "SELECT {} FROM calendars
             WHERE (creator_type = $1 AND creator_id = $2)
                OR (participant_type = $1 AND participant_id = $2)
             ORDER BY start_time, id",
            CALENDAR_COLUMNS
        );
        let rows = sqlx::query_as::<_, CalendarRow>(&sql)
            .bind(actor.kind())
            .bind(actor.id())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(CalendarEvent::from).collect())
    }

    async fn find(&self, id: i32) -> RepoResult<Option<CalendarEvent>> {
        let sql = format!("SELECT {} FROM calendars WHERE id = $1", CALENDAR_COLUMNS);
        let row = sqlx::query_as::<_, CalendarRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CalendarEvent::from))
    }

    async fn create(&self, new: NewCalendarEvent) -> RepoResult<CalendarEvent> {
        let sql = format!(
            "INSERT INTO calendars
                (title, description, start_time, end_time, event_type,
                 participant_id, participant_type, creator_id, creator_type)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {}",
            CALENDAR_COLUMNS
        );
        let row = sqlx::query_as::<_, CalendarRow>(&sql)
            .bind(&new.title)
            .bind(&new.description)
            .bind(new.start_time)
            .bind(new.end_time)
            .bind(new.event_type)
            .bind(new.participant.id())
            .bind(new.participant.kind())
            .bind(new.creator.id())
            .bind(new.creator.kind())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, id: i32, input: CalendarInput) -> RepoResult<Option<CalendarEvent>> {
        let sql = format!(
            "UPDATE calendars
             SET title = $1, description = $2, start_time = $3, end_time = $4, event_type = $5,
                 participant_id = $6, participant_type = $7, updated_at = NOW()
             WHERE id = $8
             RETURNING {}",
            CALENDAR_COLUMNS
        );
        let row = sqlx::query_as::<_, CalendarRow>(&sql)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.event_type)
            .bind(input.participant.id())
            .bind(input.participant.kind())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CalendarEvent::from))
    }

    async fn delete(&self, id: i32) -> RepoResult<bool> {
        self.delete_from("calendars", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_unique_violation_reads_as_taken_email() {
        for constraint in [Some("students_email_key"), Some("lecturers_email_lower_idx"), None] {
            match classify_unique_violation(Some("23505"), constraint) {
                Some(AppError::BadRequest(msg)) => assert_eq!(msg, "Email already registered"),
                other => panic!("{:?} -> {:?}", constraint, other),
            }
        }
    }

    #[test]
    fn test_code_unique_violation_is_bad_request() {
        assert!(matches!(
            classify_unique_violation(Some("23505"), Some("students_student_code_key")),
            Some(AppError::BadRequest(msg)) if msg == "Code already registered"
        ));
    }

    #[test]
    fn test_other_database_errors_are_left_alone() {
        assert!(classify_unique_violation(Some("23503"), Some("tasks_creator_fk")).is_none());
        assert!(classify_unique_violation(None, None).is_none());
    }
}
