use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    email_taken, CalendarRepository, LecturerRepository, RepoResult, StudentRepository,
    TaskRepository,
};
use crate::models::{
    ActorRef, CalendarEvent, CalendarInput, Lecturer, LecturerChanges, NewCalendarEvent,
    NewLecturer, NewStudent, NewTask, Student, StudentChanges, Task, TaskInput,
};

/// Rows keyed by id, with ids handed out from 1 upwards like a `SERIAL` column.
struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(i32) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn get(&self, id: i32) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn modify(&mut self, id: i32, change: impl FnOnce(&mut T)) -> Option<T> {
        let row = self.rows.get_mut(&id)?;
        change(row);
        Some(row.clone())
    }

    fn remove(&mut self, id: i32) -> bool {
        self.rows.remove(&id).is_some()
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Process-local store for every record type. Each table has its own lock.
pub struct MemoryRepository {
    students: RwLock<Table<Student>>,
    lecturers: RwLock<Table<Lecturer>>,
    tasks: RwLock<Table<Task>>,
    calendars: RwLock<Table<CalendarEvent>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            students: RwLock::new(Table::new()),
            lecturers: RwLock::new(Table::new()),
            tasks: RwLock::new(Table::new()),
            calendars: RwLock::new(Table::new()),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StudentRepository for MemoryRepository {
    async fn list(&self) -> RepoResult<Vec<Student>> {
        Ok(self.students.read().await.rows.values().cloned().collect())
    }

    async fn find(&self, id: i32) -> RepoResult<Option<Student>> {
        Ok(self.students.read().await.get(id))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Student>> {
        let students = self.students.read().await;
        Ok(students
            .rows
            .values()
            .find(|s| same_email(&s.email, email))
            .cloned())
    }

    async fn create(&self, new: NewStudent) -> RepoResult<Student> {
        let mut students = self.students.write().await;
        if students.rows.values().any(|s| same_email(&s.email, &new.email)) {
            return Err(email_taken());
        }
        let student = students.insert_with(|id| Student::from_new(id, new));
        log::info!("created student {} <{}>", student.id, student.email);
        Ok(student)
    }

    async fn update(&self, id: i32, changes: StudentChanges) -> RepoResult<Option<Student>> {
        let mut students = self.students.write().await;
        if let Some(email) = &changes.email {
            if students
                .rows
                .values()
                .any(|s| s.id != id && same_email(&s.email, email))
            {
                return Err(email_taken());
            }
        }
        Ok(students.modify(id, |student| student.apply(changes)))
    }

    async fn delete(&self, id: i32) -> RepoResult<bool> {
        Ok(self.students.write().await.remove(id))
    }
}

#[async_trait]
impl LecturerRepository for MemoryRepository {
    async fn list(&self) -> RepoResult<Vec<Lecturer>> {
        Ok(self.lecturers.read().await.rows.values().cloned().collect())
    }

    async fn find(&self, id: i32) -> RepoResult<Option<Lecturer>> {
        Ok(self.lecturers.read().await.get(id))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Lecturer>> {
        let lecturers = self.lecturers.read().await;
        Ok(lecturers
            .rows
            .values()
            .find(|l| same_email(&l.email, email))
            .cloned())
    }

    async fn create(&self, new: NewLecturer) -> RepoResult<Lecturer> {
        let mut lecturers = self.lecturers.write().await;
        if lecturers.rows.values().any(|l| same_email(&l.email, &new.email)) {
            return Err(email_taken());
        }
        let lecturer = lecturers.insert_with(|id| Lecturer::from_new(id, new));
        log::info!("created lecturer {} <{}>", lecturer.id, lecturer.email);
        Ok(lecturer)
    }

    async fn update(&self, id: i32, changes: LecturerChanges) -> RepoResult<Option<Lecturer>> {
        let mut lecturers = self.lecturers.write().await;
        if let Some(email) = &changes.email {
            if lecturers
                .rows
                .values()
                .any(|l| l.id != id && same_email(&l.email, email))
            {
                return Err(email_taken());
            }
        }
        Ok(lecturers.modify(id, |lecturer| lecturer.apply(changes)))
    }

    async fn delete(&self, id: i32) -> RepoResult<bool> {
        Ok(self.lecturers.write().await.remove(id))
    }

    async fn toggle_admin(&self, id: i32) -> RepoResult<Option<Lecturer>> {
        Ok(self
            .lecturers
            .write()
            .await
            .modify(id, Lecturer::toggle_admin))
    }
}

#[async_trait]
impl TaskRepository for MemoryRepository {
    async fn list_for(&self, actor: ActorRef) -> RepoResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut result: Vec<Task> = tasks
            .rows
            .values()
            .filter(|t| t.involves(actor))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(result)
    }

    async fn find(&self, id: i32) -> RepoResult<Option<Task>> {
        Ok(self.tasks.read().await.get(id))
    }

    async fn create(&self, new: NewTask) -> RepoResult<Task> {
        Ok(self.tasks.write().await.insert_with(|id| Task::new(id, new)))
    }

    async fn update(&self, id: i32, input: TaskInput) -> RepoResult<Option<Task>> {
        Ok(self.tasks.write().await.modify(id, |task| task.apply(input)))
    }

    async fn delete(&self, id: i32) -> RepoResult<bool> {
        Ok(self.tasks.write().await.remove(id))
    }
}

#[async_trait]
impl CalendarRepository for MemoryRepository {
    async fn list_for(&self, actor: ActorRef) -> RepoResult<Vec<CalendarEvent>> {
        let calendars = self.calendars.read().await;
        let mut result: Vec<CalendarEvent> = calendars
            .rows
            .values()
            .filter(|e| e.involves(actor))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn find(&self, id: i32) -> RepoResult<Option<CalendarEvent>> {
        Ok(self.calendars.read().await.get(id))
    }

    async fn create(&self, new: NewCalendarEvent) -> RepoResult<CalendarEvent> {
        Ok(self
            .calendars
            .write()
            .await
            .insert_with(|id| CalendarEvent::new(id, new)))
    }

    async fn update(&self, id: i32, input: CalendarInput) -> RepoResult<Option<CalendarEvent>> {
        Ok(self
            .calendars
            .write()
            .await
            .modify(id, |event| event.apply(input)))
    }

    async fn delete(&self, id: i32) -> RepoResult<bool> {
        Ok(self.calendars.write().await.remove(id))
    }
}
