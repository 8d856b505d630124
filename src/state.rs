use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenService;
use crate::error::AppError;
use crate::models::{Actor, ActorRef};
use crate::repository::{
    CalendarRepository, LecturerRepository, MemoryRepository, PgRepository, StudentRepository,
    TaskRepository,
};

/// Shared application state, registered once with `web::Data`.
pub struct AppState {
    pub students: Arc<dyn StudentRepository>,
    pub lecturers: Arc<dyn LecturerRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub calendars: Arc<dyn CalendarRepository>,
    pub tokens: TokenService,
    /// bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
}

impl AppState {
    /// State backed by the process-local store. Data is lost on restart.
    pub fn in_memory(tokens: TokenService, password_cost: u32) -> Self {
        let store = Arc::new(MemoryRepository::new());
        Self {
            students: store.clone(),
            lecturers: store.clone(),
            tasks: store.clone(),
            calendars: store,
            tokens,
            password_cost,
        }
    }

    /// State backed by PostgreSQL.
    pub fn postgres(pool: PgPool, tokens: TokenService, password_cost: u32) -> Self {
        let store = Arc::new(PgRepository::new(pool));
        Self {
            students: store.clone(),
            lecturers: store.clone(),
            tasks: store.clone(),
            calendars: store,
            tokens,
            password_cost,
        }
    }

    /// Loads the student or lecturer behind `reference`.
    pub async fn find_actor(&self, reference: ActorRef) -> Result<Option<Actor>, AppError> {
        Ok(match reference {
            ActorRef::Student(id) => self.students.find(id).await?.map(Actor::Student),
            ActorRef::Lecturer(id) => self.lecturers.find(id).await?.map(Actor::Lecturer),
        })
    }

    pub async fn actor_exists(&self, reference: ActorRef) -> Result<bool, AppError> {
        Ok(self.find_actor(reference).await?.is_some())
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::in_memory(
            TokenService::new("unit-test-secret", chrono::Duration::minutes(5)),
            crate::auth::MIN_PASSWORD_COST,
        )
    }
}
