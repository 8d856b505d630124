//! The route table.
//!
//! Every endpoint under [`API_PREFIX`] is listed once in [`ROUTES`] together
//! with its access tier. [`config`] registers the table with actix, and
//! [`AuthMiddleware`](crate::auth::AuthMiddleware) consults the same table
//! through [`lookup`] to decide whether a request needs a bearer token.

pub mod auth;
pub mod calendars;
pub mod health;
pub mod lecturers;
pub mod students;
pub mod tasks;

use actix_web::{http::Method, web, Route};

use crate::error::AppError;

/// Mount point of every entry in [`ROUTES`].
pub const API_PREFIX: &str = "/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn from_method(method: &Method) -> Option<Self> {
        [Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete]
            .into_iter()
            .find(|verb| verb.method() == *method)
    }

    pub fn method(&self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }
}

/// Who may call a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// No credentials needed.
    Public,
    /// A valid, unrevoked bearer token is required.
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    LoginStudent,
    LoginLecturer,
    Logout,
    Refresh,
    Me,
    ListStudents,
    CreateStudent,
    ShowStudent,
    UpdateStudent,
    DeleteStudent,
    ListLecturers,
    CreateLecturer,
    ShowLecturer,
    UpdateLecturer,
    DeleteLecturer,
    ToggleLecturerAdmin,
    ListTasks,
    CreateTask,
    ShowTask,
    UpdateTask,
    DeleteTask,
    ListCalendars,
    CreateCalendar,
    ShowCalendar,
    UpdateCalendar,
    DeleteCalendar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub verb: Verb,
    /// Path relative to [`API_PREFIX`]; `{name}` segments match any value.
    pub path: &'static str,
    pub action: Action,
    pub tier: Tier,
}

const fn public(verb: Verb, path: &'static str, action: Action) -> RouteEntry {
    RouteEntry {
        verb,
        path,
        action,
        tier: Tier::Public,
    }
}

const fn guarded(verb: Verb, path: &'static str, action: Action) -> RouteEntry {
    RouteEntry {
        verb,
        path,
        action,
        tier: Tier::Authenticated,
    }
}

pub static ROUTES: &[RouteEntry] = &[
    public(Verb::Post, "/login", Action::Login),
    public(Verb::Post, "/login/student", Action::LoginStudent),
    public(Verb::Post, "/login/lecturer", Action::LoginLecturer),
    guarded(Verb::Post, "/logout", Action::Logout),
    guarded(Verb::Post, "/refresh", Action::Refresh),
    guarded(Verb::Get, "/me", Action::Me),
    guarded(Verb::Get, "/students", Action::ListStudents),
    guarded(Verb::Post, "/students", Action::CreateStudent),
    guarded(Verb::Get, "/students/{id}", Action::ShowStudent),
    guarded(Verb::Put, "/students/{id}", Action::UpdateStudent),
    guarded(Verb::Delete, "/students/{id}", Action::DeleteStudent),
    guarded(Verb::Get, "/lecturers", Action::ListLecturers),
    guarded(Verb::Post, "/lecturers", Action::CreateLecturer),
    guarded(Verb::Get, "/lecturers/{id}", Action::ShowLecturer),
    guarded(Verb::Put, "/lecturers/{id}", Action::UpdateLecturer),
    guarded(Verb::Delete, "/lecturers/{id}", Action::DeleteLecturer),
    guarded(Verb::Patch, "/lecturers/{id}/admin-status", Action::ToggleLecturerAdmin),
    guarded(Verb::Get, "/tasks", Action::ListTasks),
    guarded(Verb::Post, "/tasks", Action::CreateTask),
    guarded(Verb::Get, "/tasks/{id}", Action::ShowTask),
    guarded(Verb::Put, "/tasks/{id}", Action::UpdateTask),
    guarded(Verb::Delete, "/tasks/{id}", Action::DeleteTask),
    guarded(Verb::Get, "/calendars", Action::ListCalendars),
    guarded(Verb::Post, "/calendars", Action::CreateCalendar),
    guarded(Verb::Get, "/calendars/{id}", Action::ShowCalendar),
    guarded(Verb::Put, "/calendars/{id}", Action::UpdateCalendar),
    guarded(Verb::Delete, "/calendars/{id}", Action::DeleteCalendar),
];

impl RouteEntry {
    pub fn requires_auth(&self) -> bool {
        self.tier == Tier::Authenticated
    }

    pub fn matches(&self, verb: Verb, path: &str) -> bool {
        self.verb == verb && path_matches(self.path, path)
    }
}

fn path_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = trim_path(pattern).split('/');
    let mut path_segments = trim_path(path).split('/');
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(expected), Some(actual)) => {
                let is_param = expected.starts_with('{') && expected.ends_with('}');
                if is_param {
                    if actual.is_empty() {
                        return false;
                    }
                } else if expected != actual {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

fn trim_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Finds the entry for `path` (relative to [`API_PREFIX`]).
pub fn lookup(verb: Verb, path: &str) -> Option<&'static RouteEntry> {
    ROUTES.iter().find(|entry| entry.matches(verb, path))
}

fn route_for(entry: &RouteEntry) -> Route {
    let route = web::method(entry.verb.method());
    match entry.action {
        Action::Login => route.to(auth::login),
        Action::LoginStudent => route.to(auth::login_student),
        Action::LoginLecturer => route.to(auth::login_lecturer),
        Action::Logout => route.to(auth::logout),
        Action::Refresh => route.to(auth::refresh),
        Action::Me => route.to(auth::me),
        Action::ListStudents => route.to(students::list_students),
        Action::CreateStudent => route.to(students::create_student),
        Action::ShowStudent => route.to(students::get_student),
        Action::UpdateStudent => route.to(students::update_student),
        Action::DeleteStudent => route.to(students::delete_student),
        Action::ListLecturers => route.to(lecturers::list_lecturers),
        Action::CreateLecturer => route.to(lecturers::create_lecturer),
        Action::ShowLecturer => route.to(lecturers::get_lecturer),
        Action::UpdateLecturer => route.to(lecturers::update_lecturer),
        Action::DeleteLecturer => route.to(lecturers::delete_lecturer),
        Action::ToggleLecturerAdmin => route.to(lecturers::toggle_admin_status),
        Action::ListTasks => route.to(tasks::get_tasks),
        Action::CreateTask => route.to(tasks::create_task),
        Action::ShowTask => route.to(tasks::get_task),
        Action::UpdateTask => route.to(tasks::update_task),
        Action::DeleteTask => route.to(tasks::delete_task),
        Action::ListCalendars => route.to(calendars::get_events),
        Action::CreateCalendar => route.to(calendars::create_event),
        Action::ShowCalendar => route.to(calendars::get_event),
        Action::UpdateCalendar => route.to(calendars::update_event),
        Action::DeleteCalendar => route.to(calendars::delete_event),
    }
}

/// Registers every entry of [`ROUTES`], one resource per distinct path.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(err.to_string()).into()
    }));

    let mut paths: Vec<&'static str> = Vec::new();
    for entry in ROUTES {
        if !paths.contains(&entry.path) {
            paths.push(entry.path);
        }
    }

    for path in paths {
        let resource = ROUTES
            .iter()
            .filter(|entry| entry.path == path)
            .fold(web::resource(path), |resource, entry| {
                resource.route(route_for(entry))
            });
        cfg.service(resource);
    }
}
