//! MySQL-backed repositories, the disk file store, and shared app state.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use guidance::accounts::{NewUser, Role, User, UserRepository};
use guidance::admissions::{
    ApplicantDetails, ApplicationId, ApplicationRecord, ApplicationRepository, ApplicationRow,
    ApplicationStatus, CourseSelection, FileStore, FileStoreError, NewApplication,
};
use guidance::catalog::{CatalogRepository, Course, Faculty, Institution};
use guidance::config::DatabaseConfig;
use guidance::storage::RepositoryError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Connection pool with an eager liveness probe, so a bad `DATABASE_URL`
/// fails at startup instead of on the first request.
pub(crate) async fn create_pool(config: &DatabaseConfig) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    tracing::info!(max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}

pub(crate) async fn run_migrations(pool: &MySqlPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("database migrations applied");
    Ok(())
}

fn storage_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        other => RepositoryError::Unavailable(other.to_string()),
    }
}

fn parse_status(raw: &str) -> Result<ApplicationStatus, RepositoryError> {
    ApplicationStatus::parse(raw)
        .ok_or_else(|| RepositoryError::Unavailable(format!("unexpected stored status '{raw}'")))
}

pub(crate) struct MySqlApplicationRepository {
    pool: MySqlPool,
}

impl MySqlApplicationRepository {
    pub(crate) fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ApplicationJoinRow {
    id: i64,
    name: String,
    email: String,
    phone: String,
    institution_id: i64,
    faculty_id: i64,
    course_id: i64,
    result_file: Option<String>,
    status: String,
    submitted_at: DateTime<Utc>,
    institution_name: String,
    faculty_name: String,
    course_name: String,
}

impl ApplicationJoinRow {
    fn into_domain(self) -> Result<ApplicationRow, RepositoryError> {
        let status = parse_status(&self.status)?;
        Ok(ApplicationRow {
            record: ApplicationRecord {
                id: ApplicationId(self.id),
                applicant: ApplicantDetails {
                    name: self.name,
                    email: self.email,
                    phone: self.phone,
                },
                selection: CourseSelection {
                    institution_id: self.institution_id,
                    faculty_id: self.faculty_id,
                    course_id: self.course_id,
                },
                result_file: self.result_file,
                status,
                submitted_at: self.submitted_at,
            },
            institution_name: self.institution_name,
            faculty_name: self.faculty_name,
            course_name: self.course_name,
        })
    }
}

#[async_trait]
impl ApplicationRepository for MySqlApplicationRepository {
    async fn insert(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let submitted_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO applications \
             (name, email, phone, institution_id, faculty_id, course_id, result_file, status, submitted_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&application.applicant.name)
        .bind(&application.applicant.email)
        .bind(&application.applicant.phone)
        .bind(application.selection.institution_id)
        .bind(application.selection.faculty_id)
        .bind(application.selection.course_id)
        .bind(&application.result_file)
        .bind(ApplicationStatus::Pending.label())
        .bind(submitted_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(ApplicationRecord {
            id: ApplicationId(result.last_insert_id() as i64),
            applicant: application.applicant,
            selection: application.selection,
            result_file: application.result_file,
            status: ApplicationStatus::Pending,
            submitted_at,
        })
    }

    async fn list_for_institution(
        &self,
        institution_id: i64,
    ) -> Result<Vec<ApplicationRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, ApplicationJoinRow>(
            "SELECT a.id, a.name, a.email, a.phone, a.institution_id, a.faculty_id, a.course_id, \
                    a.result_file, a.status, a.submitted_at, \
                    i.name AS institution_name, f.name AS faculty_name, c.name AS course_name \
             FROM applications a \
             JOIN institutions i ON a.institution_id = i.id \
             JOIN faculties f ON a.faculty_id = f.id \
             JOIN courses c ON a.course_id = c.id \
             WHERE a.institution_id = ?",
        )
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(ApplicationJoinRow::into_domain).collect()
    }

    async fn set_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE applications SET status = ? WHERE id = ?")
            .bind(status.label())
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_with_status(
        &self,
        institution_id: i64,
        status: ApplicationStatus,
    ) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE institution_id = ? AND status = ?",
        )
        .bind(institution_id)
        .bind(status.label())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(count as u64)
    }
}

pub(crate) struct MySqlCatalogRepository {
    pool: MySqlPool,
}

impl MySqlCatalogRepository {
    pub(crate) fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn id_exists(&self, table: &str, id: i64) -> Result<bool, RepositoryError> {
        // Table names come from the fixed call sites below, never from input.
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE id = ?"))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(count > 0)
    }
}

#[derive(sqlx::FromRow)]
struct InstitutionRow {
    id: i64,
    name: String,
}

#[derive(sqlx::FromRow)]
struct FacultyRow {
    id: i64,
    institution_id: i64,
    name: String,
}

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: i64,
    faculty_id: i64,
    name: String,
}

#[async_trait]
impl CatalogRepository for MySqlCatalogRepository {
    async fn list_institutions(&self) -> Result<Vec<Institution>, RepositoryError> {
        let rows = sqlx::query_as::<_, InstitutionRow>("SELECT id, name FROM institutions")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(rows
            .into_iter()
            .map(|row| Institution {
                id: row.id,
                name: row.name,
            })
            .collect())
    }

    async fn faculties_for_institution(
        &self,
        institution_id: i64,
    ) -> Result<Vec<Faculty>, RepositoryError> {
        let rows = sqlx::query_as::<_, FacultyRow>(
            "SELECT id, institution_id, name FROM faculties WHERE institution_id = ?",
        )
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows
            .into_iter()
            .map(|row| Faculty {
                id: row.id,
                institution_id: row.institution_id,
                name: row.name,
            })
            .collect())
    }

    async fn courses_for_faculty(&self, faculty_id: i64) -> Result<Vec<Course>, RepositoryError> {
        let rows = sqlx::query_as::<_, CourseRow>(
            "SELECT id, faculty_id, name FROM courses WHERE faculty_id = ?",
        )
        .bind(faculty_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows
            .into_iter()
            .map(|row| Course {
                id: row.id,
                faculty_id: row.faculty_id,
                name: row.name,
            })
            .collect())
    }

    async fn add_institution(&self, name: &str) -> Result<Institution, RepositoryError> {
        let result = sqlx::query("INSERT INTO institutions (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(Institution {
            id: result.last_insert_id() as i64,
            name: name.to_string(),
        })
    }

    async fn add_faculty(
        &self,
        institution_id: i64,
        name: &str,
    ) -> Result<Faculty, RepositoryError> {
        let result = sqlx::query("INSERT INTO faculties (institution_id, name) VALUES (?, ?)")
            .bind(institution_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(Faculty {
            id: result.last_insert_id() as i64,
            institution_id,
            name: name.to_string(),
        })
    }

    async fn add_course(&self, faculty_id: i64, name: &str) -> Result<Course, RepositoryError> {
        let result = sqlx::query("INSERT INTO courses (faculty_id, name) VALUES (?, ?)")
            .bind(faculty_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(Course {
            id: result.last_insert_id() as i64,
            faculty_id,
            name: name.to_string(),
        })
    }

    async fn delete_institution(&self, id: i64) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM institutions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn delete_faculty(&self, id: i64) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM faculties WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn delete_course(&self, id: i64) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn institution_exists(&self, id: i64) -> Result<bool, RepositoryError> {
        self.id_exists("institutions", id).await
    }

    async fn faculty_exists(&self, id: i64) -> Result<bool, RepositoryError> {
        self.id_exists("faculties", id).await
    }

    async fn course_exists(&self, id: i64) -> Result<bool, RepositoryError> {
        self.id_exists("courses", id).await
    }
}

pub(crate) struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub(crate) fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    username: String,
    role: String,
    institute_name: Option<String>,
    password_hash: String,
}

impl UserRow {
    fn into_domain(self) -> Result<User, RepositoryError> {
        let role = Role::parse(&self.role).ok_or_else(|| {
            RepositoryError::Unavailable(format!("unexpected stored role '{}'", self.role))
        })?;
        Ok(User {
            id: self.id,
            email: self.email,
            username: self.username,
            role,
            institute_name: self.institute_name,
            password_hash: self.password_hash,
        })
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, username, role, institute_name) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.username)
        .bind(user.role.label())
        .bind(&user.institute_name)
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict
            }
            _ => storage_error(err),
        })?;

        Ok(User {
            id: result.last_insert_id() as i64,
            email: user.email,
            username: user.username,
            role: user.role,
            institute_name: user.institute_name,
            password_hash: user.password_hash,
        })
    }

    async fn find_by_email_and_role(
        &self,
        email: &str,
        role: Role,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, username, role, institute_name, password_hash \
             FROM users WHERE email = ? AND role = ?",
        )
        .bind(email)
        .bind(role.label())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(UserRow::into_domain).transpose()
    }
}

/// Stores attachments under the configured upload directory with a
/// timestamp-prefixed, sanitized file name.
pub(crate) struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    pub(crate) fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn sanitize(file_name: &str) -> String {
        let cleaned: String = file_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if cleaned.is_empty() {
            "attachment".to_string()
        } else {
            cleaned
        }
    }
}

#[async_trait]
impl FileStore for DiskFileStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, FileStoreError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let stored_name = format!("{stamp}-{}", Self::sanitize(file_name));

        tokio::fs::write(self.root.join(&stored_name), bytes).await?;
        Ok(stored_name)
    }
}
