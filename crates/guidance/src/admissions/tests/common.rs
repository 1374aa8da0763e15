use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::admissions::domain::{
    ApplicantDetails, ApplicationId, ApplicationRecord, ApplicationRow, ApplicationStatus,
    ApplicationSubmission, CourseSelection, NewApplication,
};
use crate::admissions::repository::{ApplicationRepository, FileStore, FileStoreError};
use crate::admissions::service::AdmissionsService;
use crate::catalog::domain::{Course, Faculty, Institution};
use crate::catalog::repository::CatalogRepository;
use crate::config::StorageConfig;
use crate::storage::RepositoryError;

pub(super) fn storage_config() -> StorageConfig {
    StorageConfig {
        upload_dir: PathBuf::from("uploads"),
        public_base_url: "http://localhost:5000".to_string(),
    }
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        applicant: ApplicantDetails {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone: "1".to_string(),
        },
        selection: CourseSelection {
            institution_id: 1,
            faculty_id: 1,
            course_id: 1,
        },
    }
}

/// Catalog fake seeded with institution 1 / faculty 1 / course 1.
#[derive(Default)]
pub(super) struct MemoryCatalog {
    pub(super) institutions: Mutex<HashMap<i64, String>>,
    pub(super) faculties: Mutex<HashMap<i64, (i64, String)>>,
    pub(super) courses: Mutex<HashMap<i64, (i64, String)>>,
}

impl MemoryCatalog {
    pub(super) fn seeded() -> Self {
        let catalog = Self::default();
        catalog
            .institutions
            .lock()
            .unwrap()
            .insert(1, "Tech University".to_string());
        catalog
            .faculties
            .lock()
            .unwrap()
            .insert(1, (1, "Engineering".to_string()));
        catalog
            .courses
            .lock()
            .unwrap()
            .insert(1, (1, "Software Design".to_string()));
        catalog
    }

    fn next_id(entries: &HashMap<i64, impl Sized>) -> i64 {
        entries.keys().copied().max().unwrap_or(0) + 1
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalog {
    async fn list_institutions(&self) -> Result<Vec<Institution>, RepositoryError> {
        Ok(self
            .institutions
            .lock()
            .unwrap()
            .iter()
            .map(|(id, name)| Institution {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn faculties_for_institution(
        &self,
        institution_id: i64,
    ) -> Result<Vec<Faculty>, RepositoryError> {
        Ok(self
            .faculties
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, (owner, _))| *owner == institution_id)
            .map(|(id, (owner, name))| Faculty {
                id: *id,
                institution_id: *owner,
                name: name.clone(),
            })
            .collect())
    }

    async fn courses_for_faculty(&self, faculty_id: i64) -> Result<Vec<Course>, RepositoryError> {
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, (owner, _))| *owner == faculty_id)
            .map(|(id, (owner, name))| Course {
                id: *id,
                faculty_id: *owner,
                name: name.clone(),
            })
            .collect())
    }

    async fn add_institution(&self, name: &str) -> Result<Institution, RepositoryError> {
        let mut guard = self.institutions.lock().unwrap();
        let id = Self::next_id(&guard);
        guard.insert(id, name.to_string());
        Ok(Institution {
            id,
            name: name.to_string(),
        })
    }

    async fn add_faculty(
        &self,
        institution_id: i64,
        name: &str,
    ) -> Result<Faculty, RepositoryError> {
        let mut guard = self.faculties.lock().unwrap();
        let id = Self::next_id(&guard);
        guard.insert(id, (institution_id, name.to_string()));
        Ok(Faculty {
            id,
            institution_id,
            name: name.to_string(),
        })
    }

    async fn add_course(&self, faculty_id: i64, name: &str) -> Result<Course, RepositoryError> {
        let mut guard = self.courses.lock().unwrap();
        let id = Self::next_id(&guard);
        guard.insert(id, (faculty_id, name.to_string()));
        Ok(Course {
            id,
            faculty_id,
            name: name.to_string(),
        })
    }

    async fn delete_institution(&self, id: i64) -> Result<(), RepositoryError> {
        self.institutions.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn delete_faculty(&self, id: i64) -> Result<(), RepositoryError> {
        self.faculties.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn delete_course(&self, id: i64) -> Result<(), RepositoryError> {
        self.courses.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn institution_exists(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.institutions.lock().unwrap().contains_key(&id))
    }

    async fn faculty_exists(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.faculties.lock().unwrap().contains_key(&id))
    }

    async fn course_exists(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.courses.lock().unwrap().contains_key(&id))
    }
}

/// Application fake that resolves join names through the catalog fake, so
/// rows with deleted references drop out of listings the way the SQL inner
/// join does.
pub(super) struct MemoryApplications {
    catalog: Arc<MemoryCatalog>,
    pub(super) records: Mutex<Vec<ApplicationRecord>>,
    next_id: AtomicI64,
}

impl MemoryApplications {
    pub(super) fn new(catalog: Arc<MemoryCatalog>) -> Self {
        Self {
            catalog,
            records: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(0),
        }
    }
}

#[async_trait]
impl ApplicationRepository for MemoryApplications {
    async fn insert(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let record = ApplicationRecord {
            id: ApplicationId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1),
            applicant: application.applicant,
            selection: application.selection,
            result_file: application.result_file,
            status: ApplicationStatus::Pending,
            submitted_at: Utc::now(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_for_institution(
        &self,
        institution_id: i64,
    ) -> Result<Vec<ApplicationRow>, RepositoryError> {
        let institutions = self.catalog.institutions.lock().unwrap().clone();
        let faculties = self.catalog.faculties.lock().unwrap().clone();
        let courses = self.catalog.courses.lock().unwrap().clone();

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.selection.institution_id == institution_id)
            .filter_map(|record| {
                let institution_name = institutions.get(&record.selection.institution_id)?;
                let (_, faculty_name) = faculties.get(&record.selection.faculty_id)?;
                let (_, course_name) = courses.get(&record.selection.course_id)?;
                Some(ApplicationRow {
                    record: record.clone(),
                    institution_name: institution_name.clone(),
                    faculty_name: faculty_name.clone(),
                    course_name: course_name.clone(),
                })
            })
            .collect())
    }

    async fn set_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.records.lock().unwrap();
        match guard.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_with_status(
        &self,
        institution_id: i64,
        status: ApplicationStatus,
    ) -> Result<u64, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| {
                record.selection.institution_id == institution_id && record.status == status
            })
            .count() as u64)
    }
}

/// Repository that always fails, for storage-error mapping tests.
pub(super) struct UnavailableApplications;

#[async_trait]
impl ApplicationRepository for UnavailableApplications {
    async fn insert(&self, _: NewApplication) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn list_for_institution(&self, _: i64) -> Result<Vec<ApplicationRow>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn set_status(
        &self,
        _: ApplicationId,
        _: ApplicationStatus,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn count_with_status(
        &self,
        _: i64,
        _: ApplicationStatus,
    ) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// File store fake recording stored names.
#[derive(Default)]
pub(super) struct MemoryFiles {
    pub(super) stored: Mutex<Vec<String>>,
}

#[async_trait]
impl FileStore for MemoryFiles {
    async fn store(&self, file_name: &str, _bytes: &[u8]) -> Result<String, FileStoreError> {
        let path = format!("stored-{file_name}");
        self.stored.lock().unwrap().push(path.clone());
        Ok(path)
    }
}

pub(super) type TestService = AdmissionsService<MemoryApplications, MemoryCatalog, MemoryFiles>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryApplications>,
    Arc<MemoryCatalog>,
    Arc<MemoryFiles>,
) {
    let catalog = Arc::new(MemoryCatalog::seeded());
    let applications = Arc::new(MemoryApplications::new(catalog.clone()));
    let files = Arc::new(MemoryFiles::default());
    let service = Arc::new(AdmissionsService::new(
        applications.clone(),
        catalog.clone(),
        files.clone(),
        storage_config(),
    ));
    (service, applications, catalog, files)
}

pub(super) const BOUNDARY: &str = "guidance-test-boundary";

pub(super) fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resultFile\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) fn apply_fields<'a>() -> Vec<(&'a str, &'a str)> {
    vec![
        ("name", "A"),
        ("email", "a@x.com"),
        ("phone", "1"),
        ("institutionId", "1"),
        ("facultyId", "1"),
        ("courseId", "1"),
    ]
}

pub(super) fn apply_request(body: Vec<u8>) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post("/apply")
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(axum::body::Body::from(body))
        .unwrap()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
