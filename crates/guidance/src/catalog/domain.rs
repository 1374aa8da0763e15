use serde::{Deserialize, Serialize};

/// Top-level organization offering faculties and courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub id: i64,
    pub name: String,
}

/// Subdivision of an institution grouping courses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: i64,
    pub institution_id: i64,
    pub name: String,
}

/// Unit a student applies to, owned by a faculty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub faculty_id: i64,
    pub name: String,
}
