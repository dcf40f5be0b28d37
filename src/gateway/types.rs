//! Wire types for the grade data service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a free-text search looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Course,
    Professor,
}

impl SearchKind {
    pub fn path(self) -> &'static str {
        match self {
            SearchKind::Course => "/search/course",
            SearchKind::Professor => "/search/prof",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessorRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchHits {
    Courses(Vec<CourseRef>),
    Professors(Vec<ProfessorRef>),
}

impl SearchHits {
    pub fn len(&self) -> usize {
        match self {
            SearchHits::Courses(items) => items.len(),
            SearchHits::Professors(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Offering listing entry from `by_course` or `by_prof`.
///
/// `by_course` omits the offering id; `by_prof` carries it with the plot id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingSummary {
    #[serde(default)]
    pub id: Option<i64>,
    pub academic_year: String,
    pub semester: String,
    pub course: CourseRef,
    #[serde(default)]
    pub instructors: Vec<ProfessorRef>,
    #[serde(default)]
    pub plot_file_id: Option<String>,
}

impl OfferingSummary {
    pub fn term(&self) -> Term {
        Term::new(&self.academic_year, &self.semester)
    }
}

/// Which listing to fetch offerings from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferingScope {
    Course(String),
    Professor(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingDetails {
    pub id: i64,
    pub academic_year: String,
    pub semester: String,
    #[serde(default)]
    pub total_registered: Option<i64>,
    #[serde(default)]
    pub plot_file_id: Option<String>,
    pub course: CourseRef,
    #[serde(default)]
    pub instructors: Vec<ProfessorRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCount {
    pub grade_type: String,
    pub count: i64,
    #[serde(default)]
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeDistribution {
    pub offering: OfferingDetails,
    #[serde(default)]
    pub grades: Vec<GradeCount>,
    pub total_graded_students: i64,
    #[serde(default)]
    pub centric_grading: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaughtCount {
    pub code: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingScore {
    pub spi: f64,
    pub student_count: i64,
    pub academic_year: String,
    pub semester: String,
    pub course_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerStats {
    pub career_spi: f64,
    pub consistency_sigma: f64,
    pub career_centric_grading: String,
    pub total_students_graded_career: i64,
    pub total_offerings_count: i64,
    #[serde(default)]
    pub most_taught_courses: Vec<TaughtCount>,
    #[serde(default)]
    pub most_generous_offering: Option<OfferingScore>,
    #[serde(default)]
    pub toughest_offering: Option<OfferingScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessorDossier {
    pub instructor_name: String,
    #[serde(default)]
    pub career_plot_file_id: Option<String>,
    #[serde(default)]
    pub stats: Option<CareerStats>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatus {
    pub telegram_user_id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub is_subscribed: bool,
    pub is_blocked: bool,
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub blocked_at: Option<DateTime<Utc>>,
}

/// Profile sent when a user subscribes or is first seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub telegram_user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockStatusUpdate {
    pub is_blocked: bool,
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackSubmission {
    pub telegram_user_id: i64,
    pub feedback_type: String,
    pub message_text: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedbackReceipt {
    pub id: i64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastReceipt {
    pub task_id: String,
}

// ============================================================================
// Terms
// ============================================================================

/// Academic semester, ordered the way term menus list them
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semester {
    Odd,
    Even,
    Summer,
    Other(String),
}

impl Semester {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Odd" => Semester::Odd,
            "Even" => Semester::Even,
            "Summer" => Semester::Summer,
            other => Semester::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Semester::Odd => "Odd",
            Semester::Even => "Even",
            Semester::Summer => "Summer",
            Semester::Other(raw) => raw,
        }
    }
}

/// One (academic year, semester) offering slot of a course
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub academic_year: String,
    pub semester: Semester,
}

impl Term {
    pub fn new(academic_year: &str, semester: &str) -> Self {
        Self {
            academic_year: academic_year.trim().to_string(),
            semester: Semester::parse(semester),
        }
    }

    /// Leading year of `2023-24`; `None` when unparseable.
    pub fn start_year(&self) -> Option<i32> {
        self.academic_year
            .split('-')
            .next()
            .and_then(|y| y.trim().parse().ok())
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.academic_year, self.semester.as_str())
    }
}
