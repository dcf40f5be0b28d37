//! Callback payload codec
//!
//! Every button carries a `|`-separated payload: a fixed prefix followed by
//! the fields that prefix declares, in a fixed order. Decoding needs no
//! session state, so a stale or duplicated tap still decodes to the same
//! request.

use crate::gateway::Term;
use crate::session::FeedbackKind;

const SEP: char = '|';

/// How a course menu was reached: direct course search, or a professor's course list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavOrigin {
    Course,
    Professor(i64),
}

impl NavOrigin {
    fn encode(self) -> String {
        match self {
            NavOrigin::Course => "c".to_string(),
            NavOrigin::Professor(id) => format!("p{id}"),
        }
    }

    fn decode(raw: &str) -> Option<Self> {
        if raw == "c" {
            return Some(NavOrigin::Course);
        }
        raw.strip_prefix('p')?.parse().ok().map(NavOrigin::Professor)
    }
}

/// Which cached list a page control refers to, with the identifiers that pin it down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRef {
    CourseSearch,
    ProfSearch,
    ProfCourses { prof_id: i64 },
    Terms { course: String, origin: NavOrigin },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub list: ListRef,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    ModeCourse,
    ModeProf,
    Cancel,
    NewSearch,
    Close,
    BackToTypingCourse,
    BackToTypingProf,
    BackToCourseSearch,
    BackToProfSearch,
    BackToProfCourses { prof_id: i64 },
    BackToTerms { course: String, origin: NavOrigin },
    BackToCourseList { origin: NavOrigin },
    ViewProfCourses { prof_id: i64 },
    SelectCourse { code: String, origin: NavOrigin },
    SelectProf { prof_id: i64 },
    SelectTerm { course: String, term: Term, origin: NavOrigin },
    Page(PageRequest),
    FeedbackType(FeedbackKind),
    FeedbackConfirm,
    FeedbackChangeType,
}

/// Fields are free text from the data service; the separator cannot appear inside one.
fn field(raw: &str) -> String {
    raw.replace(SEP, "/")
}

fn id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn text(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

impl Callback {
    pub fn encode(&self) -> String {
        match self {
            Callback::ModeCourse => "mode_course".to_string(),
            Callback::ModeProf => "mode_prof".to_string(),
            Callback::Cancel => "cancel".to_string(),
            Callback::NewSearch => "back_main".to_string(),
            Callback::Close => "close_interaction".to_string(),
            Callback::BackToTypingCourse => "back_type_crs".to_string(),
            Callback::BackToTypingProf => "back_type_prof".to_string(),
            Callback::BackToCourseSearch => "back_crs_srch_list".to_string(),
            Callback::BackToProfSearch => "back_prof_srch_list".to_string(),
            Callback::BackToProfCourses { prof_id } => format!("back_prof_crs_list|{prof_id}"),
            Callback::BackToTerms { course, origin } => {
                format!("back_ys_sel|{}|{}", field(course), origin.encode())
            }
            Callback::BackToCourseList { origin } => format!("back_clp|{}", origin.encode()),
            Callback::ViewProfCourses { prof_id } => format!("vpc|{prof_id}"),
            Callback::SelectCourse { code, origin } => {
                format!("cs|{}|{}", field(code), origin.encode())
            }
            Callback::SelectProf { prof_id } => format!("ps|{prof_id}"),
            Callback::SelectTerm {
                course,
                term,
                origin,
            } => format!(
                "ysel|{}|{}|{}|{}",
                field(course),
                field(&term.academic_year),
                field(term.semester.as_str()),
                origin.encode()
            ),
            Callback::Page(PageRequest { list, page }) => match list {
                ListRef::CourseSearch => format!("p_csr|{page}"),
                ListRef::ProfSearch => format!("p_psr|{page}"),
                ListRef::ProfCourses { prof_id } => format!("p_pcl|{prof_id}|{page}"),
                ListRef::Terms { course, origin } => {
                    format!("p_ys|{}|{}|{page}", field(course), origin.encode())
                }
            },
            Callback::FeedbackType(FeedbackKind::Bug) => "fb_bug".to_string(),
            Callback::FeedbackType(FeedbackKind::Suggestion) => "fb_suggestion".to_string(),
            Callback::FeedbackType(FeedbackKind::General) => "fb_general".to_string(),
            Callback::FeedbackConfirm => "fb_confirm_send".to_string(),
            Callback::FeedbackChangeType => "fb_cancel".to_string(),
        }
    }

    /// Decode a payload; unknown prefixes and malformed fields yield `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.split(SEP).collect();
        let page = |raw: &str| raw.parse::<usize>().ok();

        Some(match parts.as_slice() {
            ["mode_course"] => Callback::ModeCourse,
            ["mode_prof"] => Callback::ModeProf,
            ["cancel"] => Callback::Cancel,
            ["back_main"] => Callback::NewSearch,
            ["close_interaction"] => Callback::Close,
            ["back_type_crs"] => Callback::BackToTypingCourse,
            ["back_type_prof"] => Callback::BackToTypingProf,
            ["back_crs_srch_list"] => Callback::BackToCourseSearch,
            ["back_prof_srch_list"] => Callback::BackToProfSearch,
            ["back_prof_crs_list", prof_id] => Callback::BackToProfCourses {
                prof_id: id(prof_id)?,
            },
            ["back_ys_sel", course, origin] => Callback::BackToTerms {
                course: text(course)?,
                origin: NavOrigin::decode(origin)?,
            },
            ["back_clp", origin] => Callback::BackToCourseList {
                origin: NavOrigin::decode(origin)?,
            },
            ["vpc", prof_id] => Callback::ViewProfCourses {
                prof_id: id(prof_id)?,
            },
            ["cs", code, origin] => Callback::SelectCourse {
                code: text(code)?,
                origin: NavOrigin::decode(origin)?,
            },
            ["ps", prof_id] => Callback::SelectProf {
                prof_id: id(prof_id)?,
            },
            ["ysel", course, year, semester, origin] => Callback::SelectTerm {
                course: text(course)?,
                term: Term::new(&text(year)?, &text(semester)?),
                origin: NavOrigin::decode(origin)?,
            },
            ["p_csr", p] => Callback::Page(PageRequest {
                list: ListRef::CourseSearch,
                page: page(p)?,
            }),
            ["p_psr", p] => Callback::Page(PageRequest {
                list: ListRef::ProfSearch,
                page: page(p)?,
            }),
            ["p_pcl", prof_id, p] => Callback::Page(PageRequest {
                list: ListRef::ProfCourses {
                    prof_id: id(prof_id)?,
                },
                page: page(p)?,
            }),
            ["p_ys", course, origin, p] => Callback::Page(PageRequest {
                list: ListRef::Terms {
                    course: text(course)?,
                    origin: NavOrigin::decode(origin)?,
                },
                page: page(p)?,
            }),
            ["fb_bug"] => Callback::FeedbackType(FeedbackKind::Bug),
            ["fb_suggestion"] => Callback::FeedbackType(FeedbackKind::Suggestion),
            ["fb_general"] => Callback::FeedbackType(FeedbackKind::General),
            ["fb_confirm_send"] => Callback::FeedbackConfirm,
            ["fb_cancel"] => Callback::FeedbackChangeType,
            _ => return None,
        })
    }
}
