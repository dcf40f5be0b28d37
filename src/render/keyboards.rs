//! Fixed menus

use super::payload::{Callback, NavOrigin};
use crate::channel::{Button, Keyboard};
use crate::session::FeedbackKind;

pub fn button(label: &str, callback: &Callback) -> Button {
    Button {
        label: label.to_string(),
        payload: callback.encode(),
    }
}

pub fn cancel_button() -> Button {
    button("❌ Cancel", &Callback::Cancel)
}

pub fn new_search_button() -> Button {
    button("🔄 New Search", &Callback::NewSearch)
}

pub fn start_menu() -> Keyboard {
    Keyboard::new()
        .single(button("📚 Search by Course (Code/Title)", &Callback::ModeCourse))
        .single(button("🧑‍🏫 Search by Professor", &Callback::ModeProf))
}

pub fn cancel_only() -> Keyboard {
    Keyboard::new().single(cancel_button())
}

/// Single control offered after an error ends the conversation
pub fn restart() -> Keyboard {
    Keyboard::new().single(button("🔄 Restart Search", &Callback::NewSearch))
}

/// Back control of a term menu, pointing at the course list it was reached from
pub fn back_to_course_list(origin: NavOrigin) -> Button {
    match origin {
        NavOrigin::Course => button("⬅️ Back to Courses", &Callback::BackToCourseSearch),
        NavOrigin::Professor(prof_id) => button(
            "⬅️ Back to Prof's Courses",
            &Callback::BackToProfCourses { prof_id },
        ),
    }
}

pub fn dossier(prof_id: i64) -> Keyboard {
    Keyboard::new()
        .single(button(
            "📚 View All Courses Taught",
            &Callback::ViewProfCourses { prof_id },
        ))
        .single(button(
            "⬅️ Select Different Professor",
            &Callback::BackToProfSearch,
        ))
        .single(new_search_button())
}

/// Shown with a professor who has no offerings on record
pub fn no_prof_courses() -> Keyboard {
    Keyboard::new()
        .single(button("⬅️ Different Professor", &Callback::BackToProfSearch))
        .single(new_search_button())
}

pub fn final_options(course: &str, origin: NavOrigin) -> Keyboard {
    Keyboard::new()
        .single(button(
            "⬅️ Select Diff. Year/Sem",
            &Callback::BackToTerms {
                course: course.to_string(),
                origin,
            },
        ))
        .single(button(
            "⬅️ Select Diff. Course",
            &Callback::BackToCourseList { origin },
        ))
        .single(new_search_button())
}

pub fn feedback_types() -> Keyboard {
    Keyboard::new()
        .single(button(
            "🐞 Report a Bug",
            &Callback::FeedbackType(FeedbackKind::Bug),
        ))
        .single(button(
            "💡 Make a Suggestion",
            &Callback::FeedbackType(FeedbackKind::Suggestion),
        ))
        .single(button(
            "💬 General Feedback",
            &Callback::FeedbackType(FeedbackKind::General),
        ))
        .single(cancel_button())
}

pub fn feedback_entry() -> Keyboard {
    Keyboard::new().single(button(
        "↩️ Cancel & Change Type",
        &Callback::FeedbackChangeType,
    ))
}

pub fn feedback_confirm() -> Keyboard {
    Keyboard::new()
        .single(button("✅ Yes, send it", &Callback::FeedbackConfirm))
        .single(button("✏️ Edit / Re-type", &Callback::FeedbackChangeType))
        .single(button("🗑️ Discard", &Callback::Cancel))
}
