//! Message texts (HTML parse mode)

use std::fmt::Write;

use crate::gate::MaintenanceMode;
use crate::gateway::{
    CareerStats, CourseRef, GradeDistribution, OfferingScore, ProfessorDossier, Term, UserStatus,
};
use crate::session::FeedbackKind;

pub const LABEL_MAX_CHARS: usize = 60;
pub const FEEDBACK_PREVIEW_MAX_CHARS: usize = 1000;
/// Longest text Telegram shows in a callback alert
pub const ALERT_MAX_CHARS: usize = 200;

pub const START_PROMPT: &str = "How would you like to search?";
pub const COURSE_PROMPT: &str = "📚 OK. Enter <b>course code OR full/partial title</b>:";
pub const PROF_PROMPT: &str = "🧑‍🏫 OK. Enter <b>professor's name</b>:";
pub const CANCELLED: &str =
    "✅ Process cancelled.\nUse /start for a new search\n\n or /feedback to leave feedback.";
pub const CLOSED: &str = "This interaction has been closed.";
pub const SESSION_EXPIRED: &str = "⌛ Session data has expired. Please use /start to begin again.";
pub const MENU_EXPIRED: &str = "⌛ This menu is no longer active. Use /start to begin again.";
pub const NETWORK_ERROR: &str =
    "❌ Network error contacting the backend service. Please try again later.";
pub const UNEXPECTED_ERROR: &str = "❌ An unexpected internal error occurred. Please restart.";

pub const FEEDBACK_INTRO: &str =
    "Thank you for offering to provide feedback! 🙏\nWhat kind of feedback would you like to give?";
pub const FEEDBACK_EMPTY: &str = "⚠️ Your message seems to be empty. Please type your feedback:";
pub const FEEDBACK_MISSING: &str =
    "⚠️ Could not retrieve your feedback message. Please start again with /feedback.";
pub const FEEDBACK_SUBMITTING: &str = "⏳ Submitting your feedback...";
pub const FEEDBACK_THANKS: &str = "✅ Thank you! Your feedback has been submitted.";

pub const HELP: &str = "ℹ️ <b>Welcome to GRADIATOR!</b>\n\n\
Your guide to analyzing course and professor grade data.\n\n\
<b>How to use the bot</b>\n\
1️⃣ Use /start and choose to search by <b>Course</b> or <b>Professor</b>.\n\
2️⃣ Select an item from the search results.\n\
3️⃣ <b>Analyze the data!</b>\n\
   • Picked a course: choose one of its offerings to see the grade plot and analysis.\n\
   • Picked a professor: see their career analysis, then browse the courses they taught.\n\n\
<b>Terms</b>\n\
• <b>AGP (Average Grade Point):</b> average grade point of all students in one offering.\n\
• <b>Centric Grading:</b> summary of where an offering's grades cluster (e.g. \"B+ Centric\").\n\
• <b>Consistency (σ):</b> spread of a professor's AGP across offerings. Low is predictable, high is erratic.\n\n\
<b>Commands</b>\n\
/start - Begin a new search.\n\
/feedback - Report a bug or suggest a feature.\n\
/subscribe - Get occasional updates about the bot.\n\
/unsubscribe - Stop receiving updates.\n\
/help - Show this message again.";

pub const ADMIN_HELP: &str = "🛠️ <b>Admin Command Reference</b>\n\n\
<b>/maintenance</b> - show the current mode\n\
<b>/maintenance on [message]</b> - reply to non-admins with a message\n\
<b>/maintenance stealth</b> - silently ignore non-admins\n\
<b>/maintenance off</b> - back to normal\n\n\
<b>/broadcast_admin &lt;message&gt;</b> - queue a message to all subscribers (HTML, <code>\\n</code> for newlines)\n\n\
<b>/block &lt;user_id&gt; [reason]</b> - block a user\n\
<b>/unblock &lt;user_id&gt;</b> - unblock a user\n\
<b>/userstatus &lt;user_id&gt;</b> - subscription and block status";

pub const SUBSCRIBED: &str = "✅ You are now subscribed for updates!";
pub const UNSUBSCRIBED: &str = "🚫 You have been unsubscribed from updates.";
pub const SUBSCRIBE_FAILED: &str =
    "❌ An error occurred while trying to subscribe. Please try again later.";
pub const UNSUBSCRIBE_FAILED: &str =
    "❌ An error occurred while trying to unsubscribe. Please try again later.";

pub const NOT_AUTHORIZED: &str = "❌ You are not authorized to use this command.";
pub const MAINTENANCE_USAGE: &str = "Unknown option. Use /maintenance to see the options.";
pub const BLOCK_USAGE: &str = "Usage: <code>/block &lt;user_id&gt; [reason]</code>";
pub const UNBLOCK_USAGE: &str = "Usage: <code>/unblock &lt;user_id&gt;</code>";
pub const USER_STATUS_USAGE: &str = "Usage: <code>/userstatus &lt;user_id&gt;</code>";
pub const BROADCAST_USAGE: &str = "Usage: <code>/broadcast_admin &lt;message&gt;</code>";
pub const BROADCAST_TOO_SHORT: &str =
    "⚠️ Broadcast message seems too short. Please provide a meaningful message.";
pub const DEFAULT_MAINTENANCE_MESSAGE: &str =
    "The bot is undergoing maintenance. Please try again later.";

/// Escape text for Telegram HTML parse mode.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Cut `raw` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(raw: &str, max: usize) -> String {
    if raw.chars().count() <= max {
        return raw.to_string();
    }
    let mut out: String = raw.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub fn course_label(course: &CourseRef) -> String {
    let label = match course.name.as_deref() {
        Some(name) if !name.is_empty() && name != course.code => {
            format!("{} - {name}", course.code)
        }
        _ => course.code.clone(),
    };
    truncate(&label, LABEL_MAX_CHARS)
}

pub fn greeting(first_name: Option<&str>) -> String {
    let name = first_name.filter(|n| !n.is_empty()).unwrap_or("there");
    format!("👋 Hi {}!\n{START_PROMPT}", escape(name))
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("1 {one}")
    } else {
        format!("{count} {many}")
    }
}

fn page_line(page: usize, last_page: usize) -> String {
    format!("Page {}/{}", page + 1, last_page + 1)
}

pub fn searching(kind_plural: &str, query: &str) -> String {
    format!("⏳ Searching {kind_plural} for '<b>{}</b>'...", escape(query))
}

pub fn too_short(kind: &str, min: usize) -> String {
    format!("⚠️ Min {min} characters required for {kind} search.\nPlease re-enter {kind} name/code:")
}

pub fn no_results(kind_plural: &str, query: &str) -> String {
    format!(
        "🤷 No {kind_plural} matching '<b>{}</b>'. Try again:",
        escape(query)
    )
}

pub fn search_header(
    one: &str,
    many: &str,
    count: usize,
    query: Option<&str>,
    page: usize,
    last_page: usize,
) -> String {
    let query_part = query
        .map(|q| format!(" for '<b>{}</b>'", escape(q)))
        .unwrap_or_default();
    format!(
        "✅ Found {}{query_part}.\n{}. Select one or browse:",
        plural(count, one, many),
        page_line(page, last_page)
    )
}

pub fn prof_courses_header(prof_name: &str, count: usize, page: usize, last_page: usize) -> String {
    format!(
        "🧑‍🏫 Courses taught by <b>{}</b> ({}).\n{}. Which course?",
        escape(prof_name),
        plural(count, "course", "courses"),
        page_line(page, last_page)
    )
}

pub fn no_prof_courses(prof_name: &str) -> String {
    format!(
        "🧑‍🏫 <b>{}</b>\n\n🤷 No specific course offerings were found.",
        escape(prof_name)
    )
}

pub fn terms_header(
    course: &str,
    prof_name: Option<&str>,
    count: usize,
    page: usize,
    last_page: usize,
) -> String {
    let prof_part = prof_name
        .map(|p| format!(" by Prof. <b>{}</b>", escape(p)))
        .unwrap_or_default();
    if count == 0 {
        return format!(
            "🤷 No offerings found for <b>{}</b>{prof_part}.",
            escape(course)
        );
    }
    format!(
        "📅 Offerings for <b>{}</b>{prof_part} ({}).\n{}. Select Year (Semester):",
        escape(course),
        plural(count, "offering", "offerings"),
        page_line(page, last_page)
    )
}

pub fn fetching_terms(course: &str) -> String {
    format!(
        "Course: <b>{}</b>\n⏳ Fetching Year/Semester options...",
        escape(course)
    )
}

pub fn fetching_dossier(prof_name: &str) -> String {
    format!(
        "Selected: <b>{}</b>\n⏳ Fetching career analysis...",
        escape(prof_name)
    )
}

pub fn fetching_grades(course: &str, term: &Term) -> String {
    format!(
        "Selected: <b>{} / {}</b>\n⏳ Fetching details...",
        escape(course),
        escape(&term.label())
    )
}

pub fn term_not_found(course: &str, term: &Term) -> String {
    format!(
        "❌ No grade data found for <b>{} / {}</b>. Select another offering below, or go back.",
        escape(course),
        escape(&term.label())
    )
}

pub fn http_error(status: u16) -> String {
    format!("❌ Backend error ({status}) contacting the service. Please try again.")
}

/// Caption of the grade card for one offering.
pub fn grade_card(data: &GradeDistribution) -> String {
    let offering = &data.offering;
    let mut instructors: Vec<&str> = offering.instructors.iter().map(|i| i.name.as_str()).collect();
    instructors.sort_unstable();
    let title = offering.course.name.as_deref().unwrap_or(&offering.course.code);

    let mut out = format!(
        "📊 <b>{} - {}</b> ({} - {})\n🧑‍🏫 <i>Instructor(s):</i> {}\n👥 <i>Students Graded:</i> {}",
        escape(&offering.course.code),
        escape(title),
        escape(&offering.academic_year),
        escape(&offering.semester),
        escape(&instructors.join(", ")),
        data.total_graded_students
    );
    if let Some(label) = data.centric_grading.as_deref() {
        let _ = write!(out, "\n\n🧠 <b>Analysis:</b> {}", escape(label));
    }
    if !data.grades.is_empty() {
        out.push_str("\n\n<b>Grade Distribution:</b>");
        for grade in &data.grades {
            let share = if data.total_graded_students > 0 {
                #[allow(clippy::cast_precision_loss)] // student counts are small
                let pct = grade.count as f64 / data.total_graded_students as f64 * 100.0;
                format!(" ({pct:.1}%)")
            } else {
                String::new()
            };
            let _ = write!(
                out,
                "\n<code>{:<4}</code> : {}{share}",
                escape(&grade.grade_type),
                grade.count
            );
        }
    }
    out.push_str(
        "\n\n<b>Note:</b> <i>Past trends only. Grading can vary! \
         Choose what interests you, and talk to seniors before requesting.</i>",
    );
    out
}

fn short_year(year: &str) -> String {
    year.replace("-20", "-")
}

fn score_line(label: &str, score: &OfferingScore) -> String {
    let semester: String = score.semester.chars().take(3).collect();
    format!(
        "• {label}: {} ({} {}) · AGP {:.2} ({} students)",
        escape(&score.course_code),
        escape(&short_year(&score.academic_year)),
        escape(&semester),
        score.spi,
        score.student_count
    )
}

fn career_sections(stats: &CareerStats) -> Vec<String> {
    let mut parts = Vec::new();
    if stats.total_offerings_count > 0 && stats.total_students_graded_career > 0 {
        parts.push(format!(
            "\n<b>Career Summary</b>\n• {} offerings analyzed\n• {} students graded",
            stats.total_offerings_count, stats.total_students_graded_career
        ));
    }
    parts.push(format!(
        "\n<b>Grading Overview</b>\n• Avg. AGP: {:.2}\n• Consistency (σ): {:.3}\n  <i>A higher σ suggests grading varies more between offerings.</i>",
        stats.career_spi, stats.consistency_sigma
    ));

    let mut highlights = Vec::new();
    if !stats.most_taught_courses.is_empty() {
        let taught: Vec<String> = stats
            .most_taught_courses
            .iter()
            .map(|c| format!("{} ({}×)", escape(&c.code), c.count))
            .collect();
        highlights.push(format!("• Most Taught: {}", taught.join(", ")));
    }
    if let Some(generous) = &stats.most_generous_offering {
        highlights.push(score_line("Most Generous", generous));
    }
    if let Some(toughest) = &stats.toughest_offering {
        highlights.push(score_line("Toughest", toughest));
    }
    if !highlights.is_empty() {
        parts.push(format!("\n<b>Highlights</b>\n{}", highlights.join("\n")));
    }
    parts
}

/// Caption of a professor's career dossier.
pub fn dossier_card(dossier: &ProfessorDossier) -> String {
    let mut parts = vec![format!(
        "<b>Professor:</b> {}",
        escape(&dossier.instructor_name)
    )];
    if let Some(message) = dossier.message.as_deref() {
        parts.push(format!("<i>{}</i>", escape(message)));
    } else if let Some(stats) = &dossier.stats {
        parts.extend(career_sections(stats));
    } else {
        parts.push("<i>No detailed statistics available.</i>".to_string());
    }
    parts.join("\n")
}

pub fn feedback_type_chosen(kind: FeedbackKind) -> String {
    format!(
        "Great! You've selected: <b>{}</b>.\nPlease type out your message now.",
        kind.display()
    )
}

pub fn feedback_preview(kind: FeedbackKind, message: &str) -> String {
    format!(
        "Thanks! Here's your <b>{}</b>:\n\n<pre>{}</pre>\n\nShall I send this?",
        kind.display(),
        escape(&truncate(message, FEEDBACK_PREVIEW_MAX_CHARS))
    )
}

pub fn admin_feedback_notice(
    kind: FeedbackKind,
    user_id: i64,
    full_name: &str,
    username: Option<&str>,
    message: &str,
) -> String {
    let who = username.map_or_else(|| format!("ID: {user_id}"), |u| format!("@{u}"));
    format!(
        "📝 <b>New Feedback Received</b>\n\n<b>User:</b> {} ({})\n<b>Type:</b> <code>{}</code>\n\n<b>Message:</b>\n{}",
        escape(full_name),
        escape(&who),
        kind.api_value(),
        escape(message)
    )
}

pub fn fetching_prof_courses(prof_name: &str) -> String {
    format!(
        "Selected: <b>{}</b>\n⏳ Fetching courses taught...",
        escape(prof_name)
    )
}

pub fn maintenance_status(mode: &MaintenanceMode) -> String {
    let current = match mode {
        MaintenanceMode::Off => "✅ Mode: <b>LIVE</b> (off)".to_string(),
        MaintenanceMode::Stealth => "🤫 Mode: <b>STEALTH</b> (on, no message)".to_string(),
        MaintenanceMode::Message(message) => format!(
            "🚧 Mode: <b>MESSAGE</b> (on)\n\n<i>Current message:</i>\n{}",
            escape(message)
        ),
    };
    format!("<b>Maintenance Status</b>\n\n{current}\n\n{ADMIN_HELP}")
}

pub fn maintenance_changed(mode: &MaintenanceMode) -> String {
    match mode {
        MaintenanceMode::Off => {
            "✅ Maintenance mode <b>DISABLED</b>. The bot is now live for all users.".to_string()
        }
        MaintenanceMode::Stealth => {
            "🤫 Maintenance mode <b>ENABLED (STEALTH)</b>. Non-admin users will be silently ignored."
                .to_string()
        }
        MaintenanceMode::Message(message) => format!(
            "🚧 Maintenance mode <b>ENABLED (MESSAGE)</b>. Non-admin users will see:\n\n{}",
            escape(message)
        ),
    }
}

pub fn blocked(user: &str, reason: Option<&str>) -> String {
    format!(
        "✅ User <code>{}</code> has been blocked. Reason: {}",
        escape(user),
        escape(reason.unwrap_or("N/A"))
    )
}

pub fn unblocked(user: &str) -> String {
    format!("✅ User <code>{}</code> has been unblocked.", escape(user))
}

pub fn admin_action_failed(action: &str, detail: &str) -> String {
    format!("⚠️ Could not {action}. Service response: {}", escape(detail))
}

pub fn user_status_card(status: &UserStatus) -> String {
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
    let mut out = format!(
        "Status for user <code>{}</code> (@{})\nSubscribed: {}\nBlocked: {}",
        status.telegram_user_id,
        escape(status.username.as_deref().unwrap_or("N/A")),
        yes_no(status.is_subscribed),
        yes_no(status.is_blocked)
    );
    if status.is_blocked {
        let blocked_at = status
            .blocked_at
            .map_or_else(|| "N/A".to_string(), |at| at.format("%Y-%m-%d %H:%M UTC").to_string());
        let _ = write!(
            out,
            "\nReason: {}\nBlocked at: {blocked_at}",
            escape(status.block_reason.as_deref().unwrap_or("N/A"))
        );
    }
    out
}

pub fn broadcast_queued(task_id: &str) -> String {
    format!(
        "✅ Broadcast successfully queued.\nTask ID: <code>{}</code>",
        escape(task_id)
    )
}
