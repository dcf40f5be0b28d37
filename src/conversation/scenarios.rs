//! End-to-end conversations through the engine, over mocked I/O

use super::{BrowseState, FeedbackState};
use crate::gate::{MaintenanceMode, MaintenanceSource};
use crate::gateway::{
    CourseRef, FeedbackReceipt, GatewayError, GradeCount, GradeDistribution, OfferingDetails,
    OfferingSummary, ProfessorDossier, ProfessorRef, SearchHits, Term, UserStatus,
};
use crate::render::keyboards;
use crate::render::payload::{Callback, ListRef, NavOrigin, PageRequest};
use crate::render::{text, NEXT_LABEL, PREVIOUS_LABEL};
use crate::runtime::testing::{Harness, Sent, ADMIN_ID, USER_ID};
use crate::runtime::{EngineSettings, Job};
use crate::session::{FeedbackKind, FlowState, SessionContext};
use std::time::Duration;

fn course(code: &str) -> CourseRef {
    CourseRef {
        code: code.to_string(),
        name: None,
    }
}

fn offering(code: &str, year: &str, semester: &str, prof_id: i64) -> OfferingSummary {
    OfferingSummary {
        id: None,
        academic_year: year.to_string(),
        semester: semester.to_string(),
        course: course(code),
        instructors: vec![ProfessorRef {
            id: prof_id,
            name: "Ada Lovelace".to_string(),
        }],
        plot_file_id: None,
    }
}

fn details(code: &str, year: &str, semester: &str) -> OfferingDetails {
    OfferingDetails {
        id: 42,
        academic_year: year.to_string(),
        semester: semester.to_string(),
        total_registered: Some(40),
        plot_file_id: None,
        course: course(code),
        instructors: vec![ProfessorRef {
            id: 7,
            name: "Ada Lovelace".to_string(),
        }],
    }
}

fn page(list: ListRef, page: usize) -> Callback {
    Callback::Page(PageRequest { list, page })
}

fn codes(range: std::ops::RangeInclusive<u32>) -> Vec<String> {
    range.map(|i| format!("CS{i:02}")).collect()
}

/// Id of the first message or edit that showed `body`
fn shown_id(h: &Harness, body: &str) -> i64 {
    h.channel
        .sent()
        .iter()
        .filter_map(Sent::shown)
        .find(|(_, shown, _)| *shown == body)
        .map(|(id, _, _)| id)
        .expect("text was never shown")
}

/// Every edit, markup change or deletion applied to message `id`
fn changes_to(h: &Harness, id: i64) -> Vec<Sent> {
    h.channel
        .sent()
        .into_iter()
        .filter(|s| {
            matches!(
                s,
                Sent::Edit { message_id, .. }
                    | Sent::Markup { message_id, .. }
                    | Sent::Delete { message_id } if *message_id == id
            )
        })
        .collect()
}

/// /start, pick a search mode, type a query answered by `hits`
async fn search(h: &Harness, mode: Callback, hits: SearchHits, query: &str) {
    h.command(USER_ID, "start", None).await;
    h.press(USER_ID, &mode).await;
    h.gateway.search.push(Ok(hits));
    h.text(USER_ID, query).await;
}

// ============================================================================
// Browse
// ============================================================================

#[tokio::test]
async fn twelve_course_matches_page_by_eight() {
    let h = Harness::new();
    let hits = SearchHits::Courses(codes(1..=12).iter().map(|c| course(c)).collect());
    search(&h, Callback::ModeCourse, hits, "CS").await;

    let labels = h.last_labels();
    assert_eq!(labels[..8], codes(1..=8)[..]);
    assert_eq!(labels[8], NEXT_LABEL);
    assert!(!labels.iter().any(|l| l == PREVIOUS_LABEL));

    h.press(USER_ID, &page(ListRef::CourseSearch, 1)).await;

    let labels = h.last_labels();
    assert_eq!(labels[..4], codes(9..=12)[..]);
    assert_eq!(labels[4], PREVIOUS_LABEL);
    assert!(!labels.iter().any(|l| l == NEXT_LABEL));

    let session = h.session(USER_ID).await;
    assert_eq!(
        session.browse_state(),
        Some(BrowseState::SelectingCourseResults)
    );
    assert_eq!(
        session.context.browse.course_search.map(|l| l.page),
        Some(1)
    );
}

#[tokio::test]
async fn short_query_asks_again_without_searching() {
    let h = Harness::new();
    h.command(USER_ID, "start", None).await;
    h.press(USER_ID, &Callback::ModeProf).await;

    h.text(USER_ID, "Al").await;

    assert!(h.gateway.calls().iter().all(|c| !c.starts_with("search")));
    assert_eq!(h.last_text(), text::too_short("professor", 3));
    assert_eq!(
        h.session(USER_ID).await.browse_state(),
        Some(BrowseState::TypingProf)
    );
}

#[tokio::test]
async fn back_from_terms_restores_the_professor_course_page() {
    let h = Harness::new();
    let hits = SearchHits::Professors(vec![ProfessorRef {
        id: 7,
        name: "Ada Lovelace".to_string(),
    }]);
    search(&h, Callback::ModeProf, hits, "Ada").await;

    h.gateway.professor_dossier.push(Ok(ProfessorDossier {
        instructor_name: "Ada Lovelace".to_string(),
        career_plot_file_id: None,
        stats: None,
        message: None,
    }));
    h.press(USER_ID, &Callback::SelectProf { prof_id: 7 }).await;

    let taught = codes(1..=10)
        .iter()
        .map(|c| offering(c, "2023-24", "Odd", 7))
        .collect();
    h.gateway.list_offerings.push(Ok(taught));
    h.press(USER_ID, &Callback::ViewProfCourses { prof_id: 7 }).await;
    h.press(USER_ID, &page(ListRef::ProfCourses { prof_id: 7 }, 1))
        .await;
    let (_, before_text, before_keyboard) = h.channel.last_shown().unwrap();

    h.press(
        USER_ID,
        &Callback::SelectCourse {
            code: "CS09".to_string(),
            origin: NavOrigin::Professor(7),
        },
    )
    .await;
    assert_eq!(h.last_labels()[0], "2023-24 (Odd)");
    assert_eq!(
        h.session(USER_ID).await.browse_state(),
        Some(BrowseState::SelectingYearSemester)
    );

    h.press(USER_ID, &Callback::BackToProfCourses { prof_id: 7 })
        .await;

    let (_, after_text, after_keyboard) = h.channel.last_shown().unwrap();
    assert_eq!(after_text, before_text);
    assert_eq!(after_keyboard, before_keyboard);
    let session = h.session(USER_ID).await;
    assert_eq!(
        session.browse_state(),
        Some(BrowseState::SelectingCourseForProf)
    );
    assert!(session.context.browse.terms.is_none());
    // the course list came from the cache, not a second fetch
    let fetches = h
        .gateway
        .calls()
        .iter()
        .filter(|c| c.starts_with("list_offerings"))
        .count();
    assert_eq!(fetches, 1);
}

#[tokio::test]
async fn back_with_cleared_context_falls_back_to_typing() {
    let h = Harness::new();
    h.command(USER_ID, "start", None).await;
    let mut session = h.session(USER_ID).await;
    session.context = SessionContext::default();
    session.browse = Some(FlowState::new(BrowseState::ShowingFinalGrades));
    h.engine.sessions().commit(USER_ID, session).await;

    let back = Callback::BackToTerms {
        course: "CS101".to_string(),
        origin: NavOrigin::Course,
    };
    h.press_on(USER_ID, &back.encode(), Some((50, false))).await;

    assert!(h.channel.sent().contains(&Sent::Edit {
        message_id: 50,
        text: text::COURSE_PROMPT.to_string(),
        keyboard: Some(keyboards::cancel_only()),
    }));
    assert_eq!(
        h.session(USER_ID).await.browse_state(),
        Some(BrowseState::TypingCourse)
    );
}

#[tokio::test]
async fn search_failure_ends_with_one_error_and_restart() {
    let h = Harness::new();
    h.command(USER_ID, "start", None).await;
    h.press(USER_ID, &Callback::ModeCourse).await;
    h.gateway
        .search
        .push(Err(GatewayError::network("operation timed out")));

    h.text(USER_ID, "CS101").await;

    let errors = h
        .channel
        .sent()
        .iter()
        .filter_map(Sent::shown)
        .filter(|(_, body, _)| *body == text::NETWORK_ERROR)
        .count();
    assert_eq!(errors, 1);
    let (_, _, keyboard) = h.channel.last_shown().unwrap();
    assert_eq!(keyboard, Some(keyboards::restart()));

    let session = h.session(USER_ID).await;
    assert_eq!(session.browse_state(), None);
    assert!(session.context.browse.mode.is_none());
}

#[tokio::test]
async fn course_path_ends_on_a_grade_card() {
    let h = Harness::new();
    search(
        &h,
        Callback::ModeCourse,
        SearchHits::Courses(vec![course("CS101")]),
        "CS1",
    )
    .await;

    h.gateway.list_offerings.push(Ok(vec![
        offering("CS101", "2022-23", "Even", 7),
        offering("CS101", "2023-24", "Odd", 7),
    ]));
    h.press(
        USER_ID,
        &Callback::SelectCourse {
            code: "CS101".to_string(),
            origin: NavOrigin::Course,
        },
    )
    .await;
    assert_eq!(h.last_labels()[..2], ["2023-24 (Odd)", "2022-23 (Even)"]);

    let mut graded = details("CS101", "2023-24", "Odd");
    graded.plot_file_id = Some("plot-1".to_string());
    h.gateway
        .offering_details
        .push(Ok(details("CS101", "2023-24", "Odd")));
    h.gateway.grade_distribution.push(Ok(GradeDistribution {
        offering: graded,
        grades: vec![GradeCount {
            grade_type: "AA".to_string(),
            count: 10,
            percentage: None,
        }],
        total_graded_students: 40,
        centric_grading: None,
    }));
    h.press(
        USER_ID,
        &Callback::SelectTerm {
            course: "CS101".to_string(),
            term: Term::new("2023-24", "Odd"),
            origin: NavOrigin::Course,
        },
    )
    .await;

    let Some(Sent::Photo {
        message_id, photo, ..
    }) = h
        .channel
        .sent()
        .into_iter()
        .rev()
        .find(|s| matches!(s, Sent::Photo { .. }))
    else {
        panic!("grade card was not sent as a photo");
    };
    assert_eq!(photo, "plot-1");
    let session = h.session(USER_ID).await;
    assert_eq!(
        session.browse_state(),
        Some(BrowseState::ShowingFinalGrades)
    );
    assert_eq!(
        session.context.browse.final_card.map(|m| m.message_id),
        Some(message_id)
    );

    // a new search from the card keeps the card but removes its buttons
    h.press(USER_ID, &Callback::NewSearch).await;
    assert!(h.channel.sent().contains(&Sent::Markup {
        message_id,
        keyboard: None
    }));
    assert_eq!(h.last_text(), text::START_PROMPT);
    let session = h.session(USER_ID).await;
    assert_eq!(session.browse_state(), Some(BrowseState::SelectingAction));
    assert!(session.context.browse.final_card.is_none());
}

#[tokio::test]
async fn missing_grade_data_keeps_the_term_menu() {
    let h = Harness::new();
    search(
        &h,
        Callback::ModeCourse,
        SearchHits::Courses(vec![course("CS101")]),
        "CS1",
    )
    .await;
    h.gateway
        .list_offerings
        .push(Ok(vec![offering("CS101", "2023-24", "Odd", 7)]));
    h.press(
        USER_ID,
        &Callback::SelectCourse {
            code: "CS101".to_string(),
            origin: NavOrigin::Course,
        },
    )
    .await;

    h.gateway
        .offering_details
        .push(Err(GatewayError::http(404, "not found")));
    let term = Term::new("2023-24", "Odd");
    h.press(
        USER_ID,
        &Callback::SelectTerm {
            course: "CS101".to_string(),
            term: term.clone(),
            origin: NavOrigin::Course,
        },
    )
    .await;

    assert!(h
        .last_text()
        .starts_with(&text::term_not_found("CS101", &term)));
    assert_eq!(h.last_labels()[0], "2023-24 (Odd)");
    assert_eq!(
        h.session(USER_ID).await.browse_state(),
        Some(BrowseState::SelectingYearSemester)
    );
}

#[tokio::test]
async fn pressed_button_is_answered_before_the_lookup() {
    let h = Harness::new();
    search(
        &h,
        Callback::ModeCourse,
        SearchHits::Courses(vec![course("CS101")]),
        "CS1",
    )
    .await;
    let before = h.channel.sent().len();

    h.gateway
        .list_offerings
        .push(Ok(vec![offering("CS101", "2023-24", "Odd", 7)]));
    h.press(
        USER_ID,
        &Callback::SelectCourse {
            code: "CS101".to_string(),
            origin: NavOrigin::Course,
        },
    )
    .await;

    let sent = h.channel.sent();
    assert!(matches!(&sent[before], Sent::Answer { text: None, .. }));
    let answers = sent[before..]
        .iter()
        .filter(|s| matches!(s, Sent::Answer { .. }))
        .count();
    assert_eq!(answers, 1);
}

#[tokio::test]
async fn button_from_a_finished_conversation_is_expired() {
    let h = Harness::new();

    h.press_on(USER_ID, &Callback::ModeProf.encode(), Some((55, false)))
        .await;

    let sent = h.channel.sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        &sent[0],
        Sent::Answer { text: Some(toast), .. } if toast == text::MENU_EXPIRED
    ));
}

#[tokio::test(start_paused = true)]
async fn idle_browse_flow_times_out() {
    let h = Harness::new();
    search(
        &h,
        Callback::ModeCourse,
        SearchHits::Courses(codes(1..=12).iter().map(|c| course(c)).collect()),
        "CS",
    )
    .await;

    tokio::time::advance(EngineSettings::default().timeouts.browse + Duration::from_secs(1)).await;
    h.press(USER_ID, &page(ListRef::CourseSearch, 1)).await;

    assert!(matches!(
        h.channel.sent().last(),
        Some(Sent::Answer { text: Some(text), .. }) if text == text::MENU_EXPIRED
    ));
    assert_eq!(h.session(USER_ID).await.browse_state(), None);
}

#[tokio::test]
async fn start_resets_both_flows() {
    let h = Harness::new();
    h.command(USER_ID, "feedback", None).await;
    h.press(USER_ID, &Callback::FeedbackType(FeedbackKind::General))
        .await;

    h.command(USER_ID, "start", None).await;

    let session = h.session(USER_ID).await;
    assert_eq!(session.feedback_state(), None);
    assert_eq!(session.browse_state(), Some(BrowseState::SelectingAction));
    let start_labels: Vec<String> = keyboards::start_menu()
        .buttons()
        .map(|b| b.label.clone())
        .collect();
    assert_eq!(h.last_labels(), start_labels);
}

// ============================================================================
// Feedback
// ============================================================================

#[tokio::test]
async fn feedback_is_submitted_and_forwarded() {
    let mut h = Harness::with_settings(EngineSettings {
        admin_channel: Some(-100),
        ..EngineSettings::default()
    });
    h.command(USER_ID, "feedback", None).await;
    h.press(USER_ID, &Callback::FeedbackType(FeedbackKind::Bug))
        .await;
    assert_eq!(
        h.session(USER_ID).await.feedback_state(),
        Some(FeedbackState::TypingFeedbackMessage)
    );

    h.text(USER_ID, "It crashed <again>").await;
    assert!(h.last_text().contains("It crashed &lt;again&gt;"));

    h.gateway.submit_feedback.push(Ok(FeedbackReceipt {
        id: 1,
        status: None,
    }));
    h.press(USER_ID, &Callback::FeedbackConfirm).await;

    assert_eq!(h.last_text(), text::FEEDBACK_THANKS);
    assert!(h.gateway.calls().contains(&"submit_feedback:bug".to_string()));
    assert!(matches!(
        h.jobs.try_recv(),
        Ok(Job::Notify { chat_id: -100, .. })
    ));
    assert_eq!(h.session(USER_ID).await.feedback_state(), None);
}

#[tokio::test(start_paused = true)]
async fn feedback_text_does_not_disturb_browse() {
    let h = Harness::new();
    h.command(USER_ID, "start", None).await;
    h.press(USER_ID, &Callback::ModeCourse).await;
    tokio::time::advance(Duration::from_secs(1)).await;
    h.command(USER_ID, "feedback", None).await;
    h.press(USER_ID, &Callback::FeedbackType(FeedbackKind::Suggestion))
        .await;

    h.text(USER_ID, "Dark mode please").await;

    let session = h.session(USER_ID).await;
    assert_eq!(
        session.feedback_state(),
        Some(FeedbackState::ConfirmFeedbackSubmission)
    );
    assert_eq!(session.browse_state(), Some(BrowseState::TypingCourse));
    assert!(h.gateway.calls().iter().all(|c| !c.starts_with("search")));
}

#[tokio::test]
async fn browse_results_leave_the_feedback_menu_alone() {
    let h = Harness::new();
    h.command(USER_ID, "start", None).await;
    h.press(USER_ID, &Callback::ModeCourse).await;
    h.command(USER_ID, "feedback", None).await;
    let prompt = shown_id(&h, text::COURSE_PROMPT);
    let feedback_menu = shown_id(&h, text::FEEDBACK_INTRO);

    h.gateway.search.push(Ok(SearchHits::Courses(vec![
        course("CS101"),
        course("CS102"),
    ])));
    h.text(USER_ID, "CS").await;

    assert_eq!(changes_to(&h, feedback_menu), vec![]);
    assert_eq!(h.channel.last_shown().map(|(id, _, _)| id), Some(prompt));
    let session = h.session(USER_ID).await;
    assert_eq!(
        session.browse_state(),
        Some(BrowseState::SelectingCourseResults)
    );
    assert_eq!(
        session.feedback_state(),
        Some(FeedbackState::AskFeedbackType)
    );

    // the untouched feedback menu still works
    h.press(USER_ID, &Callback::FeedbackType(FeedbackKind::Bug))
        .await;
    assert_eq!(
        h.session(USER_ID).await.feedback_state(),
        Some(FeedbackState::TypingFeedbackMessage)
    );
    assert_eq!(h.channel.last_shown().map(|(id, _, _)| id), Some(feedback_menu));
}

#[tokio::test(start_paused = true)]
async fn feedback_preview_leaves_the_browse_prompt_alone() {
    let h = Harness::new();
    h.command(USER_ID, "start", None).await;
    h.press(USER_ID, &Callback::ModeCourse).await;
    tokio::time::advance(Duration::from_secs(1)).await;
    h.command(USER_ID, "feedback", None).await;
    h.press(USER_ID, &Callback::FeedbackType(FeedbackKind::Bug))
        .await;
    let prompt = shown_id(&h, text::COURSE_PROMPT);
    let feedback_menu = shown_id(&h, text::FEEDBACK_INTRO);
    let prompt_changes = changes_to(&h, prompt);

    h.text(USER_ID, "Search is slow").await;

    assert_eq!(changes_to(&h, prompt), prompt_changes);
    assert!(h.channel.sent().contains(&Sent::Markup {
        message_id: feedback_menu,
        keyboard: None
    }));
    assert_eq!(
        h.session(USER_ID).await.browse_state(),
        Some(BrowseState::TypingCourse)
    );
}

#[tokio::test]
async fn typed_cancel_strips_the_prompts_of_both_flows() {
    let h = Harness::new();
    h.command(USER_ID, "start", None).await;
    h.press(USER_ID, &Callback::ModeCourse).await;
    h.command(USER_ID, "feedback", None).await;
    let prompt = shown_id(&h, text::COURSE_PROMPT);
    let feedback_menu = shown_id(&h, text::FEEDBACK_INTRO);

    h.command(USER_ID, "cancel", None).await;

    for id in [prompt, feedback_menu] {
        assert!(h.channel.sent().contains(&Sent::Markup {
            message_id: id,
            keyboard: None
        }));
    }
    assert_eq!(h.last_text(), text::CANCELLED);
    let session = h.session(USER_ID).await;
    assert_eq!(session.browse_state(), None);
    assert_eq!(session.feedback_state(), None);
}

// ============================================================================
// Gate and admin commands
// ============================================================================

#[tokio::test]
async fn maintenance_message_reaches_users_but_not_admins() {
    let h = Harness::new();
    h.maintenance
        .set_maintenance_state(&MaintenanceMode::Message("Upgrading".to_string()))
        .unwrap();

    h.command(USER_ID, "start", None).await;
    assert_eq!(h.last_text(), "🚧 Upgrading");
    assert_eq!(h.session(USER_ID).await.browse_state(), None);

    h.command(ADMIN_ID, "start", None).await;
    assert_eq!(h.last_text(), text::greeting(Some("Ana")));
    assert_eq!(
        h.session(ADMIN_ID).await.browse_state(),
        Some(BrowseState::SelectingAction)
    );
}

#[tokio::test]
async fn maintenance_alert_is_plain_text_within_the_alert_limit() {
    let h = Harness::new();
    let notice = format!("Back <soon> & {}", "x".repeat(300));
    h.maintenance
        .set_maintenance_state(&MaintenanceMode::Message(notice))
        .unwrap();

    h.press_on(USER_ID, &Callback::ModeCourse.encode(), Some((55, false)))
        .await;
    let Some(Sent::Answer {
        text: Some(alert), ..
    }) = h.channel.sent().pop()
    else {
        panic!("button was not answered with an alert");
    };
    assert!(alert.starts_with("🚧 Back <soon> & x"));
    assert_eq!(alert.chars().count(), text::ALERT_MAX_CHARS);

    h.command(USER_ID, "start", None).await;
    assert!(h.last_text().starts_with("🚧 Back &lt;soon&gt; &amp; x"));
}

#[tokio::test]
async fn admin_switches_maintenance_on() {
    let h = Harness::new();

    h.command(ADMIN_ID, "maintenance", Some("on Back soon")).await;

    let expected = MaintenanceMode::Message("Back soon".to_string());
    assert_eq!(h.maintenance.maintenance_state().unwrap(), expected);
    assert_eq!(h.last_text(), text::maintenance_changed(&expected));
}

#[tokio::test]
async fn admin_commands_are_refused_to_regular_users() {
    let h = Harness::new();

    h.command(USER_ID, "block", Some("42 spam")).await;

    assert_eq!(h.last_text(), text::NOT_AUTHORIZED);
    assert!(h
        .gateway
        .calls()
        .iter()
        .all(|c| !c.starts_with("set_block_status")));
}

#[tokio::test]
async fn admin_blocks_a_user() {
    let h = Harness::new();
    h.gateway.set_block_status.push(Ok(UserStatus {
        telegram_user_id: 42,
        first_name: None,
        username: None,
        is_subscribed: true,
        is_blocked: true,
        block_reason: Some("spam".to_string()),
        blocked_at: None,
    }));

    h.command(ADMIN_ID, "block", Some("42 spam")).await;

    assert!(h
        .gateway
        .calls()
        .contains(&"set_block_status:42:true".to_string()));
    assert_eq!(h.last_text(), text::blocked("42", Some("spam")));
}
