//! Browse flow handlers
//!
//! Each handler reads the cached slots it needs, fetches what is missing,
//! writes every slot the next state relies on and returns the menu to show.

use super::backtrack::{resolve, BackTarget, Resolution};
use super::error::{HandlerError, HandlerResult};
use super::outcome::{Effect, Outcome};
use super::routes::BrowseAction;
use super::turn::Turn;
use super::{BrowseState, Flow};
use crate::gateway::{OfferingScope, SearchHits, SearchKind, Term};
use crate::render::keyboards::{self, cancel_only, start_menu};
use crate::render::payload::{NavOrigin, PageRequest};
use crate::render::{list_menu, sort_terms, text, unique_courses, ListKind, Menu};
use crate::runtime::Job;
use crate::session::{
    BrowseSlot, BrowseSlots, ProfCourses, ResultList, SearchMode, SelectedProf, TermMenu,
};

const MIN_COURSE_QUERY: usize = 2;
const MIN_PROF_QUERY: usize = 3;

pub async fn handle(action: BrowseAction, turn: &mut Turn<'_>) -> HandlerResult<BrowseState> {
    match action {
        BrowseAction::NewSearch => Ok(new_search(turn)),
        BrowseAction::Close => Ok(Outcome::end().with_effect(Effect::show_text(text::CLOSED))),
        BrowseAction::ChooseMode(mode) => Ok(choose_mode(mode, turn)),
        BrowseAction::SearchInput(query) => search_input(query, turn).await,
        BrowseAction::SelectCourse { code, origin } => select_course(code, origin, turn).await,
        BrowseAction::SelectProf { prof_id } => select_prof(prof_id, turn).await,
        BrowseAction::ViewProfCourses { prof_id } => view_prof_courses(prof_id, turn).await,
        BrowseAction::SelectTerm {
            course,
            term,
            origin,
        } => select_term(course, term, origin, turn).await,
        BrowseAction::Page(request) => page(request, turn),
        BrowseAction::Back(target) => Ok(back(target, turn)),
    }
}

// ============================================================================
// Entry and exit
// ============================================================================

/// Hard reset: both flows cleared, greeting sent, browse flow at the start menu.
pub fn start(turn: &mut Turn<'_>) -> Outcome<BrowseState> {
    let card = turn.browse().final_card;
    turn.session.hard_reset();
    tracing::info!(user_id = turn.actor(), "Conversation (re)started");

    Outcome::goto(BrowseState::SelectingAction)
        .with_effects(card.map(Effect::StripButtons))
        .with_effect(Effect::send(
            text::greeting(turn.user.first_name.as_deref()),
            Some(start_menu()),
        ))
        .with_effect(Effect::Submit(Job::Subscribe(turn.user.clone())))
}

/// End both flows. The browse flow itself ends through the returned outcome.
///
/// Open prompts of either flow keep their text but lose their buttons. A pressed
/// cancel button is replaced by the notice; a typed /cancel gets a new message.
pub fn cancel(turn: &mut Turn<'_>) -> Outcome<BrowseState> {
    let pressed = turn.pressed;
    let prompts: Vec<_> = [Flow::Browse, Flow::Feedback]
        .into_iter()
        .filter_map(|flow| turn.session.surface(flow))
        .map(|s| s.message)
        .filter(|m| pressed.map(|p| p.message) != Some(*m))
        .collect();
    turn.session.end(Flow::Feedback);
    tracing::info!(user_id = turn.actor(), "Conversation cancelled");

    let outcome = Outcome::end().with_effects(prompts.into_iter().map(Effect::StripButtons));
    match pressed {
        Some(pressed) => {
            turn.session.set_surface(Flow::Browse, Some(pressed));
            outcome.with_effect(Effect::show_text(text::CANCELLED))
        }
        None => outcome.with_effect(Effect::send(text::CANCELLED, None)),
    }
}

fn new_search(turn: &mut Turn<'_>) -> Outcome<BrowseState> {
    let pressed = turn.pressed.map(|s| s.message);
    let card = turn.browse().final_card.take().filter(|c| Some(*c) != pressed);
    *turn.browse() = BrowseSlots::default();

    Outcome::goto(BrowseState::SelectingAction)
        .with_effects(pressed.map(Effect::StripButtons))
        .with_effects(card.map(Effect::StripButtons))
        .with_effect(Effect::send(text::START_PROMPT, Some(start_menu())))
}

fn choose_mode(mode: SearchMode, turn: &mut Turn<'_>) -> Outcome<BrowseState> {
    turn.browse().begin_search(mode);
    let (state, prompt) = match mode {
        SearchMode::Course => (BrowseState::TypingCourse, text::COURSE_PROMPT),
        SearchMode::Professor => (BrowseState::TypingProf, text::PROF_PROMPT),
    };
    Outcome::goto(state).with_effect(Effect::show(prompt, cancel_only()))
}

// ============================================================================
// Search
// ============================================================================

async fn search_input(query: String, turn: &mut Turn<'_>) -> HandlerResult<BrowseState> {
    let mode = match turn.session.browse_state() {
        Some(BrowseState::TypingProf) => SearchMode::Professor,
        _ => SearchMode::Course,
    };
    let (kind, one, many, min) = match mode {
        SearchMode::Course => (SearchKind::Course, "course", "courses", MIN_COURSE_QUERY),
        SearchMode::Professor => (SearchKind::Professor, "professor", "professors", MIN_PROF_QUERY),
    };

    let query = query.trim().to_string();
    if query.chars().count() < min {
        return Err(HandlerError::validation(text::too_short(one, min), cancel_only()));
    }

    if let Some(incoming) = turn.incoming {
        turn.emit(Effect::Delete(incoming)).await;
    }
    turn.progress(text::searching(many, &query)).await;

    let started = std::time::Instant::now();
    let hits = turn.gateway.search(&query, kind, turn.actor()).await?;
    tracing::info!(
        user_id = turn.actor(),
        ?kind,
        results = hits.len(),
        duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Search completed"
    );

    if hits.is_empty() {
        return Ok(Outcome::stay().with_effect(Effect::show(
            text::no_results(many, &query),
            cancel_only(),
        )));
    }

    let slots = turn.browse();
    slots.mode = Some(mode);
    let list_kind = match hits {
        SearchHits::Courses(items) if mode == SearchMode::Course => {
            slots.course_search = Some(ResultList::new(items, Some(query)));
            ListKind::CourseSearch
        }
        SearchHits::Professors(items) if mode == SearchMode::Professor => {
            slots.prof_search = Some(ResultList::new(items, Some(query)));
            ListKind::ProfSearch
        }
        other => {
            return Err(HandlerError::unexpected(format!(
                "search for {kind:?} returned {other:?}"
            )))
        }
    };
    slots.clear_dependents(list_kind.slot());
    show_list(list_kind, turn)
}

// ============================================================================
// Selection
// ============================================================================

async fn select_course(
    code: String,
    origin: NavOrigin,
    turn: &mut Turn<'_>,
) -> HandlerResult<BrowseState> {
    let terms = match origin {
        NavOrigin::Professor(prof_id) => {
            let cached = turn
                .browse()
                .prof_courses
                .as_ref()
                .filter(|p| p.prof_id == prof_id)
                .ok_or_else(|| {
                    HandlerError::stale("professor courses", Some(BackTarget::ProfCourses { prof_id }))
                })?;
            sort_terms(cached.offerings.iter().filter(|o| o.course.code == code))
        }
        NavOrigin::Course => {
            turn.progress(text::fetching_terms(&code)).await;
            let offerings = turn
                .gateway
                .list_offerings(&OfferingScope::Course(code.clone()), turn.actor())
                .await?;
            sort_terms(&offerings)
        }
    };
    tracing::debug!(user_id = turn.actor(), course = %code, terms = terms.len(), "Term menu built");

    let slots = turn.browse();
    let parent = match origin {
        NavOrigin::Course => BrowseSlot::CourseSearch,
        NavOrigin::Professor(_) => BrowseSlot::ProfCourses,
    };
    slots.clear_dependents(parent);
    slots.terms = Some(TermMenu {
        course: code,
        origin,
        terms: ResultList::new(terms, None),
    });
    show_list(ListKind::Terms, turn)
}

async fn select_prof(prof_id: i64, turn: &mut Turn<'_>) -> HandlerResult<BrowseState> {
    let name = turn
        .browse()
        .prof_search
        .as_ref()
        .and_then(|list| list.items.iter().find(|p| p.id == prof_id))
        .map(|p| p.name.clone())
        .ok_or_else(|| HandlerError::stale("professor search result", Some(BackTarget::ProfSearch)))?;

    let slots = turn.browse();
    slots.clear_dependents(BrowseSlot::ProfSearch);
    slots.selected_prof = Some(SelectedProf {
        id: prof_id,
        name: name.clone(),
    });

    turn.progress(text::fetching_dossier(&name)).await;
    let dossier = turn.gateway.professor_dossier(prof_id, turn.actor()).await?;

    let caption = text::dossier_card(&dossier);
    let keyboard = keyboards::dossier(prof_id);
    let outcome = Outcome::goto(BrowseState::SelectingCourseForProf);
    Ok(match dossier.career_plot_file_id {
        Some(plot) => outcome
            .with_effects(turn.surface().map(|s| Effect::Delete(s.message)))
            .with_effect(Effect::send_photo(Some(plot), caption, keyboard)),
        None => outcome.with_effect(Effect::show(caption, keyboard)),
    })
}

async fn view_prof_courses(prof_id: i64, turn: &mut Turn<'_>) -> HandlerResult<BrowseState> {
    let name = turn
        .browse()
        .prof_named(prof_id)
        .map(|p| p.name.clone())
        .ok_or_else(|| HandlerError::stale("selected professor", Some(BackTarget::ProfSearch)))?;

    turn.progress(text::fetching_prof_courses(&name)).await;
    let offerings = turn
        .gateway
        .list_offerings(&OfferingScope::Professor(prof_id), turn.actor())
        .await?;

    if offerings.is_empty() {
        return Ok(Outcome::stay().with_effect(Effect::show(
            text::no_prof_courses(&name),
            keyboards::no_prof_courses(),
        )));
    }

    let courses = unique_courses(&offerings);
    let slots = turn.browse();
    slots.prof_courses = Some(ProfCourses {
        prof_id,
        offerings,
        courses: ResultList::new(courses, None),
    });
    slots.clear_dependents(BrowseSlot::ProfCourses);
    show_list(ListKind::ProfCourses, turn)
}

async fn select_term(
    course: String,
    term: Term,
    origin: NavOrigin,
    turn: &mut Turn<'_>,
) -> HandlerResult<BrowseState> {
    let offered = turn.browse().terms.as_ref().is_some_and(|menu| {
        menu.course == course && menu.origin == origin && menu.terms.items.contains(&term)
    });
    if !offered {
        return Err(HandlerError::stale(
            "term menu",
            Some(BackTarget::Terms { course, origin }),
        ));
    }

    turn.progress(text::fetching_grades(&course, &term)).await;
    let details = turn.gateway.offering_details(&course, &term, turn.actor()).await;
    let details = match details {
        Err(e) if e.is_not_found() => return term_not_found(&course, &term, turn),
        result => result?,
    };
    let distribution = turn.gateway.grade_distribution(details.id, turn.actor()).await;
    let distribution = match distribution {
        Err(e) if e.is_not_found() => return term_not_found(&course, &term, turn),
        result => result?,
    };

    let photo = distribution
        .offering
        .plot_file_id
        .clone()
        .or(details.plot_file_id);
    let surface = turn.surface().map(|s| s.message);
    let old_card = turn.browse().final_card.take().filter(|c| Some(*c) != surface);

    Ok(Outcome::goto(BrowseState::ShowingFinalGrades)
        .with_effects(old_card.map(Effect::StripButtons))
        .with_effects(surface.map(Effect::Delete))
        .with_effect(Effect::card(
            photo,
            text::grade_card(&distribution),
            keyboards::final_options(&course, origin),
        )))
}

/// Offering without grade data: the term menu again, under an error banner.
fn term_not_found(course: &str, term: &Term, turn: &mut Turn<'_>) -> HandlerResult<BrowseState> {
    tracing::info!(user_id = turn.actor(), course, term = %term.label(), "No grade data for offering");
    let menu = menu_for(ListKind::Terms, turn)?;
    Ok(Outcome::stay().with_effect(Effect::show(
        format!("{}\n\n{}", text::term_not_found(course, term), menu.text),
        menu.keyboard,
    )))
}

// ============================================================================
// Navigation
// ============================================================================

fn page(request: PageRequest, turn: &mut Turn<'_>) -> HandlerResult<BrowseState> {
    let page_size = turn.settings.page_size;
    let slots = turn.browse();
    if !request.list.matches(slots) {
        return Err(HandlerError::stale(
            "paged list",
            Some(BackTarget::from(request.list)),
        ));
    }
    let kind = request.list.kind();
    kind.set_page(slots, request.page, page_size);
    let menu = menu_for(kind, turn)?;
    Ok(Outcome::stay().with_effect(Effect::show(menu.text, menu.keyboard)))
}

fn back(target: BackTarget, turn: &mut Turn<'_>) -> Outcome<BrowseState> {
    let page_size = turn.settings.page_size;
    match resolve(target.clone(), turn.browse(), page_size) {
        Resolution::Menu {
            target: reached,
            menu,
            steps,
        } => {
            if steps > 0 {
                tracing::info!(user_id = turn.actor(), ?target, ?reached, steps, "Back fell back");
            }
            Outcome::goto(menu.state).with_effect(Effect::show(menu.text, menu.keyboard))
        }
        Resolution::Restart => {
            tracing::info!(user_id = turn.actor(), ?target, "Back chain exhausted");
            Outcome::end().with_effect(Effect::show_text(text::SESSION_EXPIRED))
        }
    }
}

fn menu_for(kind: ListKind, turn: &mut Turn<'_>) -> Result<Menu, HandlerError> {
    let page_size = turn.settings.page_size;
    list_menu(kind, turn.browse(), page_size)
        .ok_or_else(|| HandlerError::unexpected(format!("{kind:?} list missing after update")))
}

fn show_list(kind: ListKind, turn: &mut Turn<'_>) -> HandlerResult<BrowseState> {
    let menu = menu_for(kind, turn)?;
    Ok(Outcome::goto(menu.state).with_effect(Effect::show(menu.text, menu.keyboard)))
}
