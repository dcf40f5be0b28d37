//! List menus built from cached session slots
//!
//! `ListKind` is the one descriptor behind every paginated menu: where its
//! list is cached, how items and headers render, and which state shows it.
//! Forward handlers, page turns and back navigation all go through here.

use super::keyboards::{back_to_course_list, button, cancel_button};
use super::page::{clamp_page, render_page, RenderedPage};
use super::payload::{Callback, ListRef, NavOrigin, PageRequest};
use super::text;
use crate::channel::{Button, Keyboard};
use crate::conversation::BrowseState;
use crate::session::{BrowseSlot, BrowseSlots};

/// A fully rendered menu and the state that accepts its buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub state: BrowseState,
    pub text: String,
    pub keyboard: Keyboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    CourseSearch,
    ProfSearch,
    ProfCourses,
    Terms,
}

impl ListKind {
    #[cfg(test)]
    pub const ALL: [ListKind; 4] = [
        ListKind::CourseSearch,
        ListKind::ProfSearch,
        ListKind::ProfCourses,
        ListKind::Terms,
    ];

    pub fn state(self) -> BrowseState {
        match self {
            ListKind::CourseSearch => BrowseState::SelectingCourseResults,
            ListKind::ProfSearch => BrowseState::SelectingProfResults,
            ListKind::ProfCourses => BrowseState::SelectingCourseForProf,
            ListKind::Terms => BrowseState::SelectingYearSemester,
        }
    }

    pub fn slot(self) -> BrowseSlot {
        match self {
            ListKind::CourseSearch => BrowseSlot::CourseSearch,
            ListKind::ProfSearch => BrowseSlot::ProfSearch,
            ListKind::ProfCourses => BrowseSlot::ProfCourses,
            ListKind::Terms => BrowseSlot::Terms,
        }
    }

    /// Length of the cached list, `None` when nothing is cached.
    pub fn len(self, slots: &BrowseSlots) -> Option<usize> {
        match self {
            ListKind::CourseSearch => slots.course_search.as_ref().map(|l| l.items.len()),
            ListKind::ProfSearch => slots.prof_search.as_ref().map(|l| l.items.len()),
            ListKind::ProfCourses => slots.prof_courses.as_ref().map(|p| p.courses.items.len()),
            ListKind::Terms => slots.terms.as_ref().map(|t| t.terms.items.len()),
        }
    }

    /// Move the cached cursor to `page`, clamped. Returns the page now current.
    pub fn set_page(self, slots: &mut BrowseSlots, page: usize, page_size: usize) -> Option<usize> {
        let page = clamp_page(page, self.len(slots)?, page_size);
        let cursor = match self {
            ListKind::CourseSearch => &mut slots.course_search.as_mut()?.page,
            ListKind::ProfSearch => &mut slots.prof_search.as_mut()?.page,
            ListKind::ProfCourses => &mut slots.prof_courses.as_mut()?.courses.page,
            ListKind::Terms => &mut slots.terms.as_mut()?.terms.page,
        };
        *cursor = page;
        Some(page)
    }
}

impl ListRef {
    pub fn kind(&self) -> ListKind {
        match self {
            ListRef::CourseSearch => ListKind::CourseSearch,
            ListRef::ProfSearch => ListKind::ProfSearch,
            ListRef::ProfCourses { .. } => ListKind::ProfCourses,
            ListRef::Terms { .. } => ListKind::Terms,
        }
    }

    /// The cached list is the one this reference was rendered from.
    pub fn matches(&self, slots: &BrowseSlots) -> bool {
        match self {
            ListRef::CourseSearch => slots.course_search.is_some(),
            ListRef::ProfSearch => slots.prof_search.is_some(),
            ListRef::ProfCourses { prof_id } => slots
                .prof_courses
                .as_ref()
                .is_some_and(|p| p.prof_id == *prof_id),
            ListRef::Terms { course, origin } => slots
                .terms
                .as_ref()
                .is_some_and(|t| &t.course == course && t.origin == *origin),
        }
    }
}

fn page_control(list: ListRef) -> impl Fn(usize) -> Callback {
    move |page| {
        Callback::Page(PageRequest {
            list: list.clone(),
            page,
        })
    }
}

fn assemble(rendered: RenderedPage, footer: Vec<Vec<Button>>) -> Keyboard {
    Keyboard::new()
        .rows(rendered.items.into_iter().map(|b| vec![b]))
        .row(rendered.controls)
        .rows(footer)
}

/// Render the cached list of `kind` at its current cursor; `None` when not cached.
pub fn list_menu(kind: ListKind, slots: &BrowseSlots, page_size: usize) -> Option<Menu> {
    let (text, keyboard) = match kind {
        ListKind::CourseSearch => {
            let list = slots.course_search.as_ref()?;
            let rendered = render_page(
                &list.items,
                list.page,
                page_size,
                |c| {
                    button(
                        &text::course_label(c),
                        &Callback::SelectCourse {
                            code: c.code.clone(),
                            origin: NavOrigin::Course,
                        },
                    )
                },
                page_control(ListRef::CourseSearch),
            );
            let header = text::search_header(
                "course",
                "courses",
                list.items.len(),
                list.query.as_deref(),
                rendered.page,
                rendered.last_page,
            );
            let footer = vec![
                vec![button("⬅️ Re-enter Search", &Callback::BackToTypingCourse)],
                vec![cancel_button()],
            ];
            (header, assemble(rendered, footer))
        }
        ListKind::ProfSearch => {
            let list = slots.prof_search.as_ref()?;
            let rendered = render_page(
                &list.items,
                list.page,
                page_size,
                |p| {
                    button(
                        &text::truncate(&p.name, text::LABEL_MAX_CHARS),
                        &Callback::SelectProf { prof_id: p.id },
                    )
                },
                page_control(ListRef::ProfSearch),
            );
            let header = text::search_header(
                "professor",
                "professors",
                list.items.len(),
                list.query.as_deref(),
                rendered.page,
                rendered.last_page,
            );
            let footer = vec![
                vec![button("⬅️ Re-enter Search", &Callback::BackToTypingProf)],
                vec![cancel_button()],
            ];
            (header, assemble(rendered, footer))
        }
        ListKind::ProfCourses => {
            let cache = slots.prof_courses.as_ref()?;
            let prof_id = cache.prof_id;
            let prof_name = slots
                .prof_named(prof_id)
                .map_or_else(|| format!("ID {prof_id}"), |p| p.name.clone());
            let rendered = render_page(
                &cache.courses.items,
                cache.courses.page,
                page_size,
                |c| {
                    button(
                        &text::course_label(c),
                        &Callback::SelectCourse {
                            code: c.code.clone(),
                            origin: NavOrigin::Professor(prof_id),
                        },
                    )
                },
                page_control(ListRef::ProfCourses { prof_id }),
            );
            let header = text::prof_courses_header(
                &prof_name,
                cache.courses.items.len(),
                rendered.page,
                rendered.last_page,
            );
            let footer = vec![
                vec![button("⬅️ Different Professor", &Callback::BackToProfSearch)],
                vec![cancel_button()],
            ];
            (header, assemble(rendered, footer))
        }
        ListKind::Terms => {
            let menu = slots.terms.as_ref()?;
            let prof_name = match menu.origin {
                NavOrigin::Professor(id) => slots.prof_named(id).map(|p| p.name.as_str()),
                NavOrigin::Course => None,
            };
            let rendered = render_page(
                &menu.terms.items,
                menu.terms.page,
                page_size,
                |t| {
                    button(
                        &t.label(),
                        &Callback::SelectTerm {
                            course: menu.course.clone(),
                            term: t.clone(),
                            origin: menu.origin,
                        },
                    )
                },
                page_control(ListRef::Terms {
                    course: menu.course.clone(),
                    origin: menu.origin,
                }),
            );
            let header = text::terms_header(
                &menu.course,
                prof_name,
                menu.terms.items.len(),
                rendered.page,
                rendered.last_page,
            );
            let footer = vec![
                vec![back_to_course_list(menu.origin)],
                vec![cancel_button()],
            ];
            (header, assemble(rendered, footer))
        }
    };

    Some(Menu {
        state: kind.state(),
        text,
        keyboard,
    })
}
