//! Backtrack resolver
//!
//! There is no undo stack. A back trigger names the menu it wants, and the
//! resolver rebuilds that menu from cached slots alone. When the slots are
//! gone or belong to a different selection, it walks a fixed fallback chain
//! towards the search prompts, which need no context at all.

use super::BrowseState;
use crate::render::keyboards::cancel_only;
use crate::render::payload::{Callback, ListRef, NavOrigin};
use crate::render::text::{COURSE_PROMPT, PROF_PROMPT};
use crate::render::{list_menu, ListKind, Menu};
use crate::session::{BrowseSlot, BrowseSlots, SearchMode};

/// Menu a back trigger asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackTarget {
    TypingCourse,
    TypingProf,
    CourseSearch,
    ProfSearch,
    ProfCourses { prof_id: i64 },
    Terms { course: String, origin: NavOrigin },
}

impl BackTarget {
    /// Course list a term menu was reached from
    pub fn course_list(origin: NavOrigin) -> Self {
        match origin {
            NavOrigin::Course => BackTarget::CourseSearch,
            NavOrigin::Professor(prof_id) => BackTarget::ProfCourses { prof_id },
        }
    }

    /// Next target to try when this one cannot be rebuilt.
    pub fn fallback(&self) -> Option<BackTarget> {
        match self {
            BackTarget::Terms { origin, .. } => Some(BackTarget::course_list(*origin)),
            BackTarget::CourseSearch => Some(BackTarget::TypingCourse),
            BackTarget::ProfCourses { .. } => Some(BackTarget::ProfSearch),
            BackTarget::ProfSearch => Some(BackTarget::TypingProf),
            BackTarget::TypingCourse | BackTarget::TypingProf => None,
        }
    }

    /// Depth in the browse flow. Every fallback has a strictly lower rank.
    #[cfg(test)]
    pub fn rank(&self) -> u8 {
        match self {
            BackTarget::TypingCourse | BackTarget::TypingProf => 0,
            BackTarget::CourseSearch | BackTarget::ProfSearch => 1,
            BackTarget::ProfCourses { .. } => 2,
            BackTarget::Terms { .. } => 3,
        }
    }

    /// Target named by a back button, if the payload is one.
    pub fn from_callback(callback: &Callback) -> Option<Self> {
        Some(match callback {
            Callback::BackToTypingCourse => BackTarget::TypingCourse,
            Callback::BackToTypingProf => BackTarget::TypingProf,
            Callback::BackToCourseSearch => BackTarget::CourseSearch,
            Callback::BackToProfSearch => BackTarget::ProfSearch,
            Callback::BackToProfCourses { prof_id } => BackTarget::ProfCourses { prof_id: *prof_id },
            Callback::BackToTerms { course, origin } => BackTarget::Terms {
                course: course.clone(),
                origin: *origin,
            },
            Callback::BackToCourseList { origin } => BackTarget::course_list(*origin),
            _ => return None,
        })
    }

    /// Rebuild this target's menu from `slots`, clearing everything forward of it.
    fn rebuild(&self, slots: &mut BrowseSlots, page_size: usize) -> Option<Menu> {
        match self {
            BackTarget::TypingCourse => {
                slots.begin_search(SearchMode::Course);
                Some(prompt(BrowseState::TypingCourse, COURSE_PROMPT))
            }
            BackTarget::TypingProf => {
                slots.begin_search(SearchMode::Professor);
                Some(prompt(BrowseState::TypingProf, PROF_PROMPT))
            }
            BackTarget::CourseSearch => {
                let menu = list_menu(ListKind::CourseSearch, slots, page_size)?;
                slots.mode = Some(SearchMode::Course);
                slots.clear_dependents(BrowseSlot::CourseSearch);
                Some(menu)
            }
            BackTarget::ProfSearch => {
                let menu = list_menu(ListKind::ProfSearch, slots, page_size)?;
                slots.mode = Some(SearchMode::Professor);
                slots.clear_dependents(BrowseSlot::ProfSearch);
                Some(menu)
            }
            BackTarget::ProfCourses { prof_id } => {
                slots.prof_named(*prof_id)?;
                if !(ListRef::ProfCourses { prof_id: *prof_id }).matches(slots) {
                    return None;
                }
                let menu = list_menu(ListKind::ProfCourses, slots, page_size)?;
                slots.clear_dependents(BrowseSlot::ProfCourses);
                Some(menu)
            }
            BackTarget::Terms { course, origin } => {
                let list = ListRef::Terms {
                    course: course.clone(),
                    origin: *origin,
                };
                if !list.matches(slots) {
                    return None;
                }
                list_menu(ListKind::Terms, slots, page_size)
            }
        }
    }
}

impl From<ListRef> for BackTarget {
    fn from(list: ListRef) -> Self {
        match list {
            ListRef::CourseSearch => BackTarget::CourseSearch,
            ListRef::ProfSearch => BackTarget::ProfSearch,
            ListRef::ProfCourses { prof_id } => BackTarget::ProfCourses { prof_id },
            ListRef::Terms { course, origin } => BackTarget::Terms { course, origin },
        }
    }
}

fn prompt(state: BrowseState, text: &str) -> Menu {
    Menu {
        state,
        text: text.to_string(),
        keyboard: cancel_only(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// `target` was rebuilt after `steps` fallbacks from the requested target
    Menu {
        target: BackTarget,
        menu: Menu,
        steps: usize,
    },
    /// Chain exhausted; the conversation has to start over
    Restart,
}

/// Longest possible fallback chain: Terms, ProfCourses, ProfSearch, TypingProf.
pub const MAX_FALLBACK_STEPS: usize = 3;

/// Rebuild `target`, falling back along its chain until one menu can be rebuilt.
pub fn resolve(target: BackTarget, slots: &mut BrowseSlots, page_size: usize) -> Resolution {
    let mut current = Some(target);
    let mut steps = 0;
    while let Some(target) = current {
        if let Some(menu) = target.rebuild(slots, page_size) {
            return Resolution::Menu {
                target,
                menu,
                steps,
            };
        }
        tracing::debug!(?target, "Back target not reconstructible, falling back");
        current = target.fallback();
        steps += 1;
        if steps > MAX_FALLBACK_STEPS {
            break;
        }
    }
    Resolution::Restart
}
