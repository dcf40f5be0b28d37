//! Page slicing and list ordering

use std::cmp::Ordering;

use super::payload::Callback;
use crate::channel::Button;
use crate::gateway::{CourseRef, OfferingSummary, Term};

pub const PAGE_SIZE: usize = 8;

pub const PREVIOUS_LABEL: &str = "⬅️ Previous";
pub const NEXT_LABEL: &str = "Next ➡️";

/// One page of a list: item buttons plus the navigation row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub items: Vec<Button>,
    pub controls: Vec<Button>,
    /// Page actually shown, after clamping
    pub page: usize,
    pub last_page: usize,
}

pub fn last_page(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    if len == 0 {
        0
    } else {
        (len - 1) / page_size
    }
}

pub fn clamp_page(page: usize, len: usize, page_size: usize) -> usize {
    page.min(last_page(len, page_size))
}

/// Render page `page` of `list`.
///
/// The page is clamped to `[0, last_page]`. "Previous" appears only when an
/// earlier page exists, "Next" only when a later one does; an empty list gets
/// neither.
pub fn render_page<T>(
    list: &[T],
    page: usize,
    page_size: usize,
    formatter: impl Fn(&T) -> Button,
    control: impl Fn(usize) -> Callback,
) -> RenderedPage {
    let page_size = page_size.max(1);
    let last = last_page(list.len(), page_size);
    let page = page.min(last);

    let items = list
        .iter()
        .skip(page * page_size)
        .take(page_size)
        .map(formatter)
        .collect();

    let mut controls = Vec::new();
    if page > 0 {
        controls.push(Button {
            label: PREVIOUS_LABEL.to_string(),
            payload: control(page - 1).encode(),
        });
    }
    if (page + 1) * page_size < list.len() {
        controls.push(Button {
            label: NEXT_LABEL.to_string(),
            payload: control(page + 1).encode(),
        });
    }

    RenderedPage {
        items,
        controls,
        page,
        last_page: last,
    }
}

fn newest_first(a: &Term, b: &Term) -> Ordering {
    match (a.start_year(), b.start_year()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Distinct terms of `offerings`, newest year first, then Odd, Even, Summer, other.
pub fn sort_terms<'a>(offerings: impl IntoIterator<Item = &'a OfferingSummary>) -> Vec<Term> {
    let mut terms: Vec<Term> = offerings.into_iter().map(OfferingSummary::term).collect();
    terms.sort_by(|a, b| {
        newest_first(a, b)
            .then_with(|| a.semester.cmp(&b.semester))
            .then_with(|| a.academic_year.cmp(&b.academic_year))
    });
    terms.dedup();
    terms
}

/// Distinct courses of `offerings`, ordered by code.
pub fn unique_courses(offerings: &[OfferingSummary]) -> Vec<CourseRef> {
    let mut courses: Vec<CourseRef> = Vec::new();
    for offering in offerings {
        if !courses.iter().any(|c| c.code == offering.course.code) {
            courses.push(offering.course.clone());
        }
    }
    courses.sort_by(|a, b| a.code.cmp(&b.code));
    courses
}
