//! Property-based tests for pagination and payloads

use super::page::render_page;
use super::payload::{Callback, ListRef, NavOrigin, PageRequest};
use super::*;
use crate::channel::Button;
use crate::gateway::{CourseRef, Term};
use crate::session::{BrowseSlots, ResultList};
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

fn arb_origin() -> impl Strategy<Value = NavOrigin> {
    prop_oneof![
        Just(NavOrigin::Course),
        (1i64..10_000_000).prop_map(NavOrigin::Professor),
    ]
}

fn arb_code() -> impl Strategy<Value = String> {
    "[A-Z]{2,4}[0-9]{3,4}"
}

fn arb_term() -> impl Strategy<Value = Term> {
    (
        2000i32..2040,
        prop_oneof![Just("Odd"), Just("Even"), Just("Summer")],
    )
        .prop_map(|(year, sem)| Term::new(&format!("{year}-{:02}", (year + 1) % 100), sem))
}

fn arb_list_ref() -> impl Strategy<Value = ListRef> {
    prop_oneof![
        Just(ListRef::CourseSearch),
        Just(ListRef::ProfSearch),
        (1i64..1_000_000).prop_map(|prof_id| ListRef::ProfCourses { prof_id }),
        (arb_code(), arb_origin()).prop_map(|(course, origin)| ListRef::Terms { course, origin }),
    ]
}

fn arb_callback() -> impl Strategy<Value = Callback> {
    prop_oneof![
        Just(Callback::ModeCourse),
        Just(Callback::ModeProf),
        Just(Callback::Cancel),
        Just(Callback::NewSearch),
        Just(Callback::Close),
        Just(Callback::BackToTypingCourse),
        Just(Callback::BackToTypingProf),
        Just(Callback::BackToCourseSearch),
        Just(Callback::BackToProfSearch),
        (1i64..1_000_000).prop_map(|prof_id| Callback::BackToProfCourses { prof_id }),
        (arb_code(), arb_origin())
            .prop_map(|(course, origin)| Callback::BackToTerms { course, origin }),
        arb_origin().prop_map(|origin| Callback::BackToCourseList { origin }),
        (1i64..1_000_000).prop_map(|prof_id| Callback::ViewProfCourses { prof_id }),
        (arb_code(), arb_origin()).prop_map(|(code, origin)| Callback::SelectCourse { code, origin }),
        (1i64..1_000_000).prop_map(|prof_id| Callback::SelectProf { prof_id }),
        (arb_code(), arb_term(), arb_origin()).prop_map(|(course, term, origin)| {
            Callback::SelectTerm {
                course,
                term,
                origin,
            }
        }),
        (arb_list_ref(), 0usize..500).prop_map(|(list, page)| Callback::Page(PageRequest {
            list,
            page
        })),
        Just(Callback::FeedbackConfirm),
        Just(Callback::FeedbackChangeType),
    ]
}

fn plain(item: &usize) -> Button {
    Button {
        label: item.to_string(),
        payload: format!("ps|{item}"),
    }
}

fn course_page(page: usize) -> Callback {
    Callback::Page(PageRequest {
        list: ListRef::CourseSearch,
        page,
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_page_shows_a_window_of_the_list(len in 0usize..60, page in 0usize..20, size in 1usize..12) {
        let list: Vec<usize> = (0..len).collect();
        let rendered = render_page(&list, page, size, plain, course_page);

        prop_assert!(rendered.page <= rendered.last_page);
        prop_assert!(rendered.items.len() <= size);
        let start = rendered.page * size;
        let expected: Vec<String> = list.iter().skip(start).take(size).map(usize::to_string).collect();
        let shown: Vec<String> = rendered.items.iter().map(|b| b.label.clone()).collect();
        prop_assert_eq!(shown, expected);
    }

    #[test]
    fn prop_controls_never_point_off_the_list(len in 0usize..60, page in 0usize..20, size in 1usize..12) {
        let list: Vec<usize> = (0..len).collect();
        let rendered = render_page(&list, page, size, plain, course_page);

        for control in &rendered.controls {
            let Some(Callback::Page(request)) = Callback::decode(&control.payload) else {
                return Err(TestCaseError::fail(format!("bad control {}", control.payload)));
            };
            prop_assert!(request.page <= rendered.last_page);
            prop_assert_ne!(request.page, rendered.page);
            let target = render_page(&list, request.page, size, plain, course_page);
            prop_assert!(!target.items.is_empty());
        }
        if len == 0 {
            prop_assert!(rendered.controls.is_empty());
        }
    }

    #[test]
    fn prop_rendering_is_deterministic(n in 0usize..40, page in 0usize..8) {
        let items: Vec<CourseRef> = (0..n)
            .map(|i| CourseRef { code: format!("CS{i}"), name: Some(format!("Course {i}")) })
            .collect();
        let mut slots = BrowseSlots {
            course_search: Some(ResultList::new(items, Some("CS".to_string()))),
            ..BrowseSlots::default()
        };
        ListKind::CourseSearch.set_page(&mut slots, page, PAGE_SIZE);
        let first = list_menu(ListKind::CourseSearch, &slots, PAGE_SIZE);
        let second = list_menu(ListKind::CourseSearch, &slots, PAGE_SIZE);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_every_payload_decodes_to_itself(cb in arb_callback()) {
        let encoded = cb.encode();
        prop_assert!(encoded.len() <= 64, "{} bytes: {}", encoded.len(), encoded);
        prop_assert_eq!(Callback::decode(&encoded), Some(cb));
    }

    #[test]
    fn prop_arbitrary_payloads_never_panic(raw in "[a-z_|0-9]{0,40}") {
        let _ = Callback::decode(&raw);
    }
}
