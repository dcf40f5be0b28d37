//! Presentation layer
//!
//! Pure functions from cached slots to text and keyboards. Nothing here
//! performs I/O or touches the session store.

pub mod keyboards;
pub mod menu;
mod page;
pub mod payload;
pub mod text;

#[cfg(test)]
mod proptests;

pub use menu::{list_menu, ListKind, Menu};
pub use page::{sort_terms, unique_courses, PAGE_SIZE};

#[cfg(test)]
pub use page::{NEXT_LABEL, PREVIOUS_LABEL};
