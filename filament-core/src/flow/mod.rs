//! Control Flow Components
//!
//! Components that decide what to render: conditionals, keyed lists, error
//! boundaries and async boundaries. Each is a plain component function; wrap
//! it with [`ElementType::component`](crate::render::ElementType::component)
//! to use it in an element tree.
//!
//! # Lists
//!
//! [`for_each`] returns a list of nodes tagged with their slot status. When
//! a reactive binding sees one such list replace another, the keyed list
//! reconciler patches the parent in place instead of re-rendering the range.

mod control;
mod list;
mod reconcile;
mod suspense;

pub use control::{error_boundary, match_case, show, switch, throw_error};
pub use list::for_each;
pub use suspense::{lazy, suspense};

pub(crate) use reconcile::reconcile_lists;
