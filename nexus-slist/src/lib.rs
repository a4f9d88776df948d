//! Allocation-free intrusive singly-linked lists.
//!
//! Records are threaded into chains through a [`Link`] field embedded in the
//! record itself. The list never allocates, never boxes elements, and never
//! touches a record beyond its link, so push and pop are a couple of pointer
//! writes.
//!
//! # Layers
//!
//! ```text
//! SList<'a, A: Adapter>   - typed: owner type and link field fixed at compile time
//!     │
//!     └── Head (raw)      - untyped: Link pointers + byte offset to the owner
//!             │
//!             └── check   - forward-only integrity walk (feature `debug-check`
//!                           runs it around every raw mutation)
//! ```
//!
//! A [`Head`] is a sentinel: the empty list is a head whose link points at
//! itself, and the last element links back to the head. Every walk stops when
//! it arrives back at the head, so there is no null-terminated tail to
//! special-case. Because the head refers to itself, it is always used through
//! `Pin<&Head>`.
//!
//! # Quick Start
//!
//! ```
//! use core::pin::pin;
//! use nexus_slist::{slist_adapter, Link, SList};
//!
//! struct Child {
//!     name: &'static str,
//!     link: Link,
//! }
//!
//! slist_adapter!(Children = Child { link });
//!
//! let c1 = Child { name: "c1", link: Link::new() };
//! let c2 = Child { name: "c2", link: Link::new() };
//!
//! let children = pin!(SList::<Children>::new());
//! let children = children.into_ref();
//!
//! // Safety: neither child is linked into another list.
//! unsafe {
//!     children.push_front(&c2);
//!     children.push_front(&c1);
//! }
//!
//! let names: Vec<_> = children.iter().map(|c| c.name).collect();
//! assert_eq!(names, ["c1", "c2"]);
//!
//! assert_eq!(children.pop_first().map(|c| c.name), Some("c1"));
//! assert_eq!(children.check(), Ok(1));
//! ```
//!
//! # Ownership
//!
//! Lists hold non-owning references. [`SList`] borrows each element for its
//! lifetime parameter, so the borrow checker keeps an element alive and in
//! place while it can still be reached. The raw [`Head`] API leaves that
//! obligation to the caller.
//!
//! # Feature Flags
//!
//! - `debug-check` - validate the chain before/after every mutation and abort
//!   with the caller's location on corruption

#![warn(missing_docs)]

pub mod adapter;
pub mod check;
pub mod link;
pub mod list;
pub mod raw;

pub use adapter::Adapter;
pub use check::{check, check_node, check_or_abort, Corruption, CorruptionKind};
pub use link::{Head, Link};
pub use list::{Iter, SList};
pub use raw::{link_of, owner_of, RawIter};
