//! The untyped list engine.
//!
//! Operations work on [`Link`] pointers plus a caller-supplied byte offset
//! from the start of an owner record to its link field. Nothing here knows
//! the owner type; [`SList`](crate::SList) supplies the offset from an
//! [`Adapter`](crate::Adapter) and is the preferred entry point.
//!
//! # Safety
//!
//! The `unsafe` methods share one contract:
//!
//! - `offset` is the offset of a [`Link`] field inside `T`
//!   (as from [`core::mem::offset_of!`]).
//! - Every record linked into a head stays alive and in place until it is
//!   popped or removed, and its link is a member of that one chain only.
//!
//! Breaking it corrupts the chain for every later walk. Build with the
//! `debug-check` feature to catch corruption at the offending call.
//!
//! # Example
//!
//! ```
//! use core::mem::offset_of;
//! use core::pin::pin;
//! use core::ptr::NonNull;
//! use nexus_slist::{Head, Link};
//!
//! struct Child {
//!     name: &'static str,
//!     link: Link,
//! }
//!
//! const OFFSET: usize = offset_of!(Child, link);
//!
//! let c1 = Child { name: "c1", link: Link::new() };
//! let head = pin!(Head::new());
//! let head = head.into_ref();
//!
//! unsafe {
//!     head.prepend(NonNull::from(&c1.link));
//!     let first = head.first::<Child>(OFFSET).unwrap();
//!     assert_eq!(first.as_ref().name, "c1");
//! }
//! ```

use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::pin::Pin;
use core::ptr::NonNull;

use crate::check;
use crate::link::{Head, Link};

/// Converts a pointer to a link into a pointer to its owner record.
///
/// # Safety
///
/// `link` must point to the [`Link`] field at `offset` inside a `T`.
#[inline]
pub unsafe fn owner_of<T>(link: NonNull<Link>, offset: usize) -> NonNull<T> {
    NonNull::new_unchecked(link.as_ptr().byte_sub(offset).cast::<T>())
}

/// Converts a pointer to an owner record into a pointer to its link.
///
/// # Safety
///
/// `owner` must point to a `T` with a [`Link`] field at `offset`.
#[inline]
pub unsafe fn link_of<T>(owner: NonNull<T>, offset: usize) -> NonNull<Link> {
    NonNull::new_unchecked(owner.as_ptr().byte_add(offset).cast::<Link>())
}

impl Head {
    /// Links `link` in as the new first element.
    ///
    /// The link's previous contents are overwritten; it does not need to be
    /// detached first.
    ///
    /// # Safety
    ///
    /// See the [module documentation](self).
    #[inline]
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub unsafe fn prepend(self: Pin<&Self>, link: NonNull<Link>) {
        let head = self.anchored();
        let link = link.as_ref();
        link.set_next(head.next());
        head.set_next(link);
        check::debug_head(self);
    }

    /// Links `new` in directly after `existing`.
    ///
    /// # Safety
    ///
    /// See the [module documentation](self). `existing` must be a member of
    /// this list; this is only verified with the `debug-check` feature.
    #[inline]
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub unsafe fn insert_after(self: Pin<&Self>, existing: NonNull<Link>, new: NonNull<Link>) {
        check::debug_member(self, existing);
        let existing = existing.as_ref();
        let new = new.as_ref();
        new.set_next(existing.next());
        existing.set_next(new);
        check::debug_head(self);
    }

    /// Returns the owner of the first element, or `None` if empty.
    ///
    /// # Safety
    ///
    /// See the [module documentation](self).
    #[inline]
    pub unsafe fn first<T>(self: Pin<&Self>, offset: usize) -> Option<NonNull<T>> {
        let first = self.first_link()?;
        Some(owner_of(first, offset))
    }

    /// Unlinks the first element and returns its owner, or `None` if empty.
    ///
    /// The head advances to the removed element's successor. The removed
    /// link is left detached.
    ///
    /// # Safety
    ///
    /// See the [module documentation](self).
    #[inline]
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub unsafe fn pop_first<T>(self: Pin<&Self>, offset: usize) -> Option<NonNull<T>> {
        let first = self.first_link()?;
        let link = first.as_ref();
        self.link().set_next(link.next());
        link.detach();
        check::debug_head(self);
        Some(owner_of(first, offset))
    }

    /// Unlinks `link` from wherever it is in the list.
    ///
    /// Singly-linked, so this walks from the head to find the predecessor:
    /// O(n). Returns `false`, touching nothing, if `link` is not a member.
    ///
    /// # Safety
    ///
    /// See the [module documentation](self).
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub unsafe fn remove(self: Pin<&Self>, link: NonNull<Link>) -> bool {
        check::debug_head(self);

        if !self.is_anchored() {
            return false;
        }

        let sentinel = self.sentinel();
        let target = link.as_ptr().cast_const();
        let mut prev = self.link();
        let mut cur = prev.next();

        while cur != sentinel {
            let node = &*cur;
            if cur == target {
                prev.set_next(node.next());
                node.detach();
                check::debug_head(self);
                return true;
            }
            prev = node;
            cur = node.next();
        }

        false
    }

    /// Returns `true` if `link` is a member of this list. O(n).
    ///
    /// # Safety
    ///
    /// See the [module documentation](self).
    pub unsafe fn contains(self: Pin<&Self>, link: NonNull<Link>) -> bool {
        if !self.is_anchored() {
            return false;
        }

        let sentinel = self.sentinel();
        let target = link.as_ptr().cast_const();
        let mut cur = self.link().next();

        while cur != sentinel {
            if cur == target {
                return true;
            }
            cur = (*cur).next();
        }

        false
    }

    /// Returns an iterator over the owners of every element, first to last.
    ///
    /// The iterator reads an element's successor before yielding it, so the
    /// consumer may unlink the element it was just given. If the element
    /// after it is unlinked instead, iteration ends there. Any other
    /// mutation of the list during iteration is undefined behavior.
    ///
    /// Iterating never writes to the head, so an unanchored head stays
    /// unanchored.
    ///
    /// # Safety
    ///
    /// See the [module documentation](self).
    #[inline]
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub unsafe fn iter<T>(self: Pin<&Self>, offset: usize) -> RawIter<'_, T> {
        check::debug_head(self);
        RawIter {
            sentinel: self.sentinel(),
            next: self.link().next(),
            offset,
            _marker: PhantomData,
        }
    }
}

// =============================================================================
// RawIter
// =============================================================================

/// Iterator over owner pointers, from [`Head::iter`].
pub struct RawIter<'h, T> {
    sentinel: *const Link,
    next: *const Link,
    offset: usize,
    _marker: PhantomData<(&'h Head, *const T)>,
}

impl<T> Iterator for RawIter<'_, T> {
    type Item = NonNull<T>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.next == self.sentinel {
            return None;
        }

        // Null: an unanchored head, or the prefetched successor was unlinked
        let link = NonNull::new(self.next.cast_mut())?;
        unsafe {
            self.next = link.as_ref().next();
            Some(owner_of(link, self.offset))
        }
    }
}

impl<T> FusedIterator for RawIter<'_, T> {}
