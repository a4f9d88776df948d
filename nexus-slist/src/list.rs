//! Typed intrusive singly-linked list.
//!
//! [`SList`] binds a [`Head`] to one [`Adapter`], so every operation takes and
//! returns `&A::Owner` instead of link pointers and offsets. Passing a record
//! of another type, or a list bound to another link field, does not compile.
//! At runtime each operation is exactly the raw [`Head`] operation.

use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::pin::Pin;
use core::ptr::NonNull;

use crate::adapter::Adapter;
use crate::check::{self, Corruption};
use crate::link::Head;
use crate::raw::RawIter;

/// An intrusive singly-linked list of `A::Owner` records.
///
/// Elements are borrowed for `'a`: a record cannot be dropped or moved while
/// the list may still reach it. The list is self-referential once used, so
/// it is operated through `Pin<&SList>`.
///
/// Dropping the list detaches every remaining element.
///
/// # Example
///
/// ```
/// use core::pin::pin;
/// use nexus_slist::{slist_adapter, Link, SList};
///
/// struct Child {
///     name: &'static str,
///     link: Link,
/// }
///
/// slist_adapter!(Children = Child { link });
///
/// let c1 = Child { name: "c1", link: Link::new() };
/// let c2 = Child { name: "c2", link: Link::new() };
/// let c3 = Child { name: "c3", link: Link::new() };
///
/// let list = pin!(SList::<Children>::new());
/// let list = list.into_ref();
///
/// unsafe {
///     list.push_front(&c3);
///     list.push_front(&c1);
///     list.insert_after(&c1, &c2);
/// }
///
/// let names: Vec<_> = list.iter().map(|c| c.name).collect();
/// assert_eq!(names, ["c1", "c2", "c3"]);
///
/// assert!(list.remove(&c2));
/// assert_eq!(list.len(), 2);
/// ```
pub struct SList<'a, A: Adapter> {
    head: Head,
    _marker: PhantomData<&'a A::Owner>,
}

impl<A: Adapter> Default for SList<'_, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, A: Adapter> SList<'a, A> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: Head::new(),
            _marker: PhantomData,
        }
    }

    /// Returns the underlying untyped head.
    #[inline]
    pub fn raw(self: Pin<&Self>) -> Pin<&Head> {
        // Structural pinning: the head is never moved out of the list.
        unsafe { self.map_unchecked(|list| &list.head) }
    }

    /// Sets the list to empty.
    ///
    /// Elements still in the list are forgotten, not detached. Use
    /// [`clear`](Self::clear) to detach them.
    #[inline]
    pub fn init(self: Pin<&Self>) {
        self.raw().init();
    }

    /// Returns `true` if the list has no elements.
    #[inline]
    pub fn is_empty(self: Pin<&Self>) -> bool {
        self.raw().is_empty()
    }

    /// Returns the number of elements. O(n).
    pub fn len(self: Pin<&Self>) -> usize {
        self.iter().count()
    }

    /// Adds `owner` at the front of the list.
    ///
    /// # Safety
    ///
    /// The owner's link must not currently be a member of another list.
    /// Relinking a record that is already in this list corrupts it.
    #[inline]
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub unsafe fn push_front(self: Pin<&Self>, owner: &'a A::Owner) {
        self.raw().prepend(NonNull::from(A::link(owner)));
    }

    /// Adds `new` directly after `existing`.
    ///
    /// # Safety
    ///
    /// `existing` must be in this list, and `new` must not be in any list.
    #[inline]
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub unsafe fn insert_after(self: Pin<&Self>, existing: &A::Owner, new: &'a A::Owner) {
        self.raw()
            .insert_after(NonNull::from(A::link(existing)), NonNull::from(A::link(new)));
    }

    /// Removes `owner` from the list. O(n).
    ///
    /// Returns `false` if `owner` is not in this list.
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub fn remove(self: Pin<&Self>, owner: &A::Owner) -> bool {
        unsafe { self.raw().remove(NonNull::from(A::link(owner))) }
    }

    /// Returns `true` if `owner` is in this list. O(n).
    pub fn contains(self: Pin<&Self>, owner: &A::Owner) -> bool {
        unsafe { self.raw().contains(NonNull::from(A::link(owner))) }
    }

    /// Returns the first element, or `None` if empty.
    #[inline]
    pub fn first(self: Pin<&Self>) -> Option<&'a A::Owner> {
        unsafe {
            self.raw()
                .first::<A::Owner>(A::OFFSET)
                .map(|owner| owner.as_ref())
        }
    }

    /// Removes and returns the first element, or `None` if empty.
    #[inline]
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub fn pop_first(self: Pin<&Self>) -> Option<&'a A::Owner> {
        unsafe {
            self.raw()
                .pop_first::<A::Owner>(A::OFFSET)
                .map(|owner| owner.as_ref())
        }
    }

    /// Detaches every element, leaving the list empty.
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub fn clear(self: Pin<&Self>) {
        while self.pop_first().is_some() {}
    }

    /// Returns an iterator over the elements, first to last.
    ///
    /// The element just yielded may be removed during iteration. Removing
    /// the element after it (including through [`pop_first`](Self::pop_first)
    /// once the first element has been yielded) ends iteration there: the
    /// remaining elements are still in the list but are not visited.
    /// Linking new elements while iterating is undefined behavior.
    #[inline]
    #[cfg_attr(feature = "debug-check", track_caller)]
    pub fn iter(self: Pin<&Self>) -> Iter<'_, 'a, A> {
        Iter {
            raw: unsafe { self.raw().iter(A::OFFSET) },
            _marker: PhantomData,
        }
    }

    /// Validates the list structure, returning the number of elements.
    pub fn check(self: Pin<&Self>) -> Result<usize, Corruption> {
        check::check(self.raw(), None)
    }

    /// Validates the list structure, aborting the process on corruption.
    #[track_caller]
    pub fn check_or_abort(self: Pin<&Self>) -> usize {
        check::check_or_abort(self.raw())
    }
}

impl<A: Adapter> Drop for SList<'_, A> {
    fn drop(&mut self) {
        // Dropped in place, never moved again.
        let this = unsafe { Pin::new_unchecked(&*self) };
        this.clear();
    }
}

impl<A: Adapter> fmt::Debug for SList<'_, A>
where
    A::Owner: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Iteration only reads the head. An unanchored list stays
        // unanchored, and an anchored one was pinned by the call that
        // anchored it.
        let this = unsafe { Pin::new_unchecked(self) };
        f.debug_list().entries(this.iter()).finish()
    }
}

// =============================================================================
// Iter
// =============================================================================

/// Iterator over the elements of an [`SList`].
pub struct Iter<'s, 'a, A: Adapter> {
    raw: RawIter<'s, A::Owner>,
    _marker: PhantomData<&'a A::Owner>,
}

impl<'a, A: Adapter> Iterator for Iter<'_, 'a, A> {
    type Item = &'a A::Owner;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.raw.next().map(|owner| unsafe { owner.as_ref() })
    }
}

impl<A: Adapter> FusedIterator for Iter<'_, '_, A> {}
