//! Link and head primitives.
//!
//! A [`Link`] lives inside an owner record and holds one forward reference.
//! A [`Head`] anchors a chain. It is itself a link that the chain returns to:
//!
//! ```text
//! empty:      Head ─┐
//!              ▲    │
//!              └────┘
//!
//! [c1, c2]:   Head ──► c1.link ──► c2.link ─┐
//!              ▲                            │
//!              └────────────────────────────┘
//! ```

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomPinned;
use core::pin::Pin;
use core::ptr::{self, NonNull};

/// A forward link embedded in an owner record.
///
/// The successor is null only while the link is detached: never linked, or
/// popped/removed from its list. A link inside a chain always points at
/// another link, the last one pointing back at its [`Head`].
///
/// Links use interior mutability so a list can relink records it only holds
/// shared references to.
#[repr(transparent)]
pub struct Link {
    next: Cell<*const Link>,
}

impl Link {
    /// Creates a detached link.
    #[inline]
    pub const fn new() -> Self {
        Self {
            next: Cell::new(ptr::null()),
        }
    }

    /// Returns `true` if this link has a successor.
    ///
    /// Popping or removing an element resets its link, so this is `false`
    /// for records that were never linked or have since been unlinked.
    #[inline]
    pub fn is_linked(&self) -> bool {
        !self.next.get().is_null()
    }

    #[inline]
    pub(crate) fn next(&self) -> *const Link {
        self.next.get()
    }

    #[inline]
    pub(crate) fn set_next(&self, next: *const Link) {
        self.next.set(next);
    }

    #[inline]
    pub(crate) fn detach(&self) {
        self.next.set(ptr::null());
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").field("next", &self.next.get()).finish()
    }
}

/// The anchor of a chain.
///
/// Once used, a head refers to its own address, so every operation takes
/// `Pin<&Head>`. Pin it on the stack with [`core::pin::pin!`], on the heap
/// with [`Box::pin`], or keep it in a `thread_local!`.
///
/// # Example
///
/// ```
/// use core::pin::pin;
/// use nexus_slist::Head;
///
/// let head = pin!(Head::new());
/// let head = head.into_ref();
///
/// head.init();
/// assert!(head.is_empty());
/// ```
pub struct Head {
    link: Link,
    _pin: PhantomPinned,
}

impl Head {
    /// Creates an empty head.
    ///
    /// The head stays unanchored until it is pinned and first used. An
    /// unanchored head behaves exactly like an empty one, which lets `new`
    /// serve as a `const` initializer for statics and thread-locals.
    #[inline]
    pub const fn new() -> Self {
        Self {
            link: Link::new(),
            _pin: PhantomPinned,
        }
    }

    /// Sets the head to the empty list.
    ///
    /// Elements still in the chain are forgotten, not detached.
    #[inline]
    pub fn init(self: Pin<&Self>) {
        let link = self.link();
        link.set_next(link);
    }

    /// Returns `true` if the list has no elements.
    #[inline]
    pub fn is_empty(self: Pin<&Self>) -> bool {
        let next = self.link().next();
        next.is_null() || next == self.sentinel()
    }

    /// Address of the head's own link. Walks stop when they reach it.
    #[inline]
    pub(crate) fn sentinel(self: Pin<&Self>) -> *const Link {
        self.link()
    }

    /// The head's link, without anchoring.
    #[inline]
    pub(crate) fn link(self: Pin<&Self>) -> &Link {
        &self.get_ref().link
    }

    /// The head's link, anchoring an unanchored head first.
    #[inline]
    pub(crate) fn anchored(self: Pin<&Self>) -> &Link {
        let link = self.link();
        if link.next().is_null() {
            link.set_next(link);
        }
        link
    }

    #[inline]
    pub(crate) fn is_anchored(self: Pin<&Self>) -> bool {
        self.link().is_linked()
    }

    /// The first element's link, or `None` when the list is empty.
    #[inline]
    pub(crate) fn first_link(self: Pin<&Self>) -> Option<NonNull<Link>> {
        if self.is_empty() {
            None
        } else {
            NonNull::new(self.link().next().cast_mut())
        }
    }
}

impl Default for Head {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Head")
            .field("first", &self.link.next.get())
            .finish()
    }
}
