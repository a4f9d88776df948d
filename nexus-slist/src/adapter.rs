//! Binding a list to one owner type and one link field.
//!
//! An [`Adapter`] is a marker type that is never instantiated. It names the
//! owner record and which of its [`Link`] fields a list threads through, so
//! [`SList`](crate::SList) can convert between links and owners without the
//! caller passing an offset. Owners with several links get one adapter per
//! link and can sit in several lists at once.
//!
//! ```
//! use nexus_slist::{slist_adapter, Adapter, Link};
//!
//! pub struct Order {
//!     id: u64,
//!     by_price: Link,
//!     by_time: Link,
//! }
//!
//! slist_adapter!(pub PriceQueue = Order { by_price });
//! slist_adapter!(pub TimeQueue = Order { by_time });
//!
//! assert_eq!(PriceQueue::OFFSET, core::mem::offset_of!(Order, by_price));
//! assert_ne!(PriceQueue::OFFSET, TimeQueue::OFFSET);
//! assert_eq!(core::mem::size_of::<PriceQueue>(), 0);
//! ```

use crate::link::Link;

/// Associates an owner record type with one of its [`Link`] fields.
///
/// Prefer [`slist_adapter!`](crate::slist_adapter) to a hand-written impl.
///
/// # Safety
///
/// `OFFSET` must be the byte offset within `Owner` of the field that `link`
/// returns.
pub unsafe trait Adapter {
    /// The record type that embeds the link.
    type Owner;

    /// Byte offset of the link field within `Owner`.
    const OFFSET: usize;

    /// Returns the owner's link field.
    fn link(owner: &Self::Owner) -> &Link;
}

/// Declares an [`Adapter`] marker for one link field of an owner type.
///
/// `slist_adapter!(Name = Owner { field })` defines an uninhabited
/// `enum Name {}` and implements [`Adapter`] for it. Visibility and
/// attributes go before the name. The marker exposes `Owner` in its
/// [`Adapter`] impl, so it can be no more visible than the owner type.
///
/// The field must be a [`Link`]:
///
/// ```compile_fail
/// use nexus_slist::{slist_adapter, Link};
///
/// struct Child {
///     name: &'static str,
///     link: Link,
/// }
///
/// slist_adapter!(Names = Child { name });
/// ```
///
/// and a list only accepts its own owner type:
///
/// ```compile_fail
/// use core::pin::pin;
/// use nexus_slist::{slist_adapter, Link, SList};
///
/// struct Child { link: Link }
/// struct Parent { link: Link }
///
/// slist_adapter!(Children = Child { link });
///
/// let parent = Parent { link: Link::new() };
/// let list = pin!(SList::<Children>::new());
/// unsafe { list.into_ref().push_front(&parent) };
/// ```
#[macro_export]
macro_rules! slist_adapter {
    ($(#[$attr:meta])* $vis:vis $name:ident = $owner:ty { $field:ident }) => {
        $(#[$attr])*
        $vis enum $name {}

        unsafe impl $crate::Adapter for $name {
            type Owner = $owner;

            const OFFSET: usize = ::core::mem::offset_of!($owner, $field);

            #[inline]
            fn link(owner: &$owner) -> &$crate::Link {
                &owner.$field
            }
        }
    };
}
