//! Chain integrity checking.
//!
//! [`check`] walks a chain forward from its head and confirms that it returns
//! to the head without meeting a detached link or looping through a
//! sub-cycle. The walk uses Brent's cycle detection, so it terminates on any
//! chain shape and allocates nothing. Links carry no back-reference, so only
//! forward structure is verified.
//!
//! Two failure channels:
//!
//! - no abort location: the [`Corruption`] is returned
//! - abort location: the corruption is logged against that location and the
//!   process aborts
//!
//! With the `debug-check` feature every raw mutation runs the check in abort
//! mode, reporting the caller's location. Without it the internal hooks are
//! empty and cost nothing; the functions here are always available.

use core::fmt;
use core::panic::Location;
use core::pin::Pin;
#[cfg(feature = "debug-check")]
use core::ptr::NonNull;

use crate::link::{Head, Link};

/// Kind of structural fault found in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionKind {
    /// A link in the chain has no successor.
    Detached,
    /// The chain loops without returning to where the walk started.
    Cycle,
}

/// A chain failed validation.
///
/// Addresses are recorded as integers for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corruption {
    /// What was found.
    pub kind: CorruptionKind,
    /// Address of the link the walk started from.
    pub start: usize,
    /// Address of the link at which the fault was detected.
    pub node: usize,
    /// Links visited before the fault was detected.
    pub hops: usize,
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CorruptionKind::Detached => write!(
                f,
                "detached link {:#x} ({}) in chain of {:#x}",
                self.node, self.hops, self.start
            ),
            CorruptionKind::Cycle => write!(
                f,
                "cycle at link {:#x} ({}) never returns to {:#x}",
                self.node, self.hops, self.start
            ),
        }
    }
}

impl std::error::Error for Corruption {}

/// Validates the chain anchored at `head`.
///
/// Returns the number of elements. An unanchored head is an empty list.
///
/// If `abort` is given, corruption is fatal: it is logged with that location
/// and the process aborts. Otherwise the [`Corruption`] is returned.
///
/// # Example
///
/// ```
/// use core::pin::pin;
/// use nexus_slist::{check, Head};
///
/// let head = pin!(Head::new());
/// let head = head.into_ref();
///
/// assert_eq!(check(head, None), Ok(0));
/// head.init();
/// assert_eq!(check(head, None), Ok(0));
/// ```
pub fn check(head: Pin<&Head>, abort: Option<&Location<'_>>) -> Result<usize, Corruption> {
    if !head.is_anchored() {
        return Ok(0);
    }
    // Every link reachable from a head was put there by an unsafe raw
    // operation whose contract keeps it alive.
    unsafe { check_node(head.link(), abort) }
}

/// Validates the chain anchored at `head`, aborting on corruption.
///
/// The diagnostic names the caller's location. Returns the number of
/// elements.
#[track_caller]
pub fn check_or_abort(head: Pin<&Head>) -> usize {
    let location = Location::caller();
    match check(head, None) {
        Ok(len) => len,
        Err(corruption) => abort_with(location, &corruption),
    }
}

/// Validates the chain containing `start`.
///
/// Walks forward until `start` is reached again and returns the number of
/// other links passed, the head included. Corruption is handled as in
/// [`check`].
///
/// # Safety
///
/// Every link reachable from `start` must be alive.
pub unsafe fn check_node(
    start: &Link,
    abort: Option<&Location<'_>>,
) -> Result<usize, Corruption> {
    let start_ptr: *const Link = start;

    let mut prev = start_ptr;
    let mut hare = start.next();
    let mut tortoise = start_ptr;
    let mut power = 1usize;
    let mut lam = 1usize;
    let mut hops = 0usize;

    loop {
        if hare == start_ptr {
            return Ok(hops);
        }
        if hare.is_null() {
            return Err(corrupt(CorruptionKind::Detached, start_ptr, prev, hops, abort));
        }

        hops += 1;
        if hare == tortoise {
            return Err(corrupt(CorruptionKind::Cycle, start_ptr, hare, hops, abort));
        }
        if power == lam {
            tortoise = hare;
            power *= 2;
            lam = 0;
        }

        prev = hare;
        hare = (*hare).next();
        lam += 1;
    }
}

fn corrupt(
    kind: CorruptionKind,
    start: *const Link,
    node: *const Link,
    hops: usize,
    abort: Option<&Location<'_>>,
) -> Corruption {
    let corruption = Corruption {
        kind,
        start: start as usize,
        node: node as usize,
        hops,
    };

    match abort {
        Some(location) => abort_with(location, &corruption),
        None => {
            log::debug!("list check failed: {corruption}");
            corruption
        }
    }
}

fn abort_with(location: &Location<'_>, corruption: &Corruption) -> ! {
    log::error!("{location}: {corruption}");
    std::process::abort()
}

// =============================================================================
// Debug hooks
// =============================================================================

#[cfg(feature = "debug-check")]
#[track_caller]
pub(crate) fn debug_head(head: Pin<&Head>) {
    check_or_abort(head);
}

#[cfg(not(feature = "debug-check"))]
#[inline(always)]
pub(crate) fn debug_head(_head: Pin<&Head>) {}

/// Checks the list and that `link` is one of its members.
#[cfg(feature = "debug-check")]
#[track_caller]
pub(crate) fn debug_member(head: Pin<&Head>, link: NonNull<Link>) {
    let location = Location::caller();
    if let Err(corruption) = check(head, None) {
        abort_with(location, &corruption);
    }
    if !unsafe { head.contains(link) } {
        log::error!(
            "{location}: link {:p} is not a member of list {:p}",
            link,
            head.sentinel()
        );
        std::process::abort();
    }
}

#[cfg(not(feature = "debug-check"))]
#[inline(always)]
pub(crate) fn debug_member(_head: Pin<&Head>, _link: core::ptr::NonNull<Link>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::offset_of;
    use core::pin::pin;
    use core::ptr::{self, NonNull};

    struct Child {
        link: Link,
    }

    impl Child {
        fn new() -> Self {
            Self { link: Link::new() }
        }
    }

    const OFFSET: usize = offset_of!(Child, link);

    #[test]
    fn unanchored_and_empty_heads_pass() {
        let head = pin!(Head::new());
        let head = head.into_ref();

        assert_eq!(check(head, None), Ok(0));
        head.init();
        assert_eq!(check(head, None), Ok(0));
        assert_eq!(check_or_abort(head), 0);
    }

    #[test]
    fn counts_elements() {
        let children: Vec<Child> = (0..5).map(|_| Child::new()).collect();
        let head = pin!(Head::new());
        let head = head.into_ref();

        for (i, child) in children.iter().enumerate() {
            unsafe { head.prepend(NonNull::from(&child.link)) };
            assert_eq!(check(head, None), Ok(i + 1));
        }
        for i in (0..children.len()).rev() {
            unsafe { head.pop_first::<Child>(OFFSET) };
            assert_eq!(check(head, None), Ok(i));
        }
    }

    #[test]
    fn check_node_from_element() {
        let (c1, c2, c3) = (Child::new(), Child::new(), Child::new());
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe {
            head.prepend(NonNull::from(&c3.link));
            head.prepend(NonNull::from(&c2.link));
            head.prepend(NonNull::from(&c1.link));

            // Three other links, the head among them
            assert_eq!(check_node(&c1.link, None), Ok(3));
            assert_eq!(check_node(&c2.link, None), Ok(3));
            assert_eq!(check_node(&c3.link, None), Ok(3));
        }
    }

    #[test]
    fn check_node_on_detached_link() {
        let lone = Child::new();
        let err = unsafe { check_node(&lone.link, None) }.unwrap_err();
        assert_eq!(err.kind, CorruptionKind::Detached);
        assert_eq!(err.hops, 0);
        assert_eq!(err.node, &lone.link as *const Link as usize);
    }

    #[test]
    fn detects_detached_link_in_chain() {
        let (c1, c2, c3) = (Child::new(), Child::new(), Child::new());
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe {
            head.prepend(NonNull::from(&c3.link));
            head.prepend(NonNull::from(&c2.link));
            head.prepend(NonNull::from(&c1.link));
        }
        c2.link.set_next(ptr::null());

        let err = check(head, None).unwrap_err();
        assert_eq!(err.kind, CorruptionKind::Detached);
        assert_eq!(err.node, &c2.link as *const Link as usize);
        assert_eq!(err.start, head.sentinel() as usize);
        assert_eq!(err.hops, 2);
    }

    #[test]
    fn detects_sub_cycle() {
        let (c1, c2, c3) = (Child::new(), Child::new(), Child::new());
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe {
            head.prepend(NonNull::from(&c3.link));
            head.prepend(NonNull::from(&c2.link));
            head.prepend(NonNull::from(&c1.link));
        }
        c3.link.set_next(&c2.link);

        let err = check(head, None).unwrap_err();
        assert_eq!(err.kind, CorruptionKind::Cycle);
        assert!(err.to_string().starts_with("cycle at link"));

        // Repair and re-check
        c3.link.set_next(head.sentinel());
        assert_eq!(check(head, None), Ok(3));
    }

    #[test]
    fn detects_self_loop() {
        let c1 = Child::new();
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe { head.prepend(NonNull::from(&c1.link)) };
        c1.link.set_next(&c1.link);

        let err = check(head, None).unwrap_err();
        assert_eq!(err.kind, CorruptionKind::Cycle);
        assert_eq!(err.node, &c1.link as *const Link as usize);
    }

    #[test]
    fn check_does_not_mutate() {
        let (c1, c2) = (Child::new(), Child::new());
        let head = pin!(Head::new());
        let head = head.into_ref();

        assert_eq!(check(head, None), Ok(0));
        assert!(!head.is_anchored());

        unsafe {
            head.prepend(NonNull::from(&c2.link));
            head.prepend(NonNull::from(&c1.link));
        }
        let before = (head.link().next(), c1.link.next(), c2.link.next());
        for _ in 0..3 {
            assert_eq!(check(head, None), Ok(2));
        }
        assert_eq!(before, (head.link().next(), c1.link.next(), c2.link.next()));
    }

    #[test]
    fn corruption_display() {
        let corruption = Corruption {
            kind: CorruptionKind::Detached,
            start: 0x1000,
            node: 0x2000,
            hops: 4,
        };
        assert_eq!(
            corruption.to_string(),
            "detached link 0x2000 (4) in chain of 0x1000"
        );
    }

    // =========================================================================
    // Abort channel
    // =========================================================================
    //
    // Aborting tests run in a child process: the parent re-runs this test
    // binary filtered to one ignored test, with CHILD_ENV set so the test
    // body actually executes, and inspects how the child died.

    const CHILD_ENV: &str = "NEXUS_SLIST_ABORT_CHILD";

    struct StderrLogger;

    impl log::Log for StderrLogger {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            eprintln!("[{}] {}", record.level(), record.args());
        }

        fn flush(&self) {}
    }

    static LOGGER: StderrLogger = StderrLogger;

    /// Returns `true` in the child process, after installing the logger.
    fn in_child() -> bool {
        if std::env::var_os(CHILD_ENV).is_none() {
            return false;
        }
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
        true
    }

    /// Location passed as the abort site; identical in parent and child.
    fn abort_site() -> &'static Location<'static> {
        Location::caller()
    }

    /// Runs one ignored test of this module in a child process, asserts it
    /// aborted, and returns its stderr.
    fn run_aborting(name: &str) -> String {
        let module = module_path!()
            .split_once("::")
            .map_or(module_path!(), |(_, path)| path);
        let output = std::process::Command::new(std::env::current_exe().unwrap())
            .args([&format!("{module}::{name}"), "--exact", "--ignored"])
            .args(["--nocapture", "--test-threads=1"])
            .env(CHILD_ENV, "1")
            .output()
            .unwrap();

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        assert!(!output.status.success(), "{name} did not abort:\n{stderr}");
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            assert_eq!(output.status.signal(), Some(6), "{name}:\n{stderr}");
        }
        stderr
    }

    #[test]
    #[ignore]
    fn check_with_location_aborts() {
        if !in_child() {
            return;
        }
        let (c1, c2) = (Child::new(), Child::new());
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe {
            head.prepend(NonNull::from(&c2.link));
            head.prepend(NonNull::from(&c1.link));
        }
        c1.link.set_next(ptr::null());

        let _ = check(head, Some(abort_site()));
        panic!("check returned on a corrupt chain");
    }

    #[test]
    fn corrupt_check_with_location_aborts_and_logs_site() {
        let stderr = run_aborting("check_with_location_aborts");
        assert!(stderr.contains("[ERROR]"), "{stderr}");
        assert!(stderr.contains(&abort_site().to_string()), "{stderr}");
        assert!(stderr.contains("detached link"), "{stderr}");
    }

    #[test]
    #[ignore]
    fn check_node_with_location_aborts() {
        if !in_child() {
            return;
        }
        let (c1, c2) = (Child::new(), Child::new());
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe {
            head.prepend(NonNull::from(&c2.link));
            head.prepend(NonNull::from(&c1.link));
        }
        c2.link.set_next(&c1.link);

        // From the head: c1 and c2 loop without coming back
        let _ = unsafe { check_node(head.link(), Some(abort_site())) };
        panic!("check_node returned on a corrupt chain");
    }

    #[test]
    fn corrupt_check_node_with_location_aborts_and_logs_site() {
        let stderr = run_aborting("check_node_with_location_aborts");
        assert!(stderr.contains(&abort_site().to_string()), "{stderr}");
        assert!(stderr.contains("cycle at link"), "{stderr}");
    }

    #[test]
    #[ignore]
    fn check_or_abort_aborts() {
        if !in_child() {
            return;
        }
        let c1 = Child::new();
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe { head.prepend(NonNull::from(&c1.link)) };
        c1.link.set_next(&c1.link);

        check_or_abort(head);
        panic!("check_or_abort returned on a corrupt chain");
    }

    #[test]
    fn corrupt_check_or_abort_logs_caller() {
        let stderr = run_aborting("check_or_abort_aborts");
        assert!(stderr.contains(file!()), "{stderr}");
        assert!(stderr.contains("cycle at link"), "{stderr}");
    }

    // =========================================================================
    // Debug hooks
    // =========================================================================

    #[cfg(feature = "debug-check")]
    #[test]
    fn hooks_accept_documented_operations() {
        let (c1, c2, c3) = (Child::new(), Child::new(), Child::new());
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe {
            assert_eq!(head.iter::<Child>(OFFSET).count(), 0);
            head.prepend(NonNull::from(&c3.link));
            head.prepend(NonNull::from(&c1.link));
            head.insert_after(NonNull::from(&c1.link), NonNull::from(&c2.link));
            assert_eq!(head.iter::<Child>(OFFSET).count(), 3);
            assert!(head.remove(NonNull::from(&c2.link)));
            assert!(!head.remove(NonNull::from(&c2.link)));
            assert!(head.pop_first::<Child>(OFFSET).is_some());
            assert!(head.pop_first::<Child>(OFFSET).is_some());
            assert!(head.pop_first::<Child>(OFFSET).is_none());
        }
        debug_head(head);
        assert_eq!(check(head, None), Ok(0));
    }

    #[cfg(feature = "debug-check")]
    #[test]
    #[ignore]
    fn insert_after_non_member() {
        if !in_child() {
            return;
        }
        let (c1, stranger, c2) = (Child::new(), Child::new(), Child::new());
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe {
            head.prepend(NonNull::from(&c1.link));
            head.insert_after(NonNull::from(&stranger.link), NonNull::from(&c2.link));
        }
        panic!("insert_after accepted a non-member");
    }

    #[cfg(feature = "debug-check")]
    #[test]
    fn insert_after_non_member_aborts() {
        let stderr = run_aborting("insert_after_non_member");
        assert!(stderr.contains("is not a member of list"), "{stderr}");
        assert!(stderr.contains(file!()), "{stderr}");
    }

    #[cfg(feature = "debug-check")]
    #[test]
    #[ignore]
    fn prepend_onto_corrupt_chain() {
        if !in_child() {
            return;
        }
        let (c1, c2, c3) = (Child::new(), Child::new(), Child::new());
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe {
            head.prepend(NonNull::from(&c2.link));
            head.prepend(NonNull::from(&c1.link));
        }
        c1.link.set_next(ptr::null());

        unsafe { head.prepend(NonNull::from(&c3.link)) };
        panic!("prepend accepted a corrupt chain");
    }

    #[cfg(feature = "debug-check")]
    #[test]
    fn mutation_on_corrupt_chain_aborts() {
        let stderr = run_aborting("prepend_onto_corrupt_chain");
        assert!(stderr.contains("detached link"), "{stderr}");
        assert!(stderr.contains(file!()), "{stderr}");
    }

    #[cfg(not(feature = "debug-check"))]
    #[test]
    fn debug_hooks_are_noops() {
        let (c1, c2) = (Child::new(), Child::new());
        let head = pin!(Head::new());
        let head = head.into_ref();

        unsafe { head.prepend(NonNull::from(&c1.link)) };
        c1.link.set_next(ptr::null());

        // Corrupt, yet neither hook aborts or touches the chain
        debug_head(head);
        debug_member(head, NonNull::from(&c2.link));
        assert!(c1.link.next().is_null());
        assert!(check(head, None).is_err());
    }
}
