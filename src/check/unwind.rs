//! Panic containment for simulated bodies and rule plugins.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;

thread_local! {
    static QUIET: Cell<bool> = const { Cell::new(false) };
}

/// Wraps the installed panic hook once. Panics raised while a thread is inside
/// [`catch_quietly`] go to the debug log instead of stderr.
static QUIET_HOOK: Lazy<()> = Lazy::new(|| {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if QUIET.with(Cell::get) {
            tracing::debug!("contained panic: {}", info);
        } else {
            previous(info);
        }
    }));
});

/// Run `f`, catching a panic without printing the default panic banner.
pub fn catch_quietly<R>(f: impl FnOnce() -> R) -> std::thread::Result<R> {
    Lazy::force(&QUIET_HOOK);
    let outer = QUIET.with(|q| q.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    QUIET.with(|q| q.set(outer));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catches_and_restores() {
        assert_eq!(catch_quietly(|| 3).unwrap(), 3);
        assert!(catch_quietly(|| -> i32 { panic!("boom") }).is_err());
        assert!(!QUIET.with(Cell::get));
    }

    #[test]
    fn test_nested_calls_keep_outer_state() {
        let inner = catch_quietly(|| {
            let caught = catch_quietly(|| -> u8 { panic!("inner") }).is_err();
            (caught, QUIET.with(Cell::get))
        })
        .unwrap();
        assert_eq!(inner, (true, true));
        assert!(!QUIET.with(Cell::get));
    }
}
