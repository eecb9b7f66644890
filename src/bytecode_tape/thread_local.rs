use std::cell::Cell;

use super::BytecodeTape;

thread_local! {
    static BTAPE: Cell<*mut BytecodeTape> = const { Cell::new(std::ptr::null_mut()) };
}

/// Access the active bytecode tape for the current thread.
/// Panics if no tape is active.
#[inline]
pub fn with_active_btape<R>(f: impl FnOnce(&mut BytecodeTape) -> R) -> R {
    BTAPE.with(|cell| {
        let ptr = cell.get();
        assert!(
            !ptr.is_null(),
            "No active bytecode tape. Use record_multi() to record a function."
        );
        // SAFETY: BtapeGuard guarantees validity for the duration of the
        // recording scope, single-threaded via thread-local.
        let tape = unsafe { &mut *ptr };
        f(tape)
    })
}

/// RAII guard that sets a bytecode tape as the thread-local active tape.
///
/// The previously active tape (if any) is restored on drop, so recordings nest.
pub struct BtapeGuard {
    prev: *mut BytecodeTape,
}

impl BtapeGuard {
    /// Activate `tape` as the thread-local bytecode tape.
    pub fn new(tape: &mut BytecodeTape) -> Self {
        let prev = BTAPE.with(|cell| {
            let prev = cell.get();
            cell.set(tape as *mut BytecodeTape);
            prev
        });
        BtapeGuard { prev }
    }
}

impl Drop for BtapeGuard {
    fn drop(&mut self) {
        BTAPE.with(|cell| {
            cell.set(self.prev);
        });
    }
}
