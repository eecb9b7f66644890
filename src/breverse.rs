//! Bytecode-tape reverse-mode AD variable.
//!
//! [`BReverse`] records opcodes to a [`BytecodeTape`](crate::bytecode_tape::BytecodeTape)
//! while a formula runs, so the tape can be re-evaluated at different inputs
//! without re-recording.

use std::fmt::{self, Display};

use crate::bytecode_tape::{BytecodeTape, CONSTANT};

/// Bytecode-tape reverse-mode AD variable.
///
/// 12 bytes, `Copy`. Operations record opcodes to the thread-local
/// [`BytecodeTape`]. Values built only from constants stay off the tape.
#[derive(Clone, Copy, Debug)]
pub struct BReverse {
    pub(crate) value: f64,
    pub(crate) index: u32,
}

impl BReverse {
    /// Create a constant (not tracked on tape).
    #[inline]
    pub fn constant(value: f64) -> Self {
        BReverse {
            value,
            index: CONSTANT,
        }
    }

    /// Create from a tape allocation (internal use).
    #[inline]
    pub fn from_tape(value: f64, index: u32) -> Self {
        BReverse { value, index }
    }

    /// Get the tape index.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Whether this value is untracked.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.index == CONSTANT
    }

    /// Tape index of this value, promoting a constant to a `Const` entry.
    #[inline]
    pub(crate) fn ensure_on_tape(&self, tape: &mut BytecodeTape) -> u32 {
        if self.index == CONSTANT {
            tape.push_const(self.value)
        } else {
            self.index
        }
    }
}

impl Display for BReverse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Default for BReverse {
    fn default() -> Self {
        BReverse::constant(0.0)
    }
}
