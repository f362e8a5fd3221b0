//! Per-evaluation scratch memory.
//!
//! Every allocation made while one evaluation runs (the operand stack,
//! strings handed back by the host, built-in string results) goes into a
//! [`Bump`] owned by the compiled expression. The bump is reset in one step
//! when the evaluation ends, after the final value has been copied into the
//! result slot. The slot is the only thing that outlives the call, and it is
//! overwritten by the next one.

use bumpalo::Bump;

use super::value::Value;

/// Arena statistics for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScratchStats {
    /// Bytes handed out during the most recent evaluation.
    pub last_used: usize,
    /// Bytes still handed out now; zero between evaluations.
    pub in_use: usize,
}

#[derive(Debug, Clone, Copy, Default)]
enum Kept {
    #[default]
    None,
    Num(f64),
    /// The text lives in `ResultSlot::text`.
    Str,
}

/// Owned copy of the last evaluation's result.
#[derive(Debug, Default)]
pub struct ResultSlot {
    kept: Kept,
    text: String,
}

impl ResultSlot {
    /// Copy `value` in, replacing the previous result. The text buffer's
    /// capacity is reused.
    pub fn store(&mut self, value: Value<'_>) {
        self.kept = match value {
            Value::None => Kept::None,
            Value::Num(n) => Kept::Num(n),
            Value::Str(s) => {
                self.text.clear();
                self.text.push_str(s);
                Kept::Str
            }
        };
    }

    pub fn get(&self) -> Value<'_> {
        match self.kept {
            Kept::None => Value::None,
            Kept::Num(n) => Value::Num(n),
            Kept::Str => Value::Str(&self.text),
        }
    }
}

/// The arena plus the retained result.
#[derive(Debug, Default)]
pub struct Scratch {
    bump: Bump,
    slot: ResultSlot,
    stats: ScratchStats,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an evaluation: hand out the (empty) arena for allocation and the
    /// slot that will receive the result.
    pub fn begin(&mut self) -> (&Bump, &mut ResultSlot) {
        self.bump.reset();
        (&self.bump, &mut self.slot)
    }

    /// Finish an evaluation: release everything allocated since
    /// [`begin`](Self::begin). Only the result slot survives.
    pub fn sweep(&mut self) {
        self.stats.last_used = used_bytes(&mut self.bump);
        self.bump.reset();
        self.stats.in_use = used_bytes(&mut self.bump);
    }

    /// The most recent result.
    pub fn result(&self) -> Value<'_> {
        self.slot.get()
    }

    pub fn stats(&self) -> ScratchStats {
        self.stats
    }
}

fn used_bytes(bump: &mut Bump) -> usize {
    bump.iter_allocated_chunks().map(<[_]>::len).sum()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_keeps_an_owned_copy() {
        let mut slot = ResultSlot::default();
        {
            let transient = String::from("computed");
            slot.store(Value::Str(&transient));
        }
        assert_eq!(slot.get(), Value::Str("computed"));
        slot.store(Value::Num(3.0));
        assert_eq!(slot.get(), Value::Num(3.0));
        slot.store(Value::None);
        assert_eq!(slot.get(), Value::None);
    }

    #[test]
    fn sweep_releases_everything_but_the_slot() {
        let mut scratch = Scratch::new();
        {
            let (bump, slot) = scratch.begin();
            let s = bump.alloc_str("a fairly long transient string");
            slot.store(Value::Str(s));
        }
        scratch.sweep();
        let stats = scratch.stats();
        assert!(stats.last_used >= "a fairly long transient string".len());
        assert_eq!(stats.in_use, 0);
        assert_eq!(scratch.result(), Value::Str("a fairly long transient string"));
    }

    #[test]
    fn begin_starts_empty() {
        let mut scratch = Scratch::new();
        {
            let (bump, _) = scratch.begin();
            bump.alloc_slice_fill_copy(64, 0u8);
        }
        // No sweep: a following begin still starts from an empty arena.
        {
            let (bump, _) = scratch.begin();
            bump.alloc(1u8);
        }
        scratch.sweep();
        assert!(scratch.stats().last_used < 64);
    }
}
