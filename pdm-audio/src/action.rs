//! Timed-action storage: inline-context callbacks and the scheduler FIFO.
//!
//! A [`Callback`] is a deferred zero-argument invocation whose captured
//! context lives *inside* the queue slot — a tiny vtable (invoke + drop)
//! over a fixed-size word-aligned buffer, so scheduling never allocates.
//!
//! The [`ActionQueue`] is a fixed-capacity ring buffer with separate
//! monotonically increasing in/out cursors, masked for indexing. It is
//! strict FIFO: actions are examined and fired in insertion order, never
//! reordered by target time. All access happens from the single
//! sample-emission context, so no atomics are involved.

use core::fmt;
use core::mem::{self, MaybeUninit};

use crate::constants::{ACTION_QUEUE_LEN, CALLBACK_CONTEXT_WORDS};

/// Inline storage for a callback's captured context.
type Context = [usize; CALLBACK_CONTEXT_WORDS];

/// A deferred zero-argument invocation with inline captured context.
///
/// Built from any `FnOnce() + Send` closure whose captures fit the inline
/// buffer ([`CALLBACK_CONTEXT_WORDS`] machine words, machine-word aligned).
/// Oversized or over-aligned captures are rejected at compile time.
///
/// Invoking consumes the callback. Dropping an uninvoked callback runs the
/// destructors of its captured state.
pub struct Callback {
    /// Reads the closure out of `context` and calls it. After this runs,
    /// `context` no longer holds a live value.
    call: unsafe fn(*mut Context),
    /// Drops the closure in place without calling it.
    drop: unsafe fn(*mut Context),
    context: MaybeUninit<Context>,
}

// SAFETY: `new()` only accepts `F: Send`, and the raw fn pointers carry no
// state of their own, so moving a Callback between contexts moves exactly
// the captured closure it holds.
unsafe impl Send for Callback {}

impl Callback {
    /// Wrap a closure for deferred invocation.
    ///
    /// The closure is moved into the callback's inline buffer. A `const`
    /// block verifies at compile time that the captures fit
    /// [`CALLBACK_CONTEXT_WORDS`] machine words and need no more than
    /// machine-word alignment.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send,
    {
        const {
            assert!(
                mem::size_of::<F>() <= mem::size_of::<Context>(),
                "callback captures exceed the inline context buffer"
            );
            assert!(
                mem::align_of::<F>() <= mem::align_of::<usize>(),
                "callback captures need more than machine-word alignment"
            );
        }

        unsafe fn call_impl<F: FnOnce()>(context: *mut Context) {
            // SAFETY: the caller guarantees `context` holds a live `F`
            // written by `new()` and never touches it again after this read.
            let f = unsafe { context.cast::<F>().read() };
            f();
        }

        unsafe fn drop_impl<F>(context: *mut Context) {
            // SAFETY: the caller guarantees `context` holds a live `F`.
            unsafe { context.cast::<F>().drop_in_place() }
        }

        let mut context = MaybeUninit::<Context>::uninit();
        // SAFETY: the const assertions above guarantee `F` fits the buffer
        // and is suitably aligned.
        unsafe { context.as_mut_ptr().cast::<F>().write(f) };

        Callback {
            call: call_impl::<F>,
            drop: drop_impl::<F>,
            context,
        }
    }

    /// Invoke the stored closure, consuming the callback.
    pub fn invoke(mut self) {
        let call = self.call;
        // SAFETY: `context` was initialized in `new()` and `self` is
        // consumed here, so the closure is read out exactly once. `forget`
        // below keeps `Drop` from running `drop_in_place` on the dead slot.
        unsafe { call(self.context.as_mut_ptr()) };
        mem::forget(self);
    }
}

impl Drop for Callback {
    fn drop(&mut self) {
        // Only reached when the callback was never invoked; the closure is
        // still live in `context`.
        unsafe { (self.drop)(self.context.as_mut_ptr()) }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback { .. }")
    }
}

/// A pending timed action: fire `callback` once the sample clock reaches
/// or passes `due`.
#[derive(Debug)]
pub struct Action {
    /// Target sample count. Compared to the clock with wrapping signed
    /// difference, so clock wraparound does not disturb ordering.
    pub due: i32,
    pub callback: Callback,
}

/// Fixed-capacity FIFO of pending actions.
///
/// The in/out cursors increase monotonically and wrap with `u32`
/// arithmetic; indexing masks them to the power-of-two capacity. Pending
/// count is `fifo_in - fifo_out`, never more than [`ACTION_QUEUE_LEN`].
///
/// When full, [`push()`](Self::push) rejects the *new* action and hands it
/// back — a full queue means the caller schedules faster than actions are
/// consumed, and dropping the newest bounds memory at the cost of one
/// missed event.
pub struct ActionQueue {
    slots: [Option<Action>; ACTION_QUEUE_LEN],
    /// Enqueue cursor. Only ever incremented.
    fifo_in: u32,
    /// Dequeue cursor. Only ever incremented.
    fifo_out: u32,
}

const FIFO_MASK: u32 = ACTION_QUEUE_LEN as u32 - 1;

impl ActionQueue {
    /// Create a new empty queue.
    pub const fn new() -> Self {
        assert!(ACTION_QUEUE_LEN.is_power_of_two());

        const EMPTY: Option<Action> = None;
        ActionQueue {
            slots: [EMPTY; ACTION_QUEUE_LEN],
            fifo_in: 0,
            fifo_out: 0,
        }
    }

    /// Number of pending actions.
    pub fn len(&self) -> u32 {
        self.fifo_in.wrapping_sub(self.fifo_out)
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.fifo_in == self.fifo_out
    }

    /// Check if the queue is full.
    pub fn is_full(&self) -> bool {
        self.len() >= ACTION_QUEUE_LEN as u32
    }

    /// Append an action behind the tail.
    ///
    /// Returns `Err(action)` if the queue is full, returning ownership to
    /// the caller.
    pub fn push(&mut self, action: Action) -> Result<(), Action> {
        if self.is_full() {
            return Err(action);
        }
        self.slots[(self.fifo_in & FIFO_MASK) as usize] = Some(action);
        self.fifo_in = self.fifo_in.wrapping_add(1);
        Ok(())
    }

    /// Target sample count of the head action, if any.
    pub fn head_due(&self) -> Option<i32> {
        if self.is_empty() {
            return None;
        }
        self.slots[(self.fifo_out & FIFO_MASK) as usize]
            .as_ref()
            .map(|action| action.due)
    }

    /// Remove and return the head action, reclaiming its slot.
    pub fn pop(&mut self) -> Option<Action> {
        if self.is_empty() {
            return None;
        }
        let action = self.slots[(self.fifo_out & FIFO_MASK) as usize].take();
        self.fifo_out = self.fifo_out.wrapping_add(1);
        action
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}
