//! Thread-safe memoized lazy value with at-most-once evaluation.
//!
//! Descriptor fields (generic declarations, member lists, annotation sources)
//! are expensive to compute and mutually recursive through the pool, so they
//! are wrapped in [`Memo`] cells that evaluate on first access and publish
//! exactly one result to all observers.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type Producer<T, E> = Box<dyn FnOnce() -> Result<T, E> + Send>;

enum State<T, E> {
    /// Not yet forced; holds the production function.
    Pending(Producer<T, E>),
    /// Forced; holds the cached outcome. Failures are cached too: a class
    /// record that failed to decode is corrupt, not transient, and every
    /// caller receives the same error.
    Ready(Result<Arc<T>, E>),
    /// The producer panicked mid-evaluation.
    Poisoned,
}

/// A thread-safe lazy value.
///
/// The production function runs at most once, under the cell's internal
/// mutex: the first thread to call [`get`](Memo::get) evaluates it while
/// competing threads block, then all observe the same cached result. This is
/// a hard guarantee, not a benign race — production functions may have side
/// effects (registering a module in the pool) that must not run twice.
///
/// Clones share state: forcing any clone forces them all.
pub struct Memo<T, E> {
    state: Arc<Mutex<State<T, E>>>,
}

impl<T, E> Clone for Memo<T, E> {
    fn clone(&self) -> Self {
        Memo {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, E: Clone> Memo<T, E> {
    /// Create a cell that will run `producer` on first access.
    pub fn new<F>(producer: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        Memo {
            state: Arc::new(Mutex::new(State::Pending(Box::new(producer)))),
        }
    }

    /// Create an already-resolved cell (no producer indirection).
    ///
    /// Used for terminal cases such as the unresolved sentinel's empty
    /// member list.
    pub fn resolved(value: T) -> Self {
        Memo {
            state: Arc::new(Mutex::new(State::Ready(Ok(Arc::new(value))))),
        }
    }

    /// Create an already-failed cell.
    pub fn failed(err: E) -> Self {
        Memo {
            state: Arc::new(Mutex::new(State::Ready(Err(err)))),
        }
    }

    /// Force the cell, returning the cached value or cached error.
    ///
    /// # Panics
    ///
    /// Panics if a previous evaluation panicked (poisoned cell).
    pub fn get(&self) -> Result<Arc<T>, E> {
        let mut state = self.state.lock();
        match &*state {
            State::Ready(outcome) => outcome.clone(),
            State::Poisoned => panic!("memoized cell poisoned by a panicking producer"),
            State::Pending(_) => {
                // Take the producer out, leaving a poison marker in case it
                // panics. The lock is held across evaluation: that is the
                // at-most-once guarantee (competing threads block here).
                let producer = match std::mem::replace(&mut *state, State::Poisoned) {
                    State::Pending(producer) => producer,
                    _ => unreachable!("state checked above"),
                };
                let outcome = producer().map(Arc::new);
                *state = State::Ready(outcome.clone());
                outcome
            }
        }
    }

    /// Whether the cell has been forced (successfully or not).
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.state.lock(), State::Ready(_))
    }

    /// Derive a new cell that forces this one and applies `f` to the result.
    ///
    /// The source is not forced until the derived cell is.
    pub fn map<U, F>(&self, f: F) -> Memo<U, E>
    where
        F: FnOnce(Arc<T>) -> U + Send + 'static,
        T: Send + Sync + 'static,
        E: Send + 'static,
    {
        let source = self.clone();
        Memo::new(move || source.get().map(f))
    }
}

impl<T, E> fmt::Debug for Memo<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.state.try_lock().as_deref() {
            Some(State::Pending(_)) => "Memo(<pending>)",
            Some(State::Ready(Ok(_))) => "Memo(<resolved>)",
            Some(State::Ready(Err(_))) => "Memo(<failed>)",
            Some(State::Poisoned) => "Memo(<poisoned>)",
            None => "Memo(<evaluating>)",
        };
        f.write_str(label)
    }
}
