//! Actor bodies run as stackful coroutines, suspending at `wait`/`read_*`
//! calls instead of returning control through an explicit state machine
//! (`spec.md` §4.3-4.4). Grounded on `snow-rt`'s `CoroutineHandle` wrapper
//! around `corosensei::Coroutine`, simplified in one respect: the teacher
//! stashes its `Yielder` in a thread-local because its actor bodies are
//! `extern "C"` entry points with no room for an extra parameter; ours are
//! plain closures, so the `Yielder` is passed straight into `ActorCtx`.

use std::cell::RefCell;
use std::rc::Rc;

use corosensei::stack::DefaultStack;
use corosensei::{Coroutine, CoroutineResult, Yielder};
use log::error;

use xmp_common::{ActorId, QueueId, SimError, SimErrorKind};

use crate::core::SimCore;

/// Matches the stack size `snow-rt` allocates per scheduled process.
const DEFAULT_STACK_SIZE: usize = 64 * 1024;

fn fatal(err: SimErrorKind) -> ! {
    let e = SimError::new(err);
    error!("{e}");
    panic!("{e}");
}

/// What an actor coroutine is blocked on when it yields control back to the
/// engine loop.
#[derive(Debug, Clone)]
pub enum Suspend {
    /// Resume unconditionally after `dt` virtual-time units.
    Wait(f64),
    /// Resume once an item is available on a single queue.
    ReadQueue(QueueId),
    /// Resume once an item is available on any of these queues, in the
    /// order given (`ReadInQueues`' priority scan).
    ReadAny(Vec<QueueId>),
}

/// The handle an actor body closure uses to interact with the simulated
/// world: read the clock, wait, and read or write queues.
pub struct ActorCtx<'y, T> {
    yielder: &'y Yielder<(), Suspend>,
    core: Rc<RefCell<SimCore<T>>>,
    id: ActorId,
}

impl<'y, T> ActorCtx<'y, T> {
    pub fn new(yielder: &'y Yielder<(), Suspend>, core: Rc<RefCell<SimCore<T>>>, id: ActorId) -> Self {
        ActorCtx { yielder, core, id }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn now(&self) -> f64 {
        self.core.borrow().now()
    }

    /// Suspend for `dt` virtual-time units. `dt` must be non-negative.
    pub fn wait(&self, dt: f64) {
        if dt < 0.0 {
            fatal(SimErrorKind::TopologyMalformed {
                reason: format!("{}: Wait({dt}) requested a negative duration", self.id),
            });
        }
        self.yielder.suspend(Suspend::Wait(dt));
    }

    /// Block until `q` yields an item, retrying the dequeue each time the
    /// engine resumes this actor.
    pub fn read_queue(&self, q: QueueId) -> T {
        loop {
            if let Some(item) = self.core.borrow_mut().try_pop(q) {
                return item;
            }
            self.yielder.suspend(Suspend::ReadQueue(q));
        }
    }

    /// Block until any queue in `qs` (checked in order) yields an item.
    /// Returns the item and the index into `qs` it came from.
    pub fn read_any(&self, qs: &[QueueId]) -> (T, usize) {
        loop {
            if let Some(result) = self.core.borrow_mut().try_pop_any(qs) {
                return result;
            }
            self.yielder.suspend(Suspend::ReadAny(qs.to_vec()));
        }
    }

    pub fn write_queue(&self, q: QueueId, item: T) {
        self.core.borrow_mut().push_and_wake(q, item);
    }

    pub fn queue_len(&self, q: QueueId) -> usize {
        self.core.borrow().queue_len(q)
    }
}

/// A non-generic handle to a running actor coroutine. The domain request
/// type `T` is erased: it lives only inside the closure captured by
/// `Coroutine::new`, never in this type's own signature, so `Engine<T>` can
/// hold a plain `Vec<CoroutineHandle>` regardless of `T`.
pub struct CoroutineHandle {
    coroutine: Coroutine<(), Suspend, (), DefaultStack>,
}

impl CoroutineHandle {
    /// Spawn a new actor coroutine running `body`, which receives an
    /// `ActorCtx` bound to `core`/`id` once the coroutine is first resumed.
    pub fn new<T, F>(core: Rc<RefCell<SimCore<T>>>, id: ActorId, body: F) -> Self
    where
        T: 'static,
        F: FnOnce(ActorCtx<'_, T>) + 'static,
    {
        let stack = DefaultStack::new(DEFAULT_STACK_SIZE).expect("failed to allocate coroutine stack");
        let coroutine = Coroutine::with_stack(stack, move |yielder, ()| {
            let ctx = ActorCtx::new(yielder, core, id);
            body(ctx);
        });
        CoroutineHandle { coroutine }
    }

    pub fn resume(&mut self) -> CoroutineResult<Suspend, ()> {
        self.coroutine.resume(())
    }

    pub fn done(&self) -> bool {
        self.coroutine.done()
    }
}

impl std::fmt::Debug for CoroutineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoroutineHandle").field("done", &self.done()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;

    /// A negative `Wait(dt)` is fatal regardless of build profile -- this
    /// must not be compiled out in release (`spec.md` §4.3, §7).
    #[test]
    #[should_panic(expected = "negative duration")]
    fn wait_with_negative_duration_is_fatal() {
        let mut engine: Engine<()> = Engine::new();
        engine.register_actor(|ctx| ctx.wait(-1.0));
        engine.run(10.0);
    }

    #[test]
    fn wait_with_zero_duration_is_allowed() {
        let mut engine: Engine<()> = Engine::new();
        engine.register_actor(|ctx| ctx.wait(0.0));
        engine.run(10.0);
    }
}
