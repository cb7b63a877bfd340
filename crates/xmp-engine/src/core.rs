//! The engine's shared state: the virtual clock, the event heap, and the
//! queue arena (`spec.md` §4). One `SimCore<T>` is shared (via `Rc<RefCell<_>>`)
//! by every actor coroutine and by the driving `Engine<T>` loop -- the model
//! is single-threaded and cooperative, so `Rc`/`RefCell` need no `Send`/`Sync`
//! bound the teacher's M:N `snow-rt` scheduler has to carry.

use std::collections::HashMap;

use log::error;
use xmp_common::{ActorId, QueueId, SimError, SimErrorKind};

use crate::clock::EventHeap;
use crate::queue::Queue;

fn fatal(err: SimErrorKind) -> ! {
    let e = SimError::new(err);
    error!("{e}");
    panic!("{e}");
}

pub struct SimCore<T> {
    clock: f64,
    heap: EventHeap,
    queues: Vec<Queue<T>>,
    /// Queues an actor is currently registered as a waiter on, so a wakeup
    /// on one queue can deregister the actor from every other queue it was
    /// simultaneously blocked on (`ReadInQueues` semantics).
    registrations: HashMap<ActorId, Vec<QueueId>>,
}

impl<T> Default for SimCore<T> {
    fn default() -> Self {
        SimCore {
            clock: 0.0,
            heap: EventHeap::new(),
            queues: Vec::new(),
            registrations: HashMap::new(),
        }
    }
}

impl<T> SimCore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.clock
    }

    pub fn set_now(&mut self, t: f64) {
        if t < self.clock {
            fatal(SimErrorKind::TopologyMalformed {
                reason: format!("virtual clock must not move backwards (was {}, got {t})", self.clock),
            });
        }
        self.clock = t;
    }

    pub fn peek_event_time(&self) -> Option<f64> {
        self.heap.peek_time()
    }

    pub fn pop_event(&mut self) -> Option<crate::clock::Event> {
        self.heap.pop()
    }

    pub fn schedule(&mut self, time: f64, actor: ActorId) {
        self.heap.schedule(time, actor);
    }

    /// Allocate a fresh queue, returning its id.
    pub fn add_queue(&mut self) -> QueueId {
        self.queues.push(Queue::new());
        QueueId((self.queues.len() - 1) as u32)
    }

    pub fn queue_len(&self, q: QueueId) -> usize {
        self.queues[q.0 as usize].len()
    }

    fn queue_mut(&mut self, q: QueueId) -> &mut Queue<T> {
        &mut self.queues[q.0 as usize]
    }

    pub fn try_pop(&mut self, q: QueueId) -> Option<T> {
        self.queue_mut(q).pop()
    }

    /// Scan `qs` in order, returning the first non-empty queue's item along
    /// with that queue's index into `qs` (`ReadInQueues`' priority-order
    /// scan, `spec.md` §4.3).
    pub fn try_pop_any(&mut self, qs: &[QueueId]) -> Option<(T, usize)> {
        for (i, &q) in qs.iter().enumerate() {
            if let Some(item) = self.try_pop(q) {
                return Some((item, i));
            }
        }
        None
    }

    /// Push `item` onto `q` and, if some actor is waiting on it, wake the
    /// earliest-registered one at the current clock time.
    pub fn push_and_wake(&mut self, q: QueueId, item: T) {
        self.queue_mut(q).push(item);
        if let Some(actor) = self.queue_mut(q).take_waiter() {
            self.wake_and_clear(actor);
        }
    }

    /// Register `actor` as blocked on every queue in `qs` simultaneously.
    pub fn register_wait(&mut self, actor: ActorId, qs: &[QueueId]) {
        for &q in qs {
            self.queue_mut(q).register_waiter(actor);
        }
        self.registrations.insert(actor, qs.to_vec());
    }

    /// Deregister `actor` from every queue it was waiting on and schedule
    /// its resumption at the current clock time.
    pub fn wake_and_clear(&mut self, actor: ActorId) {
        if let Some(qs) = self.registrations.remove(&actor) {
            for q in qs {
                self.queue_mut(q).remove_waiter(actor);
            }
        }
        let now = self.clock;
        self.schedule(now, actor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_wake_wakes_registered_waiter() {
        let mut core: SimCore<i32> = SimCore::new();
        let q = core.add_queue();
        core.register_wait(ActorId(0), &[q]);
        core.push_and_wake(q, 42);
        let ev = core.pop_event().unwrap();
        assert_eq!(ev.actor, ActorId(0));
        assert_eq!(ev.time, 0.0);
    }

    #[test]
    fn read_any_clears_all_registrations_on_wake() {
        let mut core: SimCore<i32> = SimCore::new();
        let qa = core.add_queue();
        let qb = core.add_queue();
        core.register_wait(ActorId(1), &[qa, qb]);
        core.push_and_wake(qa, 7);
        // the waiter on qb must have been cleared too
        assert!(core.queue_mut(qb).take_waiter().is_none());
    }

    /// The clock must never move backwards, regardless of build profile
    /// (`spec.md` §5, §7) -- this must not be compiled out in release.
    #[test]
    #[should_panic(expected = "must not move backwards")]
    fn set_now_rejects_clock_regression() {
        let mut core: SimCore<i32> = SimCore::new();
        core.set_now(5.0);
        core.set_now(3.0);
    }

    #[test]
    fn try_pop_any_scans_in_order() {
        let mut core: SimCore<i32> = SimCore::new();
        let qa = core.add_queue();
        let qb = core.add_queue();
        core.queue_mut(qb).push(99);
        let (item, idx) = core.try_pop_any(&[qa, qb]).unwrap();
        assert_eq!(item, 99);
        assert_eq!(idx, 1);
    }
}
