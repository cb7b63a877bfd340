//! The driving loop: pop the earliest event, advance the clock, resume that
//! actor's coroutine, and act on whatever it suspended with (`spec.md` §4.1,
//! §4.4). Mirrors the shape of `snow-rt`'s scheduler tick, minus its
//! cross-thread work-stealing -- everything here runs on one thread in
//! strict virtual-time order.

use std::cell::RefCell;
use std::rc::Rc;

use corosensei::CoroutineResult;
use log::trace;

use xmp_common::ActorId;

use crate::actor::{CoroutineHandle, Suspend};
use crate::core::SimCore;

pub struct Engine<T> {
    core: Rc<RefCell<SimCore<T>>>,
    actors: Vec<CoroutineHandle>,
}

impl<T: 'static> Engine<T> {
    pub fn new() -> Self {
        Engine {
            core: Rc::new(RefCell::new(SimCore::new())),
            actors: Vec::new(),
        }
    }

    pub fn core(&self) -> Rc<RefCell<SimCore<T>>> {
        Rc::clone(&self.core)
    }

    /// Register an actor body, spawning its coroutine and scheduling its
    /// first resumption at time zero. Returns the `ActorId` the body's
    /// `ActorCtx` will see.
    pub fn register_actor<F>(&mut self, body: F) -> ActorId
    where
        F: FnOnce(crate::actor::ActorCtx<'_, T>) + 'static,
    {
        let id = ActorId(self.actors.len() as u32);
        let handle = CoroutineHandle::new(self.core(), id, body);
        self.actors.push(handle);
        self.core.borrow_mut().schedule(0.0, id);
        id
    }

    /// Run the simulation until no actor has a pending event at or before
    /// `duration`.
    pub fn run(&mut self, duration: f64) {
        loop {
            let next_time = match self.core.borrow().peek_event_time() {
                Some(t) if t <= duration => t,
                _ => break,
            };

            let event = self.core.borrow_mut().pop_event().expect("peeked event must be poppable");
            self.core.borrow_mut().set_now(event.time);

            trace!("t={:.6} resuming {}", event.time, event.actor);

            let actor = &mut self.actors[event.actor.0 as usize];
            match actor.resume() {
                CoroutineResult::Yield(Suspend::Wait(dt)) => {
                    let resume_at = event.time + dt;
                    self.core.borrow_mut().schedule(resume_at, event.actor);
                }
                CoroutineResult::Yield(Suspend::ReadQueue(q)) => {
                    self.core.borrow_mut().register_wait(event.actor, &[q]);
                }
                CoroutineResult::Yield(Suspend::ReadAny(qs)) => {
                    self.core.borrow_mut().register_wait(event.actor, &qs);
                }
                CoroutineResult::Return(()) => {}
            }
        }
    }
}

impl<T: 'static> Default for Engine<T> {
    fn default() -> Self {
        Self::new()
    }
}
