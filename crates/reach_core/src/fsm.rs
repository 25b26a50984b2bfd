//! Generic State Machine Base
//!
//! A keyed registry of states plus a pointer to the active one. The base only
//! runs the active state's hooks; deciding *when* to switch belongs to the
//! concrete machine layered on top.
//!
//! ```text
//! enter()  ─► current.enter_state
//! tick()   ─► current.update_state
//! transition_to(k): k == current → nothing
//!                   k unknown    → Err (before any hook runs)
//!                   otherwise    → current.exit_state, states[k].enter_state
//! ```

use std::fmt::Debug;
use std::hash::Hash;

use fxhash::FxHashMap;

use crate::error::{InteractionError, Result};
use crate::query::TriggerPhase;

/// Behavior of one phase.
///
/// `C` is the shared context, `W` the world handed to updates, `T` the
/// payload of trigger callbacks.
pub trait BaseState<K, C, W: ?Sized, T: ?Sized> {
    fn key(&self) -> K;

    fn enter_state(&mut self, ctx: &mut C);

    fn exit_state(&mut self, ctx: &mut C);

    fn update_state(&mut self, ctx: &mut C, world: &W, dt: f32);

    fn next_state(&self, ctx: &mut C) -> K;

    fn on_trigger_enter(&mut self, _ctx: &mut C, _other: &T) {}

    fn on_trigger_stay(&mut self, _ctx: &mut C, _other: &T) {}

    fn on_trigger_exit(&mut self, _ctx: &mut C, _other: &T) {}
}

pub type BoxedState<K, C, W, T> = Box<dyn BaseState<K, C, W, T>>;

pub struct StateManager<K, C, W: ?Sized, T: ?Sized> {
    states: FxHashMap<K, BoxedState<K, C, W, T>>,
    current: K,
    context: C,
}

impl<K, C, W, T> StateManager<K, C, W, T>
where
    K: Copy + Eq + Hash + Debug,
    W: ?Sized,
    T: ?Sized,
{
    /// Registers `states` and points at `initial`.
    ///
    /// Duplicate keys and an unregistered `initial` are rejected here so that
    /// nothing can tick against a half-built registry.
    pub fn new(context: C, states: Vec<BoxedState<K, C, W, T>>, initial: K) -> Result<Self> {
        let mut registry: FxHashMap<K, BoxedState<K, C, W, T>> = FxHashMap::default();
        for state in states {
            let key = state.key();
            if registry.insert(key, state).is_some() {
                return Err(InteractionError::DuplicateState(format!("{:?}", key)));
            }
        }
        if !registry.contains_key(&initial) {
            return Err(InteractionError::UnknownState(format!("{:?}", initial)));
        }
        Ok(Self { states: registry, current: initial, context })
    }

    pub fn current_key(&self) -> K {
        self.current
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn contains(&self, key: K) -> bool {
        self.states.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, key: K) -> Option<&dyn BaseState<K, C, W, T>> {
        self.states.get(&key).map(|s| s.as_ref())
    }

    fn missing(key: K) -> InteractionError {
        InteractionError::UnknownState(format!("{:?}", key))
    }

    pub fn enter(&mut self) -> Result<()> {
        let state = self.states.get_mut(&self.current).ok_or_else(|| Self::missing(self.current))?;
        state.enter_state(&mut self.context);
        Ok(())
    }

    pub fn tick(&mut self, world: &W, dt: f32) -> Result<()> {
        let state = self.states.get_mut(&self.current).ok_or_else(|| Self::missing(self.current))?;
        state.update_state(&mut self.context, world, dt);
        Ok(())
    }

    /// Ask the active state where it wants to go.
    pub fn next_key(&mut self) -> Result<K> {
        let state = self.states.get(&self.current).ok_or_else(|| Self::missing(self.current))?;
        Ok(state.next_state(&mut self.context))
    }

    /// Returns `true` when the active state changed.
    pub fn transition_to(&mut self, next: K) -> Result<bool> {
        if next == self.current {
            return Ok(false);
        }
        if !self.states.contains_key(&next) {
            return Err(Self::missing(next));
        }

        let previous = self.current;
        if let Some(old) = self.states.get_mut(&previous) {
            old.exit_state(&mut self.context);
        }
        if let Some(new) = self.states.get_mut(&next) {
            new.enter_state(&mut self.context);
        }
        self.current = next;
        Ok(true)
    }

    /// Deliver a trigger callback to the active state only.
    pub fn forward_trigger(&mut self, phase: TriggerPhase, other: &T) -> Result<()> {
        let state = self.states.get_mut(&self.current).ok_or_else(|| Self::missing(self.current))?;
        match phase {
            TriggerPhase::Enter => state.on_trigger_enter(&mut self.context, other),
            TriggerPhase::Stay => state.on_trigger_stay(&mut self.context, other),
            TriggerPhase::Exit => state.on_trigger_exit(&mut self.context, other),
        }
        Ok(())
    }
}
