//! Per-conversation concurrency gate.
//!
//! Only user-initiated requests (recursion level 0) take the gate. Models
//! marked as long-processing get exclusive use of a running conversation: a
//! new request is rejected, or carries a control command that asks the
//! running loop to stop or force-clears the flags. Other models are admitted
//! alongside a running request and the running flag stays set until the
//! last holder leaves.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pchat::{ControlCommand, GateDecision, GateRejection, SessionLockRegistry};
//! use pcommon::ConversationKey;
//!
//! let gate = Arc::new(SessionLockRegistry::new());
//! let key = ConversationKey::new("user-1", "chat");
//!
//! let GateDecision::Admitted(guard) = gate.try_acquire(&key, 0, true, None) else {
//!     panic!("first request is admitted");
//! };
//! assert!(gate.is_running(&key));
//!
//! let decision = gate.try_acquire(&key, 0, true, Some(ControlCommand::Stop));
//! assert!(matches!(decision, GateDecision::Rejected(GateRejection::StopRequested)));
//! assert!(gate.check_stop(&key));
//!
//! drop(guard);
//! assert!(!gate.is_running(&key));
//! assert!(!gate.check_stop(&key));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pcommon::ConversationKey;
use ptooling::StopSignal;

/// Control text recognized while a long-processing conversation is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Stop,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// The stop flag was set; the running loop ends after its current round.
    StopRequested,
    /// Both flags were force-cleared.
    Cleared,
    Busy,
}

#[derive(Debug)]
pub enum GateDecision {
    Admitted(SessionGuard),
    /// Recursive rounds never touch the gate.
    Bypass,
    Rejected(GateRejection),
}

#[derive(Debug, Clone, Copy)]
struct Running {
    holders: usize,
    generation: u64,
}

#[derive(Debug, Default)]
struct LockState {
    running: HashMap<ConversationKey, Running>,
    stopping: HashSet<ConversationKey>,
    next_generation: u64,
}

impl LockState {
    fn inspect(
        &mut self,
        key: &ConversationKey,
        long_processing: bool,
        command: Option<ControlCommand>,
    ) -> Option<GateRejection> {
        if !long_processing || !self.running.contains_key(key) {
            return None;
        }

        Some(match command {
            Some(ControlCommand::Stop) => {
                self.stopping.insert(key.clone());
                GateRejection::StopRequested
            }
            Some(ControlCommand::Clear) => {
                self.running.remove(key);
                self.stopping.remove(key);
                GateRejection::Cleared
            }
            None => GateRejection::Busy,
        })
    }
}

#[derive(Debug, Default)]
pub struct SessionLockRegistry {
    state: Mutex<LockState>,
}

impl SessionLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(
        self: &Arc<Self>,
        key: &ConversationKey,
        recursion_level: u32,
        long_processing: bool,
        command: Option<ControlCommand>,
    ) -> GateDecision {
        if recursion_level > 0 {
            return GateDecision::Bypass;
        }

        let mut state = self.lock();
        if let Some(rejection) = state.inspect(key, long_processing, command) {
            return GateDecision::Rejected(rejection);
        }

        let fresh = state.next_generation;
        let entry = state.running.entry(key.clone()).or_insert(Running {
            holders: 0,
            generation: fresh,
        });
        entry.holders += 1;
        let generation = entry.generation;
        if generation == fresh {
            state.next_generation += 1;
        }

        GateDecision::Admitted(SessionGuard {
            registry: Arc::clone(self),
            key: key.clone(),
            generation,
        })
    }

    /// Applies the same control-command handling as [`try_acquire`] without
    /// marking the conversation as running.
    ///
    /// [`try_acquire`]: SessionLockRegistry::try_acquire
    pub fn check(
        &self,
        key: &ConversationKey,
        recursion_level: u32,
        long_processing: bool,
        command: Option<ControlCommand>,
    ) -> Result<(), GateRejection> {
        if recursion_level > 0 {
            return Ok(());
        }
        match self.lock().inspect(key, long_processing, command) {
            Some(rejection) => Err(rejection),
            None => Ok(()),
        }
    }

    /// Force-clears both flags for a level-0 request. Deeper levels are
    /// no-ops.
    pub fn release(&self, key: &ConversationKey, recursion_level: u32) {
        if recursion_level > 0 {
            return;
        }

        let mut state = self.lock();
        state.running.remove(key);
        state.stopping.remove(key);
    }

    pub fn request_stop(&self, key: &ConversationKey) {
        self.lock().stopping.insert(key.clone());
    }

    pub fn check_stop(&self, key: &ConversationKey) -> bool {
        self.lock().stopping.contains(key)
    }

    pub fn is_running(&self, key: &ConversationKey) -> bool {
        self.lock().running.contains_key(key)
    }

    pub fn running_count(&self) -> usize {
        self.lock().running.len()
    }

    /// A [`StopSignal`] bound to one conversation, for the tool executor.
    pub fn stop_signal(self: &Arc<Self>, key: &ConversationKey) -> Arc<dyn StopSignal> {
        Arc::new(KeyStopSignal {
            registry: Arc::clone(self),
            key: key.clone(),
        })
    }

    // A guard from before a CLEAR carries a stale generation and leaves the
    // newer entry alone.
    fn leave(&self, key: &ConversationKey, generation: u64) {
        let mut state = self.lock();
        let Some(entry) = state.running.get_mut(key) else {
            return;
        };
        if entry.generation != generation {
            return;
        }
        entry.holders = entry.holders.saturating_sub(1);
        if entry.holders == 0 {
            state.running.remove(key);
            state.stopping.remove(key);
        }
    }

    // The sets hold no invariants spanning a panic, so a poisoned lock is
    // still usable.
    fn lock(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the gate when dropped.
#[derive(Debug)]
pub struct SessionGuard {
    registry: Arc<SessionLockRegistry>,
    key: ConversationKey,
    generation: u64,
}

impl SessionGuard {
    pub fn key(&self) -> &ConversationKey {
        &self.key
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.leave(&self.key, self.generation);
    }
}

struct KeyStopSignal {
    registry: Arc<SessionLockRegistry>,
    key: ConversationKey,
}

impl StopSignal for KeyStopSignal {
    fn is_stop_requested(&self) -> bool {
        self.registry.check_stop(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ConversationKey {
        ConversationKey::new("user-1", "chat")
    }

    #[test]
    fn recursive_rounds_bypass_a_held_gate() {
        let gate = Arc::new(SessionLockRegistry::new());
        let _guard = gate.try_acquire(&key(), 0, false, None);

        assert!(matches!(gate.try_acquire(&key(), 1, false, None), GateDecision::Bypass));
        gate.release(&key(), 1);
        assert!(gate.is_running(&key()));
    }

    #[test]
    fn running_conversation_admits_models_without_long_processing() {
        let gate = Arc::new(SessionLockRegistry::new());
        let GateDecision::Admitted(first) = gate.try_acquire(&key(), 0, false, None) else {
            panic!("first request is admitted");
        };

        let GateDecision::Admitted(second) =
            gate.try_acquire(&key(), 0, false, Some(ControlCommand::Stop))
        else {
            panic!("non-long model is admitted while the key is running");
        };
        assert!(!gate.check_stop(&key()));
        assert_eq!(gate.running_count(), 1);

        drop(first);
        assert!(gate.is_running(&key()));
        drop(second);
        assert!(!gate.is_running(&key()));
    }

    #[test]
    fn long_processing_model_is_busy_while_key_runs() {
        let gate = Arc::new(SessionLockRegistry::new());
        let _guard = gate.try_acquire(&key(), 0, false, None);

        assert!(matches!(
            gate.try_acquire(&key(), 0, true, None),
            GateDecision::Rejected(GateRejection::Busy)
        ));
        assert_eq!(gate.check(&key(), 0, true, None), Err(GateRejection::Busy));
        assert_eq!(gate.check(&key(), 0, false, None), Ok(()));
        assert_eq!(gate.check(&key(), 1, true, None), Ok(()));
    }

    #[test]
    fn check_never_marks_the_key_running() {
        let gate = Arc::new(SessionLockRegistry::new());

        assert_eq!(gate.check(&key(), 0, true, None), Ok(()));
        assert!(!gate.is_running(&key()));
    }

    #[test]
    fn clear_command_force_releases_long_processing_conversation() {
        let gate = Arc::new(SessionLockRegistry::new());
        let guard = gate.try_acquire(&key(), 0, true, None);
        gate.request_stop(&key());

        assert!(matches!(
            gate.try_acquire(&key(), 0, true, Some(ControlCommand::Clear)),
            GateDecision::Rejected(GateRejection::Cleared)
        ));
        assert!(!gate.is_running(&key()));
        assert!(!gate.check_stop(&key()));

        let GateDecision::Admitted(fresh) = gate.try_acquire(&key(), 0, true, None) else {
            panic!("cleared key is admitted again");
        };
        drop(guard);
        assert!(gate.is_running(&key()));
        drop(fresh);
        assert!(!gate.is_running(&key()));
    }

    #[test]
    fn different_keys_do_not_contend() {
        let gate = Arc::new(SessionLockRegistry::new());
        let _first = gate.try_acquire(&key(), 0, false, None);
        let other = key().with_prefix("translate");

        assert!(matches!(
            gate.try_acquire(&other, 0, false, None),
            GateDecision::Admitted(_)
        ));
    }

    #[test]
    fn stop_signal_reads_live_flag() {
        let gate = Arc::new(SessionLockRegistry::new());
        let signal = gate.stop_signal(&key());
        assert!(!signal.is_stop_requested());

        gate.request_stop(&key());
        assert!(signal.is_stop_requested());
    }
}
