//! Delayed block respawn
//!
//! Destroyed blocks come back after a fixed delay, but only if the match
//! is still in a state where that makes sense. Timers are never cancelled;
//! each one reconciles against the current state when it fires:
//!
//! - Running: the block comes back if it is still pending for this timer.
//! - Paused: if the block is still pending for this timer, every pending
//!   block moves to the needs-display queue, which is flushed in one batch
//!   when Running is entered again.
//! - New / GameOver: nothing, the blocks were already restored.

use std::collections::BTreeMap;

use super::state::{BlockId, MatchState};

/// A scheduled respawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RespawnTimer {
    pub block: BlockId,
    pub deadline: f64,
    /// Destruction this timer belongs to
    pub ticket: u64,
}

/// What a fired timer asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespawnOutcome {
    /// Put this block back now
    Reinsert(BlockId),
    /// Pending blocks were moved to the needs-display queue
    Queued(usize),
    /// Stale or meaningless in the current state
    Noop,
}

#[derive(Debug, Clone)]
pub struct RespawnScheduler {
    delay: f64,
    /// Destroyed blocks waiting to come back, with their current ticket
    pending: BTreeMap<BlockId, u64>,
    /// Blocks to show in one batch when play resumes
    queued: Vec<BlockId>,
    timers: Vec<RespawnTimer>,
    next_ticket: u64,
}

impl RespawnScheduler {
    pub fn new(delay: f64) -> Self {
        Self {
            delay,
            pending: BTreeMap::new(),
            queued: Vec::new(),
            timers: Vec::new(),
            next_ticket: 1,
        }
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Hand over a freshly destroyed block
    pub fn schedule(&mut self, block: BlockId, now: f64) -> RespawnTimer {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        self.pending.insert(block, ticket);
        let timer = RespawnTimer {
            block,
            deadline: now + self.delay,
            ticket,
        };
        self.timers.push(timer);
        timer
    }

    pub fn is_pending(&self, block: BlockId) -> bool {
        self.pending.contains_key(&block)
    }

    pub fn pending(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.pending.keys().copied()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn queued(&self) -> &[BlockId] {
        &self.queued
    }

    /// Timers that have not fired yet
    pub fn timers_in_flight(&self) -> usize {
        self.timers.len()
    }

    pub fn timers(&self) -> &[RespawnTimer] {
        &self.timers
    }

    /// Remove and return the timers due at `now`, earliest first
    pub fn take_due(&mut self, now: f64) -> Vec<RespawnTimer> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|t| t.deadline <= now);
        self.timers = rest;
        due.sort_by(|a, b| {
            a.deadline
                .total_cmp(&b.deadline)
                .then(a.ticket.cmp(&b.ticket))
        });
        due
    }

    /// Reconcile a fired timer against the match state
    pub fn fire(&mut self, timer: &RespawnTimer, state: MatchState) -> RespawnOutcome {
        match state {
            MatchState::Running => {
                if self.pending.get(&timer.block) == Some(&timer.ticket) {
                    self.pending.remove(&timer.block);
                    RespawnOutcome::Reinsert(timer.block)
                } else {
                    log::trace!("Respawn timer for {:?} is stale", timer.block);
                    RespawnOutcome::Noop
                }
            }
            MatchState::Paused => {
                if self.pending.get(&timer.block) != Some(&timer.ticket) {
                    log::trace!("Respawn timer for {:?} is stale", timer.block);
                    return RespawnOutcome::Noop;
                }
                let moved = self.pending.len();
                self.queued.extend(self.pending.keys().copied());
                self.pending.clear();
                RespawnOutcome::Queued(moved)
            }
            MatchState::New | MatchState::GameOver => RespawnOutcome::Noop,
        }
    }

    /// Blocks to show now that play has resumed
    pub fn take_queued(&mut self) -> Vec<BlockId> {
        std::mem::take(&mut self.queued)
    }

    /// Forget every pending and queued block and return them all.
    ///
    /// Timers still in flight become no-ops when they fire.
    pub fn drain_all(&mut self) -> Vec<BlockId> {
        let mut blocks = std::mem::take(&mut self.queued);
        blocks.extend(self.pending.keys().copied());
        self.pending.clear();
        blocks.sort();
        blocks.dedup();
        blocks
    }
}
