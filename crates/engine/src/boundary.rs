use serde::{Deserialize, Serialize};

use crate::player::CommandSeq;
use crate::session::TrimRange;

/// What happens when playback reaches the end of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndAction {
    Loop,
    Stop,
}

/// Boundary handling shared by the trim preview and the playback stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryPolicy {
    pub at_end: EndAction,
}

impl BoundaryPolicy {
    pub const LOOP: Self = Self {
        at_end: EndAction::Loop,
    };
    pub const STOP: Self = Self {
        at_end: EndAction::Stop,
    };
    /// The trim preview always jumps back to the start and offers no stop.
    pub const TRIM_PREVIEW: Self = Self::LOOP;

    pub fn from_looping(looping: bool) -> Self {
        if looping { Self::LOOP } else { Self::STOP }
    }
}

/// Reaction to one reported position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryAction {
    Accept,
    SeekToStart,
    Pause,
}

/// Decides how to react to a reported position while bounded to `range`.
///
/// The end boundary is checked before the start boundary so a corrupted
/// range (`start >= end`) still resolves to the end policy instead of
/// bouncing between seeks. Positions are only corrected while playing.
///
/// # Example
/// ```
/// use engine::boundary::{BoundaryAction, BoundaryPolicy, boundary_action};
/// use engine::TrimRange;
///
/// let range = TrimRange { start_ms: 2_000, end_ms: 5_000 };
/// assert_eq!(
///     boundary_action(5_000, range, true, BoundaryPolicy::STOP),
///     BoundaryAction::Pause
/// );
/// assert_eq!(
///     boundary_action(1_000, range, false, BoundaryPolicy::LOOP),
///     BoundaryAction::Accept
/// );
/// ```
pub fn boundary_action(
    position_ms: u64,
    range: TrimRange,
    playing: bool,
    policy: BoundaryPolicy,
) -> BoundaryAction {
    if !playing {
        return BoundaryAction::Accept;
    }

    if position_ms >= range.end_ms {
        return match policy.at_end {
            EndAction::Loop => BoundaryAction::SeekToStart,
            EndAction::Stop => BoundaryAction::Pause,
        };
    }

    if position_ms < range.start_ms {
        return BoundaryAction::SeekToStart;
    }

    BoundaryAction::Accept
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingSeek {
    target_ms: u64,
    seq: CommandSeq,
    suppressed: u32,
}

/// Tracks the most recent unconfirmed boundary seek.
///
/// While a seek is pending, notifications that would trigger the same seek
/// again are absorbed. The seek is re-issued once the budget of absorbed
/// notifications runs out.
#[derive(Debug, Clone)]
pub(crate) struct SeekGuard {
    pending: Option<PendingSeek>,
    budget: u32,
    tolerance_ms: u64,
}

impl SeekGuard {
    pub(crate) fn new(budget: u32, tolerance_ms: u64) -> Self {
        Self {
            pending: None,
            budget: budget.max(1),
            tolerance_ms,
        }
    }

    /// Returns false when an equivalent seek is already in flight.
    pub(crate) fn should_issue(&mut self, target_ms: u64) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return true;
        };
        if pending.target_ms != target_ms {
            return true;
        }

        pending.suppressed += 1;
        pending.suppressed >= self.budget
    }

    pub(crate) fn issued(&mut self, target_ms: u64, seq: CommandSeq) {
        self.pending = Some(PendingSeek {
            target_ms,
            seq,
            suppressed: 0,
        });
    }

    /// Clears the pending seek once a position confirms it or shows the
    /// player is back inside the range.
    pub(crate) fn observe(&mut self, position_ms: u64, range: TrimRange) {
        let Some(pending) = self.pending else {
            return;
        };
        if self.confirms(position_ms, pending.target_ms) || range.contains(position_ms) {
            self.pending = None;
        }
    }

    /// Returns true when `position_ms` is close enough to `target_ms`.
    pub(crate) fn confirms(&self, position_ms: u64, target_ms: u64) -> bool {
        position_ms.abs_diff(target_ms) <= self.tolerance_ms
    }

    /// Drops the pending seek if `seq` is the one that failed.
    pub(crate) fn failed(&mut self, seq: CommandSeq) -> bool {
        if self.pending.is_some_and(|pending| pending.seq == seq) {
            self.pending = None;
            return true;
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn pending_target(&self) -> Option<u64> {
        self.pending.map(|pending| pending.target_ms)
    }

    pub(crate) fn clear(&mut self) {
        self.pending = None;
    }
}
