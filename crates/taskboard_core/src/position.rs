//! Gapped order keys for lists and tasks.
//!
//! # Responsibility
//! - Compute the position of an appended or moved entity among its siblings.
//! - Renumber the whole sibling scope when the gap next to the anchor is
//!   exhausted.
//!
//! # Invariants
//! - Input sequences are ordered ascending by position.
//! - Output never persists a tie: either the candidate lies strictly between
//!   its neighbours or the scope is renumbered to `k * interval`.
//! - The allocator never writes; callers persist `Placement` inside their own
//!   transaction.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::ops::{Add, Sub};

/// Numeric domain usable as an order key.
pub trait Position: Copy + PartialOrd + Debug + Add<Output = Self> + Sub<Output = Self> {
    const ZERO: Self;

    /// `floor((low + high) / 2)` in this domain.
    fn floor_midpoint(low: Self, high: Self) -> Self;

    /// Position of the zero-based `index`-th slot after a full renumber.
    fn nth_slot(interval: Self, index: usize) -> Self;
}

impl Position for i64 {
    const ZERO: Self = 0;

    fn floor_midpoint(low: Self, high: Self) -> Self {
        low + (high - low).div_euclid(2)
    }

    fn nth_slot(interval: Self, index: usize) -> Self {
        interval * (index as i64 + 1)
    }
}

impl Position for f64 {
    const ZERO: Self = 0.0;

    fn floor_midpoint(low: Self, high: Self) -> Self {
        ((low + high) / 2.0).floor()
    }

    fn nth_slot(interval: Self, index: usize) -> Self {
        interval * (index as f64 + 1.0)
    }
}

/// One sibling as seen by the allocator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot<K, P> {
    pub key: K,
    pub position: P,
}

impl<K, P> Slot<K, P> {
    pub fn new(key: K, position: P) -> Self {
        Self { key, position }
    }
}

/// Result of an insert-after computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement<K, P> {
    /// New position of the moving entity.
    pub position: P,
    /// Other siblings whose position changed during a renumber.
    pub renumbered: Vec<Slot<K, P>>,
    /// Whether the whole scope was renumbered.
    pub rebalanced: bool,
}

impl<K, P> Placement<K, P> {
    fn direct(position: P) -> Self {
        Self {
            position,
            renumbered: Vec::new(),
            rebalanced: false,
        }
    }
}

/// Invalid insert-after request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError<K> {
    /// The anchor is the moving entity itself.
    SelfAfter(K),
    /// The anchor is not part of the sibling scope.
    UnknownAnchor(K),
}

impl<K: Display> Display for PlacementError<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfAfter(key) => write!(f, "cannot place {key} after itself"),
            Self::UnknownAnchor(key) => write!(f, "anchor {key} is not among the siblings"),
        }
    }
}

impl<K: Debug + Display> Error for PlacementError<K> {}

/// Computes order keys with a fixed spacing and collapse threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionAllocator<P> {
    interval: P,
    collapse_threshold: P,
}

impl<P: Position> PositionAllocator<P> {
    /// Creates an allocator.
    ///
    /// `collapse_threshold` is the largest gap to the previous neighbour that
    /// still forces a renumber.
    pub fn new(interval: P, collapse_threshold: P) -> Self {
        Self {
            interval,
            collapse_threshold,
        }
    }

    pub fn interval(&self) -> P {
        self.interval
    }

    /// Position for a new entity placed after the last sibling.
    pub fn append<K>(&self, siblings: &[Slot<K, P>]) -> P {
        siblings
            .last()
            .map_or(self.interval, |last| last.position + self.interval)
    }

    /// Position for `moving` placed right after `after`, or first when
    /// `after` is `None`.
    ///
    /// `siblings` may or may not already contain `moving`.
    ///
    /// # Errors
    /// - `SelfAfter` when `after == Some(moving)`.
    /// - `UnknownAnchor` when `after` is not in `siblings`.
    pub fn insert_after<K: Copy + PartialEq>(
        &self,
        siblings: &[Slot<K, P>],
        after: Option<K>,
        moving: K,
    ) -> Result<Placement<K, P>, PlacementError<K>> {
        if after == Some(moving) {
            return Err(PlacementError::SelfAfter(moving));
        }

        let after_idx = match after {
            Some(anchor) => Some(
                siblings
                    .iter()
                    .position(|slot| slot.key == anchor)
                    .ok_or(PlacementError::UnknownAnchor(anchor))?,
            ),
            None => None,
        };

        if siblings.iter().all(|slot| slot.key == moving) {
            return Ok(Placement::direct(self.interval));
        }

        let prev = after_idx.map_or(P::ZERO, |idx| siblings[idx].position);
        let next_idx = after_idx.map_or(0, |idx| idx + 1);
        let next = siblings
            .get(next_idx)
            .map_or(prev + self.interval, |slot| slot.position);

        let candidate = P::floor_midpoint(prev, next);
        if candidate - prev <= self.collapse_threshold {
            return Ok(self.renumber(siblings, after, moving));
        }
        Ok(Placement::direct(candidate))
    }

    fn renumber<K: Copy + PartialEq>(
        &self,
        siblings: &[Slot<K, P>],
        after: Option<K>,
        moving: K,
    ) -> Placement<K, P> {
        // `None` marks the moving entity's slot in the final order.
        let mut final_order: Vec<Option<&Slot<K, P>>> = siblings
            .iter()
            .filter(|slot| slot.key != moving)
            .map(Some)
            .collect();
        let insert_at = after
            .and_then(|anchor| {
                final_order
                    .iter()
                    .position(|entry| entry.is_some_and(|slot| slot.key == anchor))
            })
            .map_or(0, |idx| idx + 1);
        final_order.insert(insert_at, None);

        let mut position = self.interval;
        let mut renumbered = Vec::new();
        for (index, entry) in final_order.into_iter().enumerate() {
            let slot_position = P::nth_slot(self.interval, index);
            match entry {
                None => position = slot_position,
                Some(slot) if slot.position != slot_position => {
                    renumbered.push(Slot::new(slot.key, slot_position));
                }
                Some(_) => {}
            }
        }

        Placement {
            position,
            renumbered,
            rebalanced: true,
        }
    }
}
