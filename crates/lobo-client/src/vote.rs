//! Day-phase voting: the per-seat tally and the voting circle layout.

use std::f32::consts::TAU;

use crate::error::ActionError;

/// Largest number of seats the voting circle renders.
pub const MAX_RENDERED_SEATS: usize = 18;

/// A single day-phase vote. Created when the day starts, dropped when it
/// ends; nothing is kept between rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRound {
    tally: Vec<u32>,
    selection: Option<usize>,
    commits: u32,
}

impl Default for VoteRound {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteRound {
    pub fn new() -> Self {
        Self {
            tally: vec![0; MAX_RENDERED_SEATS],
            selection: None,
            commits: 0,
        }
    }

    /// Arm `index` as the pending target, replacing any previous selection.
    pub fn select(&mut self, index: usize) -> Result<(), ActionError> {
        if index >= self.tally.len() {
            return Err(ActionError::InvalidSeat(index));
        }
        self.selection = Some(index);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Commit the armed selection: one vote for that seat, selection cleared.
    /// Returns the seat voted for, or `None` when nothing was armed.
    pub fn commit(&mut self) -> Option<usize> {
        let Some(index) = self.selection.take() else {
            tracing::debug!("vote commit with no selection ignored");
            return None;
        };
        self.tally[index] += 1;
        self.commits += 1;
        Some(index)
    }

    pub fn tally(&self) -> &[u32] {
        &self.tally
    }

    /// Number of vote markers to draw next to seat `index`.
    pub fn markers(&self, index: usize) -> u32 {
        self.tally.get(index).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.tally.iter().sum()
    }

    /// Successful commits this round.
    pub fn commits(&self) -> u32 {
        self.commits
    }

    /// Seats with at least one vote, most voted first; ties keep seat order.
    pub fn standings(&self) -> Vec<(usize, u32)> {
        let mut standings: Vec<(usize, u32)> = self
            .tally
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, votes)| votes > 0)
            .collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1));
        standings
    }
}

// ---------------------------------------------------------------------------
// Circle layout
// ---------------------------------------------------------------------------

/// Above this many seats the circle switches to its crowded layout.
pub const CROWDED_THRESHOLD: usize = 10;
/// Ring radius as a fraction of the smaller screen dimension.
pub const RADIUS_FACTOR: f32 = 0.35;
/// Icon/name scale in the crowded layout.
pub const CROWDED_SCALE: f32 = 0.75;
/// Ring radius growth in the crowded layout.
pub const CROWDED_RADIUS_GROWTH: f32 = 1.2;
/// Vertical compression for non-square screens.
pub const VERTICAL_SHRINK: f32 = 0.8;

/// Where to draw one seat, relative to the top-left of the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeatPosition {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

/// Lay out `count` seats on a circle centred on a `width`×`height` screen.
/// Seat `i` sits at angle `2π·i/count`.
pub fn seat_positions(count: usize, width: f32, height: f32) -> Vec<SeatPosition> {
    if count == 0 {
        return Vec::new();
    }
    let crowded = count > CROWDED_THRESHOLD;
    let mut radius = width.min(height) * RADIUS_FACTOR;
    let scale = if crowded {
        radius *= CROWDED_RADIUS_GROWTH;
        CROWDED_SCALE
    } else {
        1.0
    };
    let (cx, cy) = (width / 2.0, height / 2.0);

    (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32;
            SeatPosition {
                x: cx + radius * angle.cos(),
                y: cy + radius * angle.sin() * VERTICAL_SHRINK,
                scale,
            }
        })
        .collect()
}
