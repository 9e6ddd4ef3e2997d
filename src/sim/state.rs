//! Core simulation types
//!
//! Match state, body categories and score. Nothing here talks to the
//! physics engine or the renderer.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchState {
    /// Ball parked, all blocks alive, waiting for the begin trigger
    #[default]
    New,
    /// Active gameplay
    Running,
    /// Gameplay suspended; respawns are queued, not applied
    Paused,
    /// Session ended; control sampling is cancelled
    GameOver,
}

/// Role of a physics body. Each body carries exactly one.
///
/// Discriminants are the category bits, so sorting by tag matches sorting
/// by bit value.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryTag {
    Ball = 1 << 0,
    FloorSensor = 1 << 1,
    Block = 1 << 2,
    Paddle = 1 << 3,
    Border = 1 << 4,
}

impl CategoryTag {
    pub const ALL: [CategoryTag; 5] = [
        CategoryTag::Ball,
        CategoryTag::FloorSensor,
        CategoryTag::Block,
        CategoryTag::Paddle,
        CategoryTag::Border,
    ];

    #[inline]
    pub fn bits(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn mask(self) -> CategoryMask {
        CategoryMask::from_bits_truncate(self.bits())
    }
}

bitflags! {
    /// Set of categories, used as a contact mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CategoryMask: u32 {
        const BALL = 1 << 0;
        const FLOOR_SENSOR = 1 << 1;
        const BLOCK = 1 << 2;
        const PADDLE = 1 << 3;
        const BORDER = 1 << 4;
    }
}

impl CategoryMask {
    #[inline]
    pub fn has(self, tag: CategoryTag) -> bool {
        self.contains(tag.mask())
    }
}

impl From<CategoryTag> for CategoryMask {
    fn from(tag: CategoryTag) -> Self {
        tag.mask()
    }
}

/// Identity of a grid block: `row * columns + col`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

/// Grid cell of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

impl GridCell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major id; `Tuning::validate` keeps rows * columns within u32
    pub fn id(self, columns: usize) -> BlockId {
        BlockId((self.row * columns + self.col) as u32)
    }
}

/// Session score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    value: u64,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn increment(&mut self) -> u64 {
        self.value += 1;
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}
