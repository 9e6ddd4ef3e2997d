//! Breakable block grid
//!
//! Owns the fixed layout and the alive/destroyed split. A block is either
//! alive (drawn and collidable) or destroyed (neither), never both. A
//! destroyed block keeps its position and color, so bringing it back
//! looks exactly like the original placement.

use std::collections::HashMap;

use glam::Vec2;

use super::respawn::RespawnScheduler;
use super::state::{BlockId, CategoryTag, GridCell};
use crate::palette::{self, Rgba};
use crate::physics::{BodyDesc, BodyHandle, BodyKind, PhysicsWorld, Shape};
use crate::render::{BlockSprite, RenderSink};
use crate::tuning::Tuning;

/// A single grid block
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub cell: GridCell,
    pub position: Vec2,
    pub size: Vec2,
    pub color: Rgba,
    pub body: BodyHandle,
    alive: bool,
}

impl Block {
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn sprite(&self) -> BlockSprite {
        BlockSprite {
            id: self.id,
            position: self.position,
            size: self.size,
            color: self.color,
        }
    }
}

/// Centre of a grid cell.
///
/// The grid is centred horizontally and starts a fixed fraction of the
/// playfield height above the middle.
pub fn cell_position(tuning: &Tuning, cell: GridCell) -> Vec2 {
    let total_width = tuning.block_width * tuning.block_columns as f32;
    let x_offset = -total_width / 2.0;
    let y_offset = tuning.playfield_height * crate::consts::BLOCK_Y_OFFSET_FRACTION;
    Vec2::new(
        x_offset + (cell.col as f32 + 0.5) * tuning.block_width,
        y_offset + (cell.row as f32 + 0.5) * tuning.block_height,
    )
}

#[derive(Debug, Clone)]
pub struct BlockField {
    blocks: Vec<Block>,
    by_body: HashMap<BodyHandle, BlockId>,
    columns: usize,
}

impl BlockField {
    /// Lay out the grid, registering one body and one sprite per cell
    pub fn build<P, R>(tuning: &Tuning, physics: &mut P, render: &mut R) -> Self
    where
        P: PhysicsWorld + ?Sized,
        R: RenderSink + ?Sized,
    {
        let size = Vec2::new(tuning.block_width, tuning.block_height);
        let mut blocks = Vec::with_capacity(tuning.block_rows * tuning.block_columns);
        let mut by_body = HashMap::new();

        for row in 0..tuning.block_rows {
            for col in 0..tuning.block_columns {
                let cell = GridCell::new(row, col);
                let id = cell.id(tuning.block_columns);
                let position = cell_position(tuning, cell);
                let body = physics.add_body(BodyDesc::new(
                    CategoryTag::Block,
                    Shape::Rect {
                        half_extents: size / 2.0,
                    },
                    BodyKind::Static,
                    position,
                ));
                let block = Block {
                    id,
                    cell,
                    position,
                    size,
                    color: palette::block_color(row, col, tuning.block_columns),
                    body,
                    alive: true,
                };
                render.add_block(&block.sprite());
                by_body.insert(body, id);
                blocks.push(block);
            }
        }

        log::debug!(
            "Block field built: {}x{} blocks",
            tuning.block_rows,
            tuning.block_columns
        );

        Self {
            blocks,
            by_body,
            columns: tuning.block_columns,
        }
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0 as usize)
    }

    pub fn at(&self, cell: GridCell) -> Option<&Block> {
        if cell.col >= self.columns {
            return None;
        }
        self.get(cell.id(self.columns))
    }

    pub fn block_for_body(&self, body: BodyHandle) -> Option<BlockId> {
        self.by_body.get(&body).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.alive).count()
    }

    pub fn is_alive(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(Block::is_alive)
    }

    /// Take a block out of play and hand it to the scheduler.
    ///
    /// Returns false if the block was not alive (e.g. a second contact
    /// with it in the same frame).
    pub fn destroy<P, R>(
        &mut self,
        id: BlockId,
        now: f64,
        burst_lifetime: f32,
        scheduler: &mut RespawnScheduler,
        physics: &mut P,
        render: &mut R,
    ) -> bool
    where
        P: PhysicsWorld + ?Sized,
        R: RenderSink + ?Sized,
    {
        let Some(block) = self.blocks.get_mut(id.0 as usize) else {
            return false;
        };
        if !block.alive {
            return false;
        }

        block.alive = false;
        physics.set_enabled(block.body, false);
        render.emit_burst(block.position, burst_lifetime);
        render.remove_block(id);
        let timer = scheduler.schedule(id, now);

        log::debug!(
            "Block {:?} at ({}, {}) destroyed, back at {:.2}",
            id,
            block.cell.row,
            block.cell.col,
            timer.deadline
        );
        true
    }

    /// Put a block back in play. No-op if it is already alive.
    pub fn revive<P, R>(&mut self, id: BlockId, physics: &mut P, render: &mut R) -> bool
    where
        P: PhysicsWorld + ?Sized,
        R: RenderSink + ?Sized,
    {
        let Some(block) = self.blocks.get_mut(id.0 as usize) else {
            return false;
        };
        if block.alive {
            return false;
        }

        block.alive = true;
        physics.set_enabled(block.body, true);
        render.add_block(&block.sprite());
        true
    }

    /// Undo every destruction of the session (pending and queued alike)
    pub fn restore_all<P, R>(
        &mut self,
        scheduler: &mut RespawnScheduler,
        physics: &mut P,
        render: &mut R,
    ) -> usize
    where
        P: PhysicsWorld + ?Sized,
        R: RenderSink + ?Sized,
    {
        let mut restored = 0;
        for id in scheduler.drain_all() {
            if self.revive(id, &mut *physics, &mut *render) {
                restored += 1;
            }
        }
        if restored > 0 {
            log::debug!("Restored {} blocks", restored);
        }
        restored
    }
}
