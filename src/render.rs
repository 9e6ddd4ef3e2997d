//! Rendering sink port
//!
//! Presentation only: the core pushes commands and never reads anything
//! back.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::palette::Rgba;
use crate::sim::state::BlockId;

/// On-screen text labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Score,
    Best,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// Small text, used for the start prompt
    Prompt,
    /// Large numeric score
    Score,
    Plain,
}

/// Everything needed to draw a block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSprite {
    pub id: BlockId,
    pub position: Vec2,
    pub size: Vec2,
    pub color: Rgba,
}

/// The player's paddle; its x follows the control signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleSprite {
    pub position: Vec2,
    pub size: Vec2,
    pub color: Rgba,
}

pub trait RenderSink {
    fn set_background(&mut self, color: Rgba);
    fn set_paddle(&mut self, sprite: &PaddleSprite);
    fn add_block(&mut self, sprite: &BlockSprite);
    fn remove_block(&mut self, id: BlockId);
    fn set_label(&mut self, label: Label, text: &str, style: LabelStyle);
    /// One-shot break effect; the renderer removes it after `lifetime`
    fn emit_burst(&mut self, position: Vec2, lifetime: f32);
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Background(Rgba),
    Paddle(PaddleSprite),
    AddBlock(BlockSprite),
    RemoveBlock(BlockId),
    SetLabel {
        label: Label,
        text: String,
        style: LabelStyle,
    },
    Burst {
        position: Vec2,
        lifetime: f32,
    },
}

/// Sink that remembers every command and the resulting scene
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub commands: Vec<RenderCommand>,
    blocks: BTreeMap<BlockId, BlockSprite>,
    labels: BTreeMap<Label, (String, LabelStyle)>,
    paddle: Option<PaddleSprite>,
    background: Option<Rgba>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks currently on screen
    pub fn visible_blocks(&self) -> impl Iterator<Item = &BlockSprite> {
        self.blocks.values()
    }

    pub fn is_visible(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn block(&self, id: BlockId) -> Option<&BlockSprite> {
        self.blocks.get(&id)
    }

    pub fn paddle(&self) -> Option<&PaddleSprite> {
        self.paddle.as_ref()
    }

    pub fn background(&self) -> Option<Rgba> {
        self.background
    }

    pub fn label(&self, label: Label) -> Option<&str> {
        self.labels.get(&label).map(|(text, _)| text.as_str())
    }

    pub fn label_style(&self, label: Label) -> Option<LabelStyle> {
        self.labels.get(&label).map(|(_, style)| *style)
    }

    /// How many times a block was added since the last `clear_commands`
    pub fn add_count(&self, id: BlockId) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::AddBlock(s) if s.id == id))
            .count()
    }

    pub fn burst_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::Burst { .. }))
            .count()
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl RenderSink for RecordingSink {
    fn set_background(&mut self, color: Rgba) {
        self.background = Some(color);
        self.commands.push(RenderCommand::Background(color));
    }

    fn set_paddle(&mut self, sprite: &PaddleSprite) {
        log::trace!("render: paddle at {}", sprite.position);
        self.paddle = Some(*sprite);
        self.commands.push(RenderCommand::Paddle(*sprite));
    }

    fn add_block(&mut self, sprite: &BlockSprite) {
        log::trace!("render: add block {:?} at {}", sprite.id, sprite.position);
        self.blocks.insert(sprite.id, *sprite);
        self.commands.push(RenderCommand::AddBlock(*sprite));
    }

    fn remove_block(&mut self, id: BlockId) {
        log::trace!("render: remove block {:?}", id);
        self.blocks.remove(&id);
        self.commands.push(RenderCommand::RemoveBlock(id));
    }

    fn set_label(&mut self, label: Label, text: &str, style: LabelStyle) {
        self.labels.insert(label, (text.to_string(), style));
        self.commands.push(RenderCommand::SetLabel {
            label,
            text: text.to_string(),
            style,
        });
    }

    fn emit_burst(&mut self, position: Vec2, lifetime: f32) {
        self.commands.push(RenderCommand::Burst { position, lifetime });
    }
}
