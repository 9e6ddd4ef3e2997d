//! Contact classification
//!
//! Decides what a physics contact means for the match, using only the
//! category tags. The pair is put in tag order first, so (A, B) and
//! (B, A) always classify the same way.

use super::blocks::BlockField;
use super::state::{BlockId, CategoryTag};
use crate::physics::{Contact, ContactBody};

/// Meaning of a tag pair, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Ball touched the floor sensor
    BallLost,
    /// Ball touched a block
    BlockHit,
    /// Physics handles it (bounces) or nobody cares
    Ignored,
}

/// What the session should do about a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    BallLost,
    BlockHit(BlockId),
}

/// Put a pair in ascending tag order
#[inline]
pub fn canonical(a: CategoryTag, b: CategoryTag) -> (CategoryTag, CategoryTag) {
    if a <= b { (a, b) } else { (b, a) }
}

pub fn classify(a: CategoryTag, b: CategoryTag) -> ContactKind {
    match canonical(a, b) {
        (CategoryTag::Ball, CategoryTag::FloorSensor) => ContactKind::BallLost,
        (CategoryTag::Ball, CategoryTag::Block) => ContactKind::BlockHit,
        _ => ContactKind::Ignored,
    }
}

/// Classify a contact and resolve the block it refers to
pub fn resolve(contact: &Contact, blocks: &BlockField) -> Option<Reaction> {
    let (first, second): (ContactBody, ContactBody) = if contact.a.tag <= contact.b.tag {
        (contact.a, contact.b)
    } else {
        (contact.b, contact.a)
    };

    match classify(first.tag, second.tag) {
        ContactKind::BallLost => Some(Reaction::BallLost),
        ContactKind::BlockHit => match blocks.block_for_body(second.body) {
            Some(id) => Some(Reaction::BlockHit(id)),
            None => {
                log::warn!("Block contact with unknown body {:?}", second.body);
                None
            }
        },
        ContactKind::Ignored => None,
    }
}
