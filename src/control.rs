//! External paddle control signal
//!
//! Something outside the core (a face tracker) produces a scalar in its
//! own units. The core asks for one value per sampling period; `None`
//! means no value was available this time (no frame, no face).

use std::collections::VecDeque;

pub trait ControlSignalSource {
    fn sample(&mut self) -> Option<f32>;
}

impl<F> ControlSignalSource for F
where
    F: FnMut() -> Option<f32>,
{
    fn sample(&mut self) -> Option<f32> {
        self()
    }
}

/// Replays a fixed list of samples, then reports nothing
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    samples: VecDeque<Option<f32>>,
    taken: usize,
}

impl ScriptedSource {
    pub fn new(samples: impl IntoIterator<Item = Option<f32>>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            taken: 0,
        }
    }

    /// A source that never has a value
    pub fn silent() -> Self {
        Self::default()
    }

    /// How many times the source was asked
    pub fn taken(&self) -> usize {
        self.taken
    }
}

impl ControlSignalSource for ScriptedSource {
    fn sample(&mut self) -> Option<f32> {
        self.taken += 1;
        self.samples.pop_front().flatten()
    }
}
