//! Controller layer: raw UI input to operator events.

pub mod keyboard;
