//! Control panel rendering.

pub mod app;

pub use app::TeleopApp;
