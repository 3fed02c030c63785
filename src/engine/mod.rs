//! Engine: the phase sequencing core.
//!
//! Decides which scene is on screen, when it changes, and what numeric
//! parameters it shows at any instant. Time only enters through the `now`
//! passed by the caller, so the whole engine runs on virtual time.
//!
//! The engine never deals with terminals, ANSI codes or grids.

pub mod anim;
pub mod clock;
pub mod controller;
pub mod particles;
pub mod phase;
pub mod pointer;
pub mod scene;
pub mod typewriter;

pub use controller::PhaseController;
pub use phase::{Phase, PhaseEvent};
