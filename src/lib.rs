//! Volume mixer for the operating system's audio mixer device
//!
//! The [`device`] layer talks to the mixer node, [`control`] holds the
//! typed controls users interact with, and [`mixer`] keeps the two in
//! step.

pub mod control;
pub mod device;
pub mod error;
pub mod log;
pub mod mixer;
pub mod settings;
