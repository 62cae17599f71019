//! Player command surface
//!
//! The operations behind the screen's controls, callable from any async
//! context that holds a shared `PlayerState`.

pub mod player;
