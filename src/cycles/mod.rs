//! Cycle detection and reversible cycle removal.

mod cut;
mod find;
mod reconnect;

pub use cut::cut_cycles;
pub use find::find_cycle;
pub use reconnect::reconnect_cycles;
