pub mod extract;
pub mod serpentine;
pub mod state;
