/// Traits for canonical binary representations
mod encode;
/// Checkpoint signing and signature recovery
mod signing;

pub use encode::*;
pub use signing::*;
