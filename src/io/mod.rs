pub mod export;
mod snapshot;

pub use snapshot::*;
