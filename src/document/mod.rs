mod handle;
mod snapshot;

pub use handle::*;
pub use snapshot::*;
