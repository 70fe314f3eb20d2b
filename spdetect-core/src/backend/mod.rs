mod backend;
mod structs;

pub use backend::IndexerBackend;
pub use structs::*;
