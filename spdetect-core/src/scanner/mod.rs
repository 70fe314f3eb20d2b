mod processor;
mod scanner;
mod structs;

pub use processor::TransactionProcessor;
pub use scanner::ScanCoordinator;
pub use structs::*;
