pub mod input;
pub mod operation;
pub mod statistics;

// Stats crate: pure parsing and computation, no I/O.
pub use input::*;
pub use operation::*;
pub use statistics::*;
