mod common;
mod conversation;
mod design;
mod file;
mod memory;
mod plan;
mod task;

pub use common::*;
pub use conversation::*;
pub use design::*;
pub use file::*;
pub use memory::*;
pub use plan::*;
pub use task::*;
