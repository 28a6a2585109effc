pub mod pipeline;
pub mod tasks;

pub use pipeline::*;
pub use tasks::*;
