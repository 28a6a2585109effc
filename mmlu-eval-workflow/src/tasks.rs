pub mod data_loading;
pub mod prompting;
pub mod inference;
pub mod evaluation;
pub mod reporting;

pub use data_loading::*;
pub use prompting::*;
pub use inference::*;
pub use evaluation::*;
pub use reporting::*;
