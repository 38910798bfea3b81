//! Command orchestration: thin wrappers that build definitions from CLI
//! options, validate, and drive the repository.

pub mod add;
pub mod generate;
pub mod list;
pub mod remove;

pub use add::AddCommand;
pub use generate::GenerateCommand;
pub use list::ListCommand;
pub use remove::RemoveCommand;
