//! The `list` verb: print stored definitions as a console table.

use flagbit_core::FeatureBitRepository;

use crate::cli::ListArgs;
use crate::output;

/// Fetches all definitions and renders them.
pub struct ListCommand<'a> {
    args: &'a ListArgs,
    repo: &'a dyn FeatureBitRepository,
}

impl<'a> ListCommand<'a> {
    pub fn new(args: &'a ListArgs, repo: &'a dyn FeatureBitRepository) -> Self {
        Self { args, repo }
    }

    pub async fn run(&self) -> anyhow::Result<String> {
        let definitions = self.repo.get_all().await?;
        Ok(output::render_table(&definitions, self.args.long))
    }
}
