//! The `remove` verb: delete a feature bit, optionally detaching
//! dependents first.

use anyhow::bail;
use flagbit_core::{join_names, split_names, FeatureBitRepository};
use flagbit_domain::FeatureBitDefinition;

use crate::cli::RemoveArgs;
use crate::context::CommandContext;

/// Removes a definition by name.
///
/// Refuses when other definitions still depend on the target unless
/// `--force` was given; with force, every dependent is rewritten to drop
/// the target from its dependency list before the delete.
pub struct RemoveCommand<'a> {
    args: &'a RemoveArgs,
    repo: &'a dyn FeatureBitRepository,
    context: &'a CommandContext,
}

impl<'a> RemoveCommand<'a> {
    pub fn new(
        args: &'a RemoveArgs,
        repo: &'a dyn FeatureBitRepository,
        context: &'a CommandContext,
    ) -> Self {
        Self { args, repo, context }
    }

    pub async fn run(&self) -> anyhow::Result<String> {
        let name = &self.args.name;
        let Some(definition) = self.repo.get_by_name(name).await? else {
            bail!("Feature bit '{name}' could not be found.");
        };

        let dependents = self.find_dependents(name).await?;
        if !dependents.is_empty() {
            if !self.args.force {
                bail!(
                    "Feature bit '{name}' has a dependency. Use --force to remove feature bit dependencies."
                );
            }
            self.detach_dependents(name, dependents).await?;
        }

        self.repo.remove(&definition).await?;
        Ok("Feature bit removed.".to_string())
    }

    /// Every definition whose dependency list names the target.
    async fn find_dependents(&self, name: &str) -> anyhow::Result<Vec<FeatureBitDefinition>> {
        let definitions = self.repo.get_all().await?;
        Ok(definitions
            .into_iter()
            .filter(|definition| {
                split_names(definition.dependencies.as_deref())
                    .iter()
                    .any(|dependency| dependency == name)
            })
            .collect())
    }

    /// Rewrite each dependent without the removed name, refreshing its
    /// last-modified audit pair.
    async fn detach_dependents(
        &self,
        name: &str,
        dependents: Vec<FeatureBitDefinition>,
    ) -> anyhow::Result<()> {
        for mut dependent in dependents {
            let remaining: Vec<String> = split_names(dependent.dependencies.as_deref())
                .into_iter()
                .filter(|dependency| dependency != name)
                .collect();
            dependent.dependencies =
                if remaining.is_empty() { None } else { Some(join_names(&remaining)) };
            dependent.last_modified_date_time = self.context.timestamp;
            dependent.last_modified_by_user = self.context.username.clone();
            self.repo.update(dependent).await?;
        }
        Ok(())
    }
}
