//! The `add` verb: create a feature bit, or overwrite one with `--force`.

use anyhow::bail;
use flagbit_core::{validate_dependencies, FeatureBitRepository};
use flagbit_domain::{FeatureBitDefinition, FlagbitError};

use crate::cli::AddArgs;
use crate::context::CommandContext;

/// Builds a definition from the CLI options and persists it.
///
/// A conflicting name fails unless `--force` was given, in which case the
/// existing definition is overwritten in place (preserving its id and
/// creation audit fields).
pub struct AddCommand<'a> {
    args: &'a AddArgs,
    repo: &'a dyn FeatureBitRepository,
    context: &'a CommandContext,
}

impl<'a> AddCommand<'a> {
    pub fn new(
        args: &'a AddArgs,
        repo: &'a dyn FeatureBitRepository,
        context: &'a CommandContext,
    ) -> Self {
        Self { args, repo, context }
    }

    pub async fn run(&self) -> anyhow::Result<String> {
        self.validate_dependency_graph().await?;
        let definition = self.build_definition();

        match self.repo.add(definition.clone()).await {
            Ok(_) => Ok("Feature bit added.".to_string()),
            Err(FlagbitError::Conflict(_)) if self.args.force => {
                self.force_update(definition).await
            }
            Err(FlagbitError::Conflict(_)) => bail!(
                "Feature bit '{}' already exists. Use --force to overwrite existing feature bits.",
                self.args.name
            ),
            Err(err) => Err(err.into()),
        }
    }

    /// Dependency names must exist and must not introduce a loop. Runs
    /// before the add so a conflicting name never bypasses the check.
    async fn validate_dependency_graph(&self) -> anyhow::Result<()> {
        if let Some(dependencies) = &self.args.dependencies {
            let definitions = self.repo.get_all().await?;
            validate_dependencies(&self.args.name, dependencies, &definitions)?;
        }
        Ok(())
    }

    async fn force_update(&self, definition: FeatureBitDefinition) -> anyhow::Result<String> {
        let mut existing = self
            .repo
            .get_by_name(&self.args.name)
            .await?
            .ok_or_else(|| {
                FlagbitError::NotFound(format!(
                    "feature bit '{}' could not be found",
                    self.args.name
                ))
            })?;
        existing.apply_update(&definition);
        self.repo.update(existing).await?;
        Ok("Feature bit updated.".to_string())
    }

    fn build_definition(&self) -> FeatureBitDefinition {
        FeatureBitDefinition {
            id: 0, // assigned by the store
            name: self.args.name.clone(),
            on_off: parse_on_off(&self.args.onoff),
            excluded_environments: self.args.excluded_environments.clone(),
            included_environments: self.args.included_environments.clone(),
            minimum_allowed_permission_level: self.args.minimum_permission_level,
            exact_allowed_permission_level: self.args.exact_permission_level,
            allowed_users: self.args.allowed_users.clone(),
            dependencies: self.args.dependencies.clone(),
            created_date_time: self.context.timestamp,
            created_by_user: self.context.username.clone(),
            last_modified_date_time: self.context.timestamp,
            last_modified_by_user: self.context.username.clone(),
        }
    }
}

/// Lenient boolean parse: anything that is not a valid "true"/"false"
/// counts as false.
fn parse_on_off(text: &str) -> bool {
    text.trim().parse::<bool>().unwrap_or(false)
}
