//! Write-path dependency validation.
//!
//! Before a definition with dependencies is persisted, the CLI orchestration
//! verifies that every referenced name exists and that the dependency graph
//! still terminates within the recursion ceiling. The walk shares its depth
//! ceiling with the evaluator but runs at write time, where a violation is a
//! hard error instead of a truncated branch.

use flagbit_domain::{FeatureBitDefinition, FlagbitError, Result};

use crate::dependencies::split_names;
use crate::evaluator::MAX_DEPENDENCY_DEPTH;

/// One (parent, child) edge visited while walking a dependency graph.
///
/// `within_ceiling` is false for edges discovered at the recursion ceiling;
/// the walk stops there, so such an edge means the chain did not provably
/// terminate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub parent: String,
    pub child: String,
    pub within_ceiling: bool,
}

/// Validate the dependency list of a definition about to be written.
///
/// Checks, in order:
/// 1. Every referenced name exists among `definitions`.
/// 2. Walking from each first-level dependency, the graph terminates within
///    [`MAX_DEPENDENCY_DEPTH`] and never revisits a (parent, child) edge.
///
/// The depth is threaded through each recursive call explicitly; sibling
/// branches do not share counter state. Note this is a deliberately coarse
/// check: an acyclic chain deeper than the ceiling is rejected exactly like
/// a real cycle.
pub fn validate_dependencies(
    owner_name: &str,
    dependencies: &str,
    definitions: &[FeatureBitDefinition],
) -> Result<()> {
    let names = split_names(Some(dependencies));
    if names.is_empty() {
        return Ok(());
    }

    let unknown: Vec<&String> =
        names.iter().filter(|name| find(definitions, name).is_none()).collect();
    if !unknown.is_empty() {
        return Err(FlagbitError::Validation(format!(
            "feature bit '{owner_name}' has 1 or more invalid dependencies {dependencies}"
        )));
    }

    // Walk each referenced feature once; a name listed twice would
    // duplicate its subtree's edges and read as a loop.
    let mut edges = Vec::new();
    let mut walked: Vec<&str> = Vec::new();
    for name in &names {
        if walked.contains(&name.as_str()) {
            continue;
        }
        walked.push(name);
        if let Some(first_level) = find(definitions, name) {
            collect_edges(definitions, first_level, 0, &mut edges);
        }
    }

    if !terminates(&edges) {
        return Err(FlagbitError::Validation(format!(
            "feature bit '{owner_name}' has a recursive loop {dependencies}"
        )));
    }
    Ok(())
}

/// Walk one definition's dependencies, recording every visited edge.
///
/// Recursion stops at the ceiling; edges discovered there are marked as
/// outside the ceiling rather than followed.
fn collect_edges(
    definitions: &[FeatureBitDefinition],
    definition: &FeatureBitDefinition,
    depth: u32,
    edges: &mut Vec<DependencyEdge>,
) {
    for child in split_names(definition.dependencies.as_deref()) {
        edges.push(DependencyEdge {
            parent: definition.name.clone(),
            child: child.clone(),
            within_ceiling: depth < MAX_DEPENDENCY_DEPTH,
        });

        if depth < MAX_DEPENDENCY_DEPTH {
            if let Some(child_definition) = find(definitions, &child) {
                collect_edges(definitions, child_definition, depth + 1, edges);
            }
        }
    }
}

/// An edge set terminates when no edge was cut off at the ceiling and no
/// (parent, child) pair was visited twice.
fn terminates(edges: &[DependencyEdge]) -> bool {
    if edges.iter().any(|edge| !edge.within_ceiling) {
        return false;
    }
    for (index, edge) in edges.iter().enumerate() {
        let revisited = edges[index + 1..]
            .iter()
            .any(|other| other.parent == edge.parent && other.child == edge.child);
        if revisited {
            return false;
        }
    }
    true
}

fn find<'a>(
    definitions: &'a [FeatureBitDefinition],
    name: &str,
) -> Option<&'a FeatureBitDefinition> {
    definitions.iter().find(|definition| definition.name == name)
}
