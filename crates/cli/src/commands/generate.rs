//! The `generate` verb: emit a Rust enum mapping feature names to ids.

use std::path::Path;

use anyhow::bail;
use flagbit_core::FeatureBitRepository;
use flagbit_domain::FeatureBitDefinition;

use crate::cli::GenerateArgs;

/// Writes a `#[repr(i32)]` enum of all stored feature bits so callers
/// can reference them without string literals.
pub struct GenerateCommand<'a> {
    args: &'a GenerateArgs,
    repo: &'a dyn FeatureBitRepository,
}

impl<'a> GenerateCommand<'a> {
    pub fn new(args: &'a GenerateArgs, repo: &'a dyn FeatureBitRepository) -> Self {
        Self { args, repo }
    }

    pub async fn run(&self) -> anyhow::Result<String> {
        if self.args.output.exists() {
            bail!("Output file already exists.");
        }

        let mut definitions = self.repo.get_all().await?;
        definitions.sort_by_key(|definition| definition.id);
        let source = render_enum(&self.args.type_name, &definitions);
        write_output(&self.args.output, &source)?;

        Ok(format!(
            "Feature bit enum successfully written to {}.",
            self.args.output.display()
        ))
    }
}

fn write_output(path: &Path, source: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, source)?;
    Ok(())
}

fn render_enum(type_name: &str, definitions: &[FeatureBitDefinition]) -> String {
    let mut source = String::new();
    source.push_str("// Generated by flagbit. Do not edit by hand.\n\n");
    source.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n");
    source.push_str("#[repr(i32)]\n");
    source.push_str(&format!("pub enum {type_name} {{\n"));
    for definition in definitions {
        source.push_str(&format!(
            "    {} = {},\n",
            variant_ident(&definition.name),
            definition.id
        ));
    }
    source.push_str("}\n");
    source
}

/// Turns a stored name into a PascalCase Rust identifier. Separators and
/// punctuation start a new word; a leading digit gets an underscore
/// prefix so the result stays a valid ident.
fn variant_ident(name: &str) -> String {
    let mut ident = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if upper_next {
                ident.extend(ch.to_uppercase());
                upper_next = false;
            } else {
                ident.push(ch);
            }
        } else {
            upper_next = true;
        }
    }
    if ident.is_empty() {
        ident.push_str("Unnamed");
    } else if ident.chars().next().is_some_and(|ch| ch.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}
