//! Choosing which repositories a batch runs against.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::{BufRead, Write};

use crate::error::{FanoutError, Result};
use crate::types::RepositoryRef;

/// Keep the repositories whose name (or `owner/name`) matches any pattern.
pub fn filter_by_globs(repos: &[RepositoryRef], patterns: &[String]) -> Result<Vec<RepositoryRef>> {
    let set = build_globset(patterns)?;
    Ok(repos
        .iter()
        .filter(|r| set.is_match(r.name()) || set.is_match(r.to_string()))
        .cloned()
        .collect())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Show a numbered list and read a comma-separated selection such as `1,3,5`.
///
/// Entries that are not numbers or are out of range are reported on `output`
/// and skipped. Selecting nothing valid is an error.
pub fn prompt_selection<R: BufRead, W: Write>(
    repos: &[RepositoryRef],
    action: &str,
    mut input: R,
    mut output: W,
) -> Result<Vec<RepositoryRef>> {
    if repos.is_empty() {
        return Err(FanoutError::InvalidInput(
            "no repositories available to choose from".into(),
        ));
    }

    writeln!(
        output,
        "Select repositories to {} (comma-separated indices):",
        action
    )?;
    for (i, repo) in repos.iter().enumerate() {
        writeln!(output, "[{}] {}", i + 1, repo)?;
    }
    write!(output, "Enter the numbers of the repositories you want (e.g., 1,3,5): ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let mut selected = Vec::new();
    for token in line.trim().split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<usize>() {
            Ok(idx) if (1..=repos.len()).contains(&idx) => selected.push(repos[idx - 1].clone()),
            Ok(idx) => writeln!(output, "Index out of range: {} (skipping)", idx)?,
            Err(_) => writeln!(output, "Invalid input: {} (skipping)", token)?,
        }
    }

    if selected.is_empty() {
        return Err(FanoutError::InvalidInput("no repositories selected".into()));
    }
    Ok(selected)
}
