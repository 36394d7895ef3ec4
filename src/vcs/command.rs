//
//  atlas-client
//  vcs/command.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! External tool invocation for the VCS adapters.

use std::io;
use std::path::Path;
use std::process::Command;

use super::VcsError;

/// Runs `program args...` inside `dir` and returns its standard output.
///
/// A missing binary is reported as [`VcsError::ToolNotFound`]; a binary that
/// ran and exited non-zero as [`VcsError::CommandFailed`] carrying its stderr.
pub(crate) fn run(dir: &Path, program: &str, args: &[&str]) -> Result<String, VcsError> {
    let command = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");

    tracing::debug!("Running `{}` in {}", command, dir.display());

    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => VcsError::ToolNotFound {
                tool: program.to_string(),
            },
            _ => VcsError::Io {
                path: dir.to_path_buf(),
                source: e,
            },
        })?;

    if !output.status.success() {
        return Err(VcsError::CommandFailed {
            command,
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Splits tool output into trimmed, non-empty lines.
pub(crate) fn lines(output: &str) -> impl Iterator<Item = &str> {
    output
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
}
