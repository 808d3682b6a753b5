// src/stages/source.rs

//! Pipeline sources reading from a [`FileSystem`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result as AnyResult;
use tracing::debug;

use crate::context::Context;
use crate::errors::{Result, SlurpError};
use crate::fs::FileSystem;
use crate::pipeline::channel::channel;
use crate::pipeline::{File, Pipe};
use crate::stages::NameMatcher;

/// Yield every file under `root` whose root-relative path matches at least
/// one positive pattern and no `!`-prefixed pattern.
///
/// Patterns match whole `/`-separated paths: `src/*.rs` only matches files
/// directly in `src`, `src/**/*.rs` matches them at any depth.
///
/// Each file is yielded once, in path order, with its root-relative path.
/// Files are only read when the consumer is ready for them. Unreadable
/// files are logged and skipped.
pub fn glob(
    ctx: &Context,
    fs: Arc<dyn FileSystem>,
    root: impl Into<PathBuf>,
    patterns: &[&str],
) -> Result<Pipe> {
    let matchers = patterns
        .iter()
        .map(|p| NameMatcher::path(p))
        .collect::<Result<Vec<_>>>()?;
    if !matchers.iter().any(|m| !m.is_negative()) {
        return Err(SlurpError::ConfigError(
            "glob source needs at least one non-negated pattern".to_string(),
        ));
    }

    let root = root.into();
    let ctx = ctx.clone();
    let (output, inlet) = channel();

    tokio::spawn(async move {
        let walk_fs = Arc::clone(&fs);
        let walk_root = root.clone();
        let found = tokio::task::spawn_blocking(move || {
            collect_matching_files(walk_fs.as_ref(), &walk_root, &matchers)
        })
        .await;

        let paths = match found {
            Ok(Ok(paths)) => paths,
            Ok(Err(err)) => {
                ctx.log()
                    .error(format_args!("walking {}: {err:#}", root.display()));
                return;
            }
            Err(join_err) => {
                ctx.log().error(format_args!("glob walker failed: {join_err}"));
                return;
            }
        };

        debug!(root = %root.display(), count = paths.len(), "glob source matched files");

        for rel in paths {
            let read_fs = Arc::clone(&fs);
            let full = root.join(&rel);
            let bytes = match tokio::task::spawn_blocking(move || read_fs.read(&full)).await {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(err)) => {
                    ctx.log().error(format_args!("{err:#}"));
                    continue;
                }
                Err(join_err) => {
                    ctx.log().error(format_args!("reading {}: {join_err}", rel.display()));
                    continue;
                }
            };

            if let Err(file) = output.send(File::from_bytes(rel, bytes)).await {
                let _ = file.close();
                break;
            }
        }
    });

    Ok(Pipe::from(inlet))
}

/// Walk `root` and collect root-relative paths accepted by `matchers`.
fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    matchers: &[NameMatcher],
) -> AnyResult<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if accepts(matchers, &rel_str) {
                        files.insert(rel.to_path_buf());
                    }
                }
            }
        }
    }

    Ok(files)
}

fn accepts(matchers: &[NameMatcher], rel_path: &str) -> bool {
    let included = matchers
        .iter()
        .any(|m| !m.is_negative() && m.glob_matches(rel_path));
    let excluded = matchers
        .iter()
        .any(|m| m.is_negative() && m.glob_matches(rel_path));
    included && !excluded
}
