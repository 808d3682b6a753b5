// src/stages/mod.rs

//! Reusable pipeline stages and sources.

pub mod source;

use globset::{Glob, GlobBuilder, GlobMatcher};

use crate::context::Context;
use crate::errors::{Result, SlurpError};
use crate::pipeline::{File, Inlet, Outlet, Stage};

/// Drop (and close) every file for which `reject` returns true; pass the
/// rest through unchanged.
pub fn filter_fn<F>(ctx: &Context, mut reject: F) -> impl Stage + use<F>
where
    F: FnMut(&File) -> bool + Send + 'static,
{
    let ctx = ctx.clone();
    move |mut input: Inlet, output: Outlet| async move {
        while let Some(file) = input.recv().await {
            if reject(&file) {
                let name = file.name();
                if let Err(err) = file.close() {
                    ctx.log().error(format_args!("closing {name}: {err}"));
                }
                continue;
            }
            if let Err(file) = output.send(file).await {
                let _ = file.close();
                break;
            }
        }
    }
}

/// Drop files whose name matches the glob `pattern`.
///
/// A leading `!` negates the pattern: `"!*.js"` drops everything that is
/// not a `.js` file.
pub fn filter(ctx: &Context, pattern: &str) -> Result<impl Stage + use<>> {
    let matcher = NameMatcher::new(pattern)?;
    Ok(filter_fn(ctx, move |file| matcher.matches(&file.name())))
}

/// Pass every file through `f`.
pub fn map<F>(mut f: F) -> impl Stage
where
    F: FnMut(File) -> File + Send + 'static,
{
    move |mut input: Inlet, output: Outlet| async move {
        while let Some(file) = input.recv().await {
            if let Err(file) = output.send(f(file)).await {
                let _ = file.close();
                break;
            }
        }
    }
}

/// Concatenate every input into a single in-memory file called `name`,
/// each input followed by a newline. Inputs are closed as they are read.
pub fn concat(ctx: &Context, name: &str) -> impl Stage + use<> {
    let ctx = ctx.clone();
    let name = name.to_string();
    move |mut input: Inlet, output: Outlet| async move {
        let mut joined = Vec::new();
        while let Some(mut file) = input.recv().await {
            ctx.log()
                .info(format_args!("Adding {} to {}", file.path().display(), name));
            match file.read_to_end().await {
                Ok(bytes) => joined.extend_from_slice(&bytes),
                Err(err) => {
                    ctx.log()
                        .error(format_args!("reading {}: {err}", file.path().display()));
                    return;
                }
            }
            joined.push(b'\n');
            if let Err(err) = file.close() {
                ctx.log().error(format_args!("closing file: {err}"));
            }
        }

        if let Err(file) = output.send(File::from_bytes(name, joined)).await {
            let _ = file.close();
        }
    }
}

/// Log every file's path and size and pass it through.
pub fn list(ctx: &Context) -> impl Stage + use<> {
    let ctx = ctx.clone();
    move |mut input: Inlet, output: Outlet| async move {
        while let Some(file) = input.recv().await {
            match file.size() {
                Some(size) => ctx
                    .log()
                    .info(format_args!("File: {} ({size} bytes)", file.path().display())),
                None => ctx.log().info(format_args!("File: {}", file.path().display())),
            }
            if let Err(file) = output.send(file).await {
                let _ = file.close();
                break;
            }
        }
    }
}

/// Glob matcher with optional `!` negation.
#[derive(Debug, Clone)]
pub(crate) struct NameMatcher {
    matcher: GlobMatcher,
    negative: bool,
}

impl NameMatcher {
    /// Matcher for bare file names; `*` may match any character.
    pub(crate) fn new(pattern: &str) -> Result<Self> {
        let (negative, glob) = split_negation(pattern);
        let matcher = Glob::new(glob)
            .map_err(|e| invalid_pattern(pattern, e))?
            .compile_matcher();
        Ok(Self { matcher, negative })
    }

    /// Matcher for `/`-separated relative paths: `*` and `?` stay within
    /// one path component, only `**` crosses directories.
    pub(crate) fn path(pattern: &str) -> Result<Self> {
        let (negative, glob) = split_negation(pattern);
        let matcher = GlobBuilder::new(glob)
            .literal_separator(true)
            .build()
            .map_err(|e| invalid_pattern(pattern, e))?
            .compile_matcher();
        Ok(Self { matcher, negative })
    }

    pub(crate) fn is_negative(&self) -> bool {
        self.negative
    }

    /// Whether the bare glob matches, ignoring negation.
    pub(crate) fn glob_matches(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        self.glob_matches(name) != self.negative
    }
}

fn split_negation(pattern: &str) -> (bool, &str) {
    match pattern.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    }
}

fn invalid_pattern(pattern: &str, err: globset::Error) -> SlurpError {
    SlurpError::ConfigError(format!("invalid glob pattern {pattern}: {err}"))
}
