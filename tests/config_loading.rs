use std::io::Write;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use slurp::cli::{CliArgs, LogLevel};
use slurp::config::{ConfigFile, RawConfigFile, SessionConfig, load_and_validate, load_or_default};
use slurp::errors::SlurpError;
use slurp::logging::{build_filter, parse_level_str};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_session_section_is_loaded() {
    let file = write_config(
        r#"
[session]
default_task = "all"
shutdown_timeout_secs = 5
poll_interval_ms = 250
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let session = cfg.session();

    assert_eq!(session.default_task, "all");
    assert_eq!(session.shutdown_timeout(), Duration::from_secs(5));
    assert_eq!(session.poll_interval(), Duration::from_millis(250));
}

#[test]
fn missing_keys_fall_back_to_defaults() {
    let empty = write_config("");
    let partial = write_config("[session]\nshutdown_timeout_secs = 3\n");

    let empty = load_and_validate(empty.path()).unwrap();
    let partial = load_and_validate(partial.path()).unwrap();

    assert_eq!(empty.session(), &SessionConfig::default());
    assert_eq!(empty.session().default_task, "default");
    assert_eq!(empty.session().shutdown_timeout(), Duration::from_secs(30));
    assert_eq!(empty.session().poll_interval(), Duration::from_secs(1));
    assert_eq!(partial.session().shutdown_timeout_secs, 3);
    assert_eq!(partial.session().poll_interval_ms, 1000);
}

#[test]
fn zero_timeout_is_rejected() {
    let file = write_config("[session]\nshutdown_timeout_secs = 0\n");

    let err = load_and_validate(file.path()).unwrap_err();

    assert!(matches!(err, SlurpError::ConfigError(ref msg) if msg.contains("shutdown_timeout_secs")));
}

#[test]
fn poll_interval_longer_than_timeout_is_rejected() {
    let file = write_config("[session]\nshutdown_timeout_secs = 1\npoll_interval_ms = 1500\n");

    let err = load_and_validate(file.path()).unwrap_err();

    assert!(matches!(err, SlurpError::ConfigError(ref msg) if msg.contains("poll_interval_ms")));
}

#[test]
fn blank_default_task_is_rejected() {
    let raw = RawConfigFile {
        session: SessionConfig {
            default_task: "  ".to_string(),
            ..SessionConfig::default()
        },
    };

    assert!(ConfigFile::try_from(raw).is_err());
}

#[test]
fn unknown_keys_are_parse_errors() {
    let file = write_config("[session]\nshutdown_timeout = 3\n");

    let err = load_and_validate(file.path()).unwrap_err();

    assert!(matches!(err, SlurpError::TomlError(_)));
    assert!(err.is_configuration());
}

#[test]
fn explicit_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("Nope.toml");

    let err = load_or_default(Some(Path::new(&missing))).unwrap_err();

    assert!(matches!(err, SlurpError::IoError(_)));
}

#[test]
fn configured_default_task_becomes_the_root() {
    let file = write_config("[session]\ndefault_task = \"all\"\n");
    let cfg = load_or_default(Some(file.path())).unwrap();

    let b = slurp::Build::with_config(cfg.session().clone());

    assert_eq!(b.registry().root_task(), "all");
    assert_eq!(b.config().default_task, "all");
}

#[test]
fn cli_accepts_tasks_and_flags() {
    let args = CliArgs::try_parse_from([
        "slurp",
        "--list",
        "--config",
        "ci/Slurp.toml",
        "--log-level",
        "debug",
        "build",
        "test",
    ])
    .unwrap();

    assert_eq!(args.tasks, vec!["build", "test"]);
    assert!(args.list);
    assert!(!args.dry_run);
    assert_eq!(args.config.as_deref(), Some("ci/Slurp.toml"));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
}

#[test]
fn log_level_names_are_parsed_leniently() {
    assert_eq!(parse_level_str(" WARNING "), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("trace"), Some(tracing::Level::TRACE));
    assert_eq!(parse_level_str("loud"), None);
}

#[test]
fn log_filter_prefers_flag_then_env_directives() {
    let shown = |filter: tracing_subscriber::EnvFilter| filter.to_string().to_lowercase();

    assert_eq!(shown(build_filter(Some(LogLevel::Debug), Some("trace"))), "debug");
    assert_eq!(shown(build_filter(None, Some(" WARNING "))), "warn");
    assert_eq!(shown(build_filter(None, None)), "info");

    let directives = shown(build_filter(None, Some("slurp::task=warn,slurp=debug")));
    assert!(directives.contains("slurp::task=warn"), "{directives}");
    assert!(directives.contains("slurp=debug"), "{directives}");
}
