use assetflow::cli::{CliArgs, Command, LogLevel};
use assetflow::logging::resolve_level;
use clap::Parser;
use tracing::Level;

#[test]
fn cli_level_wins_over_env() {
    assert_eq!(resolve_level(Some(LogLevel::Warn), Some("trace")), Level::WARN);
}

#[test]
fn env_level_is_parsed_loosely() {
    assert_eq!(resolve_level(None, Some(" DEBUG ")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some("warning")), Level::WARN);
}

#[test]
fn unknown_or_missing_env_defaults_to_info() {
    assert_eq!(resolve_level(None, Some("chatty")), Level::INFO);
    assert_eq!(resolve_level(None, None), Level::INFO);
}

#[test]
fn no_subcommand_means_build_with_the_default_config() {
    let args = CliArgs::try_parse_from(["assetflow"]).unwrap();
    assert_eq!(args.config, "Assetfile.toml");
    assert!(args.command.is_none());
    assert!(args.log_level.is_none());
}

#[test]
fn global_flags_work_after_the_subcommand() {
    let args = CliArgs::try_parse_from([
        "assetflow",
        "build",
        "--cleanup-tmpdir",
        "--config",
        "site/Assetfile.toml",
        "--log-level",
        "debug",
    ])
    .unwrap();

    assert_eq!(args.config, "site/Assetfile.toml");
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(matches!(args.command, Some(Command::Build { cleanup_tmpdir: true })));
}

#[test]
fn watch_takes_a_debounce() {
    let args = CliArgs::try_parse_from(["assetflow", "watch"]).unwrap();
    assert!(matches!(args.command, Some(Command::Watch { debounce_ms: 200 })));

    let args = CliArgs::try_parse_from(["assetflow", "watch", "--debounce-ms", "50"]).unwrap();
    assert!(matches!(args.command, Some(Command::Watch { debounce_ms: 50 })));
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(CliArgs::try_parse_from(["assetflow", "deploy"]).is_err());
    assert!(matches!(
        CliArgs::try_parse_from(["assetflow", "plan"]).unwrap().command,
        Some(Command::Plan)
    ));
    assert!(matches!(
        CliArgs::try_parse_from(["assetflow", "clean"]).unwrap().command,
        Some(Command::Clean)
    ));
}
