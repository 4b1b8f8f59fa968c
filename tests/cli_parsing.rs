use std::path::PathBuf;

use clap::Parser;

use signal_lab::adapters::DriverKind;
use signal_lab::cli::commands::config::ConfigCommands;
use signal_lab::cli::commands::known_config::KnownConfigCommands;
use signal_lab::cli::{Cli, Commands};
use signal_lab::domain::models::{OutputFormat, RepairPlatform};

#[test]
fn test_parse_verify() {
    let cli = Cli::try_parse_from([
        "signal-lab",
        "verify",
        "https://store.labessentials.com",
        "--revenue",
        "50000",
        "--ad-spend",
        "5000",
        "--max-iterations",
        "3",
    ])
    .unwrap();

    assert!(!cli.json);
    match cli.command {
        Commands::Verify(args) => {
            assert_eq!(args.url, "https://store.labessentials.com");
            assert_eq!(args.revenue, Some(50_000.0));
            assert_eq!(args.ad_spend, Some(5_000.0));
            assert_eq!(args.max_iterations, Some(3));
            assert_eq!(args.delay_ms, None);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "signal-lab",
        "audit",
        "https://shop.example.com",
        "--json",
        "--driver",
        "scripted",
        "--config",
        "custom.yaml",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(cli.driver, Some(DriverKind::Scripted));
    assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
    match cli.command {
        Commands::Audit(args) => {
            assert_eq!(args.url, "https://shop.example.com");
            assert_eq!(args.revenue, None);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_repair_overrides() {
    let cli = Cli::try_parse_from([
        "signal-lab",
        "repair",
        "reports/revenue-audit-1.json",
        "--platform",
        "woocommerce",
        "--format",
        "js",
    ])
    .unwrap();

    match cli.command {
        Commands::Repair(args) => {
            assert_eq!(args.audit_file, PathBuf::from("reports/revenue-audit-1.json"));
            assert_eq!(args.platform, Some(RepairPlatform::Woocommerce));
            assert_eq!(args.format, Some(OutputFormat::Js));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_unknown_platform_rejected() {
    let result = Cli::try_parse_from([
        "signal-lab",
        "repair",
        "audit.json",
        "--platform",
        "magento",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_parse_known_config_check() {
    let cli = Cli::try_parse_from([
        "signal-lab",
        "known-config",
        "check",
        "https://lwscientific.com",
    ])
    .unwrap();

    match cli.command {
        Commands::KnownConfig(args) => match args.command {
            KnownConfigCommands::Check { url } => assert_eq!(url, "https://lwscientific.com"),
            KnownConfigCommands::List => panic!("Wrong known-config command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_config_show() {
    let cli = Cli::try_parse_from(["signal-lab", "config", "show"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config(args) if matches!(args.command, ConfigCommands::Show)
    ));
}

#[test]
fn test_verify_requires_url() {
    assert!(Cli::try_parse_from(["signal-lab", "verify"]).is_err());
}
