mod common;

use common::{write_file, FakeDriver, FakeMigrator, SQLITE_CONFIG};
use straight_gateway::addons::{AddonError, AddonLoader, AddonRegistry};
use straight_gateway::config::ConfigError;
use straight_gateway::db::migration::MigrationError;
use straight_gateway::db::ConnectionError;
use straight_gateway::{Startup, StartupError, StartupPaths};

fn paths(config_dir: &std::path::Path) -> StartupPaths {
    StartupPaths::new(config_dir)
}

#[tokio::test]
async fn test_first_run_scaffolds_and_stops() {
    let tmp = tempfile::tempdir().unwrap();
    let config_dir = tmp.path().join("straight");
    let driver = FakeDriver::default();
    let migrator = FakeMigrator::new(true);

    let mut notices: Vec<u8> = Vec::new();
    let err = Startup::new(paths(&config_dir), driver.clone(), migrator.clone())
        .prepare(&mut notices)
        .await
        .err()
        .unwrap();

    assert!(matches!(err, StartupError::FirstRun { ref config_path } if config_path == &config_dir.join("config.yml")));
    assert_eq!(err.exit_code(), 0);
    assert!(config_dir.join("config.yml").exists());
    assert!(config_dir.join("addons.yml").exists());
    assert_eq!(driver.connect_count(), 0);
    assert_eq!(migrator.run_count(), 0);

    let notices = String::from_utf8(notices).unwrap();
    assert!(notices.contains("NOTICE!"));
    assert!(notices.contains("WARNING!"));
    assert!(notices.trim_end().ends_with("Shutting down now."));
}

#[tokio::test]
async fn test_second_run_uses_template_config() {
    let tmp = tempfile::tempdir().unwrap();
    let config_dir = tmp.path().join("straight");

    let first = Startup::new(paths(&config_dir), FakeDriver::default(), FakeMigrator::new(true))
        .prepare(&mut std::io::sink())
        .await;
    assert!(matches!(first, Err(StartupError::FirstRun { .. })));

    let driver = FakeDriver::default();
    let server = Startup::new(paths(&config_dir), driver.clone(), FakeMigrator::new(true))
        .prepare(&mut std::io::sink())
        .await
        .unwrap();

    let expected = config_dir.join("straight.db");
    assert_eq!(driver.last_target(), Some(format!("sqlite://{}", expected.display())));
    assert_eq!(server.db().target, format!("sqlite://{}", expected.display()));
    assert_eq!(server.logger().file, config_dir.join("straight.log"));
}

#[tokio::test]
async fn test_migrations_applied_once() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "config.yml", SQLITE_CONFIG);
    let migrator = FakeMigrator::new(true);

    for _ in 0..3 {
        Startup::new(paths(tmp.path()), FakeDriver::default(), migrator.clone())
            .prepare(&mut std::io::sink())
            .await
            .unwrap();
    }
    assert_eq!(migrator.run_count(), 1);
}

#[tokio::test]
async fn test_current_schema_is_not_migrated() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "config.yml", SQLITE_CONFIG);
    let migrator = FakeMigrator::new(false);

    Startup::new(paths(tmp.path()), FakeDriver::default(), migrator.clone())
        .prepare(&mut std::io::sink())
        .await
        .unwrap();
    assert_eq!(migrator.run_count(), 0);
}

#[tokio::test]
async fn test_invalid_config_stops_before_connecting() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "config.yml", "db:\n  adapter: sqlite\n");
    write_file(tmp.path(), "addons.yml", "");
    let driver = FakeDriver::default();

    let err = Startup::new(paths(tmp.path()), driver.clone(), FakeMigrator::new(true))
        .prepare(&mut std::io::sink())
        .await
        .err()
        .unwrap();

    assert_eq!(err.exit_code(), 1);
    let errors = match err {
        StartupError::Config(ConfigError::Validation(errors)) => errors,
        other => panic!("expected a validation error, got {other}"),
    };
    assert!(errors.iter().any(|e| e.to_string().contains("logmaster")));
    assert_eq!(driver.connect_count(), 0);
}

#[tokio::test]
async fn test_unknown_keys_reach_settings() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(
        tmp.path(),
        "config.yml",
        &format!("{SQLITE_CONFIG}gateway_currency: BTC\n"),
    );

    let server = Startup::new(paths(tmp.path()), FakeDriver::default(), FakeMigrator::new(false))
        .prepare(&mut std::io::sink())
        .await
        .unwrap();
    assert_eq!(server.settings().get_str("gateway_currency").as_deref(), Some("BTC"));
    assert_eq!(server.routes().len(), 1);
    assert!(server.routes().resolve("/gateways/1/orders").is_some());
}

#[tokio::test]
async fn test_addons_from_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "config.yml", SQLITE_CONFIG);
    write_file(tmp.path(), "addons.yml", "status:\n  module: Status\n");

    let mut server = Startup::new(paths(tmp.path()), FakeDriver::default(), FakeMigrator::new(false))
        .prepare(&mut std::io::sink())
        .await
        .unwrap();
    let loader = AddonLoader::new(AddonRegistry::with_builtins(), tmp.path());

    assert_eq!(server.load_addons(&loader).unwrap(), ["status".to_string()]);
    assert_eq!(server.routes().len(), 2);
    assert!(server.routes().resolve("/status").is_some());
}

#[tokio::test]
async fn test_failing_addon_names_itself() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "config.yml", SQLITE_CONFIG);
    write_file(
        tmp.path(),
        "addons.yml",
        "status:\n  module: Status\npayouts:\n  module: Payouts\n",
    );

    let mut server = Startup::new(paths(tmp.path()), FakeDriver::default(), FakeMigrator::new(false))
        .prepare(&mut std::io::sink())
        .await
        .unwrap();
    let loader = AddonLoader::new(AddonRegistry::with_builtins(), tmp.path());

    let err = server.load_addons(&loader).unwrap_err();
    assert!(matches!(err, AddonError::UnknownModule { ref addon, .. } if addon == "payouts"));
    assert!(StartupError::from(err).to_string().contains("payouts"));
    assert_eq!(server.routes().len(), 1);
    assert!(server.addons().is_empty());
}

#[tokio::test]
async fn test_connection_failure_stops_before_migrations() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "config.yml", SQLITE_CONFIG);
    let driver = FakeDriver::unreachable();
    let migrator = FakeMigrator::new(true);

    let err = Startup::new(paths(tmp.path()), driver.clone(), migrator.clone())
        .prepare(&mut std::io::sink())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, StartupError::Connection(ConnectionError::Connect { .. })));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(driver.connect_count(), 1);
    assert_eq!(migrator.checks.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(migrator.run_count(), 0);
}

#[tokio::test]
async fn test_migration_failure_aborts_startup() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "config.yml", SQLITE_CONFIG);
    let migrator = FakeMigrator::failing();

    let err = Startup::new(paths(tmp.path()), FakeDriver::default(), migrator.clone())
        .prepare(&mut std::io::sink())
        .await
        .err()
        .unwrap();

    assert!(matches!(err, StartupError::Migration(MigrationError::Engine(_))));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(migrator.run_count(), 1);
}

#[tokio::test]
async fn test_addons_load_only_once() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "config.yml", SQLITE_CONFIG);
    write_file(tmp.path(), "addons.yml", "status:\n  module: Status\n");

    let mut server = Startup::new(paths(tmp.path()), FakeDriver::default(), FakeMigrator::new(false))
        .prepare(&mut std::io::sink())
        .await
        .unwrap();
    let loader = AddonLoader::new(AddonRegistry::with_builtins(), tmp.path());

    server.load_addons(&loader).unwrap();
    let err = server.load_addons(&loader).unwrap_err();
    assert!(matches!(err, AddonError::AlreadyLoaded));
    assert_eq!(server.routes().len(), 2);
    assert_eq!(server.addons(), ["status".to_string()]);
}

#[tokio::test]
async fn test_sqlite3_database_resolved_under_config_dir() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(
        tmp.path(),
        "config.yml",
        &SQLITE_CONFIG.replace("adapter: sqlite", "adapter: sqlite3"),
    );
    let driver = FakeDriver::default();

    Startup::new(paths(tmp.path()), driver.clone(), FakeMigrator::new(false))
        .prepare(&mut std::io::sink())
        .await
        .unwrap();
    let expected = tmp.path().join("gateway.db");
    assert_eq!(driver.last_target(), Some(format!("sqlite3://{}", expected.display())));
}
