//! Loading the configuration files shipped in `config/`.

use deployer_core::config::{ConfigManager, ConfigurationError};
use deployer_core::orchestration::DeployerContext;
use deployer_core::templates::DeploymentTarget;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn shipped_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

#[test]
fn test_base_configuration_matches_defaults() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "development")
            .unwrap();
    let config = manager.config();

    assert_eq!(manager.environment(), "development");
    assert_eq!(config.deployer.max_attempts, 600);
    assert_eq!(config.deployer.du_attempts, 500);
    assert_eq!(config.deployer.max_wait_interval, None);
    assert_eq!(
        DeploymentTarget::from_tags(&config.api.image_format, &config.worker.image_storage)
            .unwrap(),
        DeploymentTarget::ContainerImage
    );
}

#[test]
fn test_test_environment_shrinks_budgets() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "test").unwrap();
    let config = manager.config();

    assert_eq!(config.deployer.max_attempts, 10);
    assert_eq!(config.deployer.du_attempts, 5);
    assert_eq!(config.deployer.growth_factor, 1.1);
    assert_eq!(config.database.max_connections, 5);

    let probe = config.probe_policy();
    assert_eq!(probe.retry_interval, Duration::from_millis(10));
}

#[test]
fn test_production_targets_vm_images_with_ceiling() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "production")
            .unwrap();
    let config = manager.config();

    assert_eq!(
        DeploymentTarget::from_tags(&config.api.image_format, &config.worker.image_storage)
            .unwrap(),
        DeploymentTarget::VmImage
    );
    assert_eq!(config.deployer.flavor, "m1.medium");
    assert_eq!(config.deployer.image, "coreos");
    assert_eq!(
        config.poll_policy().max_interval,
        Some(Duration::from_secs(30))
    );
}

#[test]
fn test_unsupported_combination_loads_but_cannot_be_targeted() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("deployer-config.yaml"),
        "api:\n  image_format: vm\nworker:\n  image_storage: glance\n",
    )
    .unwrap();

    let manager =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
            .unwrap();
    let config = manager.config();

    let err = DeploymentTarget::from_tags(&config.api.image_format, &config.worker.image_storage)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "image_storage glance not supported with image_format vm"
    );
}

#[test]
fn test_ceiling_below_wait_interval_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("deployer-config.yaml"),
        "deployer:\n  wait_interval: 5.0\n  max_wait_interval: 2.0\n",
    )
    .unwrap();

    let result =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test");

    match result {
        Err(ConfigurationError::InvalidValue { field, .. }) => {
            assert_eq!(field, "deployer.max_wait_interval");
        }
        other => panic!("expected an invalid value error, got {other:?}"),
    }
}

#[test]
fn test_prepared_config_installs_file_logging() {
    let dir = TempDir::new().unwrap();
    let log_dir = dir.path().join("logs");
    fs::write(
        dir.path().join("deployer-config.yaml"),
        format!("deployer:\n  deployer_log_dir: {}\n", log_dir.display()),
    )
    .unwrap();

    let manager =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
            .unwrap();
    let config = DeployerContext::prepare_config(&manager).unwrap();

    assert_eq!(config.deployer.deployer_log_dir, log_dir);
    assert!(log_dir.is_dir());
}
