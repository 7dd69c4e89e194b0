//! Integration tests for layered configuration read from the process
//! environment and real config files.

use scrivo::config::{ConfigLoader, ConfigSource, PROJECT_CONFIG_FILE, PartialConfig};
use scrivo::prompt::PrivacyLevel;
use scrivo::{ConfigError, GitmojiMode, Provider};
use serial_test::serial;

const CLEARED: [(&str, Option<&str>); 4] = [
    ("SCRIVO_PROVIDER", None),
    ("SCRIVO_PRIVACY", None),
    ("SCRIVO_GITMOJI", None),
    ("SCRIVO_TIMEOUT", None),
];

fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
    let mut all: Vec<(&str, Option<&str>)> = CLEARED
        .iter()
        .filter(|(key, _)| !vars.iter().any(|(k, _)| k == key))
        .copied()
        .collect();
    all.extend_from_slice(vars);
    temp_env::with_vars(all, f);
}

#[test]
#[serial]
fn test_global_project_env_and_cli_layers() {
    let xdg = tempfile::tempdir().unwrap();
    let global_dir = xdg.path().join("scrivo");
    std::fs::create_dir_all(&global_dir).unwrap();
    std::fs::write(
        global_dir.join("config.toml"),
        "privacy = \"low\"\nstyle_samples = 10\ngitmoji = true\n",
    )
    .unwrap();

    let project = tempfile::tempdir().unwrap();
    std::fs::write(
        project.path().join(PROJECT_CONFIG_FILE),
        "privacy = \"high\"\ngitmoji_mode = \"gitmoji\"\n",
    )
    .unwrap();

    let xdg_path = xdg.path().to_string_lossy().to_string();
    with_env(
        &[
            ("XDG_CONFIG_HOME", Some(xdg_path.as_str())),
            ("SCRIVO_GITMOJI", Some("false")),
            ("SCRIVO_TIMEOUT", Some("45")),
        ],
        || {
            let cli = PartialConfig {
                provider: Some(Provider::Stub),
                ..Default::default()
            };
            let resolved = ConfigLoader::new(Some(project.path())).load(&cli).unwrap();
            let config = &resolved.config;

            assert_eq!(config.style_samples, 10);
            assert_eq!(resolved.source("style_samples"), ConfigSource::GlobalFile);

            assert_eq!(config.privacy, PrivacyLevel::High);
            assert_eq!(resolved.source("privacy"), ConfigSource::ProjectFile);
            assert_eq!(config.gitmoji_mode, GitmojiMode::Gitmoji);

            assert!(!config.gitmoji);
            assert_eq!(resolved.source("gitmoji"), ConfigSource::Environment);
            assert_eq!(config.timeout_secs, 45);

            assert_eq!(config.provider, Provider::Stub);
            assert_eq!(resolved.source("provider"), ConfigSource::Cli);

            assert_eq!(config.max_title_length, 72);
            assert_eq!(resolved.source("max_title_length"), ConfigSource::Default);
        },
    );
}

#[test]
#[serial]
fn test_environment_is_snapshotted_at_construction() {
    let empty = tempfile::tempdir().unwrap();
    let empty_path = empty.path().to_string_lossy().to_string();
    with_env(
        &[
            ("XDG_CONFIG_HOME", Some(empty_path.as_str())),
            ("SCRIVO_PROVIDER", Some("codex")),
        ],
        || {
            let loader = ConfigLoader::new(None);
            temp_env::with_var("SCRIVO_PROVIDER", Some("stub"), || {
                let resolved = loader.load(&PartialConfig::default()).unwrap();
                assert_eq!(resolved.config.provider, Provider::Codex);
            });
        },
    );
}

#[test]
#[serial]
fn test_bad_environment_value_is_an_error() {
    let empty = tempfile::tempdir().unwrap();
    let empty_path = empty.path().to_string_lossy().to_string();
    with_env(
        &[
            ("XDG_CONFIG_HOME", Some(empty_path.as_str())),
            ("SCRIVO_PRIVACY", Some("secret")),
        ],
        || {
            let err = ConfigLoader::new(None)
                .load(&PartialConfig::default())
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidEnv { .. }));
            assert!(err.to_string().contains("SCRIVO_PRIVACY"));
        },
    );
}

#[test]
#[serial]
fn test_unparsable_project_file_is_an_error() {
    let empty = tempfile::tempdir().unwrap();
    let empty_path = empty.path().to_string_lossy().to_string();
    let project = tempfile::tempdir().unwrap();
    std::fs::write(project.path().join(PROJECT_CONFIG_FILE), "privacy = [").unwrap();

    with_env(&[("XDG_CONFIG_HOME", Some(empty_path.as_str()))], || {
        let err = ConfigLoader::new(Some(project.path()))
            .load(&PartialConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    });
}
