// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use crate::config::{load_and_validate_config, ConfigOverrides, FlagValue};
    use crate::errors::ConfigError;
    use crate::stages::launcher::LaunchCommand;

    /// The current deployment configuration loads and validates
    #[test]
    fn test_launch_yaml_loading() {
        let config =
            load_and_validate_config("configs/launch.yaml", &ConfigOverrides::default()).unwrap();

        assert_eq!(config.environment.name, "sglang");
        assert_eq!(config.packages.accelerator_toolkit, "12.1");
        assert_eq!(config.packages.numerical.requirement(), "torch==2.4.0");
        assert_eq!(config.packages.serving.requirement(), "sglang[all]==0.3.0");
        assert_eq!(config.packages.extra_index_urls.len(), 1);
        assert_eq!(config.server.tensor_parallel, 2);
        assert_eq!(config.server.port, 30000);
        assert_eq!(config.system.privilege_command.as_deref(), Some("sudo"));
        assert_eq!(
            config.server.extra_flags.get("max-total-tokens"),
            Some(&FlagValue::Integer(8192))
        );
    }

    /// The older variant differs only in versions and tuning flags
    #[test]
    fn test_cu118_yaml_loading() {
        let config =
            load_and_validate_config("configs/launch-cu118.yaml", &ConfigOverrides::default())
                .unwrap();

        assert_eq!(
            config.packages.numerical_index_url(),
            "https://download.pytorch.org/whl/cu118"
        );
        assert_eq!(config.packages.numerical.requirement(), "torch");
        assert_eq!(config.server.env.get("CUDA_VISIBLE_DEVICES").map(String::as_str), Some("0,1"));

        let launch = LaunchCommand::from_config(&config.server);
        assert!(launch.args().contains(&"--disable-radix-cache".to_string()));
        assert!(launch.args().contains(&"--schedule-conservativeness".to_string()));
    }

    /// Both variants share the same workflow and fixed flag set
    #[test]
    fn test_variants_share_fixed_flags() {
        let current =
            load_and_validate_config("configs/launch.yaml", &ConfigOverrides::default()).unwrap();
        let legacy =
            load_and_validate_config("configs/launch-cu118.yaml", &ConfigOverrides::default())
                .unwrap();

        let flags = |args: &[String]| -> Vec<String> {
            args.iter()
                .filter(|a| a.starts_with("--"))
                .take(9)
                .cloned()
                .collect()
        };
        let current_launch = LaunchCommand::from_config(&current.server);
        let legacy_launch = LaunchCommand::from_config(&legacy.server);
        assert_eq!(flags(current_launch.args()), flags(legacy_launch.args()));
    }

    /// CLI overrides are validated like file values
    #[test]
    fn test_invalid_override_is_reported() {
        let overrides = ConfigOverrides {
            tensor_parallel: Some(0),
            ..Default::default()
        };
        let result = load_and_validate_config("configs/launch.yaml", &overrides);

        match result {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].to_string().contains("server.tensor_parallel"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "server: [not, a, map]\n").unwrap();

        let result = load_and_validate_config(&path, &ConfigOverrides::default());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
