// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Installer used when `runtime.installer_url` is not configured
pub const DEFAULT_INSTALLER_URL: &str =
    "https://repo.anaconda.com/miniconda/Miniconda3-latest-Linux-x86_64.sh";
/// Directory name under `$HOME` for the distribution manager
pub const DEFAULT_INSTALL_DIR_NAME: &str = "miniconda3";
/// Fallback install root when `$HOME` is unset
pub const FALLBACK_INSTALL_ROOT: &str = "/opt";

pub const DEFAULT_ENVIRONMENT_NAME: &str = "sglang";
pub const DEFAULT_PYTHON_VERSION: &str = "3.10";

pub const DEFAULT_ACCELERATOR_TOOLKIT: &str = "12.1";
/// Wheel index for the numerical library; `{toolkit}` becomes e.g. `121`
pub const DEFAULT_INDEX_URL_TEMPLATE: &str = "https://download.pytorch.org/whl/cu{toolkit}";
pub const TOOLKIT_PLACEHOLDER: &str = "{toolkit}";
pub const DEFAULT_NUMERICAL_PACKAGE: &str = "torch";
pub const DEFAULT_SERVING_PACKAGE: &str = "sglang[all]";

pub const DEFAULT_SERVER_MODULE: &str = "sglang.launch_server";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 30000;
pub const DEFAULT_TENSOR_PARALLEL: u32 = 1;
pub const DEFAULT_DTYPE: &str = "auto";
pub const DEFAULT_MEM_FRACTION: f64 = 0.85;
pub const DEFAULT_MAX_RUNNING_REQUESTS: u32 = 64;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log levels accepted by the server's `--log-level` flag
pub const SERVER_LOG_LEVELS: [&str; 5] = ["debug", "info", "warning", "error", "critical"];

/// OS packages installed when `system.packages` is not configured
pub const DEFAULT_SYSTEM_PACKAGES: [&str; 3] = ["wget", "git", "build-essential"];
