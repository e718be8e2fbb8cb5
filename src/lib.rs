// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // process + download backends
pub mod config;     // YAML config, overrides, validation
pub mod engine;     // sequential workflow executor
pub mod errors;     // error handling
pub mod observability;
pub mod stages;     // provisioning and launch stages
pub mod traits;     // unified abstractions
