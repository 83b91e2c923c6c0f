// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Viewport tuning knobs.
//!
//! Defaults match the interactive front end; every knob can be overridden through a
//! `DISVIEW_*` environment variable or a builder setter.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub const ENV_BATCH_SIZE: &str = "DISVIEW_BATCH_SIZE";
pub const ENV_PASS_CAP: &str = "DISVIEW_PASS_CAP";
pub const ENV_SCROLL_THRESHOLD: &str = "DISVIEW_SCROLL_THRESHOLD";
pub const ENV_PREVIEW_LINES: &str = "DISVIEW_PREVIEW_LINES";
pub const ENV_TEMPLATE_DIR: &str = "DISVIEW_TEMPLATE_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid env {name}={value}")]
    InvalidEnv { name: String, value: String },
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportConfig {
    batch_size: usize,
    pass_cap: usize,
    threshold_fraction: f64,
    preview_lines: usize,
    history_limit: usize,
    template_dir: Option<PathBuf>,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            pass_cap: 10,
            threshold_fraction: 0.5,
            preview_lines: 24,
            history_limit: 64,
            template_dir: None,
        }
    }
}

impl ViewportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Builds a config from an arbitrary variable source; unset variables keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let mut config = Self::default();

        if let Some(value) = read_var(&lookup, ENV_BATCH_SIZE)? {
            config = config.with_batch_size(parse_count(ENV_BATCH_SIZE, &value)?)?;
        }
        if let Some(value) = read_var(&lookup, ENV_PASS_CAP)? {
            config = config.with_pass_cap(parse_count(ENV_PASS_CAP, &value)?)?;
        }
        if let Some(value) = read_var(&lookup, ENV_SCROLL_THRESHOLD)? {
            let fraction = value
                .parse::<f64>()
                .map_err(|error| ConfigError::InvalidEnv {
                    name: ENV_SCROLL_THRESHOLD.to_string(),
                    value: format!("{value} ({error})"),
                })?;
            config = config.with_threshold_fraction(fraction)?;
        }
        if let Some(value) = read_var(&lookup, ENV_PREVIEW_LINES)? {
            config = config.with_preview_lines(parse_count(ENV_PREVIEW_LINES, &value)?)?;
        }
        if let Some(value) = read_var(&lookup, ENV_TEMPLATE_DIR)? {
            config = config.with_template_dir(Some(PathBuf::from(value)));
        }

        Ok(config)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pass_cap(&self) -> usize {
        self.pass_cap
    }

    pub fn threshold_fraction(&self) -> f64 {
        self.threshold_fraction
    }

    pub fn preview_lines(&self) -> usize {
        self.preview_lines
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn template_dir(&self) -> Option<&std::path::Path> {
        self.template_dir.as_deref()
    }

    /// Batch size must be at least 2: the first line of every follow-up batch repeats the
    /// last visible line and is dropped.
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, ConfigError> {
        if batch_size < 2 {
            return Err(ConfigError::OutOfRange {
                name: "batch size",
                expected: "at least 2",
                value: batch_size.to_string(),
            });
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    pub fn with_pass_cap(mut self, pass_cap: usize) -> Result<Self, ConfigError> {
        if pass_cap == 0 {
            return Err(ConfigError::OutOfRange {
                name: "pass cap",
                expected: "at least 1",
                value: pass_cap.to_string(),
            });
        }
        self.pass_cap = pass_cap;
        Ok(self)
    }

    pub fn with_threshold_fraction(mut self, fraction: f64) -> Result<Self, ConfigError> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "scroll threshold",
                expected: "in (0, 1]",
                value: fraction.to_string(),
            });
        }
        self.threshold_fraction = fraction;
        Ok(self)
    }

    pub fn with_preview_lines(mut self, preview_lines: usize) -> Result<Self, ConfigError> {
        if preview_lines == 0 {
            return Err(ConfigError::OutOfRange {
                name: "preview lines",
                expected: "at least 1",
                value: preview_lines.to_string(),
            });
        }
        self.preview_lines = preview_lines;
        Ok(self)
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    pub fn with_template_dir(mut self, template_dir: Option<PathBuf>) -> Self {
        self.template_dir = template_dir;
        self
    }
}

fn read_var<F>(lookup: &F, name: &str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            value: "<non-unicode>".to_string(),
        }),
    }
}

fn parse_count(name: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .parse::<usize>()
        .map_err(|error| ConfigError::InvalidEnv {
            name: name.to_string(),
            value: format!("{value} ({error})"),
        })
}
