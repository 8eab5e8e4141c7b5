// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use field_lite_analysis::AnalysisConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Host configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interval between idle callbacks.
    pub tick_interval: Duration,
    /// Upper bound on idle callbacks before the host gives up.
    pub max_ticks: u32,
    /// Tick at which the analyzed face is edited (0 disables the edit).
    pub edit_at_tick: u32,
    /// Where the final field snapshot is written. Stdout when unset.
    pub output: Option<PathBuf>,
    pub log_format: LogFormat,
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            tick_interval: Duration::from_millis(
                std::env::var("TICK_INTERVAL_MS")
                    .unwrap_or_else(|_| "50".into())
                    .parse()
                    .unwrap_or(50),
            ),
            max_ticks: std::env::var("MAX_TICKS")
                .unwrap_or_else(|_| "2000".into())
                .parse()
                .unwrap_or(2000),
            edit_at_tick: std::env::var("EDIT_AT_TICK")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            output: std::env::var("OUTPUT_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            log_format: match std::env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            analysis: AnalysisConfig::from_env(),
        }
    }
}
