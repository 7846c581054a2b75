// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use doglog_core::FormatProfile;

pub const DEFAULT_LIMIT: u32 = 300;
pub const DEFAULT_RANGE: &str = "now-15m";
pub const DEFAULT_INDEX: &str = "main";

/// Search and tail logs from Datadog.
#[derive(Debug, Parser)]
#[command(name = "doglog", version, about, long_about = None)]
pub struct Args {
    /// Path to the config file [default: ~/.doglog.toml]
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<String>,

    /// Generate debug output.
    #[arg(short, long)]
    pub debug: bool,

    /// Index to search in. Repeat the parameter to add indices to the list.
    #[arg(short = 'i', long = "indices", value_name = "INDEX", default_value = DEFAULT_INDEX)]
    pub indices: Vec<String>,

    /// Output messages in JSON. Shows the normalized record, which lists the
    /// fields available to format templates.
    #[arg(short, long)]
    pub json: bool,

    /// The maximum number of messages to request per page. Must be greater than 0.
    #[arg(short, long, default_value_t = i64::from(DEFAULT_LIMIT), allow_negative_numbers = true)]
    pub limit: i64,

    /// Use the long output formats.
    #[arg(long)]
    pub long: bool,

    /// Don't use colors in output. Automatically turned off when redirecting output.
    #[arg(long = "no-colors")]
    pub no_colors: bool,

    /// Query terms in Datadog search syntax, e.g. '@level:INFO'.
    #[arg(short, long, default_value = "*")]
    pub query: String,

    /// The Datadog log service to constrain the search, e.g. '-s send-email'.
    #[arg(short, long)]
    pub service: Option<String>,

    /// Start of the search window: an ISO-8601 date, a unix timestamp in
    /// milliseconds, or date math such as 'now-2h'.
    #[arg(long, default_value = DEFAULT_RANGE, allow_hyphen_values = true)]
    pub start: String,

    /// End of the search window, in the same formats as --start.
    #[arg(long, default_value = "now", allow_hyphen_values = true)]
    pub end: String,

    /// Keep polling for new messages. Requires a relative --start.
    #[arg(short, long)]
    pub tail: bool,
}

impl Args {
    /// Page size sent to the API; non-positive values fall back to the default.
    pub fn page_limit(&self) -> u32 {
        if self.limit <= 0 {
            return DEFAULT_LIMIT;
        }
        u32::try_from(self.limit).unwrap_or(u32::MAX)
    }

    pub fn profile(&self) -> FormatProfile {
        if self.long {
            FormatProfile::Long
        } else {
            FormatProfile::Short
        }
    }
}

/// Whether a time expression moves with the clock, as tailing requires.
pub fn is_relative(expr: &str) -> bool {
    let expr = expr.trim();
    expr.starts_with("now") || expr.starts_with('-') || expr.starts_with('+')
}
