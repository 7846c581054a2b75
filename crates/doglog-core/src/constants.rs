// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

// Built-in top-level record fields, copied into the bag under reserved keys
pub const DATADOG_STATUS: &str = "__Status";
pub const DATADOG_SERVICE: &str = "__Service";
pub const DATADOG_HOST: &str = "__Host";
pub const DATADOG_TIMESTAMP: &str = "__Timestamp";
pub const DATADOG_MESSAGE: &str = "__Message";

// Canonical field names resolved through the field map
pub const LEVEL: &str = "level";
pub const MESSAGE: &str = "message";
pub const CLASSNAME: &str = "classname";
pub const THREADNAME: &str = "threadname";
pub const TIMESTAMP: &str = "timestamp";
pub const FULL_MESSAGE: &str = "full_message";

/// Prefix of the bag key a canonical field is stored under.
pub const CANONICAL_PREFIX: &str = "__";

// Computed fields
pub const COMPUTED_LEVEL_FIELD: &str = "__level";
pub const COMPUTED_MESSAGE_FIELD: &str = "__message";
pub const COMPUTED_CLASSNAME_FIELD: &str = "__classname";
pub const COMPUTED_SHORT_CLASSNAME_FIELD: &str = "__short_classname";
pub const COMPUTED_JSON_FIELD: &str = "__json";

// Escape code fields
pub const LEVEL_COLOR_FIELD: &str = "_Level_color";
pub const GREY_FIELD: &str = "_Grey";
pub const RED_FIELD: &str = "_Red";
pub const GREEN_FIELD: &str = "_Green";
pub const YELLOW_FIELD: &str = "_Yellow";
pub const BLUE_FIELD: &str = "_Blue";
pub const MAGENTA_FIELD: &str = "_Magenta";
pub const CYAN_FIELD: &str = "_Cyan";
pub const WHITE_FIELD: &str = "_White";
pub const RESET_FIELD: &str = "_Reset";

pub const GREY_ESC: &str = "\x1b[37m";
pub const RED_ESC: &str = "\x1b[91m";
pub const GREEN_ESC: &str = "\x1b[92m";
pub const YELLOW_ESC: &str = "\x1b[93m";
pub const BLUE_ESC: &str = "\x1b[94m";
pub const MAGENTA_ESC: &str = "\x1b[95m";
pub const CYAN_ESC: &str = "\x1b[96m";
pub const WHITE_ESC: &str = "\x1b[97m";
pub const RESET_ESC: &str = "\x1b[39;49m";

/// Every named color field with its escape sequence, level color excluded.
pub const COLOR_FIELDS: [(&str, &str); 9] = [
    (GREY_FIELD, GREY_ESC),
    (RED_FIELD, RED_ESC),
    (GREEN_FIELD, GREEN_ESC),
    (YELLOW_FIELD, YELLOW_ESC),
    (BLUE_FIELD, BLUE_ESC),
    (MAGENTA_FIELD, MAGENTA_ESC),
    (CYAN_FIELD, CYAN_ESC),
    (WHITE_FIELD, WHITE_ESC),
    (RESET_FIELD, RESET_ESC),
];

pub const DEBUG_LEVEL: &str = "DEBUG";
pub const ERROR_LEVEL: &str = "ERROR";
pub const FATAL_LEVEL: &str = "FATAL";
pub const INFO_LEVEL: &str = "INFO";
pub const TRACE_LEVEL: &str = "TRACE";
pub const WARN_LEVEL: &str = "WARN";

/// Marks output rendered by the fallback template.
pub const NO_FORMAT_DEFINED: &str = "No Formats Defined>>";
pub const FALLBACK_TEMPLATE_NAME: &str = "_default";
