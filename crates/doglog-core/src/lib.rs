// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Search and tail logs from the Datadog Logs API.
//!
//! Records fetched through a [`search::LogSearch`] are flattened, normalized
//! into a bag of canonical fields and rendered through the first configured
//! template whose fields are all present. [`retrieval::RetrievalLoop`] drives
//! the whole pipeline, once or repeatedly with an adaptive delay.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod constants;
pub mod error;
pub mod fields;
pub mod flatten;
pub mod http;
pub mod normalize;
pub mod poll;
pub mod query;
pub mod retrieval;
pub mod search;
pub mod template;
pub mod value;

pub use error::{ConfigError, FetchError, RenderError};
pub use fields::FieldMap;
pub use normalize::{NormalizedRecord, Normalizer};
pub use retrieval::{CycleOutcome, LoopState, NoProgress, Progress, RetrievalLoop};
pub use search::{LogSearch, RawRecord, SearchPage, SearchRequest};
pub use template::{FormatProfile, TemplateRenderer, TemplateSet};
pub use value::{AttributeValue, Bag};
