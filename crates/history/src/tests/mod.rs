//! Cross-module tests for the search pipeline.

pub(crate) mod support;
