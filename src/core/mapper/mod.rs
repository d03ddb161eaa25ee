// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mappers turn external text into event values.

pub mod json;

pub use json::JsonEventMapper;
