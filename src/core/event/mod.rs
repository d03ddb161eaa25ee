// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event value model: the immutable payloads that flow between processors.

pub mod bag;
pub mod tuple;
pub mod value;

pub use bag::Bag;
pub use tuple::NamedTuple;
pub use value::Value;
