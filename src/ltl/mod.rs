// SPDX-License-Identifier: MIT OR Apache-2.0

//! Linear temporal logic operators over boolean event streams.

pub mod implies;
pub mod until;

pub use implies::implies;
pub use until::UntilProcessor;
