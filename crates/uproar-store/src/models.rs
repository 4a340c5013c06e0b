// SPDX-FileCopyrightText: 2026 Uproar Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage model re-exports.
//!
//! Rows map 1:1 onto the core [`EngagementRecord`] type; the store defines
//! no private row structs.

pub use uproar_core::types::EngagementRecord;
