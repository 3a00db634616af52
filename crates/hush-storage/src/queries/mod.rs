// SPDX-FileCopyrightText: 2026 Hush Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each function accepts `&Database` and runs its
//! statements through the single background connection.

pub mod jobs;
pub mod push_state;
