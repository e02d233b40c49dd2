// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! TUI module for the region monitor.

mod app;

pub use app::run_monitor;
