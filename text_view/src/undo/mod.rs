// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod coalescing_undo_manager;
pub mod undo_manager;

// Re-export.
pub use coalescing_undo_manager::*;
pub use undo_manager::*;
