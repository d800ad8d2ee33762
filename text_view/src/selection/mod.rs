// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod caret_resolver;
pub mod drag_selection;
pub mod selection_navigation;
pub mod selection_types;

// Re-export.
pub use caret_resolver::*;
pub use drag_selection::*;
pub use selection_navigation::*;
pub use selection_types::*;
