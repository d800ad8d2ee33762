// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod fragment_store;
pub mod layout_fragment;
pub mod line_fragment;
pub mod monospace_shaper;
pub mod text_shaper;

// Re-export.
pub use fragment_store::*;
pub use layout_fragment::*;
pub use line_fragment::*;
pub use monospace_shaper::*;
pub use text_shaper::*;
