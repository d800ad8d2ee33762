// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod editor_core;
pub mod text_view_completion;
pub mod text_view_config;
pub mod text_view_delegate;
pub mod text_view_editing;
pub mod text_view_event;
pub mod text_view_selection;
pub mod text_view_struct;

// Re-export.
pub use editor_core::*;
pub use text_view_config::*;
pub use text_view_delegate::*;
pub use text_view_event::*;
pub use text_view_struct::*;
