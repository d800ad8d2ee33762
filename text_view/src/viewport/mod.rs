// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod rendering_surface;
pub mod scroll_host;
pub mod viewport_bounds;
pub mod viewport_layout_controller;

// Re-export.
pub use rendering_surface::*;
pub use scroll_host::*;
pub use viewport_bounds::*;
pub use viewport_layout_controller::*;
