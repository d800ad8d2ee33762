// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # r3bl_text_view
//!
//! The core of a rich text view: how an attributed document becomes positioned text on
//! screen, how screen points map back to document locations, how the caret and
//! selections move, and how edits are undone.
//!
//! ```text
//!  DocumentModel ──edits──▶ LayoutFragmentStore ◀── ViewportLayoutController ──▶ ScrollHost
//!        ▲                         ▲                        │
//!        │                         │                        ▼
//!   TextView ──────────────▶ CaretResolver            rendering surfaces
//!        │                         ▲
//!        ├──▶ SelectionNavigation ─┘
//!        └──▶ CoalescingUndoManager
//! ```
//!
//! - [`document`]: the attributed text, opaque [`Location`]s and [`DocRange`]s, and the
//!   [`DocumentModel`] trait with an in memory [`TextContentStorage`].
//! - [`layout`]: one [`LayoutFragment`] per paragraph, laid out lazily and stacked
//!   vertically by [`LayoutFragmentStore`]. The viewport anchor keeps the visible content
//!   stable while the height of the document is still an estimate.
//! - [`viewport`]: [`ViewportLayoutController`] lays out only what is visible (plus some
//!   overdraw), mounts one rendering surface per fragment and corrects scroll offsets.
//! - [`selection`]: caret geometry ([`CaretResolver`]), keyboard and mouse navigation
//!   ([`SelectionNavigation`]) and drags ([`DragSelection`]).
//! - [`undo`]: grouped undo and redo with typing coalescing.
//! - [`completion`]: cancellable completion fetches on a tokio runtime.
//! - [`text_view`]: [`TextView`] ties it all together and turns [`KeyEvent`]s and mouse
//!   input into edits and selection changes.
//!
//! Everything except completion fetches runs on the thread that owns the view.
//!
//! ```
//! use r3bl_text_view::{ClipView, DocumentModel, Size, TextView, TextViewConfig};
//!
//! let mut view = TextView::from_plain(
//!     "Hello",
//!     ClipView::new(Size::new(500.0, 100.0)),
//!     TextViewConfig::default(),
//! );
//! view.move_to_end_of_document();
//! view.insert_text(" world");
//! assert_eq!(view.string(), "Hello world");
//! view.undo();
//! assert_eq!(view.string(), "Hello");
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach.
pub mod completion;
pub mod core;
pub mod document;
pub mod layout;
pub mod selection;
pub mod text_view;
pub mod undo;
pub mod viewport;

// Re-export.
pub use completion::*;
pub use core::*;
pub use document::*;
pub use layout::*;
pub use selection::*;
pub use text_view::*;
pub use undo::*;
pub use viewport::*;
