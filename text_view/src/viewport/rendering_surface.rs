// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{cell::RefCell,
          rc::{Rc, Weak}};

use rustc_hash::FxHashMap;
use strum_macros::{Display, EnumIter};

use crate::{FragmentId, LayoutFragment, Point, Rect, TextAttributes};

/// Marker drawn in place of a whitespace character when invisible characters are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum InvisibleCharacter {
    #[strum(serialize = "·")]
    Space,
    #[strum(serialize = "→")]
    Tab,
    #[strum(serialize = "¶")]
    LineBreak,
}

impl InvisibleCharacter {
    #[must_use]
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            ' ' => Some(Self::Space),
            '\t' => Some(Self::Tab),
            '\n' => Some(Self::LineBreak),
            _ => None,
        }
    }
}

/// Drawing commands produced by [`RenderingSurface::draw`]. Positions are baseline
/// origins relative to the surface frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    PaintTextWithAttributes(String, TextAttributes, Point),
    PaintInvisibleCharacter(InvisibleCharacter, Point),
}

/// Visual object bound to one [`LayoutFragment`] for the fragment's lifetime.
///
/// The surface holds its fragment weakly. When the layout store drops the fragment
/// (after an edit or a width change) the surface draws nothing and gets released on
/// the next viewport pass.
#[derive(Debug)]
pub struct RenderingSurface {
    fragment_id: FragmentId,
    fragment: Weak<LayoutFragment>,
    frame: Rect,
    needs_display: bool,
    needs_layout: bool,
    shows_invisible_characters: bool,
    draw_count: usize,
}

impl RenderingSurface {
    #[must_use]
    pub fn new(fragment: &Rc<LayoutFragment>, frame: Rect) -> Self {
        Self {
            fragment_id: fragment.id(),
            fragment: Rc::downgrade(fragment),
            frame,
            needs_display: true,
            needs_layout: true,
            shows_invisible_characters: false,
            draw_count: 0,
        }
    }

    #[must_use]
    pub fn fragment_id(&self) -> FragmentId { self.fragment_id }

    #[must_use]
    pub fn fragment(&self) -> Option<Rc<LayoutFragment>> { self.fragment.upgrade() }

    #[must_use]
    pub fn frame(&self) -> Rect { self.frame }

    #[must_use]
    pub fn needs_display(&self) -> bool { self.needs_display }

    #[must_use]
    pub fn needs_layout(&self) -> bool { self.needs_layout }

    #[must_use]
    pub fn draw_count(&self) -> usize { self.draw_count }

    #[must_use]
    pub fn shows_invisible_characters(&self) -> bool { self.shows_invisible_characters }

    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
        self.needs_layout = true;
        self.needs_display = true;
    }

    pub fn set_shows_invisible_characters(&mut self, shows: bool) {
        if self.shows_invisible_characters != shows {
            self.shows_invisible_characters = shows;
            self.needs_display = true;
        }
    }

    pub fn set_needs_display(&mut self) { self.needs_display = true; }

    pub fn layout_if_needed(&mut self) { self.needs_layout = false; }

    /// Paints every line of the fragment, one op per attribute run, plus markers for
    /// whitespace when invisible characters are shown.
    pub fn draw(&mut self) -> Vec<DrawOp> {
        let Some(fragment) = self.fragment.upgrade() else {
            return vec![];
        };
        let text = fragment.text();
        let mut ops = vec![];

        for line in fragment.line_fragments() {
            let bounds = line.typographic_bounds;
            let baseline = bounds.min_y() + line.metrics.leading / 2.0 + line.metrics.ascent;
            let content = line.character_range.start..line.content_end(text);

            let mut run_start = 0;
            for run in fragment.runs() {
                let run_end = run_start + run.len;
                let start = run_start.max(content.start);
                let end = run_end.min(content.end);
                if start < end {
                    let x = bounds.min_x() + line.caret_x(start);
                    ops.push(DrawOp::PaintTextWithAttributes(
                        text[start..end].to_string(),
                        run.attributes.clone(),
                        Point::new(x, baseline),
                    ));
                }
                run_start = run_end;
            }

            if self.shows_invisible_characters {
                let range = line.character_range.clone();
                for (index, ch) in text[range.clone()].char_indices() {
                    if let Some(marker) = InvisibleCharacter::from_char(ch) {
                        let x = bounds.min_x() + line.caret_x(range.start + index);
                        ops.push(DrawOp::PaintInvisibleCharacter(marker, Point::new(x, baseline)));
                    }
                }
            }
        }

        self.draw_count += 1;
        self.needs_display = false;
        ops
    }
}

/// Side table from fragment identity to the surface bound to it. It owns nothing:
/// entries die when the controller stops mounting their surface.
#[derive(Debug, Default)]
pub struct SurfaceCache {
    surfaces: FxHashMap<FragmentId, Weak<RefCell<RenderingSurface>>>,
}

impl SurfaceCache {
    #[must_use]
    pub fn get(&self, id: FragmentId) -> Option<Rc<RefCell<RenderingSurface>>> {
        self.surfaces.get(&id).and_then(Weak::upgrade)
    }

    pub fn insert(&mut self, id: FragmentId, surface: &Rc<RefCell<RenderingSurface>>) {
        self.surfaces.insert(id, Rc::downgrade(surface));
    }

    /// Drops dead entries. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.surfaces.len();
        self.surfaces.retain(|_, it| it.strong_count() > 0);
        before - self.surfaces.len()
    }

    #[must_use]
    pub fn len(&self) -> usize { self.surfaces.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.surfaces.is_empty() }
}
