//! Level layout: a flat run of column markers turned into floor bricks and a
//! gap set.
//!
//! Every byte of the level file is one fixed-width column. `'1'` is solid
//! ground (a stack of bricks), anything else is a gap. There is no header and
//! no delimiter, so a trailing newline is itself a gap column.
//!
//! Gaps are stored as the set of integer world x-coordinates they cover, so
//! the death check is a pair of O(1) lookups. A gap column starting at `s`
//! covers the inclusive range `[s, s + width]`; the shared boundary with the
//! next column is therefore a gap even when that column is solid.

use glam::Vec2;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::LoadFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnTag {
    Solid,
    Gap,
}

impl ColumnTag {
    pub fn from_marker(marker: u8) -> Self {
        if marker == b'1' {
            Self::Solid
        } else {
            Self::Gap
        }
    }
}

/// Integer x-coordinates with no floor underneath.
#[derive(Debug, Clone, Default)]
pub struct GapSet {
    xs: HashSet<i32>,
}

impl GapSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every unit step of `[start, start + width]`, truncating each to
    /// an integer.
    pub fn insert_band(&mut self, start: f32, width: f32) {
        let mut x = start;
        while x <= start + width {
            self.xs.insert(x as i32);
            x += 1.0;
        }
    }

    /// Membership for a world x. The probe is truncated toward zero, so a
    /// fractional position tests the integer it truncates to.
    pub fn contains(&self, x: f32) -> bool {
        self.xs.contains(&(x as i32))
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LevelLayout {
    columns: Vec<ColumnTag>,
    gaps: GapSet,
    column_width: f32,
    total_length: f32,
}

impl LevelLayout {
    pub fn empty(column_width: f32) -> Self {
        Self {
            columns: Vec::new(),
            gaps: GapSet::new(),
            column_width,
            total_length: 0.0,
        }
    }

    pub fn from_bytes(markers: &[u8], column_width: f32) -> Self {
        let mut columns = Vec::with_capacity(markers.len());
        let mut gaps = GapSet::new();
        for (index, &marker) in markers.iter().enumerate() {
            let tag = ColumnTag::from_marker(marker);
            if tag == ColumnTag::Gap {
                gaps.insert_band(column_width * index as f32, column_width);
            }
            columns.push(tag);
        }
        let total_length = column_width * columns.len() as f32;
        Self {
            columns,
            gaps,
            column_width,
            total_length,
        }
    }

    pub fn parse(markers: &str, column_width: f32) -> Self {
        Self::from_bytes(markers.as_bytes(), column_width)
    }

    pub fn columns(&self) -> &[ColumnTag] {
        &self.columns
    }

    pub fn gaps(&self) -> &GapSet {
        &self.gaps
    }

    pub fn column_width(&self) -> f32 {
        self.column_width
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column count times column width.
    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Top-left corners of every floor brick, row-major: the first row across
    /// all solid columns, then the next row down, and so on. The last entry
    /// is the bottom brick of the right-most solid column.
    pub fn brick_positions(&self, stack_top_y: f32, stack_depth: u32) -> Vec<Vec2> {
        let solid: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, tag)| **tag == ColumnTag::Solid)
            .map(|(index, _)| index)
            .collect();

        let mut bricks = Vec::with_capacity(solid.len() * stack_depth as usize);
        for row in 0..stack_depth {
            let y = stack_top_y + self.column_width * row as f32;
            for &index in &solid {
                bricks.push(Vec2::new(self.column_width * index as f32, y));
            }
        }
        bricks
    }

    /// `(start, end)` world-x bands of each gap column, for debug drawing.
    pub fn gap_bands(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, tag)| **tag == ColumnTag::Gap)
            .map(|(index, _)| {
                let start = self.column_width * index as f32;
                (start, start + self.column_width)
            })
    }
}

pub fn load_level_from_path(path: &Path, column_width: f32) -> Result<LevelLayout, LoadFailure> {
    let markers = fs::read(path).map_err(|e| LoadFailure::level_missing(path, e.to_string()))?;
    Ok(LevelLayout::from_bytes(&markers, column_width))
}

/// Load the level, or log the failure and hand back an empty layout so the
/// session continues without a floor.
pub fn load_level_or_empty(path: &Path, column_width: f32) -> LevelLayout {
    match load_level_from_path(path, column_width) {
        Ok(layout) => {
            log::info!(
                "Level loaded from '{}': {} columns, {} gap units, length {}",
                path.display(),
                layout.column_count(),
                layout.gaps().len(),
                layout.total_length()
            );
            layout
        }
        Err(err) => {
            log::error!("{err}. Continuing with an empty level.");
            LevelLayout::empty(column_width)
        }
    }
}
