//! The boundary that paints `SceneFrame`s.
//!
//! The engine hands over plain numbers and strings; a `Renderer` decides
//! how they look. The shipped implementation rasterizes frames onto a cell
//! grid and writes only the cells that changed since the previous frame.

pub mod layout;
pub mod terminal;

use crate::error::PresenterResult;
use crate::types::{Cell, CellChange, DrawOp, SceneFrame};

pub use terminal::TerminalRenderer;

pub trait Renderer {
    /// Paint one frame. A failure here is a render fault.
    fn paint(&mut self, frame: &SceneFrame) -> PresenterResult<()>;

    /// Paint the static fault view with its restart hint.
    fn paint_fallback(&mut self, message: &str) -> PresenterResult<()>;

    /// Forget what is on screen; the next paint redraws everything.
    fn invalidate(&mut self);
}

/// Cell grid of the last painted frame, used to diff the next one.
#[derive(Debug, Default)]
pub struct Canvas {
    grid: Option<Vec<Vec<Cell>>>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.grid = None;
    }

    /// Rasterize `ops` and return the cells to write. The first frame after
    /// an invalidation, or after a size change, is returned in full.
    pub fn update(&mut self, ops: &[DrawOp], width: u16, height: u16) -> Vec<CellChange> {
        let next = rasterize(ops, width, height);
        let changes = match &self.grid {
            Some(prev) if prev.len() == next.len() && prev.first().map(Vec::len) == next.first().map(Vec::len) => {
                diff(prev, &next)
            }
            _ => full(&next),
        };
        self.grid = Some(next);
        changes
    }
}

/// Rasterize draw operations onto a fixed-size cell grid.
///
/// Operations are sorted by z-order so that higher z values paint over
/// lower ones.
pub fn rasterize(ops: &[DrawOp], width: u16, height: u16) -> Vec<Vec<Cell>> {
    let w = width as usize;
    let h = height as usize;
    let mut grid = vec![vec![Cell::default(); w]; h];

    let mut ops: Vec<_> = ops.iter().collect();
    ops.sort_by_key(|op| op.z_order);

    for op in ops {
        let x = op.x as usize;
        let y = op.y as usize;
        if x < w && y < h {
            grid[y][x] = Cell {
                ch: op.ch,
                marks: op.marks.clone(),
                style: op.style,
            };
        }
    }

    grid
}

/// Cell-level diff between two grids of the same size.
pub fn diff(prev: &[Vec<Cell>], next: &[Vec<Cell>]) -> Vec<CellChange> {
    let mut changes = Vec::new();
    for (y, (prev_row, next_row)) in prev.iter().zip(next.iter()).enumerate() {
        for (x, (prev_cell, next_cell)) in prev_row.iter().zip(next_row.iter()).enumerate() {
            if prev_cell != next_cell {
                changes.push(CellChange {
                    x: x as u16,
                    y: y as u16,
                    cell: next_cell.clone(),
                });
            }
        }
    }
    changes
}

fn full(grid: &[Vec<Cell>]) -> Vec<CellChange> {
    grid.iter()
        .enumerate()
        .flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, cell)| CellChange {
                x: x as u16,
                y: y as u16,
                cell: cell.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Style;

    fn op(x: u16, y: u16, ch: char, z_order: i32) -> DrawOp {
        DrawOp {
            x,
            y,
            ch,
            marks: String::new(),
            style: Style::default(),
            z_order,
        }
    }

    #[test]
    fn higher_z_wins() {
        let grid = rasterize(&[op(1, 0, 'b', 2), op(1, 0, 'a', 1)], 3, 1);
        assert_eq!(grid[0][1].ch, 'b');
    }

    #[test]
    fn out_of_bounds_ops_are_dropped() {
        let grid = rasterize(&[op(9, 9, 'x', 0)], 2, 2);
        assert!(grid.iter().flatten().all(|c| c.ch == ' '));
    }

    #[test]
    fn canvas_sends_full_then_diffs() {
        let mut canvas = Canvas::new();
        let first = canvas.update(&[op(0, 0, 'a', 0)], 2, 2);
        assert_eq!(first.len(), 4);
        let second = canvas.update(&[op(0, 0, 'a', 0), op(1, 1, 'b', 0)], 2, 2);
        assert_eq!(second.len(), 1);
        assert_eq!((second[0].x, second[0].y, second[0].cell.ch), (1, 1, 'b'));
        assert!(canvas.update(&[op(0, 0, 'a', 0), op(1, 1, 'b', 0)], 2, 2).is_empty());

        canvas.invalidate();
        assert_eq!(canvas.update(&[], 2, 2).len(), 4);
        assert_eq!(canvas.update(&[], 3, 2).len(), 6);
    }
}
