//! Greedy meshing over 32×32 slice masks.
//!
//! Each slice of a sub-chunk is flattened into a mask of visible front and back faces. The mask
//! is then consumed rectangle by rectangle: the first set cell grows into the longest same-colour
//! run, the run grows downwards while every row keeps at least that length, and the cells not
//! covered by the emitted quad are pushed back as up to three smaller scan areas.

use super::face::{Face, FacePlane};

/// Edge length of a slice mask.
pub const MASK_EDGE: usize = 32;

/// One cell of a slice mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskCell {
    /// Visible face on the positive side of the slice.
    pub front: bool,
    /// Visible face on the negative side of the slice.
    pub back: bool,
    pub color: [u8; 3],
}

impl MaskCell {
    #[inline]
    fn is_set(&self, front: bool) -> bool {
        if front {
            self.front
        } else {
            self.back
        }
    }

    #[inline]
    fn clear(&mut self, front: bool) {
        if front {
            self.front = false;
        } else {
            self.back = false;
        }
    }
}

/// A slice mask indexed `[v][u]`.
pub type SliceMask = [[MaskCell; MASK_EDGE]; MASK_EDGE];

/// Inclusive rectangle of mask cells still to be scanned.
#[derive(Debug, Clone, Copy)]
struct Rect {
    x: usize,
    y: usize,
    x2: usize,
    y2: usize,
}

impl Rect {
    /// Builds the rectangle if it is non-empty.
    fn non_empty(x: usize, y: usize, x2: isize, y2: isize) -> Option<Rect> {
        (x as isize <= x2 && y as isize <= y2).then(|| Rect {
            x,
            y,
            x2: x2 as usize,
            y2: y2 as usize,
        })
    }
}

const FULL: Rect = Rect {
    x: 0,
    y: 0,
    x2: MASK_EDGE - 1,
    y2: MASK_EDGE - 1,
};

/// Length of the same-colour set run in row `y` starting at `x`, bounded by `r.x2`.
fn run_length(
    mask: &SliceMask,
    x: usize,
    y: usize,
    r: &Rect,
    front: bool,
    color: [u8; 3],
) -> usize {
    let mut l = x;
    while l <= r.x2 && mask[y][l].is_set(front) && mask[y][l].color == color {
        l += 1;
    }
    l - x
}

/// Number of rows from `y` down whose run at `x` is at least `length` long.
fn run_height(
    mask: &SliceMask,
    x: usize,
    y: usize,
    length: usize,
    r: &Rect,
    front: bool,
    color: [u8; 3],
) -> usize {
    let mut h = y;
    while h <= r.y2 && run_length(mask, x, h, r, front, color) >= length {
        h += 1;
    }
    h - y
}

fn clear_area(mask: &mut SliceMask, front: bool, x: usize, y: usize, x2: usize, y2: usize) {
    for row in mask.iter_mut().take(y2).skip(y) {
        for cell in row.iter_mut().take(x2).skip(x) {
            cell.clear(front);
        }
    }
}

/// First set cell of the scan area, row-major.
fn first_set(mask: &SliceMask, r: &Rect, front: bool) -> Option<(usize, usize)> {
    (r.y..=r.y2)
        .flat_map(|j| (r.x..=r.x2).map(move |i| (i, j)))
        .find(|&(i, j)| mask[j][i].is_set(front))
}

/// Consumes every `front` (or back) cell of `mask` and emits one [`Face`] per merged rectangle.
///
/// The mask's flags for the chosen orientation are all cleared afterwards.
pub fn build_faces_from_mask(
    mask: &mut SliceMask,
    plane: FacePlane,
    slice: u32,
    front: bool,
    faces: &mut Vec<Face>,
) {
    let mut scan_areas = vec![FULL];

    while let Some(r) = scan_areas.pop() {
        let Some((i, j)) = first_set(mask, &r, front) else {
            continue;
        };
        let color = mask[j][i].color;

        let l = run_length(mask, i, j, &r, front, color);
        let h = run_height(mask, i, j + 1, l, &FULL, front, color) + 1;

        let (ii, jj, hh) = (i as isize, j as isize, h as isize);
        // below the quad, full width of the area
        scan_areas.extend(Rect::non_empty(r.x, j + h, r.x2 as isize, r.y2 as isize));
        // left of the quad, rows after the first
        scan_areas.extend(Rect::non_empty(r.x, j + 1, ii - 1, jj + hh - 1));
        // right of the quad
        scan_areas.extend(Rect::non_empty(i + l, j, r.x2 as isize, jj + hh - 1));

        faces.push(Face {
            plane,
            slice,
            front,
            start: (i as u32, j as u32),
            dims: (l as u32, h as u32),
            color,
        });
        clear_area(mask, front, i, j, i + l, j + h);
    }
}
