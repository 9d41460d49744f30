use std::fmt;

/// The axis pair a quad lies in. The remaining axis is the slice axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacePlane {
    /// Quads facing ±z.
    XY = 0,
    /// Quads facing ±y.
    XZ,
    /// Quads facing ±x.
    YZ,
}

impl FacePlane {
    pub fn all() -> [FacePlane; 3] {
        [FacePlane::XY, FacePlane::XZ, FacePlane::YZ]
    }

    /// Maps mask coordinates `(u, v)` on `slice` to a cell coordinate.
    pub fn cell(self, slice: u32, u: u32, v: u32) -> (u32, u32, u32) {
        match self {
            FacePlane::XY => (u, v, slice),
            FacePlane::XZ => (u, slice, v),
            FacePlane::YZ => (slice, u, v),
        }
    }
}

impl fmt::Display for FacePlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FacePlane::XY => "XY",
            FacePlane::XZ => "XZ",
            FacePlane::YZ => "YZ",
        };
        write!(f, "{name}")
    }
}

/// One merged rectangle of same-coloured visible cell faces.
///
/// `start` and `dims` are in mask coordinates `(u, v)`; see [`FacePlane::cell`]. A front face
/// sits on the positive side of its slice, a back face on the negative side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub plane: FacePlane,
    pub slice: u32,
    pub front: bool,
    pub start: (u32, u32),
    pub dims: (u32, u32),
    pub color: [u8; 3],
}

impl Face {
    /// Quad corners in sub-chunk local space.
    pub fn corners(&self) -> [[f32; 3]; 4] {
        let d = (self.slice + self.front as u32) as f32;
        let (u0, v0) = (self.start.0 as f32, self.start.1 as f32);
        let (u1, v1) = (u0 + self.dims.0 as f32, v0 + self.dims.1 as f32);

        match self.plane {
            FacePlane::XY => [[u1, v1, d], [u0, v1, d], [u0, v0, d], [u1, v0, d]],
            FacePlane::XZ => [[u0, d, v0], [u1, d, v0], [u1, d, v1], [u0, d, v1]],
            FacePlane::YZ => [[d, u1, v0], [d, u1, v1], [d, u0, v1], [d, u0, v0]],
        }
    }

    /// Texture id taken from one colour channel: XZ front uses red, XZ back uses blue, and
    /// the other planes use green.
    pub fn texture_id(&self) -> f32 {
        let channel = match (self.plane, self.front) {
            (FacePlane::XZ, true) => self.color[0],
            (FacePlane::XZ, false) => self.color[2],
            _ => self.color[1],
        };
        channel as f32
    }

    /// Per-corner `(u, v, texture_id)`, with UVs repeating once per cell.
    pub fn uvs(&self) -> [[f32; 3]; 4] {
        let (mut w, mut h) = (self.dims.0 as f32, self.dims.1 as f32);
        if self.plane == FacePlane::YZ {
            std::mem::swap(&mut w, &mut h);
        }
        let t = self.texture_id();
        [[0.0, 0.0, t], [w, 0.0, t], [w, h, t], [0.0, h, t]]
    }

    /// XZ corners wind the opposite way round, so the winding flag flips for that plane.
    fn wound_forward(&self) -> bool {
        if self.plane == FacePlane::XZ {
            !self.front
        } else {
            self.front
        }
    }

    /// Two triangles over the four corners starting at vertex `base`.
    pub fn indices(&self, base: u32) -> [u32; 6] {
        if self.wound_forward() {
            [base, base + 2, base + 3, base, base + 1, base + 2]
        } else {
            [base + 3, base + 2, base, base + 2, base + 1, base]
        }
    }

    /// Outward unit normal.
    pub fn normal(&self) -> [f32; 3] {
        let sign = if self.front { 1.0 } else { -1.0 };
        match self.plane {
            FacePlane::XY => [0.0, 0.0, sign],
            FacePlane::XZ => [0.0, sign, 0.0],
            FacePlane::YZ => [sign, 0.0, 0.0],
        }
    }
}
