// Logical <-> physical coordinate mapping.
// W/H are always the physical (unrotated) buffer dimensions.

use crate::ui::Region;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Logical size for a physical `w` x `h` surface.
    pub const fn logical_size(self, w: u32, h: u32) -> (u32, u32) {
        match self {
            Rotation::Deg0 | Rotation::Deg180 => (w, h),
            Rotation::Deg90 | Rotation::Deg270 => (h, w),
        }
    }

    #[inline]
    pub const fn to_physical(self, lx: i32, ly: i32, w: u32, h: u32) -> (i32, i32) {
        let (w, h) = (w as i32, h as i32);
        match self {
            Rotation::Deg0 => (lx, ly),
            Rotation::Deg90 => (w - 1 - ly, lx),
            Rotation::Deg180 => (w - 1 - lx, h - 1 - ly),
            Rotation::Deg270 => (ly, h - 1 - lx),
        }
    }

    /// Map a logical rectangle to the physical rectangle it covers.
    pub const fn transform_region(self, r: Region, w: u32, h: u32) -> Region {
        let (w, h) = (w as i32, h as i32);
        let (rw, rh) = (r.w as i32, r.h as i32);
        match self {
            Rotation::Deg0 => r,
            Rotation::Deg90 => Region::new(w - r.y - rh, r.x, r.h, r.w),
            Rotation::Deg180 => Region::new(w - r.x - rw, h - r.y - rh, r.w, r.h),
            Rotation::Deg270 => Region::new(r.y, h - r.x - rw, r.h, r.w),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 7;
    const H: u32 = 4;

    #[test]
    fn test_every_pixel_maps_to_a_distinct_physical_pixel() {
        for rot in Rotation::ALL {
            let (lw, lh) = rot.logical_size(W, H);
            let mut seen = [[false; W as usize]; H as usize];
            for ly in 0..lh as i32 {
                for lx in 0..lw as i32 {
                    let (px, py) = rot.to_physical(lx, ly, W, H);
                    assert!(px >= 0 && px < W as i32 && py >= 0 && py < H as i32);
                    let cell = &mut seen[py as usize][px as usize];
                    assert!(!*cell, "{:?} ({}, {}) hit twice", rot, px, py);
                    *cell = true;
                }
            }
        }
    }

    #[test]
    fn test_corner_mapping() {
        assert_eq!(Rotation::Deg90.to_physical(0, 0, W, H), (6, 0));
        assert_eq!(Rotation::Deg180.to_physical(0, 0, W, H), (6, 3));
        assert_eq!(Rotation::Deg270.to_physical(0, 0, W, H), (0, 3));
    }

    #[test]
    fn test_region_transform_matches_point_transform() {
        let r = Region::new(1, 2, 2, 3);
        for rot in Rotation::ALL {
            let phys = rot.transform_region(r, W, H);
            for ly in r.y..r.bottom() {
                for lx in r.x..r.right() {
                    let (px, py) = rot.to_physical(lx, ly, W, H);
                    assert!(phys.contains(px, py), "{:?} ({}, {})", rot, lx, ly);
                }
            }
            assert_eq!(phys.area(), r.area());
        }
    }
}
