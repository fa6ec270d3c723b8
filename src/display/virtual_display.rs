// Software display: back buffer for drawing, front buffer for what the
// "panel" shows. show_region copies only the bytes covering the region,
// so tests and simulators can see exactly what a partial flush moved.

use alloc::vec::Vec;
use core::convert::Infallible;

use log::debug;

use super::DisplayTarget;
use crate::buffer::PixelBuffer;
use crate::color::ColorMode;
use crate::error::Result;
use crate::ui::Region;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Calls to show/show_region that moved data.
    pub shows: u32,
    pub bytes: usize,
    /// Regions of partial flushes only.
    pub regions: u32,
}

pub struct VirtualDisplay {
    back: PixelBuffer,
    front: PixelBuffer,
    stats: TransferStats,
    history: Vec<Region>,
}

impl VirtualDisplay {
    pub fn new(width: u32, height: u32, mode: ColorMode) -> Result<Self> {
        let back = PixelBuffer::new(width, height, mode)?;
        let front = back.clone();
        Ok(Self {
            back,
            front,
            stats: TransferStats::default(),
            history: Vec::new(),
        })
    }

    /// What the panel currently shows.
    pub fn front(&self) -> &PixelBuffer {
        &self.front
    }

    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    /// Every region transmitted so far, full flushes included.
    pub fn history(&self) -> &[Region] {
        &self.history
    }

    pub fn reset_stats(&mut self) {
        self.stats = TransferStats::default();
        self.history.clear();
    }

    fn copy_region(&mut self, r: Region) -> usize {
        let x0 = r.x as u32;
        let x1 = x0 + r.w;
        let mut moved = 0;
        for y in r.y as u32..r.y as u32 + r.h {
            let src = self.back.row_bytes(y, x0, x1);
            let dst = self.front.row_bytes_mut(y, x0, x1);
            dst.copy_from_slice(src);
            moved += src.len();
        }
        moved
    }
}

impl DisplayTarget for VirtualDisplay {
    type Error = Infallible;

    fn buffer(&self) -> &PixelBuffer {
        &self.back
    }

    fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.back
    }

    fn show(&mut self) -> core::result::Result<(), Self::Error> {
        self.front.data_mut().copy_from_slice(self.back.data());
        self.stats.shows += 1;
        self.stats.bytes += self.back.len();
        self.history.push(self.back.bounds());
        debug!("[DISP] virtual full flush, {} bytes", self.back.len());
        Ok(())
    }

    fn show_region(&mut self, region: Region) -> core::result::Result<(), Self::Error> {
        let Some(r) = region.clamp_to(self.back.width(), self.back.height()) else {
            return Ok(());
        };
        let moved = self.copy_region(r);
        self.stats.shows += 1;
        self.stats.regions += 1;
        self.stats.bytes += moved;
        self.history.push(r);
        debug!(
            "[DISP] virtual partial flush {}x{}+{}+{}, {} bytes",
            r.w, r.h, r.x, r.y, moved
        );
        Ok(())
    }
}
