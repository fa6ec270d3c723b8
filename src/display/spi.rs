// Framebuffered SPI panel speaking the MIPI DCS command set
// (ST7735/ST7789/ILI9341 family). Chip-specific init belongs to the board;
// this only opens an address window and streams the buffer bytes for it.
// DC low = command, DC high = data.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::{info, warn};

use super::DisplayTarget;
use crate::buffer::PixelBuffer;
use crate::color::ColorMode;
use crate::error::GraphicsError;
use crate::ui::Region;

mod cmd {
    pub const SLEEP_OUT: u8 = 0x11;
    pub const DISPLAY_ON: u8 = 0x29;
    pub const COLUMN_ADDRESS_SET: u8 = 0x2A;
    pub const ROW_ADDRESS_SET: u8 = 0x2B;
    pub const MEMORY_WRITE: u8 = 0x2C;
    pub const PIXEL_FORMAT_SET: u8 = 0x3A;
}

const SLEEP_OUT_DELAY_MS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError<S, P> {
    Spi(S),
    Pin(P),
}

impl<S: fmt::Debug, P: fmt::Debug> fmt::Display for DisplayError<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Spi(e) => write!(f, "spi transfer failed: {:?}", e),
            DisplayError::Pin(e) => write!(f, "dc pin failed: {:?}", e),
        }
    }
}

impl<S: fmt::Debug, P: fmt::Debug> core::error::Error for DisplayError<S, P> {}

pub struct SpiDisplay<SPI, DC> {
    spi: SPI,
    dc: DC,
    buffer: PixelBuffer,
    col_offset: u16,
    row_offset: u16,
}

impl<SPI, DC> SpiDisplay<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    pub fn new(
        spi: SPI,
        dc: DC,
        width: u32,
        height: u32,
        mode: ColorMode,
    ) -> Result<Self, GraphicsError> {
        if pixel_format(mode).is_none() {
            return Err(GraphicsError::UnsupportedColorMode(mode));
        }
        Ok(Self {
            spi,
            dc,
            buffer: PixelBuffer::new(width, height, mode)?,
            col_offset: 0,
            row_offset: 0,
        })
    }

    /// Panel RAM offset of the visible area (common on 128x160 glass).
    pub fn with_offset(mut self, col: u16, row: u16) -> Self {
        self.col_offset = col;
        self.row_offset = row;
        self
    }

    /// Wake the panel, select the pixel format, switch it on.
    pub fn init<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<(), DisplayError<SPI::Error, DC::Error>> {
        self.send_command(cmd::SLEEP_OUT, &[])?;
        delay.delay_ms(SLEEP_OUT_DELAY_MS);
        if let Some(colmod) = pixel_format(self.buffer.mode()) {
            self.send_command(cmd::PIXEL_FORMAT_SET, &[colmod])?;
        }
        self.send_command(cmd::DISPLAY_ON, &[])?;
        Ok(())
    }

    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }

    fn send_command(
        &mut self,
        command: u8,
        params: &[u8],
    ) -> Result<(), DisplayError<SPI::Error, DC::Error>> {
        self.dc.set_low().map_err(DisplayError::Pin)?;
        self.spi.write(&[command]).map_err(DisplayError::Spi)?;
        if !params.is_empty() {
            self.dc.set_high().map_err(DisplayError::Pin)?;
            self.spi.write(params).map_err(DisplayError::Spi)?;
        }
        Ok(())
    }

    fn set_window(&mut self, r: Region) -> Result<(), DisplayError<SPI::Error, DC::Error>> {
        let x0 = r.x as u16 + self.col_offset;
        let x1 = x0 + r.w as u16 - 1;
        let y0 = r.y as u16 + self.row_offset;
        let y1 = y0 + r.h as u16 - 1;
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.send_command(cmd::COLUMN_ADDRESS_SET, &[x0h, x0l, x1h, x1l])?;
        self.send_command(cmd::ROW_ADDRESS_SET, &[y0h, y0l, y1h, y1l])?;
        Ok(())
    }

    fn write_window(&mut self, r: Region) -> Result<usize, DisplayError<SPI::Error, DC::Error>> {
        self.set_window(r)?;
        self.send_command(cmd::MEMORY_WRITE, &[])?;
        self.dc.set_high().map_err(DisplayError::Pin)?;

        let x0 = r.x as u32;
        let x1 = x0 + r.w;
        let full_rows = x0 == 0 && x1 == self.buffer.width();
        if full_rows {
            let stride = self.buffer.stride();
            let start = r.y as usize * stride;
            let end = start + r.h as usize * stride;
            let data = &self.buffer.data()[start..end];
            self.spi.write(data).map_err(DisplayError::Spi)?;
            return Ok(data.len());
        }

        let mut sent = 0;
        for y in r.y as u32..r.y as u32 + r.h {
            let row = self.buffer.row_bytes(y, x0, x1);
            self.spi.write(row).map_err(DisplayError::Spi)?;
            sent += row.len();
        }
        Ok(sent)
    }

    // 12bpp shares a byte between column pairs; widen to even columns
    fn align_window(&self, r: Region) -> Region {
        if self.buffer.mode() != ColorMode::Format12bppRgb444 {
            return r;
        }
        r.align_columns(2)
            .clamp_to(self.buffer.width(), self.buffer.height())
            .unwrap_or(r)
    }
}

// MIPI DCS COLMOD value for each mode the panel family can take directly
fn pixel_format(mode: ColorMode) -> Option<u8> {
    match mode {
        ColorMode::Format12bppRgb444 => Some(0x53),
        ColorMode::Format16bppRgb565 => Some(0x55),
        ColorMode::Format18bppRgb666 => Some(0x66),
        ColorMode::Format24bppRgb888 => Some(0x77),
        _ => None,
    }
}

impl<SPI, DC> DisplayTarget for SpiDisplay<SPI, DC>
where
    SPI: SpiDevice,
    DC: OutputPin,
{
    type Error = DisplayError<SPI::Error, DC::Error>;

    fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }

    fn show(&mut self) -> Result<(), Self::Error> {
        let bytes = self.write_window(self.buffer.bounds())?;
        info!("[DISP] full flush, {} bytes", bytes);
        Ok(())
    }

    fn show_region(&mut self, region: Region) -> Result<(), Self::Error> {
        let Some(r) = region.clamp_to(self.buffer.width(), self.buffer.height()) else {
            warn!("[DISP] show_region outside panel, skipped");
            return Ok(());
        };
        let r = self.align_window(r);
        let bytes = self.write_window(r)?;
        info!(
            "[DISP] partial flush {}x{}+{}+{}, {} bytes",
            r.w, r.h, r.x, r.y, bytes
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use alloc::vec::Vec;
    use core::convert::Infallible;
    use embedded_hal::spi::{ErrorKind, ErrorType, Operation};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Wire {
        Command(u8),
        Data(Vec<u8>),
    }

    #[derive(Default)]
    struct Bus {
        dc_high: bool,
        log: Vec<Wire>,
        fail: bool,
    }

    // pin and device share one log so tests see the exact byte stream
    type Shared = alloc::rc::Rc<core::cell::RefCell<Bus>>;

    struct MockSpi(Shared);
    struct MockDc(Shared);

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct MockSpiError;

    impl embedded_hal::spi::Error for MockSpiError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    impl ErrorType for MockSpi {
        type Error = MockSpiError;
    }

    impl SpiDevice for MockSpi {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), MockSpiError> {
            let mut bus = self.0.borrow_mut();
            if bus.fail {
                return Err(MockSpiError);
            }
            for op in operations {
                if let Operation::Write(bytes) = op {
                    if bus.dc_high {
                        bus.log.push(Wire::Data(bytes.to_vec()));
                    } else {
                        for &b in bytes.iter() {
                            bus.log.push(Wire::Command(b));
                        }
                    }
                }
            }
            Ok(())
        }
    }

    impl embedded_hal::digital::ErrorType for MockDc {
        type Error = Infallible;
    }

    impl OutputPin for MockDc {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().dc_high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().dc_high = true;
            Ok(())
        }
    }

    fn panel(mode: ColorMode) -> (SpiDisplay<MockSpi, MockDc>, Shared) {
        let bus = Shared::default();
        let disp = SpiDisplay::new(MockSpi(bus.clone()), MockDc(bus.clone()), 10, 4, mode).unwrap();
        (disp, bus)
    }

    #[test]
    fn test_rejects_modes_the_panel_cannot_take() {
        let bus = Shared::default();
        let r = SpiDisplay::new(
            MockSpi(bus.clone()),
            MockDc(bus),
            10,
            4,
            ColorMode::Format1bpp,
        );
        assert!(matches!(
            r,
            Err(GraphicsError::UnsupportedColorMode(ColorMode::Format1bpp))
        ));
    }

    #[test]
    fn test_partial_flush_sends_window_then_rows() {
        let (mut disp, bus) = panel(ColorMode::Format16bppRgb565);
        disp.buffer_mut().fill_rect(2, 1, 3, 2, Color::RED);
        disp.show_region(Region::new(2, 1, 3, 2)).unwrap();

        let log = &bus.borrow().log;
        assert_eq!(log[0], Wire::Command(0x2A));
        assert_eq!(log[1], Wire::Data(alloc::vec![0, 2, 0, 4]));
        assert_eq!(log[2], Wire::Command(0x2B));
        assert_eq!(log[3], Wire::Data(alloc::vec![0, 1, 0, 2]));
        assert_eq!(log[4], Wire::Command(0x2C));
        let rows: Vec<_> = log[5..].to_vec();
        assert_eq!(rows.len(), 2);
        for row in rows {
            assert_eq!(row, Wire::Data(alloc::vec![0xF8, 0x00, 0xF8, 0x00, 0xF8, 0x00]));
        }
    }

    #[test]
    fn test_full_flush_is_one_burst() {
        let (mut disp, bus) = panel(ColorMode::Format16bppRgb565);
        disp.show().unwrap();
        let log = &bus.borrow().log;
        let Some(Wire::Data(burst)) = log.last() else {
            panic!("no data burst");
        };
        assert_eq!(burst.len(), 10 * 4 * 2);
    }

    #[test]
    fn test_rgb444_window_widened_to_even_columns() {
        let (mut disp, bus) = panel(ColorMode::Format12bppRgb444);
        disp.show_region(Region::new(3, 0, 2, 1)).unwrap();
        let log = &bus.borrow().log;
        assert_eq!(log[1], Wire::Data(alloc::vec![0, 2, 0, 5]));
        assert_eq!(log[5], Wire::Data(alloc::vec![0; 6]));
    }

    #[test]
    fn test_bus_error_surfaces_to_caller() {
        let (mut disp, bus) = panel(ColorMode::Format16bppRgb565);
        bus.borrow_mut().fail = true;
        assert_eq!(disp.show(), Err(DisplayError::Spi(MockSpiError)));
    }
}
