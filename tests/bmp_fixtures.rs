// Decoding the BMP fixtures under tests/assets.

use pulp_graphics::{Color, ColorMode, Image};

const WL: [(&[u8], u16); 6] = [
    (include_bytes!("assets/wl1.bmp"), 1),
    (include_bytes!("assets/wl4.bmp"), 4),
    (include_bytes!("assets/wl8.bmp"), 8),
    (include_bytes!("assets/wl16.bmp"), 16),
    (include_bytes!("assets/wl24.bmp"), 24),
    (include_bytes!("assets/wl32.bmp"), 32),
];

const RGB17X3: &[u8] = include_bytes!("assets/RGB17x3_24.bmp");

// the gradient the wl fixtures were drawn with
fn wl_color(x: u32, y: u32) -> Color {
    let (w, h) = (110, 53);
    if x < 2 || y < 2 || x >= w - 2 || y >= h - 2 {
        return Color::BLACK;
    }
    Color::rgb(
        (x * 255 / (w - 1)) as u8,
        (y * 255 / (h - 1)) as u8,
        (255 - (x + y) * 255 / (w + h - 2)) as u8,
    )
}

fn close(a: Color, b: Color, tol: i32) -> bool {
    (a.r as i32 - b.r as i32).abs() <= tol
        && (a.g as i32 - b.g as i32).abs() <= tol
        && (a.b as i32 - b.b as i32).abs() <= tol
}

#[test]
fn test_wl_fixtures_report_size_and_depth() {
    for (bytes, bpp) in WL {
        let img = Image::from_bmp(bytes).unwrap();
        assert_eq!(img.width(), 110, "{}bpp", bpp);
        assert_eq!(img.height(), 53, "{}bpp", bpp);
        assert_eq!(img.bits_per_pixel(), bpp);
    }
}

#[test]
fn test_decoded_buffer_modes() {
    let mode = |i: usize| Image::from_bmp(WL[i].0).unwrap().buffer().mode();
    assert_eq!(mode(0), ColorMode::Format24bppRgb888);
    assert_eq!(mode(3), ColorMode::Format16bppRgb565);
    assert_eq!(mode(4), ColorMode::Format24bppRgb888);
    assert_eq!(mode(5), ColorMode::Format32bppRgba8888);
}

#[test]
fn test_rgb17x3_rows() {
    let img = Image::from_bmp(RGB17X3).unwrap();
    assert_eq!((img.width(), img.height(), img.bits_per_pixel()), (17, 3, 24));
    let buf = img.buffer();
    for x in 0..17 {
        assert_eq!(buf.get_pixel(x, 0).unwrap(), Color::RED, "x={}", x);
        assert_eq!(buf.get_pixel(x, 1).unwrap(), Color::GREEN, "x={}", x);
        assert_eq!(buf.get_pixel(x, 2).unwrap(), Color::BLUE, "x={}", x);
    }
}

#[test]
fn test_direct_colour_depths_match_source() {
    let wl24 = Image::from_bmp(WL[4].0).unwrap();
    let wl32 = Image::from_bmp(WL[5].0).unwrap();
    let wl16 = Image::from_bmp(WL[3].0).unwrap();
    for y in 0..53 {
        for x in 0..110 {
            let want = wl_color(x, y);
            let (xi, yi) = (x as i32, y as i32);
            assert_eq!(wl24.buffer().get_pixel(xi, yi).unwrap(), want);
            assert_eq!(wl32.buffer().get_pixel(xi, yi).unwrap(), want);
            let c16 = wl16.buffer().get_pixel(xi, yi).unwrap();
            assert!(close(c16, want, 8), "({}, {}) {:?} vs {:?}", x, y, c16, want);
        }
    }
}

#[test]
fn test_palette_depths_are_gray() {
    for (bytes, bpp) in &WL[..3] {
        let img = Image::from_bmp(bytes).unwrap();
        let buf = img.buffer();
        assert_eq!(buf.get_pixel(0, 0).unwrap(), Color::BLACK, "{}bpp", bpp);
        for y in 0..53 {
            for x in 0..110 {
                let c = buf.get_pixel(x, y).unwrap();
                assert!(c.r == c.g && c.g == c.b, "{}bpp ({}, {})", bpp, x, y);
            }
        }
    }
}

#[test]
fn test_truncated_file_is_rejected() {
    let bytes = &WL[4].0[..1000];
    assert!(Image::from_bmp(bytes).is_err());
}

#[cfg(feature = "std")]
#[test]
fn test_load_from_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/assets/RGB17x3_24.bmp");
    let img = Image::load_from_file(path).unwrap();
    assert_eq!(img.width(), 17);
    assert!(Image::load_from_file("/nonexistent/image.bmp").is_err());
}
