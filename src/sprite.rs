use std::path::Path;

use image::RgbaImage;
use thiserror::Error;

use crate::pet::descriptor::RenderDescriptor;

/// Behavior rows in the sheet (walk, idle, dragged, unused, back).
pub const ROWS: u32 = 5;
/// Animation frames per row.
pub const COLS: u32 = 3;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("failed to load sprite sheet: {0}")]
    Load(#[from] image::ImageError),
    #[error("sprite sheet {0}x{1} is smaller than the {COLS}x{ROWS} grid")]
    TooSmall(u32, u32),
}

/// A destination rectangle in surface pixels.
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// Mutable view over a 0RGB pixel surface (softbuffer's format). The surface
/// is sized in physical pixels, so one surface pixel is one screen pixel at
/// any display scale; the app re-sizes it whenever the window resizes or
/// changes scale factor.
pub struct PixelFrame<'a> {
    pub pixels: &'a mut [u32],
    pub width: u32,
    pub height: u32,
}

impl<'a> PixelFrame<'a> {
    pub fn new(pixels: &'a mut [u32], width: u32, height: u32) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }
}

/// A sprite sheet logically divided into `ROWS` behavior rows of `COLS`
/// animation frames each.
pub struct SpriteSheet {
    image: RgbaImage,
    sprite_w: u32,
    sprite_h: u32,
}

impl SpriteSheet {
    pub fn from_image(image: RgbaImage) -> Result<Self, SpriteError> {
        let (w, h) = image.dimensions();
        if w < COLS || h < ROWS {
            return Err(SpriteError::TooSmall(w, h));
        }
        Ok(Self {
            image,
            sprite_w: w / COLS,
            sprite_h: h / ROWS,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, SpriteError> {
        let image = image::open(path)?.to_rgba8();
        Self::from_image(image)
    }
}

/// Blits sheet sub-images into a pixel surface. Drawing is a no-op until a
/// sheet has been loaded.
pub struct SpriteRenderer {
    sheet: Option<SpriteSheet>,
}

impl SpriteRenderer {
    pub fn new() -> Self {
        Self { sheet: None }
    }

    pub fn set_sheet(&mut self, sheet: SpriteSheet) {
        log::info!(
            "sprite sheet loaded: {}x{} per frame, {ROWS} rows x {COLS} cols",
            sheet.sprite_w,
            sheet.sprite_h
        );
        self.sheet = Some(sheet);
    }

    pub fn loaded(&self) -> bool {
        self.sheet.is_some()
    }

    /// Draw the sub-image selected by `desc` into `dest`, nearest-neighbor
    /// scaled, mirrored about its vertical axis when `desc.flip`. Row and
    /// frame indices are clamped into range. Source alpha is composited
    /// src-over; out-of-frame destination pixels are skipped.
    pub fn draw(&self, frame: &mut PixelFrame<'_>, desc: &RenderDescriptor, dest: Rect) {
        let Some(sheet) = &self.sheet else {
            return;
        };
        if dest.w == 0 || dest.h == 0 {
            return;
        }

        let row = desc.row.min(ROWS - 1);
        let col = desc.frame.min(COLS - 1);
        let sx0 = col * sheet.sprite_w;
        let sy0 = row * sheet.sprite_h;

        for dy in 0..dest.h {
            let fy = dest.y + dy as i32;
            if fy < 0 || fy >= frame.height as i32 {
                continue;
            }
            // Nearest-neighbor row pick, no smoothing.
            let sy = sy0 + dy * sheet.sprite_h / dest.h;

            for dx in 0..dest.w {
                let fx = dest.x + dx as i32;
                if fx < 0 || fx >= frame.width as i32 {
                    continue;
                }
                // Mirroring reverses the horizontal source walk, so each
                // call leaves no transform state behind.
                let ux = if desc.flip { dest.w - 1 - dx } else { dx };
                let sx = sx0 + ux * sheet.sprite_w / dest.w;

                let src = sheet.image.get_pixel(sx, sy).0;
                let idx = fy as usize * frame.width as usize + fx as usize;
                frame.pixels[idx] = blend(src, frame.pixels[idx]);
            }
        }
    }
}

/// Src-over composite of an RGBA pixel onto a 0RGB background pixel.
fn blend(src: [u8; 4], dst: u32) -> u32 {
    let a = src[3] as u32;
    if a == 255 {
        return (src[0] as u32) << 16 | (src[1] as u32) << 8 | src[2] as u32;
    }
    if a == 0 {
        return dst;
    }
    let inv = 255 - a;
    let dr = (dst >> 16) & 0xFF;
    let dg = (dst >> 8) & 0xFF;
    let db = dst & 0xFF;
    let r = (src[0] as u32 * a + dr * inv) / 255;
    let g = (src[1] as u32 * a + dg * inv) / 255;
    let b = (src[2] as u32 * a + db * inv) / 255;
    r << 16 | g << 8 | b
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 3x5 grid of 2x2 cells, each cell filled with a unique opaque color.
    fn test_sheet() -> SpriteSheet {
        let mut img = RgbaImage::new(COLS * 2, ROWS * 2);
        for row in 0..ROWS {
            for col in 0..COLS {
                let color = Rgba([(row * 16 + col + 1) as u8, 0, 0, 255]);
                for py in 0..2 {
                    for px in 0..2 {
                        img.put_pixel(col * 2 + px, row * 2 + py, color);
                    }
                }
            }
        }
        SpriteSheet::from_image(img).unwrap()
    }

    fn cell_color(row: u32, col: u32) -> u32 {
        ((row * 16 + col + 1) as u32) << 16
    }

    fn desc(row: u32, frame: u32, flip: bool) -> RenderDescriptor {
        RenderDescriptor { row, frame, flip }
    }

    #[test]
    fn sheet_slicing_computes_cell_size_once() {
        let sheet = test_sheet();
        assert_eq!(sheet.sprite_w, 2);
        assert_eq!(sheet.sprite_h, 2);
    }

    #[test]
    fn rejects_images_smaller_than_the_grid() {
        let img = RgbaImage::new(2, 2);
        assert!(matches!(
            SpriteSheet::from_image(img),
            Err(SpriteError::TooSmall(2, 2))
        ));
    }

    #[test]
    fn draw_is_a_noop_before_the_sheet_loads() {
        let renderer = SpriteRenderer::new();
        let mut pixels = vec![0u32; 4];
        let mut frame = PixelFrame::new(&mut pixels, 2, 2);
        renderer.draw(&mut frame, &desc(0, 0, false), Rect::new(0, 0, 2, 2));
        assert!(pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn draw_blits_the_selected_row_and_frame() {
        let mut renderer = SpriteRenderer::new();
        renderer.set_sheet(test_sheet());

        let mut pixels = vec![0u32; 4];
        let mut frame = PixelFrame::new(&mut pixels, 2, 2);
        renderer.draw(&mut frame, &desc(4, 1, false), Rect::new(0, 0, 2, 2));
        assert!(pixels.iter().all(|&p| p == cell_color(4, 1)));
    }

    #[test]
    fn draw_scales_nearest_neighbor() {
        let mut renderer = SpriteRenderer::new();
        renderer.set_sheet(test_sheet());

        // 2x2 source into a 4x4 destination: still one flat color.
        let mut pixels = vec![0u32; 16];
        let mut frame = PixelFrame::new(&mut pixels, 4, 4);
        renderer.draw(&mut frame, &desc(1, 2, false), Rect::new(0, 0, 4, 4));
        assert!(pixels.iter().all(|&p| p == cell_color(1, 2)));
    }

    #[test]
    fn flip_mirrors_about_the_vertical_axis() {
        let mut renderer = SpriteRenderer::new();
        let mut img = RgbaImage::new(COLS * 2, ROWS * 2);
        // row 0, frame 0: left column red, right column green
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img.put_pixel(1, 1, Rgba([0, 255, 0, 255]));
        renderer.set_sheet(SpriteSheet::from_image(img).unwrap());

        let mut pixels = vec![0u32; 4];
        let mut frame = PixelFrame::new(&mut pixels, 2, 2);
        renderer.draw(&mut frame, &desc(0, 0, true), Rect::new(0, 0, 2, 2));
        // mirrored: green lands on the left, red on the right
        assert_eq!(pixels[0], 0x00FF00);
        assert_eq!(pixels[1], 0xFF0000);
        assert_eq!(pixels[2], 0x00FF00);
        assert_eq!(pixels[3], 0xFF0000);
    }

    #[test]
    fn out_of_range_indices_are_clamped() {
        let mut renderer = SpriteRenderer::new();
        renderer.set_sheet(test_sheet());

        let mut pixels = vec![0u32; 4];
        let mut frame = PixelFrame::new(&mut pixels, 2, 2);
        renderer.draw(&mut frame, &desc(99, 99, false), Rect::new(0, 0, 2, 2));
        assert!(pixels.iter().all(|&p| p == cell_color(ROWS - 1, COLS - 1)));
    }

    #[test]
    fn destination_is_clipped_to_the_frame() {
        let mut renderer = SpriteRenderer::new();
        renderer.set_sheet(test_sheet());

        let mut pixels = vec![0u32; 4];
        let mut frame = PixelFrame::new(&mut pixels, 2, 2);
        renderer.draw(&mut frame, &desc(0, 0, false), Rect::new(1, 1, 2, 2));
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[1], 0);
        assert_eq!(pixels[2], 0);
        assert_eq!(pixels[3], cell_color(0, 0));
    }

    #[test]
    fn transparent_source_pixels_leave_the_background() {
        let mut renderer = SpriteRenderer::new();
        let mut img = RgbaImage::new(COLS * 2, ROWS * 2);
        img.put_pixel(0, 0, Rgba([255, 255, 255, 0]));
        renderer.set_sheet(SpriteSheet::from_image(img).unwrap());

        let mut pixels = vec![0x123456u32; 4];
        let mut frame = PixelFrame::new(&mut pixels, 2, 2);
        renderer.draw(&mut frame, &desc(0, 0, false), Rect::new(0, 0, 2, 2));
        assert_eq!(pixels[0], 0x123456);
    }
}
