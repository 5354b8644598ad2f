// File: compositor.rs
// Location: /src/compositor.rs

use image::{imageops, Rgba, RgbaImage};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Mask, Paint, Path, PathBuilder, Pattern, Pixmap, Rect,
    SpreadMode, Transform,
};

use crate::config::LogoShape;
use crate::logo::LogoError;

/// Quiet zone added around the rendered code, in output pixels.
pub const MARGIN: u32 = 10;

/// Gap between the badge edge and the logo, in the nominal size space.
const LOGO_PADDING: f32 = 4.0;
const CORNER_RADIUS_RATIO: f32 = 0.15;
// control point distance for a quarter circle drawn as one cubic
const KAPPA: f32 = 0.552_284_75;

/// A decoded logo plus how it should sit on the code.
#[derive(Debug, Clone, Copy)]
pub struct LogoOverlay<'a> {
    pub image: &'a RgbaImage,
    pub size: u32,
    pub opacity: f32,
    pub shape: LogoShape,
}

/// Badge and image placement in output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogoGeometry {
    pub scale: f32,
    pub container_x: f32,
    pub container_y: f32,
    pub container_size: f32,
    pub padding: f32,
    pub image_x: f32,
    pub image_y: f32,
    pub image_size: f32,
}

impl LogoGeometry {
    /// `rendered_width` is the width the renderer actually produced,
    /// `nominal_size` the size that was asked for. Logo sizes are given in
    /// the nominal space and scaled by their ratio.
    pub fn new(
        output_width: u32,
        output_height: u32,
        rendered_width: u32,
        nominal_size: u32,
        logo_size: u32,
    ) -> Result<Self, LogoError> {
        if nominal_size == 0 {
            return Err(LogoError::Geometry("requested size is zero".to_string()));
        }

        let scale = rendered_width as f32 / nominal_size as f32;
        let container_size = logo_size as f32 * scale;
        let padding = LOGO_PADDING * scale;
        let image_size = container_size - padding * 2.0;

        if image_size.is_nan() || image_size <= 0.0 {
            return Err(LogoError::Geometry(format!(
                "logo size {} leaves no room for the image",
                logo_size
            )));
        }

        let container_x = (output_width as f32 - container_size) / 2.0;
        let container_y = (output_height as f32 - container_size) / 2.0;

        Ok(Self {
            scale,
            container_x,
            container_y,
            container_size,
            padding,
            image_x: container_x + padding,
            image_y: container_y + padding,
            image_size,
        })
    }
}

/// Result of one compositing pass. `warning` is set when a logo was
/// requested but could not be drawn; `image` is then the plain code.
#[derive(Debug)]
pub struct Composition {
    pub image: RgbaImage,
    pub warning: Option<LogoError>,
}

/// Pads the rendered code with the quiet zone and, if given, stamps the
/// logo badge onto its center. Always starts from a fresh surface.
pub fn compose(
    qr: &RgbaImage,
    nominal_size: u32,
    background: Rgba<u8>,
    logo: Option<&LogoOverlay<'_>>,
) -> Composition {
    let mut base = RgbaImage::from_pixel(
        qr.width() + MARGIN * 2,
        qr.height() + MARGIN * 2,
        background,
    );
    imageops::replace(&mut base, qr, i64::from(MARGIN), i64::from(MARGIN));

    let Some(overlay) = logo else {
        return Composition {
            image: base,
            warning: None,
        };
    };

    match draw_logo(&base, qr.width(), nominal_size, overlay) {
        Ok(image) => Composition {
            image,
            warning: None,
        },
        Err(e) => {
            log::warn!("Drawing code without logo: {}", e);
            Composition {
                image: base,
                warning: Some(e),
            }
        }
    }
}

fn draw_logo(
    base: &RgbaImage,
    rendered_width: u32,
    nominal_size: u32,
    overlay: &LogoOverlay<'_>,
) -> Result<RgbaImage, LogoError> {
    let geometry = LogoGeometry::new(
        base.width(),
        base.height(),
        rendered_width,
        nominal_size,
        overlay.size,
    )?;

    // Everything fallible is prepared before the first pixel is touched.
    let badge = shape_path(
        overlay.shape,
        geometry.container_x,
        geometry.container_y,
        geometry.container_size,
    )
    .ok_or_else(|| LogoError::Geometry("badge outline is degenerate".to_string()))?;
    let clip = shape_path(
        overlay.shape,
        geometry.image_x,
        geometry.image_y,
        geometry.image_size,
    )
    .ok_or_else(|| LogoError::Geometry("logo clip is degenerate".to_string()))?;
    let logo = to_pixmap(overlay.image)
        .ok_or_else(|| LogoError::Geometry("logo has no pixels".to_string()))?;
    let mut canvas = to_pixmap(base)
        .ok_or_else(|| LogoError::Geometry("output surface is empty".to_string()))?;
    let mut coverage = Mask::new(base.width(), base.height())
        .ok_or_else(|| LogoError::Geometry("output surface is empty".to_string()))?;
    coverage.fill_path(&badge, FillRule::Winding, true, Transform::identity());
    let image_draw = ClippedDraw::begin(
        &canvas,
        &clip,
        geometry.image_x,
        geometry.image_y,
        geometry.image_size,
        overlay.opacity,
    )
    .ok_or_else(|| LogoError::Geometry("failed to set up logo clip".to_string()))?;

    // The badge ignores the logo opacity so the code never shows a hole.
    let mut white = Paint::default();
    white.set_color_rgba8(255, 255, 255, 255);
    white.anti_alias = true;
    canvas.fill_path(&badge, &white, FillRule::Winding, Transform::identity(), None);

    image_draw.draw_image(&mut canvas, &logo);

    log::debug!(
        "Placed {:?} logo badge {:.1}px at ({:.1}, {:.1}), scale {:.3}",
        overlay.shape,
        geometry.container_size,
        geometry.container_x,
        geometry.container_y,
        geometry.scale
    );

    Ok(copy_covered(base, &canvas, &coverage))
}

/// Clip region, target and alpha that apply to a single image draw.
/// Consumed by the draw, so none of it can leak into later drawing.
struct ClippedDraw {
    mask: Mask,
    target: Rect,
    opacity: f32,
}

impl ClippedDraw {
    fn begin(canvas: &Pixmap, clip: &Path, x: f32, y: f32, size: f32, opacity: f32) -> Option<Self> {
        let target = Rect::from_xywh(x, y, size, size)?;
        let mut mask = Mask::new(canvas.width(), canvas.height())?;
        mask.fill_path(clip, FillRule::Winding, true, Transform::identity());
        Some(Self {
            mask,
            target,
            opacity,
        })
    }

    /// Draws `image` stretched over the target square.
    fn draw_image(self, canvas: &mut Pixmap, image: &Pixmap) {
        let sx = self.target.width() / image.width() as f32;
        let sy = self.target.height() / image.height() as f32;

        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.shader = Pattern::new(
            image.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bicubic,
            self.opacity,
            Transform::from_row(sx, 0.0, 0.0, sy, self.target.x(), self.target.y()),
        );

        canvas.fill_rect(self.target, &paint, Transform::identity(), Some(&self.mask));
    }
}

fn shape_path(shape: LogoShape, x: f32, y: f32, size: f32) -> Option<Path> {
    match shape {
        LogoShape::Square => Rect::from_xywh(x, y, size, size).map(PathBuilder::from_rect),
        LogoShape::Circle => {
            let radius = size / 2.0;
            PathBuilder::from_circle(x + radius, y + radius, radius)
        }
        LogoShape::Rounded => rounded_rect(x, y, size, size * CORNER_RADIUS_RATIO),
    }
}

fn rounded_rect(x: f32, y: f32, size: f32, radius: f32) -> Option<Path> {
    let r = radius.min(size / 2.0);
    let k = r * KAPPA;
    let right = x + size;
    let bottom = y + size;

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Takes the drawn pixels where `coverage` is set and the untouched base
/// pixels everywhere else. Premultiplied storage is lossy for translucent
/// pixels, so nothing outside the badge goes through it.
fn copy_covered(base: &RgbaImage, pixmap: &Pixmap, coverage: &Mask) -> RgbaImage {
    let mut image = base.clone();
    let drawn = image
        .pixels_mut()
        .zip(pixmap.pixels())
        .zip(coverage.data())
        .filter(|(_, covered)| **covered > 0);
    for ((dst, src), _) in drawn {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}
