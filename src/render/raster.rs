use super::{to_data_uri, Overlay, Segment, KEYPOINT_COLOR, TEXT_COLOR};
use crate::{error::Error, geometry::Point};
use num_traits::ToPrimitive;
use opencv::{
    core::{add_weighted, Mat, MatTraitConst, Point2i, Rect, Scalar, Vector},
    imgcodecs::{imencode, imread, IMREAD_COLOR, IMWRITE_JPEG_QUALITY},
    imgproc::{circle, line, put_text, rectangle, FILLED, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
};
use std::path::Path;

pub const JPEG_QUALITY: i32 = 95;

fn pixel(point: Point) -> Result<Point2i, Error> {
    let x = point.x().round().to_i32();
    let y = point.y().round().to_i32();
    match (x, y) {
        (Some(x), Some(y)) => Ok(Point2i::new(x, y)),
        _ => Err(Error::ConvertPointToPixel(point.x(), point.y())),
    }
}

fn draw_segment(canvas: &mut Mat, segment: &Segment) -> Result<(), Error> {
    line(
        canvas,
        pixel(segment.from)?,
        pixel(segment.to)?,
        Scalar::from(segment.color),
        segment.thickness,
        LINE_8, // line_type
        0,      // shift
    )
    .map_err(Error::DrawLine)
}

/// Paint `overlay` onto a copy of `image` and return the JPEG bytes.
pub fn annotate(image: &Mat, overlay: &Overlay) -> Result<Vec<u8>, Error> {
    let mut canvas = image.try_clone().map_err(Error::CopyImage)?;

    for bone in &overlay.bones {
        draw_segment(&mut canvas, bone)?;
    }

    for marker in &overlay.markers {
        circle(
            &mut canvas,
            pixel(marker.center)?,
            marker.radius,
            Scalar::from(KEYPOINT_COLOR),
            FILLED, // thickness
            LINE_8, // line_type
            0,      // shift
        )
        .map_err(Error::DrawCircle)?;
    }

    for guide in &overlay.guides {
        draw_segment(&mut canvas, guide)?;
    }

    let panel = &overlay.panel;
    let mut shaded = canvas.try_clone().map_err(Error::CopyImage)?;
    let (left, top) = panel.top_left;
    let (right, bottom) = panel.bottom_right;
    rectangle(
        &mut shaded,
        Rect::new(left, top, right - left, bottom - top),
        Scalar::all(0.0),
        FILLED,
        LINE_8,
        0,
    )
    .map_err(Error::DrawRectangle)?;

    let mut blended = Mat::default();
    add_weighted(
        &shaded,
        panel.alpha,
        &canvas,
        1.0 - panel.alpha,
        0.0, // gamma
        &mut blended,
        -1, // keep the source depth
    )
    .map_err(Error::BlendOverlay)?;

    let (x, mut y) = panel.origin;
    for text in &panel.lines {
        put_text(
            &mut blended,
            text,
            Point2i::new(x, y),
            FONT_HERSHEY_SIMPLEX,
            panel.font_scale,
            Scalar::from(TEXT_COLOR),
            2,       // thickness
            LINE_AA, // line_type
            false,   // bottom_left_origin
        )
        .map_err(Error::PutText)?;
        y += panel.line_step;
    }

    let mut buffer = Vector::<u8>::new();
    let params = Vector::from_slice(&[IMWRITE_JPEG_QUALITY, JPEG_QUALITY]);
    imencode(".jpg", &blended, &mut buffer, &params).map_err(Error::EncodeImage)?;
    tracing::debug!(bytes = buffer.len(), "encoded annotated image");
    Ok(buffer.to_vec())
}

/// Read the image at `path`, annotate it, and return a JPEG data URI.
pub fn annotate_file(path: &Path, overlay: &Overlay) -> Result<String, Error> {
    let image = imread(&path.to_string_lossy(), IMREAD_COLOR)
        .map_err(|e| Error::ReadImage(e, path.to_owned()))?;
    if image.empty() {
        return Err(Error::EmptyImage(path.to_owned()));
    }
    let jpeg = annotate(&image, overlay)?;
    Ok(to_data_uri("image/jpeg", &jpeg))
}
