//! Interactive keypoint and match overlays.

use feature_track::provider::{Observer, StageEvent};
use feature_track::track_core::KeyPoint;
use feature_track::FrameRecord;
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::drawing;
use log::*;
use std::io::{self, BufRead};

const KEYPOINT_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const MATCH_COLOR: Rgba<u8> = Rgba([0, 255, 255, 255]);

fn to_rgba(image: &GrayImage) -> RgbaImage {
    DynamicImage::ImageLuma8(image.clone()).to_rgba8()
}

fn draw_keypoint(canvas: &mut RgbaImage, keypoint: &KeyPoint, x_offset: u32, color: Rgba<u8>) {
    let center = (keypoint.x() as i32 + x_offset as i32, keypoint.y() as i32);
    let radius = (keypoint.size / 2.0).round().max(1.0) as i32;
    drawing::draw_hollow_circle_mut(canvas, center, radius, color);
    if keypoint.angle >= 0.0 {
        let (sin, cos) = keypoint.angle.to_radians().sin_cos();
        let end = (
            center.0 as f32 + cos * radius as f32,
            center.1 as f32 + sin * radius as f32,
        );
        drawing::draw_line_segment_mut(canvas, (center.0 as f32, center.1 as f32), end, color);
    }
}

/// Draws the keypoints of a frame as circles of their size, with a tick for their orientation.
pub fn render_keypoints(frame: &FrameRecord) -> RgbaImage {
    let mut canvas = to_rgba(&frame.image);
    for keypoint in &frame.keypoints {
        draw_keypoint(&mut canvas, keypoint, 0, KEYPOINT_COLOR);
    }
    canvas
}

/// Places `previous` left of `current` and connects the matched keypoints.
pub fn render_matches(previous: &FrameRecord, current: &FrameRecord) -> RgbaImage {
    let (left_width, left_height) = previous.image.dimensions();
    let (right_width, right_height) = current.image.dimensions();
    let mut canvas = RgbaImage::from_pixel(
        left_width + right_width,
        left_height.max(right_height),
        Rgba([0, 0, 0, 255]),
    );
    image::imageops::replace(&mut canvas, &to_rgba(&previous.image), 0, 0);
    image::imageops::replace(&mut canvas, &to_rgba(&current.image), left_width as i64, 0);

    for m in &current.matches {
        let (Some(a), Some(b)) = (
            previous.keypoints.get(m.previous),
            current.keypoints.get(m.current),
        ) else {
            warn!("match {:?} refers to a missing keypoint", m);
            continue;
        };
        draw_keypoint(&mut canvas, a, 0, KEYPOINT_COLOR);
        draw_keypoint(&mut canvas, b, left_width, KEYPOINT_COLOR);
        drawing::draw_line_segment_mut(
            &mut canvas,
            a.point,
            (b.x() + left_width as f32, b.y()),
            MATCH_COLOR,
        );
    }
    canvas
}

/// Shows overlays with the system image viewer and waits for Enter after each one.
///
/// Keypoints are shown once a frame is filtered and matches once a frame is matched.
#[derive(Debug, Default)]
pub struct OverlayObserver;

impl OverlayObserver {
    fn show(&self, title: &str, image: RgbaImage) -> io::Result<()> {
        let path = tempfile::Builder::new()
            .prefix("kptrack-")
            .suffix(".png")
            .tempfile()?
            .into_temp_path();
        image
            .save(&path)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        open::that(&path)?;
        println!("{} (press Enter to continue)", title);
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        // The temporary file is removed here.
        drop(path);
        Ok(())
    }
}

impl Observer for OverlayObserver {
    fn observe(&mut self, event: StageEvent<'_>) {
        let (title, image) = match event {
            StageEvent::Filtered(frame) => (
                format!(
                    "frame {}: {} keypoints in focus",
                    frame.index,
                    frame.keypoints.len()
                ),
                render_keypoints(frame),
            ),
            StageEvent::Matched { previous, current } => (
                format!(
                    "frames {} and {}: {} matches",
                    previous.index,
                    current.index,
                    current.matches.len()
                ),
                render_matches(previous, current),
            ),
            StageEvent::Detected(_) | StageEvent::Described(_) => return,
        };
        if let Err(e) = self.show(&title, image) {
            error!("unable to show the overlay for {}: {}", title, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_track::track_core::FeatureMatch;
    use image::Luma;

    fn frame(index: usize, keypoints: Vec<KeyPoint>) -> FrameRecord {
        let mut frame = FrameRecord::new(index, GrayImage::from_pixel(40, 30, Luma([10])));
        frame.keypoints = keypoints;
        frame
    }

    #[test]
    fn keypoints_are_circled() {
        let frame = frame(0, vec![KeyPoint::new(20.0, 15.0, 8.0)]);
        let canvas = render_keypoints(&frame);
        assert_eq!(canvas.dimensions(), (40, 30));
        assert_eq!(canvas.get_pixel(24, 15), &KEYPOINT_COLOR);
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([10, 10, 10, 255]));
    }

    #[test]
    fn matches_are_drawn_side_by_side() {
        let previous = frame(0, vec![KeyPoint::new(5.0, 10.0, 2.0)]);
        let mut current = frame(1, vec![KeyPoint::new(5.0, 10.0, 2.0)]);
        current.matches = vec![FeatureMatch::new(0, 0, 0.0)];
        let canvas = render_matches(&previous, &current);
        assert_eq!(canvas.dimensions(), (80, 30));
        assert_eq!(canvas.get_pixel(25, 10), &MATCH_COLOR);
        assert_eq!(canvas.get_pixel(25, 20), &Rgba([10, 10, 10, 255]));
    }

    #[test]
    fn dangling_matches_are_skipped() {
        let previous = frame(0, vec![]);
        let mut current = frame(1, vec![]);
        current.matches = vec![FeatureMatch::new(3, 4, 1.0)];
        let canvas = render_matches(&previous, &current);
        assert!(canvas.pixels().all(|pixel| pixel == &Rgba([10, 10, 10, 255])));
    }
}
