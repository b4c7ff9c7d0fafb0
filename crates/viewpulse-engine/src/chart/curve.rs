//! Smooth SVG paths through projected chart points.

use std::fmt::Write as _;

use serde::Serialize;

/// A point in the chart's `[0, 100] x [0, 100]` drawing space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
}

impl PlotPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub control1: PlotPoint,
    pub control2: PlotPoint,
    pub end: PlotPoint,
}

/// A smooth path through every input point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurvePath {
    start: Option<PlotPoint>,
    segments: Vec<CubicSegment>,
}

/// Catmull-Rom interpolation expressed as cubic Béziers.
///
/// For each segment `p1 -> p2` with neighbours `p0` and `p3` (clamped to the
/// ends), the control points are `p1 + (p2 - p0) / 6` and
/// `p2 - (p3 - p1) / 6`.
#[must_use]
pub fn catmull_rom(points: &[PlotPoint]) -> CurvePath {
    let Some(&start) = points.first() else {
        return CurvePath::default();
    };

    let last = points.len() - 1;
    let segments = (0..last)
        .map(|i| {
            let p0 = points[i.saturating_sub(1)];
            let p1 = points[i];
            let p2 = points[i + 1];
            let p3 = points[(i + 2).min(last)];

            CubicSegment {
                control1: PlotPoint::new(p1.x + (p2.x - p0.x) / 6.0, p1.y + (p2.y - p0.y) / 6.0),
                control2: PlotPoint::new(p2.x - (p3.x - p1.x) / 6.0, p2.y - (p3.y - p1.y) / 6.0),
                end: p2,
            }
        })
        .collect();

    CurvePath {
        start: Some(start),
        segments,
    }
}

impl CurvePath {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
    }

    #[must_use]
    pub fn start(&self) -> Option<PlotPoint> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Option<PlotPoint> {
        self.segments.last().map(|s| s.end).or(self.start)
    }

    #[must_use]
    pub fn segments(&self) -> &[CubicSegment] {
        &self.segments
    }

    /// SVG path data: `M x y` followed by one `C` command per segment.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let Some(start) = self.start else {
            return String::new();
        };

        let mut out = format!("M {} {}", start.x, start.y);
        for seg in &self.segments {
            let _ = write!(
                out,
                " C {} {}, {} {}, {} {}",
                seg.control1.x, seg.control1.y, seg.control2.x, seg.control2.y, seg.end.x, seg.end.y
            );
        }
        out
    }

    /// Closed area under the curve down to the `baseline` y coordinate.
    #[must_use]
    pub fn area_svg(&self, baseline: f64) -> String {
        match (self.start, self.end()) {
            (Some(first), Some(last)) => format!(
                "{} L {} {baseline} L {} {baseline} Z",
                self.to_svg(),
                last.x,
                first.x
            ),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_path() {
        let path = catmull_rom(&[]);
        assert!(path.is_empty());
        assert_eq!(path.to_svg(), "");
        assert_eq!(path.area_svg(100.0), "");
    }

    #[test]
    fn single_point_is_degenerate_move() {
        let path = catmull_rom(&[PlotPoint::new(10.0, 20.0)]);
        assert_eq!(path.to_svg(), "M 10 20");
        assert!(path.segments().is_empty());
    }

    #[test]
    fn two_points_hit_both_endpoints_exactly() {
        let a = PlotPoint::new(0.0, 100.0);
        let b = PlotPoint::new(60.0, 40.0);
        let path = catmull_rom(&[a, b]);

        assert_eq!(path.start(), Some(a));
        assert_eq!(path.end(), Some(b));
        let seg = path.segments()[0];
        assert_eq!(seg.control1, PlotPoint::new(10.0, 90.0));
        assert_eq!(seg.control2, PlotPoint::new(50.0, 50.0));
        assert_eq!(path.to_svg(), "M 0 100 C 10 90, 50 50, 60 40");
    }

    #[test]
    fn passes_through_every_point() {
        let points = [
            PlotPoint::new(0.0, 80.0),
            PlotPoint::new(25.0, 60.0),
            PlotPoint::new(50.0, 65.0),
            PlotPoint::new(100.0, 10.0),
        ];
        let path = catmull_rom(&points);
        let ends: Vec<PlotPoint> = path.segments().iter().map(|s| s.end).collect();
        assert_eq!(ends, points[1..].to_vec());
    }

    #[test]
    fn interior_controls_use_neighbours() {
        let points = [
            PlotPoint::new(0.0, 0.0),
            PlotPoint::new(6.0, 6.0),
            PlotPoint::new(12.0, 0.0),
        ];
        let path = catmull_rom(&points);
        let second = path.segments()[1];
        assert_eq!(second.control1, PlotPoint::new(8.0, 6.0));
        assert_eq!(second.control2, PlotPoint::new(11.0, 1.0));
    }

    #[test]
    fn area_closes_along_the_baseline() {
        let path = catmull_rom(&[PlotPoint::new(0.0, 100.0), PlotPoint::new(60.0, 40.0)]);
        assert_eq!(
            path.area_svg(100.0),
            "M 0 100 C 10 90, 50 50, 60 40 L 60 100 L 0 100 Z"
        );
    }
}
