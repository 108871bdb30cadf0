//! Bézier nodes and paths, the output of the path data parser.

use std::fmt::Write;

use lyon_geom::euclid::Point2D;
use lyon_geom::{CubicBezierSegment, QuadraticBezierSegment};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geom::{AffineTransform, Point};

/// The anchor (on-curve point) of a node.
pub const C0_MASK: u8 = 1;
/// The incoming control point of a node.
pub const C1_MASK: u8 = 2;
/// The outgoing control point of a node.
pub const C2_MASK: u8 = 4;

/// A path vertex with up to three control-point slots.
///
/// Slot 0 is the anchor, slot 1 the incoming control point and slot 2 the
/// outgoing control point. `mask` tells which of the slots are present. An
/// absent control point coincides with the anchor.
#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BezierNode {
    pub mask: u8,
    pub points: [Point; 3],
}

impl BezierNode {
    pub fn new(anchor: Point) -> Self {
        Self {
            mask: C0_MASK,
            points: [anchor; 3],
        }
    }

    pub fn anchor(&self) -> Point {
        self.points[0]
    }

    pub fn incoming(&self) -> Option<Point> {
        if self.mask & C1_MASK == 0 {
            None
        } else {
            Some(self.points[1])
        }
    }

    pub fn outgoing(&self) -> Option<Point> {
        if self.mask & C2_MASK == 0 {
            None
        } else {
            Some(self.points[2])
        }
    }

    fn set_incoming(&mut self, p: Point) {
        self.mask |= C1_MASK;
        self.points[1] = p;
    }

    fn set_outgoing(&mut self, p: Point) {
        self.mask |= C2_MASK;
        self.points[2] = p;
    }

    /// The control point implied for a smooth curve leaving this node: the
    /// incoming control point mirrored through the anchor, or the anchor
    /// itself if there is no incoming control point.
    pub fn smooth_control(&self) -> Point {
        match self.incoming() {
            Some(c1) => self.anchor().reflect(c1),
            None => self.anchor(),
        }
    }

    fn map(&self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            mask: self.mask,
            points: [f(self.points[0]), f(self.points[1]), f(self.points[2])],
        }
    }
}

/// An ordered sequence of nodes plus a closed flag.
///
/// Paths are built by the parsers in this crate and are immutable afterwards.
#[derive(Debug, PartialEq, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BezierPath {
    nodes: Vec<BezierNode>,
    closed: bool,
}

impl BezierPath {
    pub(crate) fn new(start: Point) -> Self {
        Self {
            nodes: vec![BezierNode::new(start)],
            closed: false,
        }
    }

    pub(crate) fn line_to(&mut self, p: Point) {
        self.nodes.push(BezierNode::new(p));
    }

    pub(crate) fn curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        if let Some(last) = self.nodes.last_mut() {
            last.set_outgoing(c1);
        }
        let mut node = BezierNode::new(p);
        node.set_incoming(c2);
        self.nodes.push(node);
    }

    /// Append a quadratic segment, stored as the equivalent cubic.
    pub(crate) fn quad_to(&mut self, c: Point, p: Point) {
        let from = self.nodes.last().map_or(p, BezierNode::anchor);
        let cubic = QuadraticBezierSegment {
            from: to_lyon(from),
            ctrl: to_lyon(c),
            to: to_lyon(p),
        }
        .to_cubic();
        self.curve_to(from_lyon(cubic.ctrl1), from_lyon(cubic.ctrl2), p);
    }

    /// Mark the path closed.
    ///
    /// A curve that ended exactly on the start point is folded into the
    /// implicit closing segment, so that serialized closed curves parse back
    /// to the same nodes.
    pub(crate) fn close(&mut self) {
        self.closed = true;
        if self.nodes.len() < 2 {
            return;
        }
        let last = self.nodes[self.nodes.len() - 1];
        #[allow(clippy::float_cmp)]
        let folds = last.incoming().is_some() && last.anchor() == self.nodes[0].anchor();
        if folds {
            self.nodes.pop();
            if let Some(c1) = last.incoming() {
                self.nodes[0].set_incoming(c1);
            }
        }
    }

    pub fn nodes(&self) -> &[BezierNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of segments, including the implicit closing segment of a
    /// closed path.
    pub fn segment_count(&self) -> usize {
        match (self.nodes.len(), self.closed) {
            (0, _) => 0,
            (n, true) => n,
            (n, false) => n - 1,
        }
    }

    /// The anchor of the first node.
    pub fn start(&self) -> Option<Point> {
        self.nodes.first().map(BezierNode::anchor)
    }

    /// Iterate over `(from, to)` node pairs, closing segment included.
    fn segments(&self) -> impl Iterator<Item = (&BezierNode, &BezierNode)> + '_ {
        let n = self.nodes.len();
        (0..self.segment_count()).map(move |i| (&self.nodes[i], &self.nodes[(i + 1) % n]))
    }

    /// Return a copy of this path with every point mapped through `t`.
    pub fn transform(&self, t: &AffineTransform) -> BezierPath {
        BezierPath {
            nodes: self.nodes.iter().map(|node| node.map(|p| t.apply(p))).collect(),
            closed: self.closed,
        }
    }

    /// Smallest axis-aligned box containing all present points, as
    /// `(min, max)`.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let mut points = self.nodes.iter().flat_map(|node| {
            node.points
                .iter()
                .enumerate()
                .filter(move |(i, _)| node.mask & (1u8 << *i) != 0)
                .map(|(_, p)| *p)
        });
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }

    /// Flatten the path into a polyline.
    ///
    /// Curved segments are approximated with line segments so that the
    /// maximum distance to the curve stays below `tolerance`. A closed path
    /// ends with its start point.
    pub fn flatten(&self, tolerance: f64) -> Vec<Point> {
        let mut line = Vec::new();
        if let Some(start) = self.start() {
            line.push(start);
        }
        for (from, to) in self.segments() {
            if from.outgoing().is_none() && to.incoming().is_none() {
                line.push(to.anchor());
                continue;
            }
            let curve = CubicBezierSegment {
                from: to_lyon(from.anchor()),
                ctrl1: to_lyon(from.points[2]),
                ctrl2: to_lyon(to.points[1]),
                to: to_lyon(to.anchor()),
            };
            for point in curve.flattened(tolerance) {
                line.push(from_lyon(point));
            }
        }
        line
    }

    /// Serialize as SVG path data using absolute `M`, `L`, `C` and `Z`.
    pub fn to_path_data(&self) -> String {
        let mut out = String::new();
        self.write_path_data(&mut out);
        out
    }

    fn write_path_data(&self, out: &mut String) {
        let start = match self.start() {
            Some(start) => start,
            None => return,
        };
        // Writing into a String cannot fail.
        let _ = write!(out, "M {} {}", start.x, start.y);
        for (i, (from, to)) in self.segments().enumerate() {
            let closing = self.closed && i + 1 == self.nodes.len();
            let curved = from.outgoing().is_some() || to.incoming().is_some();
            if curved {
                let (c1, c2, p) = (from.points[2], to.points[1], to.anchor());
                let _ = write!(
                    out,
                    " C {} {} {} {} {} {}",
                    c1.x, c1.y, c2.x, c2.y, p.x, p.y
                );
            } else if !closing {
                let p = to.anchor();
                let _ = write!(out, " L {} {}", p.x, p.y);
            }
        }
        if self.closed {
            out.push_str(" Z");
        }
    }
}

/// Serialize a sequence of subpaths as one SVG `d` attribute value.
pub fn to_path_data(paths: &[BezierPath]) -> String {
    let mut out = String::new();
    for path in paths.iter().filter(|path| !path.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        path.write_path_data(&mut out);
    }
    out
}

fn to_lyon(p: Point) -> Point2D<f64, lyon_geom::euclid::UnknownUnit> {
    Point2D::new(p.x, p.y)
}

fn from_lyon(p: Point2D<f64, lyon_geom::euclid::UnknownUnit>) -> Point {
    Point::new(p.x, p.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> BezierPath {
        let mut path = BezierPath::new((0.0, 0.0).into());
        path.line_to((10.0, 0.0).into());
        path.line_to((10.0, 10.0).into());
        path.line_to((0.0, 10.0).into());
        path
    }

    #[test]
    fn test_node_slots() {
        let mut path = BezierPath::new((0.0, 0.0).into());
        path.curve_to((0.0, 10.0).into(), (10.0, 10.0).into(), (10.0, 0.0).into());
        let nodes = path.nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].mask, C0_MASK | C2_MASK);
        assert_eq!(nodes[0].outgoing(), Some((0.0, 10.0).into()));
        assert_eq!(nodes[0].incoming(), None);
        assert_eq!(nodes[1].mask, C0_MASK | C1_MASK);
        assert_eq!(nodes[1].incoming(), Some((10.0, 10.0).into()));
        assert_eq!(nodes[1].smooth_control(), (10.0, -10.0).into());
    }

    #[test]
    fn test_segment_count() {
        let mut path = square();
        assert_eq!(path.segment_count(), 3);
        path.close();
        assert_eq!(path.segment_count(), 4);
        assert_eq!(BezierPath::new((1.0, 1.0).into()).segment_count(), 0);
    }

    #[test]
    fn test_to_path_data_lines() {
        let mut path = square();
        assert_eq!(path.to_path_data(), "M 0 0 L 10 0 L 10 10 L 0 10");
        path.close();
        assert_eq!(path.to_path_data(), "M 0 0 L 10 0 L 10 10 L 0 10 Z");
    }

    #[test]
    fn test_to_path_data_curves() {
        let mut path = BezierPath::new((0.0, 0.0).into());
        path.curve_to((0.0, 5.0).into(), (5.0, 5.0).into(), (5.0, 0.0).into());
        path.curve_to((5.0, -5.0).into(), (0.0, -5.0).into(), (0.0, 0.0).into());
        path.close();
        // The curve back to the start folds into the closing segment.
        assert_eq!(path.len(), 2);
        assert_eq!(
            path.to_path_data(),
            "M 0 0 C 0 5 5 5 5 0 C 5 -5 0 -5 0 0 Z"
        );
    }

    #[test]
    fn test_to_path_data_multiple() {
        let a = BezierPath::new((1.0, 2.0).into());
        let mut b = BezierPath::new((3.0, 4.0).into());
        b.line_to((5.5, -6.0).into());
        assert_eq!(to_path_data(&[a, b]), "M 1 2 M 3 4 L 5.5 -6");
        assert_eq!(to_path_data(&[]), "");
    }

    #[test]
    fn test_flatten_lines() {
        let mut path = square();
        path.close();
        let line = path.flatten(0.15);
        assert_eq!(
            line,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
                Point::new(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_flatten_curve() {
        let _ = env_logger::try_init();
        let mut path = BezierPath::new((10.0, 80.0).into());
        path.curve_to((40.0, 10.0).into(), (65.0, 10.0).into(), (95.0, 80.0).into());
        let line = path.flatten(0.15);
        assert!(line.len() > 3);
        assert_eq!(line[0], Point::new(10.0, 80.0));
        assert_eq!(line[line.len() - 1], Point::new(95.0, 80.0));
        assert!(line.iter().all(|p| p.y <= 80.0 && p.y >= 10.0));
    }

    #[test]
    fn test_flatten_quadratic() {
        let mut path = BezierPath::new((0.0, 0.0).into());
        path.quad_to((5.0, 10.0).into(), (10.0, 0.0).into());
        assert_eq!(path.nodes()[0].outgoing(), Some(Point::new(10.0 / 3.0, 20.0 / 3.0)));
        assert_eq!(path.nodes()[1].incoming(), Some(Point::new(20.0 / 3.0, 20.0 / 3.0)));

        // The parabola y = 2x - x²/5, apex (5, 5).
        let line = path.flatten(0.01);
        assert!(line.len() > 3);
        for p in &line {
            let expected = 2.0 * p.x - 0.2 * p.x * p.x;
            assert!((p.y - expected).abs() < 1e-6, "{:?} is off the curve", p);
        }
        let apex = line.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert!(apex > 4.95 && apex <= 5.0 + 1e-9, "apex {}", apex);
    }

    #[test]
    fn test_bounds_and_transform() {
        let mut path = BezierPath::new((0.0, 0.0).into());
        path.curve_to((0.0, -4.0).into(), (6.0, 12.0).into(), (5.0, 1.0).into());
        assert_eq!(
            path.bounds(),
            Some((Point::new(0.0, -4.0), Point::new(6.0, 12.0)))
        );
        let moved = path.transform(&AffineTransform::translate(1.0, 1.0));
        assert_eq!(moved.nodes()[1].anchor(), Point::new(6.0, 2.0));
        assert_eq!(moved.nodes()[1].incoming(), Some(Point::new(7.0, 13.0)));
        assert_eq!(moved.nodes()[0].mask, path.nodes()[0].mask);
    }
}
