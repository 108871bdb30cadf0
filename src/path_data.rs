//! Parser for the SVG path data (`d` attribute) mini language.

use log::trace;
use svgtypes::{PathParser, PathSegment};

use crate::bezier::{BezierNode, BezierPath};
use crate::error::{svgtypes_offset, Error, Result};
use crate::geom::Point;

const COMMANDS: &str = "MmZzLlHhVvCcSsQqTtAa";

/// Map a tokenizer error to `MalformedPathData`, naming the command whose
/// arguments were being read.
fn segment_error(text: &str, e: &svgtypes::Error) -> Error {
    let position = svgtypes_offset(text, e);
    let reason = match text[..position].rfind(|c: char| COMMANDS.contains(c)) {
        Some(i) => format!("command '{}': {}", &text[i..=i], e),
        None => e.to_string(),
    };
    Error::path_data(position, reason)
}

/// The subpath being built, plus the current point.
#[derive(Debug, PartialEq)]
struct CurrentPath {
    path: Option<BezierPath>,

    /// The current point `p`.
    current: Point,

    /// First anchor of the current subpath. `Z` returns here.
    start: Point,

    /// Control point of the quadratic segment that ended at `current`, if the
    /// previous command was `Q` or `T`.
    quad_control: Option<Point>,

    number_scale: f64,

    /// Reported as the error position for coordinates that overflow.
    text_len: usize,
}

impl CurrentPath {
    fn new(number_scale: f64, text_len: usize) -> Self {
        Self {
            path: None,
            current: Point::default(),
            start: Point::default(),
            quad_control: None,
            number_scale,
            text_len,
        }
    }

    fn checked(&self, p: Point) -> Result<Point> {
        if p.x.is_finite() && p.y.is_finite() {
            Ok(p)
        } else {
            Err(Error::path_data(
                self.text_len,
                format!("coordinate ({}, {}) is not finite", p.x, p.y),
            ))
        }
    }

    /// Scale a coordinate pair and resolve it against the current point if
    /// the command is relative.
    fn resolve(&self, abs: bool, x: f64, y: f64) -> Result<Point> {
        let (x, y) = (x * self.number_scale, y * self.number_scale);
        let p = if abs {
            Point::new(x, y)
        } else {
            self.current.offset(x, y)
        };
        self.checked(p)
    }

    fn resolve_horizontal(&self, abs: bool, x: f64) -> Result<Point> {
        let x = x * self.number_scale;
        let p = if abs {
            Point::new(x, self.current.y)
        } else {
            self.current.offset(x, 0.0)
        };
        self.checked(p)
    }

    fn resolve_vertical(&self, abs: bool, y: f64) -> Result<Point> {
        let y = y * self.number_scale;
        let p = if abs {
            Point::new(self.current.x, y)
        } else {
            self.current.offset(0.0, y)
        };
        self.checked(p)
    }

    /// Begin a new subpath at `p`, returning the previous one if any.
    fn move_to(&mut self, p: Point) -> Option<BezierPath> {
        let prev = self.finish();
        self.path = Some(BezierPath::new(p));
        self.current = p;
        self.start = p;
        self.quad_control = None;
        prev
    }

    /// The path to append to. A drawing command following `Z` opens a new
    /// subpath at the start of the closed one, which is handed back through
    /// `done`.
    fn open_path(&mut self, done: &mut Vec<BezierPath>) -> &mut BezierPath {
        let reopen = self.path.as_ref().map_or(true, BezierPath::is_closed);
        if reopen {
            if let Some(closed) = self.path.replace(BezierPath::new(self.start)) {
                done.push(closed);
            }
        }
        let start = self.start;
        self.path.get_or_insert_with(|| BezierPath::new(start))
    }

    fn last_node(&self) -> Option<BezierNode> {
        self.path
            .as_ref()
            .filter(|path| !path.is_closed())
            .and_then(|path| path.nodes().last().copied())
    }

    fn line_to(&mut self, p: Point, done: &mut Vec<BezierPath>) {
        self.open_path(done).line_to(p);
        self.current = p;
        self.quad_control = None;
    }

    fn curve_to(&mut self, c1: Point, c2: Point, p: Point, done: &mut Vec<BezierPath>) {
        self.open_path(done).curve_to(c1, c2, p);
        self.current = p;
        self.quad_control = None;
    }

    fn quad_to(&mut self, c: Point, p: Point, done: &mut Vec<BezierPath>) {
        self.open_path(done).quad_to(c, p);
        self.current = p;
        self.quad_control = Some(c);
    }

    /// First control point for `S`, derived from the node at the current
    /// point.
    fn smooth_control(&self) -> Point {
        self.last_node()
            .map_or(self.current, |node| node.smooth_control())
    }

    /// Control point for `T`: the previous quadratic control point mirrored
    /// through the current point, otherwise the `S` rule.
    fn smooth_quad_control(&self) -> Point {
        match self.quad_control {
            Some(c) => self.current.reflect(c),
            None => self.smooth_control(),
        }
    }

    fn close(&mut self) {
        if let Some(path) = self.path.as_mut() {
            path.close();
        }
        self.current = self.start;
        self.quad_control = None;
    }

    fn finish(&mut self) -> Option<BezierPath> {
        self.path.take()
    }
}

/// Parse an SVG path data string into its subpaths.
///
/// Every numeral is multiplied by `number_scale` before it is used. An empty
/// string yields no paths. Any syntax error aborts the parse; no partial
/// result is returned.
pub fn parse_path_data(text: &str, number_scale: f64) -> Result<Vec<BezierPath>> {
    trace!("parse_path_data");
    let mut paths = Vec::new();
    if text.trim_matches(|c: char| c.is_ascii_whitespace() || c == ',').is_empty() {
        return Ok(paths);
    }
    let mut current = CurrentPath::new(number_scale, text.len());

    for segment in PathParser::from(text) {
        let segment = segment.map_err(|e| segment_error(text, &e))?;
        match segment {
            PathSegment::MoveTo { abs, x, y } => {
                trace!("parse_path_data: MoveTo");
                let p = current.resolve(abs, x, y)?;
                if let Some(prev) = current.move_to(p) {
                    paths.push(prev);
                }
            }
            PathSegment::LineTo { abs, x, y } => {
                trace!("parse_path_data: LineTo");
                let p = current.resolve(abs, x, y)?;
                current.line_to(p, &mut paths);
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                trace!("parse_path_data: HorizontalLineTo");
                let p = current.resolve_horizontal(abs, x)?;
                current.line_to(p, &mut paths);
            }
            PathSegment::VerticalLineTo { abs, y } => {
                trace!("parse_path_data: VerticalLineTo");
                let p = current.resolve_vertical(abs, y)?;
                current.line_to(p, &mut paths);
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                trace!("parse_path_data: CurveTo");
                let c1 = current.resolve(abs, x1, y1)?;
                let c2 = current.resolve(abs, x2, y2)?;
                let p = current.resolve(abs, x, y)?;
                current.curve_to(c1, c2, p, &mut paths);
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                trace!("parse_path_data: SmoothCurveTo");
                let c1 = current.smooth_control();
                let c2 = current.resolve(abs, x2, y2)?;
                let p = current.resolve(abs, x, y)?;
                current.curve_to(c1, c2, p, &mut paths);
            }
            PathSegment::Quadratic { abs, x1, y1, x, y } => {
                trace!("parse_path_data: Quadratic");
                let c = current.resolve(abs, x1, y1)?;
                let p = current.resolve(abs, x, y)?;
                current.quad_to(c, p, &mut paths);
            }
            PathSegment::SmoothQuadratic { abs, x, y } => {
                trace!("parse_path_data: SmoothQuadratic");
                let c = current.smooth_quad_control();
                let p = current.resolve(abs, x, y)?;
                current.quad_to(c, p, &mut paths);
            }
            PathSegment::ClosePath { .. } => {
                trace!("parse_path_data: ClosePath");
                current.close();
            }
            PathSegment::EllipticalArc { .. } => {
                // Arcs are the only segments written with these letters, and
                // parsing stops at the first one.
                let position = text.find(|c| c == 'A' || c == 'a').unwrap_or(0);
                return Err(Error::path_data(
                    position,
                    "elliptical arcs are not supported",
                ));
            }
        }
    }

    if let Some(path) = current.finish() {
        paths.push(path);
    }
    trace!("parse_path_data: {} subpaths", paths.len());
    Ok(paths)
}
