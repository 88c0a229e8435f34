//! Vector masks and vector strokes of shape layers.
//!
//! Path points are stored normalized to the canvas: `(0, 0)` is the top-left corner and `(1, 1)` the bottom-right one.

use crate::document::Document;
use crate::error::DocumentError;
use crate::geometry::Rect;
use crate::layers::LayerKey;
use crate::records::{BlockData, Tag};

use bitflags::bitflags;
use glam::DVec2;
use kurbo::{BezPath, Cap, Join, PathEl, Shape};
use layered_raster::{BlendMode, Color, Image};
use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};

/// Tolerance used when flattening strokes into outlines, in pixels.
const STROKE_TOLERANCE: f64 = 0.1;

pub fn dvec2_to_point(value: DVec2) -> kurbo::Point {
	kurbo::Point::new(value.x, value.y)
}

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
	#[repr(transparent)]
	pub struct VectorMaskFlags: u32 {
		const INVERT   = 0b001;
		const NOT_LINK = 0b010;
		const DISABLE  = 0b100;
	}
}

/// How a subpath combines with the subpaths before it.
#[repr(i16)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive, Serialize, Deserialize)]
pub enum PathOperation {
	Xor = 0,
	#[default]
	Or = 1,
	Subtract = 2,
	Intersect = 3,
}

/// A Bézier knot: the anchor with its incoming and outgoing control points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Knot {
	pub preceding: DVec2,
	pub anchor: DVec2,
	pub leaving: DVec2,
	pub linked: bool,
}

impl Knot {
	/// A corner knot without handles.
	pub fn corner(anchor: DVec2) -> Self {
		Self {
			preceding: anchor,
			anchor,
			leaving: anchor,
			linked: false,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subpath {
	pub knots: Vec<Knot>,
	pub closed: bool,
	pub operation: PathOperation,
}

impl Subpath {
	/// The subpath as a Bézier path, with every point multiplied by `scale`.
	pub fn to_bez_path(&self, scale: DVec2) -> BezPath {
		let mut path = BezPath::new();
		let Some(first) = self.knots.first() else { return path };
		path.move_to(dvec2_to_point(first.anchor * scale));

		for pair in self.knots.windows(2) {
			segment_to(&mut path, pair[0], pair[1], scale);
		}
		if self.closed {
			if let Some(&last) = self.knots.last() {
				segment_to(&mut path, last, *first, scale);
			}
			path.close_path();
		}
		path
	}

	fn translate(&mut self, delta: DVec2) {
		for knot in &mut self.knots {
			knot.preceding += delta;
			knot.anchor += delta;
			knot.leaving += delta;
		}
	}
}

/// Straight segments are emitted as lines so the winding tests never see degenerate cubics.
fn segment_to(path: &mut BezPath, start: Knot, end: Knot, scale: DVec2) {
	if start.leaving == start.anchor && end.preceding == end.anchor {
		path.line_to(dvec2_to_point(end.anchor * scale));
	} else {
		path.curve_to(dvec2_to_point(start.leaving * scale), dvec2_to_point(end.preceding * scale), dvec2_to_point(end.anchor * scale));
	}
}

/// Payload of the vector mask blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorMaskSetting {
	pub version: u32,
	pub flags: VectorMaskFlags,
	/// When set, the area outside of every subpath starts filled.
	pub initial_fill_rule: bool,
	pub subpaths: Vec<Subpath>,
}

impl VectorMaskSetting {
	/// Shifts every point by `delta`, in normalized units.
	pub fn translate(&mut self, delta: DVec2) {
		for subpath in &mut self.subpaths {
			subpath.translate(delta);
		}
	}
}

/// Resolved vector mask of a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMask {
	setting: VectorMaskSetting,
}

impl VectorMask {
	pub fn new(setting: VectorMaskSetting) -> Self {
		Self { setting }
	}

	pub fn inverted(&self) -> bool {
		self.setting.flags.contains(VectorMaskFlags::INVERT)
	}

	pub fn not_linked(&self) -> bool {
		self.setting.flags.contains(VectorMaskFlags::NOT_LINK)
	}

	pub fn disabled(&self) -> bool {
		self.setting.flags.contains(VectorMaskFlags::DISABLE)
	}

	pub fn initial_fill_rule(&self) -> bool {
		self.setting.initial_fill_rule
	}

	pub fn subpaths(&self) -> &[Subpath] {
		&self.setting.subpaths
	}

	/// Bounds of all anchors in normalized coordinates, or the whole canvas `(0, 0, 1, 1)` when there are none.
	pub fn bbox(&self) -> kurbo::Rect {
		let mut anchors = self.setting.subpaths.iter().flat_map(|subpath| subpath.knots.iter()).map(|knot| knot.anchor);
		let Some(first) = anchors.next() else {
			return kurbo::Rect::new(0., 0., 1., 1.);
		};
		let (min, max) = anchors.fold((first, first), |(min, max), anchor| (min.min(anchor), max.max(anchor)));
		kurbo::Rect::new(min.x, min.y, max.x, max.y)
	}

	/// Every subpath in canvas pixels, with the operation combining it into the mask.
	pub fn to_bez_paths(&self, canvas: DVec2) -> Vec<(PathOperation, BezPath)> {
		self.setting.subpaths.iter().map(|subpath| (subpath.operation, subpath.to_bez_path(canvas))).collect()
	}

	/// Coverage of the mask over `viewport`, sampled at pixel centers. The invert flag is applied; the disable flag is not.
	pub fn rasterize(&self, canvas: DVec2, viewport: Rect) -> Image<f32> {
		let initial = if self.initial_fill_rule() { 1. } else { 0. };
		let mut coverage = Image::new(viewport.width(), viewport.height(), initial);

		for (operation, path) in self.to_bez_paths(canvas) {
			let inside = fill_path(&path, viewport);
			coverage.zip_apply(&inside, |current, inside| match operation {
				PathOperation::Or => current.max(inside),
				PathOperation::Xor => (current - inside).abs(),
				PathOperation::Subtract => (current - inside).max(0.),
				PathOperation::Intersect => current.min(inside),
			});
		}

		if self.inverted() {
			coverage.data.iter_mut().for_each(|value| *value = 1. - *value);
		}
		coverage
	}
}

/// Non-zero coverage of a path over `viewport`, sampled at pixel centers.
pub(crate) fn fill_path(path: &BezPath, viewport: Rect) -> Image<f32> {
	let bounds = path.bounding_box();
	Image::from_fn(viewport.width(), viewport.height(), |x, y| {
		let point = kurbo::Point::new((viewport.left + x as i32) as f64 + 0.5, (viewport.top + y as i32) as f64 + 0.5);
		if point.x < bounds.x0 || point.y < bounds.y0 || point.x > bounds.x1 || point.y > bounds.y1 {
			return 0.;
		}
		// Non-zero fill rule
		if path.winding(point) != 0 { 1. } else { 0. }
	})
}

/// Where a stroke sits relative to the path.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrokeAlignment {
	Inside,
	#[default]
	Center,
	Outside,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineCap {
	#[default]
	Butt,
	Round,
	Square,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineJoin {
	#[default]
	Miter,
	Round,
	Bevel,
}

/// Payload of the vector stroke block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStrokeData {
	pub enabled: bool,
	pub fill_enabled: bool,
	pub line_width: f64,
	pub dash_set: Vec<f64>,
	pub dash_offset: f64,
	pub miter_limit: f64,
	pub line_cap: LineCap,
	pub line_join: LineJoin,
	pub alignment: StrokeAlignment,
	pub blend_mode: BlendMode,
	/// Percentage from 0 to 100.
	pub opacity: f64,
	/// Solid color content. Gradient and pattern content is kept in the descriptor only.
	pub color: Option<Color>,
	pub descriptor: serde_json::Value,
}

impl Default for VectorStrokeData {
	fn default() -> Self {
		Self {
			enabled: true,
			fill_enabled: true,
			line_width: 1.,
			dash_set: Vec::new(),
			dash_offset: 0.,
			miter_limit: 100.,
			line_cap: LineCap::default(),
			line_join: LineJoin::default(),
			alignment: StrokeAlignment::default(),
			blend_mode: BlendMode::Normal,
			opacity: 100.,
			color: Some(Color::BLACK),
			descriptor: serde_json::Value::Null,
		}
	}
}

/// Resolved vector stroke of a shape layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
	data: VectorStrokeData,
}

impl Stroke {
	pub fn new(data: VectorStrokeData) -> Self {
		Self { data }
	}

	pub fn enabled(&self) -> bool {
		self.data.enabled
	}

	/// Whether the shape's fill is drawn under the stroke.
	pub fn fill_enabled(&self) -> bool {
		self.data.fill_enabled
	}

	pub fn line_width(&self) -> f64 {
		self.data.line_width
	}

	pub fn line_dash_set(&self) -> &[f64] {
		&self.data.dash_set
	}

	pub fn line_dash_offset(&self) -> f64 {
		self.data.dash_offset
	}

	pub fn miter_limit(&self) -> f64 {
		self.data.miter_limit
	}

	pub fn line_cap(&self) -> LineCap {
		self.data.line_cap
	}

	pub fn line_join(&self) -> LineJoin {
		self.data.line_join
	}

	pub fn alignment(&self) -> StrokeAlignment {
		self.data.alignment
	}

	pub fn blend_mode(&self) -> BlendMode {
		self.data.blend_mode
	}

	/// Opacity from 0 to 1.
	pub fn opacity(&self) -> f32 {
		(self.data.opacity / 100.).clamp(0., 1.) as f32
	}

	pub fn color(&self) -> Option<Color> {
		self.data.color
	}

	pub fn data(&self) -> &VectorStrokeData {
		&self.data
	}

	fn style(&self, width: f64) -> kurbo::Stroke {
		let cap = match self.data.line_cap {
			LineCap::Butt => Cap::Butt,
			LineCap::Round => Cap::Round,
			LineCap::Square => Cap::Square,
		};
		let join = match self.data.line_join {
			LineJoin::Miter => Join::Miter,
			LineJoin::Round => Join::Round,
			LineJoin::Bevel => Join::Bevel,
		};
		let style = kurbo::Stroke::new(width).with_caps(cap).with_join(join).with_miter_limit(self.data.miter_limit);
		if self.data.dash_set.is_empty() {
			style
		} else {
			// Dash lengths are stored relative to the line width
			style.with_dashes(self.data.dash_offset * width, self.data.dash_set.iter().map(|dash| dash * width))
		}
	}

	/// Coverage of the stroke drawn along `paths` over `viewport`, honoring its alignment.
	pub fn rasterize(&self, paths: &[BezPath], viewport: Rect) -> Image<f32> {
		let width = match self.data.alignment {
			StrokeAlignment::Center => self.data.line_width,
			StrokeAlignment::Inside | StrokeAlignment::Outside => self.data.line_width * 2.,
		};
		let style = self.style(width);

		let mut coverage = Image::new(viewport.width(), viewport.height(), 0_f32);
		for path in paths {
			let outline = kurbo::stroke(path.iter(), &style, &kurbo::StrokeOpts::default(), STROKE_TOLERANCE);
			let stroke = fill_path(&outline, viewport);
			let fill = fill_path(&closed(path), viewport);
			coverage.zip_apply(&stroke, |current, stroke| current.max(stroke));
			match self.data.alignment {
				StrokeAlignment::Center => {}
				StrokeAlignment::Inside => coverage.zip_apply(&fill, |current, fill| current.min(fill)),
				StrokeAlignment::Outside => coverage.zip_apply(&fill, |current, fill| current.min(1. - fill)),
			}
		}
		coverage
	}
}

/// The path with every open subpath closed, for inside tests.
fn closed(path: &BezPath) -> BezPath {
	let mut elements = Vec::new();
	let mut open = false;
	for element in path.iter() {
		match element {
			PathEl::MoveTo(_) if open => {
				elements.push(PathEl::ClosePath);
				open = false;
			}
			PathEl::ClosePath => open = false,
			_ => {}
		}
		if matches!(element, PathEl::MoveTo(_)) {
			open = true;
		}
		elements.push(element);
	}
	if open {
		elements.push(PathEl::ClosePath);
	}
	BezPath::from_vec(elements)
}

impl Document {
	/// The layer's vector mask, from whichever of the two vector mask blocks comes first.
	pub fn vector_mask(&self, key: LayerKey) -> Result<Option<&VectorMask>, DocumentError> {
		let node = self.layer(key)?;
		let vector_mask = node.cache.vector_mask.get_or_init(|| match node.record.tagged_blocks.get_any(&Tag::VECTOR_MASKS)? {
			(_, BlockData::VectorMask(setting)) => Some(VectorMask::new(setting.clone())),
			(tag, _) => {
				log::debug!("Vector mask block {:?} of \"{}\" is not in path form, ignoring it", tag, node.name());
				None
			}
		});
		Ok(vector_mask.as_ref())
	}

	/// The layer's vector stroke, if it has one.
	pub fn stroke(&self, key: LayerKey) -> Result<Option<&Stroke>, DocumentError> {
		let node = self.layer(key)?;
		let stroke = node.cache.stroke.get_or_init(|| match node.record.tagged_blocks.get(Tag::VectorStrokeData)? {
			BlockData::VectorStroke(data) => Some(Stroke::new(data.clone())),
			_ => None,
		});
		Ok(stroke.as_ref())
	}
}
