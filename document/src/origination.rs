//! Live shape properties: the primitive shapes (rectangles, ellipses, lines) a vector mask was drawn from.

use crate::document::Document;
use crate::error::DocumentError;
use crate::layers::LayerKey;
use crate::records::{BlockData, Tag};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Payload of the vector origination block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginationData {
	/// Set when the path was edited so that the live shapes no longer describe it.
	pub invalidated: bool,
	pub descriptors: Vec<OriginationDescriptor>,
}

impl OriginationData {
	/// Shifts every shape by `delta` pixels.
	pub fn translate(&mut self, delta: DVec2) {
		let offset = kurbo::Vec2::new(delta.x, delta.y);
		for descriptor in &mut self.descriptors {
			descriptor.bbox = descriptor.bbox.map(|bbox| bbox + offset);
			if let Some(line) = &mut descriptor.line {
				line.start += delta;
				line.end += delta;
			}
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineEnds {
	pub start: DVec2,
	pub end: DVec2,
	pub weight: f64,
}

/// One live shape entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginationDescriptor {
	/// 1 rectangle, 2 rounded rectangle, 4 line, 5 ellipse.
	pub origin_type: i32,
	pub invalidated: bool,
	pub resolution: Option<f64>,
	pub index: Option<i32>,
	/// Shape bounds in canvas pixels.
	pub bbox: Option<kurbo::Rect>,
	/// Corner radii of rounded rectangles: top-right, top-left, bottom-left, bottom-right.
	pub radii: Option<[f64; 4]>,
	pub line: Option<LineEnds>,
	/// Remaining descriptor fields, preserved as read.
	pub descriptor: serde_json::Value,
}

/// A resolved live shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Origination {
	/// The shape was edited into a plain path and has no usable geometry.
	Invalidated(OriginationDescriptor),
	Rectangle(OriginationDescriptor),
	RoundedRectangle(OriginationDescriptor),
	Line(OriginationDescriptor),
	Ellipse(OriginationDescriptor),
	Other(OriginationDescriptor),
}

impl Origination {
	pub fn new(descriptor: OriginationDescriptor) -> Self {
		if descriptor.invalidated {
			return Origination::Invalidated(descriptor);
		}
		match descriptor.origin_type {
			1 => Origination::Rectangle(descriptor),
			2 => Origination::RoundedRectangle(descriptor),
			4 => Origination::Line(descriptor),
			5 => Origination::Ellipse(descriptor),
			_ => Origination::Other(descriptor),
		}
	}

	pub fn descriptor(&self) -> &OriginationDescriptor {
		match self {
			Origination::Invalidated(descriptor)
			| Origination::Rectangle(descriptor)
			| Origination::RoundedRectangle(descriptor)
			| Origination::Line(descriptor)
			| Origination::Ellipse(descriptor)
			| Origination::Other(descriptor) => descriptor,
		}
	}

	pub fn is_invalidated(&self) -> bool {
		matches!(self, Origination::Invalidated(_))
	}

	pub fn origin_type(&self) -> i32 {
		self.descriptor().origin_type
	}

	/// Bounds of the shape in canvas pixels. Invalidated shapes have none.
	pub fn bbox(&self) -> Option<kurbo::Rect> {
		match self {
			Origination::Invalidated(_) => None,
			_ => self.descriptor().bbox,
		}
	}

	pub fn radii(&self) -> Option<[f64; 4]> {
		match self {
			Origination::RoundedRectangle(descriptor) => descriptor.radii,
			_ => None,
		}
	}

	pub fn line_ends(&self) -> Option<LineEnds> {
		match self {
			Origination::Line(descriptor) => descriptor.line,
			_ => None,
		}
	}
}

impl Document {
	/// The layer's live shapes. Empty when there is no origination block or when it is flagged as invalidated as a whole.
	pub fn origination(&self, key: LayerKey) -> Result<&[Origination], DocumentError> {
		let node = self.layer(key)?;
		let origination = node.cache.origination.get_or_init(|| match node.record.tagged_blocks.get(Tag::VectorOriginationData) {
			Some(BlockData::VectorOrigination(data)) if !data.invalidated => data.descriptors.iter().cloned().map(Origination::new).collect(),
			_ => Vec::new(),
		});
		Ok(origination)
	}

	pub fn has_origination(&self, key: LayerKey) -> Result<bool, DocumentError> {
		Ok(!self.origination(key)?.is_empty())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::geometry::Rect;
	use crate::records::ColorMode;
	use crate::test_utils::*;
	use crate::vector::{Knot, PathOperation, Subpath, VectorMaskSetting};
	use pretty_assertions::assert_eq;

	fn shape_document(origination: OriginationData) -> (Document, LayerKey) {
		let mut document = Document::new(100, 100, ColorMode::Rgb);
		let mut entry = pixel_entry("shape", [0, 0, 0, 0]);
		let knots = [(0.1, 0.1), (0.2, 0.1), (0.2, 0.2)].into_iter().map(|(x, y)| Knot::corner(DVec2::new(x, y))).collect();
		let subpath = Subpath {
			knots,
			closed: true,
			operation: PathOperation::Or,
		};
		let blocks = &mut entry.record.tagged_blocks;
		blocks.set(
			Tag::VectorMaskSetting2,
			BlockData::VectorMask(VectorMaskSetting {
				subpaths: vec![subpath],
				..Default::default()
			}),
		);
		blocks.set(Tag::VectorOriginationData, BlockData::VectorOrigination(origination));
		let key = document.new_layer(entry);
		(document, key)
	}

	fn rectangle(bbox: kurbo::Rect) -> OriginationDescriptor {
		OriginationDescriptor {
			origin_type: 1,
			bbox: Some(bbox),
			..Default::default()
		}
	}

	#[test]
	fn live_shapes_define_the_shape_box() {
		let (document, shape) = shape_document(OriginationData {
			invalidated: false,
			descriptors: vec![rectangle(kurbo::Rect::new(10.7, 20.2, 30.9, 40.5)), rectangle(kurbo::Rect::new(5.5, 25., 12., 45.9))],
		});
		assert!(document.has_origination(shape).unwrap());
		assert!(matches!(document.origination(shape).unwrap()[0], Origination::Rectangle(_)));
		assert_eq!(document.bbox(shape).unwrap(), Rect::new(5, 20, 30, 45));
	}

	#[test]
	fn invalidated_shapes_fall_back_to_the_path() {
		let (document, shape) = shape_document(OriginationData {
			invalidated: false,
			descriptors: vec![
				rectangle(kurbo::Rect::new(0., 0., 50., 50.)),
				OriginationDescriptor {
					invalidated: true,
					..Default::default()
				},
			],
		});
		assert!(document.origination(shape).unwrap()[1].is_invalidated());
		assert_eq!(document.bbox(shape).unwrap(), Rect::new(10, 10, 20, 20));

		let (document, shape) = shape_document(OriginationData {
			invalidated: true,
			descriptors: vec![rectangle(kurbo::Rect::new(0., 0., 50., 50.))],
		});
		assert!(!document.has_origination(shape).unwrap());
		assert_eq!(document.bbox(shape).unwrap(), Rect::new(10, 10, 20, 20));
	}

	#[test]
	fn shape_kinds() {
		let line = Origination::new(OriginationDescriptor {
			origin_type: 4,
			line: Some(LineEnds {
				start: DVec2::ZERO,
				end: DVec2::new(3., 4.),
				weight: 1.,
			}),
			..Default::default()
		});
		assert_eq!(line.line_ends().map(|line| line.end), Some(DVec2::new(3., 4.)));
		assert!(matches!(Origination::new(OriginationDescriptor { origin_type: 5, ..Default::default() }), Origination::Ellipse(_)));
		assert!(matches!(Origination::new(OriginationDescriptor { origin_type: 9, ..Default::default() }), Origination::Other(_)));
		assert_eq!(Origination::new(OriginationDescriptor { origin_type: 2, ..Default::default() }).radii(), None);
	}
}
