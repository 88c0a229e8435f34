//! Bounding boxes of layers and groups, and moving layers around the canvas.

use crate::document::Document;
use crate::error::DocumentError;
use crate::layers::{LayerData, LayerKey, LayerNode};
use crate::records::{BlockData, LayerRecord, Tag};

use glam::{IVec2, UVec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in canvas pixels. `right` and `bottom` are exclusive.
///
/// `(0, 0, 0, 0)` is the empty box: it means "no geometry" and never takes part in unions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
	pub left: i32,
	pub top: i32,
	pub right: i32,
	pub bottom: i32,
}

impl Rect {
	pub const EMPTY: Rect = Rect::new(0, 0, 0, 0);

	pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
		Self { left, top, right, bottom }
	}

	pub fn from_offset_size(offset: IVec2, size: UVec2) -> Self {
		Self::new(offset.x, offset.y, offset.x + size.x as i32, offset.y + size.y as i32)
	}

	/// Whether this is literally `(0, 0, 0, 0)`. A zero-area box elsewhere on the canvas is not empty in this sense.
	pub fn is_empty(&self) -> bool {
		*self == Self::EMPTY
	}

	pub fn has_area(&self) -> bool {
		self.right > self.left && self.bottom > self.top
	}

	pub fn width(&self) -> u32 {
		(self.right - self.left).max(0) as u32
	}

	pub fn height(&self) -> u32 {
		(self.bottom - self.top).max(0) as u32
	}

	pub fn offset(&self) -> IVec2 {
		IVec2::new(self.left, self.top)
	}

	pub fn size(&self) -> UVec2 {
		UVec2::new(self.width(), self.height())
	}

	#[must_use]
	pub fn union(&self, other: &Rect) -> Rect {
		Rect::new(self.left.min(other.left), self.top.min(other.top), self.right.max(other.right), self.bottom.max(other.bottom))
	}

	/// The overlapping area, or `None` when the rectangles do not overlap.
	pub fn intersection(&self, other: &Rect) -> Option<Rect> {
		let rect = Rect::new(self.left.max(other.left), self.top.max(other.top), self.right.min(other.right), self.bottom.min(other.bottom));
		rect.has_area().then_some(rect)
	}

	#[must_use]
	pub fn translate(&self, delta: IVec2) -> Rect {
		Rect::new(self.left + delta.x, self.top + delta.y, self.right + delta.x, self.bottom + delta.y)
	}

	pub fn contains(&self, point: IVec2) -> bool {
		point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
	}

	/// Union of all non-empty boxes, or the empty box when there are none.
	pub fn union_all(rects: impl IntoIterator<Item = Rect>) -> Rect {
		rects.into_iter().filter(|rect| !rect.is_empty()).reduce(|a, b| a.union(&b)).unwrap_or(Rect::EMPTY)
	}
}

impl From<kurbo::Rect> for Rect {
	/// Truncates each edge toward zero.
	fn from(rect: kurbo::Rect) -> Self {
		Rect::new(rect.x0 as i32, rect.y0 as i32, rect.x1 as i32, rect.y1 as i32)
	}
}

impl From<Rect> for kurbo::Rect {
	fn from(rect: Rect) -> Self {
		kurbo::Rect::new(rect.left.into(), rect.top.into(), rect.right.into(), rect.bottom.into())
	}
}

/// How boxes of groups are gathered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct BoundsOptions {
	pub include_invisible: bool,
	/// Artboards without a rectangle count as empty instead of failing.
	pub tolerate_missing_artboard: bool,
}

impl Document {
	/// The whole canvas.
	pub fn viewbox(&self) -> Rect {
		Rect::from_offset_size(IVec2::ZERO, UVec2::new(self.width(), self.height()))
	}

	/// Bounding box of a layer, computed once and cached until something moves or changes visibility.
	///
	/// - Groups union the non-empty boxes of their effectively visible children, recursively.
	/// - Artboards read their artboard rectangle and fail with [`DocumentError::MissingArtboardGeometry`] without one.
	/// - Shape layers without pixels derive their box from live shapes, then from the vector mask.
	/// - Everything else uses the stored rectangle.
	pub fn bbox(&self, key: LayerKey) -> Result<Rect, DocumentError> {
		let node = self.layer(key)?;
		if let Some(bbox) = node.cache.bbox.get() {
			return Ok(bbox);
		}
		let bbox = self.extract_bbox(key, BoundsOptions::default())?;
		node.cache.bbox.set(Some(bbox));
		Ok(bbox)
	}

	/// Like [`Document::bbox`] but hidden children of groups contribute too. Not cached.
	pub fn bbox_including_invisible(&self, key: LayerKey) -> Result<Rect, DocumentError> {
		self.extract_bbox(
			key,
			BoundsOptions {
				include_invisible: true,
				..Default::default()
			},
		)
	}

	pub(crate) fn extract_bbox(&self, key: LayerKey, options: BoundsOptions) -> Result<Rect, DocumentError> {
		if options == BoundsOptions::default() {
			if let Some(bbox) = self.layer(key)?.cache.bbox.get() {
				return Ok(bbox);
			}
		}

		let node = self.layer(key)?;
		match &node.data {
			LayerData::Artboard(_) => match node.record.tagged_blocks.artboard().and_then(|artboard| artboard.rect) {
				Some(rect) => Ok(rect.into()),
				None if options.tolerate_missing_artboard => {
					log::debug!("Artboard \"{}\" has no rectangle, treating it as empty", node.name());
					Ok(Rect::EMPTY)
				}
				None => Err(DocumentError::MissingArtboardGeometry(key)),
			},
			LayerData::Group(group) => {
				let mut bbox = Rect::EMPTY;
				for &child in group.children() {
					if !options.include_invisible && !self.is_visible(child)? {
						continue;
					}
					let child_box = if options == BoundsOptions::default() { self.bbox(child)? } else { self.extract_bbox(child, options)? };
					if !child_box.is_empty() {
						bbox = if bbox.is_empty() { child_box } else { bbox.union(&child_box) };
					}
				}
				Ok(bbox)
			}
			LayerData::Shape => self.shape_bbox(key),
			_ => self.layer_rect(key),
		}
	}

	fn shape_bbox(&self, key: LayerKey) -> Result<Rect, DocumentError> {
		let node = self.layer(key)?;
		if node.has_pixels() {
			return Ok(record_rect(node));
		}

		let origination = self.origination(key)?;
		if !origination.is_empty() && !origination.iter().any(|shape| shape.is_invalidated()) {
			let bounds = origination.iter().filter_map(|shape| shape.bbox()).reduce(|a, b| a.union(b));
			if let Some(bounds) = bounds {
				return Ok(bounds.into());
			}
		}

		if let Some(vector_mask) = self.vector_mask(key)? {
			let bounds = vector_mask.bbox();
			let (width, height) = (self.width() as f64, self.height() as f64);
			return Ok(Rect::new(
				(bounds.x0 * width).round() as i32,
				(bounds.y0 * height).round() as i32,
				(bounds.x1 * width).round() as i32,
				(bounds.y1 * height).round() as i32,
			));
		}
		Ok(Rect::EMPTY)
	}

	/// The rectangle stored in the layer's record. Fill layers store zero for a right or bottom edge that extends to the canvas
	/// edge, which is resolved here.
	pub fn layer_rect(&self, key: LayerKey) -> Result<Rect, DocumentError> {
		let node = self.layer(key)?;
		Ok(match node.data {
			LayerData::Fill => fill_rect(&node.record, self.canvas_size()),
			_ => record_rect(node),
		})
	}

	fn canvas_size(&self) -> UVec2 {
		UVec2::new(self.width(), self.height())
	}

	/// Top-left corner of the layer's bounding box.
	pub fn offset(&self, key: LayerKey) -> Result<IVec2, DocumentError> {
		Ok(self.bbox(key)?.offset())
	}

	/// Width and height of the layer's bounding box.
	pub fn size(&self, key: LayerKey) -> Result<UVec2, DocumentError> {
		Ok(self.bbox(key)?.size())
	}

	/// Moves the layer so the top-left corner of its bounding box lands on `offset`.
	pub fn set_offset(&mut self, key: LayerKey, offset: IVec2) -> Result<(), DocumentError> {
		let delta = offset - self.offset(key)?;
		self.translate(key, delta)
	}

	pub fn set_left(&mut self, key: LayerKey, left: i32) -> Result<(), DocumentError> {
		let offset = self.offset(key)?;
		self.set_offset(key, IVec2::new(left, offset.y))
	}

	pub fn set_top(&mut self, key: LayerKey, top: i32) -> Result<(), DocumentError> {
		let offset = self.offset(key)?;
		self.set_offset(key, IVec2::new(offset.x, top))
	}

	/// Shifts a layer by `delta` pixels, keeping its size. Groups move together with all their descendants.
	pub fn translate(&mut self, key: LayerKey, delta: IVec2) -> Result<(), DocumentError> {
		if key == self.root() {
			return Err(DocumentError::RootLayer);
		}
		self.layer(key)?;
		if delta == IVec2::ZERO {
			return Ok(());
		}

		let mut targets = vec![key];
		targets.extend(self.descendants(key, true));
		let canvas = self.canvas_size();
		for target in targets {
			let node = &mut self.layers[target];
			translate_record(node, delta, canvas);
			node.cache.invalidate_blocks();
		}
		self.invalidate_subtree_bbox(key);
		self.invalidate_bbox(key);
		Ok(())
	}

	/// Drops the cached box of the layer and of every ancestor up to the root.
	pub fn invalidate_bbox(&self, key: LayerKey) {
		for ancestor in self.ancestors(key) {
			self.layers[ancestor].cache.bbox.set(None);
		}
	}

	/// Drops the cached box of the layer and of everything below it.
	pub fn invalidate_subtree_bbox(&self, key: LayerKey) {
		let mut stack = vec![key];
		while let Some(current) = stack.pop() {
			if let Some(node) = self.layers.get(current) {
				node.cache.bbox.set(None);
				stack.extend_from_slice(node.children());
			}
		}
	}
}

fn record_rect(node: &LayerNode) -> Rect {
	Rect::new(node.record.left, node.record.top, node.record.right, node.record.bottom)
}

fn fill_rect(record: &LayerRecord, canvas: UVec2) -> Rect {
	let right = if record.right == 0 { canvas.x as i32 } else { record.right };
	let bottom = if record.bottom == 0 { canvas.y as i32 } else { record.bottom };
	Rect::new(record.left, record.top, right, bottom)
}

/// Moves every position stored in a record: the layer rectangle, mask rectangles, and vector geometry.
fn translate_record(node: &mut LayerNode, delta: IVec2, canvas: UVec2) {
	let record = &mut node.record;
	match node.data {
		// Group records carry no geometry of their own
		LayerData::Group(_) | LayerData::Artboard(_) => {}
		_ => {
			// Edges extending to the canvas are pinned down first, otherwise the shift would collapse them
			let rect = if matches!(node.data, LayerData::Fill) { fill_rect(record, canvas) } else { Rect::new(record.left, record.top, record.right, record.bottom) };
			record.left = rect.left.saturating_add(delta.x);
			record.right = rect.right.saturating_add(delta.x);
			record.top = rect.top.saturating_add(delta.y);
			record.bottom = rect.bottom.saturating_add(delta.y);
		}
	}

	if let Some(mask) = &mut record.mask_data {
		mask.left = mask.left.saturating_add(delta.x);
		mask.right = mask.right.saturating_add(delta.x);
		mask.top = mask.top.saturating_add(delta.y);
		mask.bottom = mask.bottom.saturating_add(delta.y);
		if let Some([top, left, bottom, right]) = &mut mask.real_rect {
			*top = top.saturating_add(delta.y);
			*left = left.saturating_add(delta.x);
			*bottom = bottom.saturating_add(delta.y);
			*right = right.saturating_add(delta.x);
		}
	}

	let canvas = canvas.max(UVec2::ONE).as_dvec2();
	let shift = delta.as_dvec2();
	for tag in Tag::VECTOR_MASKS {
		if let Some(BlockData::VectorMask(setting)) = record.tagged_blocks.get_mut(tag) {
			setting.translate(shift / canvas);
		}
	}
	if let Some(BlockData::VectorOrigination(origination)) = record.tagged_blocks.get_mut(Tag::VectorOriginationData) {
		origination.translate(shift);
	}
	for tag in Tag::ARTBOARDS {
		if let Some(BlockData::Artboard(artboard)) = record.tagged_blocks.get_mut(tag) {
			artboard.rect = artboard.rect.map(|rect| rect + kurbo::Vec2::new(shift.x, shift.y));
		}
	}
}
