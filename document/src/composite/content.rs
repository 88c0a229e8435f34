//! The pixels a single non-group layer contributes, before masks, clipping, opacity and effects.

use super::{Compositor, blend_into};
use crate::error::DocumentError;
use crate::fill::FillContent;
use crate::layers::{LayerKey, LayerKind};

use glam::IVec2;
use layered_raster::{Color, Image};

impl Compositor<'_> {
	/// Content of a leaf layer over the viewport, or `None` when it has nothing to draw.
	pub(super) fn layer_content(&self, key: LayerKey) -> Result<Option<Image<Color>>, DocumentError> {
		let node = self.document.layer(key)?;
		match node.kind() {
			LayerKind::Shape if self.request.settings.force_vector || !node.has_pixels() => self.shape_content(key),
			LayerKind::Fill => self.fill_content(key),
			_ => self.pixel_content(key),
		}
	}

	fn pixel_content(&self, key: LayerKey) -> Result<Option<Image<Color>>, DocumentError> {
		let Some(pixels) = self.document.layer_image(key, self.request.decoder)? else {
			return Ok(None);
		};
		let node = self.document.layer(key)?;
		Ok(Some(self.place(&pixels, IVec2::new(node.left(), node.top()))))
	}

	/// Positions an image with its top-left corner at `offset` on the canvas, cropped to the viewport.
	fn place(&self, pixels: &Image<Color>, offset: IVec2) -> Image<Color> {
		let viewport = self.viewport;
		Image::from_fn(viewport.width(), viewport.height(), |x, y| {
			let (x, y) = (viewport.left + x as i32 - offset.x, viewport.top + y as i32 - offset.y);
			pixels.sample(x as i64, y as i64, Color::TRANSPARENT)
		})
	}

	fn fill_color(&self, key: LayerKey) -> Result<Option<Color>, DocumentError> {
		Ok(match self.document.fill_content(key)? {
			Some(FillContent::Solid(color)) => Some(color),
			Some(FillContent::Gradient(_)) => {
				log::warn!("Gradient fill of \"{}\" is not rendered", self.document.layer(key)?.name());
				None
			}
			Some(FillContent::Pattern(_)) => {
				log::warn!("Pattern fill of \"{}\" is not rendered", self.document.layer(key)?.name());
				None
			}
			None => None,
		})
	}

	/// Solid color fills paint their whole rectangle, which extends to the canvas edges when stored as zero.
	fn fill_content(&self, key: LayerKey) -> Result<Option<Image<Color>>, DocumentError> {
		let Some(color) = self.fill_color(key)? else { return Ok(None) };
		let rect = self.document.bbox(key)?;
		let viewport = self.viewport;
		Ok(Some(Image::from_fn(viewport.width(), viewport.height(), |x, y| {
			let point = IVec2::new(viewport.left + x as i32, viewport.top + y as i32);
			if rect.contains(point) { color } else { Color::TRANSPARENT }
		})))
	}

	/// Draws a shape layer from its vector data: the fill inside the vector mask, then the vector stroke along its paths.
	fn shape_content(&self, key: LayerKey) -> Result<Option<Image<Color>>, DocumentError> {
		let document = self.document;
		let Some(vector_mask) = document.vector_mask(key)? else {
			return self.pixel_content(key);
		};
		let stroke = document.stroke(key)?.filter(|stroke| stroke.enabled());

		let mut image = Image::new(self.viewport.width(), self.viewport.height(), Color::TRANSPARENT);
		if stroke.is_none_or(|stroke| stroke.fill_enabled()) {
			if let Some(color) = self.fill_color(key)? {
				let coverage = vector_mask.rasterize(self.canvas, self.viewport);
				image = coverage.map(|coverage| color.multiply_alpha(coverage));
			}
		}

		if let Some(stroke) = stroke {
			match stroke.color() {
				Some(color) => {
					let paths = vector_mask.to_bez_paths(self.canvas).into_iter().map(|(_, path)| path).collect::<Vec<_>>();
					let coverage = stroke.rasterize(&paths, self.viewport);
					let layer = coverage.map(|coverage| color.multiply_alpha(coverage));
					blend_into(&mut image, &layer, stroke.blend_mode().for_layer(), stroke.opacity());
				}
				None => log::warn!("Gradient and pattern strokes of \"{}\" are not rendered", document.layer(key)?.name()),
			}
		}
		Ok(Some(image))
	}
}

#[cfg(test)]
mod test {
	use crate::composite::{CompositeRequest, CompositeSettings};
	use crate::document::Document;
	use crate::records::{BlockData, ColorMode, Tag};
	use crate::test_utils::*;
	use crate::vector::{Knot, PathOperation, StrokeAlignment, Subpath, VectorMaskSetting, VectorStrokeData};

	use glam::DVec2;
	use layered_raster::Color;
	use pretty_assertions::assert_eq;

	fn square(left: f64, top: f64, right: f64, bottom: f64) -> VectorMaskSetting {
		let knots = [(left, top), (right, top), (right, bottom), (left, bottom)].into_iter().map(|(x, y)| Knot::corner(DVec2::new(x, y))).collect();
		VectorMaskSetting {
			subpaths: vec![Subpath {
				knots,
				closed: true,
				operation: PathOperation::Or,
			}],
			..Default::default()
		}
	}

	fn alpha_row(document: &Document, request: &CompositeRequest, y: u32) -> Vec<u8> {
		let composite = document.composite(document.root(), request).unwrap();
		(0..composite.width()).map(|x| composite.image.get_pixel(x, y).unwrap_or_default().to_rgba8()[3]).collect()
	}

	#[test]
	fn shapes_fill_their_vector_mask() {
		init_logger();
		let mut document = Document::new(8, 8, ColorMode::Rgb);
		let mut entry = pixel_entry("shape", [0, 0, 0, 0]);
		entry.record.tagged_blocks.set(Tag::SolidColorSheetSetting, BlockData::SolidColor(Color::from_rgb8(0, 0, 255)));
		entry.record.tagged_blocks.set(Tag::VectorMaskSetting2, BlockData::VectorMask(square(0.25, 0.25, 0.75, 0.75)));
		let shape = document.new_layer(entry);
		document.add_layer(document.root(), shape).unwrap();

		let request = CompositeRequest::default();
		assert_eq!(alpha_row(&document, &request, 4), vec![0, 0, 255, 255, 255, 255, 0, 0]);
		assert_eq!(alpha_row(&document, &request, 1), vec![0; 8]);
		let composite = document.composite(document.root(), &request).unwrap();
		assert_eq!(composite.image.get_pixel(3, 3).map(|color| color.to_rgba8()), Some([0, 0, 255, 255]));

		// Without the fill only the outline is left, and an inside stroke keeps it within the shape
		let stroke = VectorStrokeData {
			fill_enabled: false,
			line_width: 1.,
			alignment: StrokeAlignment::Inside,
			color: Some(Color::BLACK),
			..Default::default()
		};
		document.set_tagged_block(shape, Tag::VectorStrokeData, BlockData::VectorStroke(stroke)).unwrap();
		assert_eq!(alpha_row(&document, &request, 4), vec![0, 0, 255, 0, 0, 255, 0, 0]);
		assert_eq!(alpha_row(&document, &request, 2), vec![0, 0, 255, 255, 255, 255, 0, 0]);
	}

	#[test]
	fn shape_pixels_win_unless_vectors_are_forced() {
		let mut document = Document::new(4, 1, ColorMode::Rgb);
		let mut entry = pixel_entry("shape", [0, 0, 4, 1]);
		entry.record.tagged_blocks.set(Tag::SolidColorSheetSetting, BlockData::SolidColor(Color::BLACK));
		entry.record.tagged_blocks.set(Tag::VectorMaskSetting2, BlockData::VectorMask(square(0., 0., 0.5, 1.)));
		let shape = document.new_layer(entry);
		document.add_layer(document.root(), shape).unwrap();

		assert_eq!(alpha_row(&document, &CompositeRequest::default(), 0), vec![255; 4]);

		let settings = CompositeSettings {
			force_vector: true,
			..Default::default()
		};
		let request = CompositeRequest {
			settings: &settings,
			..Default::default()
		};
		assert_eq!(alpha_row(&document, &request, 0), vec![255, 255, 0, 0]);
	}

	#[test]
	fn solid_fills_cover_the_canvas() {
		let mut document = Document::new(3, 1, ColorMode::Rgb);
		let mut entry = pixel_entry("fill", [1, 0, 0, 0]);
		entry.record.tagged_blocks.set(Tag::SolidColorSheetSetting, BlockData::SolidColor(Color::from_rgb8(9, 8, 7)));
		let fill = document.new_layer(entry);
		document.add_layer(document.root(), fill).unwrap();

		assert_eq!(alpha_row(&document, &CompositeRequest::default(), 0), vec![0, 255, 255]);

		document.set_tagged_block(fill, Tag::SolidColorSheetSetting, BlockData::Raw(Vec::new())).unwrap();
		assert_eq!(alpha_row(&document, &CompositeRequest::default(), 0), vec![0, 0, 0]);
	}
}
