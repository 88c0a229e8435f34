//! Flattening a layer or a whole subtree into a single image.
//!
//! Layers are drawn back to front into an accumulator covering the viewport. Groups either blend their children straight into the
//! accumulator (pass-through) or into an isolated buffer that is then blended as one layer.

mod content;
mod effects;

use crate::channels::{ChannelDecoder, RawChannelDecoder};
use crate::document::Document;
use crate::effects::{EffectPlacement, Effects};
use crate::error::DocumentError;
use crate::geometry::{BoundsOptions, Rect};
use crate::layers::{LayerData, LayerKey, LayerKind};
use crate::records::ColorMode;

use glam::{DVec2, IVec2, UVec2};
use layered_raster::{BlendMode, Color, Image, blend_colors};
use serde::{Deserialize, Serialize};

/// Options of a compositing run. Every field has a default, so partial configuration files deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeSettings {
	/// Color the accumulator starts with.
	pub backdrop_color: Color,
	/// Alpha of the starting backdrop, 0 for a transparent result.
	pub backdrop_alpha: f32,
	/// Draw shape layers from their vector data even when they carry pixels.
	pub force_vector: bool,
	pub apply_effects: bool,
	/// Let artboards without a rectangle count as empty when computing the default viewport.
	pub tolerate_missing_artboard_geometry: bool,
}

static DEFAULT_SETTINGS: CompositeSettings = CompositeSettings {
	backdrop_color: Color::WHITE,
	backdrop_alpha: 0.,
	force_vector: false,
	apply_effects: true,
	tolerate_missing_artboard_geometry: false,
};

impl Default for CompositeSettings {
	fn default() -> Self {
		DEFAULT_SETTINGS.clone()
	}
}

/// Decides whether a layer takes part in compositing.
pub type LayerFilter<'a> = dyn Fn(&Document, LayerKey) -> bool + 'a;

/// Everything a compositing run needs besides the document.
#[derive(Clone, Copy)]
pub struct CompositeRequest<'a> {
	/// Area of the canvas to render. Defaults to the canvas for the root and to the layer's bounding box otherwise.
	pub viewport: Option<Rect>,
	pub settings: &'a CompositeSettings,
	/// Replaces the default filter, which keeps effectively visible layers.
	pub layer_filter: Option<&'a LayerFilter<'a>>,
	pub decoder: &'a dyn ChannelDecoder,
}

impl Default for CompositeRequest<'_> {
	fn default() -> Self {
		Self {
			viewport: None,
			settings: &DEFAULT_SETTINGS,
			layer_filter: None,
			decoder: &RawChannelDecoder,
		}
	}
}

impl core::fmt::Debug for CompositeRequest<'_> {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("CompositeRequest")
			.field("viewport", &self.viewport)
			.field("settings", &self.settings)
			.field("layer_filter", &self.layer_filter.is_some())
			.finish_non_exhaustive()
	}
}

/// The flattened result, with straight alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeImage {
	pub image: Image<Color>,
	/// The rendered area in canvas pixels.
	pub viewport: Rect,
	canvas: UVec2,
	color_mode: ColorMode,
	depth: u16,
}

impl CompositeImage {
	pub fn width(&self) -> u32 {
		self.image.width
	}

	pub fn height(&self) -> u32 {
		self.image.height
	}

	pub fn is_empty(&self) -> bool {
		self.image.is_empty()
	}

	/// Top-left corner of the viewport, reported only when the image does not cover exactly the canvas.
	pub fn offset(&self) -> Option<IVec2> {
		let canvas = Rect::from_offset_size(IVec2::ZERO, self.canvas);
		(self.viewport != canvas).then_some(self.viewport.offset())
	}

	pub fn alpha(&self) -> Image<f32> {
		self.image.alpha()
	}

	pub fn to_rgba_image(&self) -> ::image::RgbaImage {
		self.image.to_rgba_image()
	}

	/// Converts to an image whose channel layout and sample type follow the document's color mode and depth.
	pub fn to_dynamic_image(&self) -> ::image::DynamicImage {
		use ::image::{DynamicImage, ImageBuffer, LumaA, Rgba};

		let (width, height) = (self.image.width, self.image.height);
		let pixel = |x, y| self.image.get_pixel(x, y).unwrap_or_default();
		match (self.color_mode, self.depth) {
			(_, 32) => DynamicImage::ImageRgba32F(ImageBuffer::from_fn(width, height, |x, y| {
				let (red, green, blue, alpha) = pixel(x, y).components();
				Rgba([red, green, blue, alpha])
			})),
			(ColorMode::Grayscale, 16) => DynamicImage::ImageLumaA16(ImageBuffer::from_fn(width, height, |x, y| {
				let [value, _, _, alpha] = pixel(x, y).to_rgba16();
				LumaA([value, alpha])
			})),
			(ColorMode::Grayscale, _) => DynamicImage::ImageLumaA8(ImageBuffer::from_fn(width, height, |x, y| {
				let [value, _, _, alpha] = pixel(x, y).to_rgba8();
				LumaA([value, alpha])
			})),
			(_, 16) => DynamicImage::ImageRgba16(ImageBuffer::from_fn(width, height, |x, y| Rgba(pixel(x, y).to_rgba16()))),
			_ => DynamicImage::ImageRgba8(self.to_rgba_image()),
		}
	}
}

impl Document {
	/// Flattens a layer, or the whole document when given the root.
	///
	/// A viewport without area yields an empty image rather than an error. Only grayscale and RGB documents can be composited.
	pub fn composite(&self, key: LayerKey, request: &CompositeRequest) -> Result<CompositeImage, DocumentError> {
		self.layer(key)?;
		let settings = request.settings;
		let viewport = match request.viewport {
			Some(viewport) => viewport,
			None if key == self.root() => self.viewbox(),
			None => self.extract_bbox(
				key,
				BoundsOptions {
					include_invisible: false,
					tolerate_missing_artboard: settings.tolerate_missing_artboard_geometry,
				},
			)?,
		};

		let mut result = CompositeImage {
			image: Image::default(),
			viewport,
			canvas: UVec2::new(self.width(), self.height()),
			color_mode: self.color_mode(),
			depth: self.depth(),
		};
		if !viewport.has_area() {
			log::debug!("Viewport {viewport:?} has no area, nothing to composite");
			return Ok(result);
		}
		if !matches!(self.color_mode(), ColorMode::Grayscale | ColorMode::Rgb) {
			return Err(DocumentError::UnsupportedColorMode(self.color_mode()));
		}

		let backdrop = settings.backdrop_color.with_alpha(settings.backdrop_alpha.clamp(0., 1.));
		let mut accumulator = Image::new(viewport.width(), viewport.height(), backdrop);
		let compositor = Compositor {
			document: self,
			request,
			viewport,
			canvas: DVec2::new(self.width() as f64, self.height() as f64),
		};
		if key == self.root() {
			compositor.composite_children(key, &mut accumulator)?;
		} else if compositor.include(key)? {
			compositor.composite_layer(key, &mut accumulator)?;
		}
		result.image = accumulator;
		Ok(result)
	}
}

/// Blends `layer` over `accumulator` pixel by pixel.
pub(crate) fn blend_into(accumulator: &mut Image<Color>, layer: &Image<Color>, blend_mode: BlendMode, opacity: f32) {
	if opacity <= 0. {
		return;
	}
	accumulator.zip_apply(layer, |backdrop, source| blend_colors(source, backdrop, blend_mode, opacity));
}

struct Compositor<'a> {
	document: &'a Document,
	request: &'a CompositeRequest<'a>,
	viewport: Rect,
	canvas: DVec2,
}

impl Compositor<'_> {
	fn include(&self, key: LayerKey) -> Result<bool, DocumentError> {
		match self.request.layer_filter {
			Some(filter) => Ok(filter(self.document, key)),
			None => self.document.is_visible(key),
		}
	}

	fn transparent(&self) -> Image<Color> {
		Image::new(self.viewport.width(), self.viewport.height(), Color::TRANSPARENT)
	}

	fn composite_children(&self, parent: LayerKey, accumulator: &mut Image<Color>) -> Result<(), DocumentError> {
		for &child in self.document.group_children(parent)? {
			// Clipped layers are drawn together with their base
			if self.document.layer(child)?.clip_base().is_some() {
				continue;
			}
			if !self.include(child)? {
				log::trace!("Skipping \"{}\"", self.document.layer(child)?.name());
				continue;
			}
			self.composite_layer(child, accumulator)?;
		}
		Ok(())
	}

	fn composite_layer(&self, key: LayerKey, accumulator: &mut Image<Color>) -> Result<(), DocumentError> {
		let document = self.document;
		let node = document.layer(key)?;
		let effects = match self.request.settings.apply_effects && document.has_effects(key)? {
			true => Some(document.effects(key)?),
			false => None,
		};

		let mut blend_mode = node.blend_mode();
		if node.is_group() && blend_mode == BlendMode::PassThrough {
			if !node.has_clip_layers() && effects.is_none() {
				return self.composite_pass_through(key, accumulator);
			}
			log::debug!("Pass-through group \"{}\" has clipping layers or effects, compositing it in isolation", node.name());
			blend_mode = BlendMode::Normal;
		}

		let mut content = match &node.data {
			LayerData::Group(_) | LayerData::Artboard(_) => {
				let mut isolated = self.transparent();
				self.composite_children(key, &mut isolated)?;
				isolated
			}
			LayerData::Adjustment(kind) => {
				log::trace!("Adjustment layer \"{}\" ({kind}) has no pixels to composite", node.name());
				return Ok(());
			}
			_ => match self.layer_content(key)? {
				Some(content) => content,
				None => return Ok(()),
			},
		};

		if let Some(coverage) = self.mask_coverage(key)? {
			content.zip_apply(&coverage, |color, coverage| color.multiply_alpha(coverage));
		}
		let shape_alpha = content.alpha();
		let mut body = self.apply_clip_layers(key, content, &shape_alpha)?;

		// Fill opacity fades the content but not its effects
		let fill_opacity = node.fill_opacity() as f32 / 255.;
		if fill_opacity < 1. {
			body.data.iter_mut().for_each(|color| *color = color.multiply_alpha(fill_opacity));
		}

		let opacity = node.opacity() as f32 / 255.;
		if let Some(effects) = effects {
			self.draw_effects(effects, EffectPlacement::Below, &shape_alpha, accumulator, opacity);
			self.draw_effects(effects, EffectPlacement::Above, &shape_alpha, &mut body, 1.);
		}

		let blend_mode = if node.is_group() { blend_mode } else { blend_mode.for_layer() };
		blend_into(accumulator, &body, blend_mode, opacity);
		Ok(())
	}

	/// Children blend straight into the accumulator. Opacity and masks then fade between the backdrop before and after.
	fn composite_pass_through(&self, key: LayerKey, accumulator: &mut Image<Color>) -> Result<(), DocumentError> {
		let opacity = self.document.layer(key)?.opacity() as f32 / 255.;
		let coverage = self.mask_coverage(key)?;
		if opacity >= 1. && coverage.is_none() {
			return self.composite_children(key, accumulator);
		}

		let backdrop = accumulator.clone();
		self.composite_children(key, accumulator)?;
		for (index, (color, before)) in accumulator.data.iter_mut().zip(backdrop.data.iter()).enumerate() {
			let amount = opacity * coverage.as_ref().and_then(|coverage| coverage.data.get(index).copied()).unwrap_or(1.);
			*color = before.lerp(color, amount);
		}
		Ok(())
	}

	/// Combined coverage of the enabled raster mask and vector mask over the viewport, or `None` when neither applies.
	fn mask_coverage(&self, key: LayerKey) -> Result<Option<Image<f32>>, DocumentError> {
		let document = self.document;
		let mut coverage = None;

		if let Some(mask) = document.mask(key)?.filter(|mask| !mask.disabled()) {
			let pixels = document.mask_image(key, self.request.decoder)?.map(|(_, pixels)| pixels);
			coverage = Some(mask.coverage(pixels.as_ref(), self.viewport));
		}

		// Shape layers are already drawn from their vector mask
		if document.kind(key)? != LayerKind::Shape {
			if let Some(vector_mask) = document.vector_mask(key)?.filter(|vector_mask| !vector_mask.disabled()) {
				let vector = vector_mask.rasterize(self.canvas, self.viewport);
				coverage = Some(match coverage {
					Some(mut coverage) => {
						coverage.zip_apply(&vector, |raster, vector| raster * vector);
						coverage
					}
					None => vector,
				});
			}
		}
		Ok(coverage)
	}

	/// Draws the clipping layers over the base content, then limits the result to the base's own alpha.
	fn apply_clip_layers(&self, key: LayerKey, content: Image<Color>, shape_alpha: &Image<f32>) -> Result<Image<Color>, DocumentError> {
		let clip_layers = self.document.layer(key)?.clip_layers();
		if clip_layers.is_empty() {
			return Ok(content);
		}

		let mut clipped = content;
		for &clip in clip_layers {
			if self.include(clip)? {
				self.composite_layer(clip, &mut clipped)?;
			}
		}
		clipped.zip_apply(shape_alpha, |color, alpha| color.with_alpha(alpha));
		Ok(clipped)
	}

	fn draw_effects(&self, effects: &Effects, placement: EffectPlacement, shape_alpha: &Image<f32>, target: &mut Image<Color>, opacity: f32) {
		for effect in effects.stacked(placement) {
			if let Some(layer) = effects::render(effect, shape_alpha) {
				blend_into(target, &layer, effect.blend_mode.for_layer(), effect.opacity() * opacity);
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::effects::{Effect, EffectKind, EffectsData, ShadowSettings};
	use crate::records::{BlockData, MaskData, Tag};
	use crate::test_utils::*;
	use pretty_assertions::assert_eq;

	/// The default backdrop: white at zero alpha.
	const CLEAR: [u8; 4] = [255, 255, 255, 0];

	fn rgba8(image: &CompositeImage) -> Vec<[u8; 4]> {
		image.image.data.iter().map(Color::to_rgba8).collect()
	}

	fn pixel(image: &CompositeImage, x: u32, y: u32) -> [u8; 4] {
		image.image.get_pixel(x, y).unwrap_or_default().to_rgba8()
	}

	#[test]
	fn canvas_sized_layer_reproduces_its_pixels() {
		init_logger();
		let mut document = Document::new(3, 2, ColorMode::Rgb);
		let source = ::image::RgbaImage::from_fn(3, 2, |x, y| ::image::Rgba([x as u8 * 100, y as u8 * 200, 17, 255]));
		let layer = document.new_pixel_layer(&source, "photo", 0, 0).unwrap();
		document.add_layer(document.root(), layer).unwrap();

		let composite = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(composite.to_rgba_image(), source);
		assert_eq!(composite.offset(), None);
	}

	#[test]
	fn empty_viewport_is_not_an_error() {
		let mut document = Document::new(4, 4, ColorMode::Rgb);
		add_filled_layer(&mut document, "layer", [0, 0, 4, 4], [255, 0, 0, 255]);
		let request = CompositeRequest {
			viewport: Some(Rect::new(2, 2, 2, 4)),
			..Default::default()
		};
		let composite = document.composite(document.root(), &request).unwrap();
		assert!(composite.is_empty());

		let hidden = add_filled_layer(&mut document, "hidden", [0, 0, 4, 4], [0, 0, 255, 255]);
		document.set_visible(hidden, false).unwrap();
		let composite = document.composite(hidden, &CompositeRequest::default()).unwrap();
		assert_eq!(rgba8(&composite), vec![CLEAR; 16]);
	}

	#[test]
	fn viewport_crops_and_reports_offset() {
		let mut document = Document::new(4, 4, ColorMode::Rgb);
		let layer = add_filled_layer(&mut document, "layer", [1, 1, 3, 3], [0, 255, 0, 255]);

		let composite = document.composite(layer, &CompositeRequest::default()).unwrap();
		assert_eq!((composite.width(), composite.height()), (2, 2));
		assert_eq!(composite.offset(), Some(IVec2::new(1, 1)));
		assert_eq!(rgba8(&composite), vec![[0, 255, 0, 255]; 4]);

		let composite = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(pixel(&composite, 0, 0), CLEAR);
		assert_eq!(pixel(&composite, 1, 1), [0, 255, 0, 255]);
	}

	#[test]
	fn backdrop_and_opacity() {
		let mut document = Document::new(1, 1, ColorMode::Rgb);
		let layer = add_filled_layer(&mut document, "layer", [0, 0, 1, 1], [0, 0, 0, 255]);
		document.set_opacity(layer, 51).unwrap();

		let settings = CompositeSettings {
			backdrop_alpha: 1.,
			..Default::default()
		};
		let request = CompositeRequest {
			settings: &settings,
			..Default::default()
		};
		let composite = document.composite(document.root(), &request).unwrap();
		// 20% black over white
		assert_eq!(pixel(&composite, 0, 0), [204, 204, 204, 255]);
	}

	#[test]
	fn pass_through_matches_direct_compositing() {
		init_logger();
		let build = |grouped: bool| {
			let mut document = Document::new(2, 1, ColorMode::Rgb);
			add_filled_layer(&mut document, "backdrop", [0, 0, 2, 1], [200, 100, 50, 255]);
			let top = add_filled_layer(&mut document, "multiply", [0, 0, 1, 1], [128, 128, 255, 255]);
			document.set_blend_mode(top, BlendMode::Multiply).unwrap();
			if grouped {
				let group = document.group_layers(&[top], "group", None, true).unwrap();
				document.set_blend_mode(group, BlendMode::PassThrough).unwrap();
			}
			document
		};
		let direct = build(false);
		let grouped = build(true);
		let direct = direct.composite(direct.root(), &CompositeRequest::default()).unwrap();
		let grouped = grouped.composite(grouped.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(grouped, direct);
		assert_eq!(pixel(&direct, 0, 0), [100, 50, 50, 255]);
	}

	#[test]
	fn isolated_groups_blend_as_a_unit() {
		let mut document = Document::new(1, 1, ColorMode::Rgb);
		add_filled_layer(&mut document, "backdrop", [0, 0, 1, 1], [0, 255, 0, 255]);
		let top = add_filled_layer(&mut document, "multiply", [0, 0, 1, 1], [255, 0, 0, 255]);
		document.set_blend_mode(top, BlendMode::Multiply).unwrap();
		let group = document.group_layers(&[top], "group", None, true).unwrap();
		document.set_blend_mode(group, BlendMode::Normal).unwrap();
		document.set_opacity(group, 0).unwrap();

		let composite = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(pixel(&composite, 0, 0), [0, 255, 0, 255]);

		// Multiplying inside the isolated group sees no backdrop, so red comes out unchanged
		document.set_opacity(group, 255).unwrap();
		let composite = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(pixel(&composite, 0, 0), [255, 0, 0, 255]);

		document.set_blend_mode(group, BlendMode::PassThrough).unwrap();
		let composite = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(pixel(&composite, 0, 0), [0, 0, 0, 255]);
	}

	#[test]
	fn clipping_layers_stay_inside_their_base() {
		let mut document = Document::new(4, 1, ColorMode::Rgb);
		add_filled_layer(&mut document, "base", [0, 0, 2, 1], [255, 0, 0, 255]);
		let clip = add_filled_layer(&mut document, "clip", [1, 0, 4, 1], [0, 0, 255, 255]);
		document.set_clipping(clip, true).unwrap();

		let composite = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(rgba8(&composite), vec![[255, 0, 0, 255], [0, 0, 255, 255], CLEAR, CLEAR]);

		// Hiding the clipping layer leaves the base alone
		document.set_visible(clip, false).unwrap();
		let composite = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(pixel(&composite, 1, 0), [255, 0, 0, 255]);
	}

	#[test]
	fn masks_limit_coverage() {
		let mut document = Document::new(2, 1, ColorMode::Rgb);
		let layer = add_filled_layer(&mut document, "layer", [0, 0, 2, 1], [0, 0, 0, 255]);
		document
			.set_mask_data(
				layer,
				Some(MaskData {
					left: 1,
					right: 2,
					bottom: 1,
					background_color: 0,
					..Default::default()
				}),
			)
			.unwrap();
		// No mask pixels were stored, so the whole mask reads as its background color
		let composite = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(rgba8(&composite), vec![CLEAR; 2]);

		document
			.set_mask_data(
				layer,
				Some(MaskData {
					background_color: 255,
					..Default::default()
				}),
			)
			.unwrap();
		let composite = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(rgba8(&composite), vec![[0, 0, 0, 255]; 2]);
	}

	#[test]
	fn adjustment_layers_add_nothing() {
		let mut document = Document::new(2, 2, ColorMode::Rgb);
		add_filled_layer(&mut document, "layer", [0, 0, 2, 2], [10, 20, 30, 255]);
		let before = document.composite(document.root(), &CompositeRequest::default()).unwrap();

		let mut entry = pixel_entry("levels", [0, 0, 2, 2]);
		entry.record.tagged_blocks.set(Tag::Adjustment(crate::adjustment::AdjustmentKind::Levels), BlockData::Raw(Vec::new()));
		let adjustment = document.new_layer(entry);
		document.add_layer(document.root(), adjustment).unwrap();

		let after = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		assert_eq!(after, before);
		assert!(document.composite(adjustment, &CompositeRequest::default()).unwrap().image.data.iter().all(|color| color.a() == 0.));
	}

	#[test]
	fn custom_filters_replace_visibility() {
		let mut document = Document::new(1, 1, ColorMode::Rgb);
		add_filled_layer(&mut document, "red", [0, 0, 1, 1], [255, 0, 0, 255]);
		let blue = add_filled_layer(&mut document, "blue", [0, 0, 1, 1], [0, 0, 255, 255]);

		let only_red: &LayerFilter = &|document, key| document.layer(key).map(|node| node.name() == "red").unwrap_or(false);
		let request = CompositeRequest {
			layer_filter: Some(only_red),
			..Default::default()
		};
		assert_eq!(pixel(&document.composite(document.root(), &request).unwrap(), 0, 0), [255, 0, 0, 255]);

		document.set_visible(blue, false).unwrap();
		let everything: &LayerFilter = &|_, _| true;
		let request = CompositeRequest {
			layer_filter: Some(everything),
			..Default::default()
		};
		assert_eq!(pixel(&document.composite(document.root(), &request).unwrap(), 0, 0), [0, 0, 255, 255]);
	}

	#[test]
	fn drop_shadow_falls_below_the_content() {
		let mut document = Document::new(4, 1, ColorMode::Rgb);
		let layer = add_filled_layer(&mut document, "layer", [0, 0, 2, 1], [255, 255, 255, 255]);
		let shadow = Effect {
			blend_mode: BlendMode::Normal,
			..Effect::new(EffectKind::DropShadow(ShadowSettings {
				color: Color::BLACK,
				angle: 180.,
				use_global_light: false,
				distance: 1.,
				spread: 100.,
				size: 0.,
			}))
		};
		let data = EffectsData {
			effects: vec![shadow],
			..Default::default()
		};
		document.set_tagged_block(layer, Tag::ObjectBasedEffectsLayerInfo, BlockData::Effects(data)).unwrap();

		let request = CompositeRequest {
			viewport: Some(document.viewbox()),
			..Default::default()
		};
		let composite = document.composite(document.root(), &request).unwrap();
		assert_eq!(rgba8(&composite), vec![[255, 255, 255, 255], [255, 255, 255, 255], [0, 0, 0, 255], CLEAR]);

		let settings = CompositeSettings {
			apply_effects: false,
			..Default::default()
		};
		let request = CompositeRequest { settings: &settings, ..request };
		assert_eq!(pixel(&document.composite(document.root(), &request).unwrap(), 2, 0), CLEAR);
	}

	#[test]
	fn dynamic_image_follows_the_document_format() {
		let mut document = Document::new(1, 1, ColorMode::Grayscale);
		add_filled_layer(&mut document, "layer", [0, 0, 1, 1], [128, 128, 128, 255]);
		let composite = document.composite(document.root(), &CompositeRequest::default()).unwrap();
		let ::image::DynamicImage::ImageLumaA8(image) = composite.to_dynamic_image() else { panic!("expected an 8-bit gray image") };
		assert_eq!(image.get_pixel(0, 0).0, [128, 255]);

		let document = Document::new(1, 1, ColorMode::Cmyk);
		assert_eq!(document.composite(document.root(), &CompositeRequest::default()), Err(DocumentError::UnsupportedColorMode(ColorMode::Cmyk)));
	}
}
