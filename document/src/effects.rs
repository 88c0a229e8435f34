//! Layer effects (layer styles): shadows, glows, overlays and strokes attached to a layer.

use crate::document::Document;
use crate::error::DocumentError;
use crate::layers::LayerKey;
use crate::records::{BlockData, Tag};

use core::fmt;
use layered_raster::{BlendMode, Color};
use serde::{Deserialize, Serialize};

/// Payload of the object-based effects blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectsData {
	/// The layer-wide switch that turns every effect on or off.
	pub enabled: bool,
	pub scale: f64,
	pub effects: Vec<Effect>,
	/// Remaining descriptor fields, preserved as read.
	pub descriptor: serde_json::Value,
}

impl Default for EffectsData {
	fn default() -> Self {
		Self {
			enabled: true,
			scale: 100.,
			effects: Vec::new(),
			descriptor: serde_json::Value::Null,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
	pub enabled: bool,
	pub present: bool,
	pub shown: bool,
	pub blend_mode: BlendMode,
	/// Percentage from 0 to 100.
	pub opacity: f64,
	pub kind: EffectKind,
}

impl Effect {
	pub fn new(kind: EffectKind) -> Self {
		let blend_mode = match kind {
			EffectKind::DropShadow(_) | EffectKind::InnerShadow(_) => BlendMode::Multiply,
			EffectKind::OuterGlow(_) | EffectKind::InnerGlow(_) => BlendMode::Screen,
			_ => BlendMode::Normal,
		};
		Self {
			enabled: true,
			present: true,
			shown: true,
			blend_mode,
			opacity: 100.,
			kind,
		}
	}

	/// Opacity from 0 to 1.
	pub fn opacity(&self) -> f32 {
		(self.opacity / 100.).clamp(0., 1.) as f32
	}

	pub fn name(&self) -> &'static str {
		self.kind.name()
	}
}

/// Settings shared by drop and inner shadows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
	pub color: Color,
	/// Light angle in degrees, counterclockwise from the positive x axis.
	pub angle: f64,
	pub use_global_light: bool,
	pub distance: f64,
	/// Spread (choke for inner shadows) as a percentage of the size.
	pub spread: f64,
	pub size: f64,
}

impl Default for ShadowSettings {
	fn default() -> Self {
		Self {
			color: Color::BLACK,
			angle: 120.,
			use_global_light: true,
			distance: 5.,
			spread: 0.,
			size: 5.,
		}
	}
}

/// Settings shared by outer and inner glows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlowSettings {
	/// `None` for gradient glows, which are not rendered.
	pub color: Option<Color>,
	/// Spread (choke for inner glows) as a percentage of the size.
	pub spread: f64,
	pub size: f64,
}

impl Default for GlowSettings {
	fn default() -> Self {
		Self {
			color: Some(Color::from_rgb8(255, 255, 190)),
			spread: 0.,
			size: 5.,
		}
	}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrokePosition {
	Inside,
	Center,
	#[default]
	Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeEffectSettings {
	/// `None` for gradient and pattern fills, which are not rendered.
	pub color: Option<Color>,
	pub size: f64,
	pub position: StrokePosition,
}

impl Default for StrokeEffectSettings {
	fn default() -> Self {
		Self {
			color: Some(Color::from_rgb8(255, 0, 0)),
			size: 3.,
			position: StrokePosition::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
	DropShadow(ShadowSettings),
	InnerShadow(ShadowSettings),
	OuterGlow(GlowSettings),
	InnerGlow(GlowSettings),
	ColorOverlay { color: Color },
	GradientOverlay(serde_json::Value),
	PatternOverlay(serde_json::Value),
	Stroke(StrokeEffectSettings),
	BevelEmboss(serde_json::Value),
	Satin(serde_json::Value),
}

/// Whether an effect is drawn under or over the layer content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EffectPlacement {
	Below,
	Above,
}

impl EffectKind {
	pub fn name(&self) -> &'static str {
		match self {
			EffectKind::DropShadow(_) => "Drop Shadow",
			EffectKind::InnerShadow(_) => "Inner Shadow",
			EffectKind::OuterGlow(_) => "Outer Glow",
			EffectKind::InnerGlow(_) => "Inner Glow",
			EffectKind::ColorOverlay { .. } => "Color Overlay",
			EffectKind::GradientOverlay(_) => "Gradient Overlay",
			EffectKind::PatternOverlay(_) => "Pattern Overlay",
			EffectKind::Stroke(_) => "Stroke",
			EffectKind::BevelEmboss(_) => "Bevel & Emboss",
			EffectKind::Satin(_) => "Satin",
		}
	}

	/// Position in the fixed effect stack, from the bottom.
	pub fn stacking_order(&self) -> (EffectPlacement, u8) {
		match self {
			EffectKind::DropShadow(_) => (EffectPlacement::Below, 0),
			EffectKind::OuterGlow(_) => (EffectPlacement::Below, 1),
			EffectKind::InnerShadow(_) => (EffectPlacement::Above, 0),
			EffectKind::InnerGlow(_) => (EffectPlacement::Above, 1),
			EffectKind::BevelEmboss(_) => (EffectPlacement::Above, 2),
			EffectKind::Satin(_) => (EffectPlacement::Above, 3),
			EffectKind::ColorOverlay { .. } => (EffectPlacement::Above, 4),
			EffectKind::GradientOverlay(_) => (EffectPlacement::Above, 5),
			EffectKind::PatternOverlay(_) => (EffectPlacement::Above, 6),
			EffectKind::Stroke(_) => (EffectPlacement::Above, 7),
		}
	}
}

impl fmt::Display for EffectKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.name())
	}
}

/// Resolved effects of a layer, with shadow angles following the document's global light where requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
	enabled: bool,
	scale: f64,
	items: Vec<Effect>,
}

impl Effects {
	pub fn new(data: &EffectsData, global_angle: f64) -> Self {
		let items = data
			.effects
			.iter()
			.cloned()
			.map(|mut effect| {
				if let EffectKind::DropShadow(settings) | EffectKind::InnerShadow(settings) = &mut effect.kind {
					if settings.use_global_light {
						settings.angle = global_angle;
					}
				}
				effect
			})
			.collect();
		Self {
			enabled: data.enabled,
			scale: data.scale,
			items,
		}
	}

	pub fn enabled(&self) -> bool {
		self.enabled
	}

	pub fn scale(&self) -> f64 {
		self.scale
	}

	pub fn iter(&self) -> impl Iterator<Item = &Effect> {
		self.items.iter()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Effects are active when the layer-wide switch and at least one individual effect are enabled.
	pub fn has_active(&self) -> bool {
		self.enabled && self.items.iter().any(|effect| effect.enabled)
	}

	/// Enabled effects of one placement in stacking order, bottom first.
	pub fn stacked(&self, placement: EffectPlacement) -> Vec<&Effect> {
		if !self.enabled {
			return Vec::new();
		}
		let mut effects = self.items.iter().filter(|effect| effect.enabled && effect.kind.stacking_order().0 == placement).collect::<Vec<_>>();
		effects.sort_by_key(|effect| effect.kind.stacking_order().1);
		effects
	}
}

impl Document {
	/// The layer's effects. Layers without an effects block get an empty, enabled list.
	pub fn effects(&self, key: LayerKey) -> Result<&Effects, DocumentError> {
		let node = self.layer(key)?;
		Ok(node.cache.effects.get_or_init(|| match node.record.tagged_blocks.get_any(&Tag::EFFECTS) {
			Some((_, BlockData::Effects(data))) => Effects::new(data, self.global_angle()),
			Some((tag, _)) => {
				log::debug!("Effects block {:?} of \"{}\" is not in descriptor form, ignoring it", tag, node.name());
				Effects::default()
			}
			None => Effects::new(&EffectsData::default(), self.global_angle()),
		}))
	}

	/// Whether the layer has an effects block with the layer-wide switch and at least one effect enabled.
	pub fn has_effects(&self, key: LayerKey) -> Result<bool, DocumentError> {
		let node = self.layer(key)?;
		if !node.record.tagged_blocks.contains_any(&Tag::EFFECTS) {
			return Ok(false);
		}
		Ok(self.effects(key)?.has_active())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::records::ColorMode;
	use crate::test_utils::*;
	use pretty_assertions::assert_eq;

	fn effects_block(enabled: bool, effects: Vec<Effect>) -> BlockData {
		BlockData::Effects(EffectsData {
			enabled,
			effects,
			..Default::default()
		})
	}

	#[test]
	fn activity_needs_both_switches() {
		let mut document = Document::new(4, 4, ColorMode::Rgb);
		let layer = add_pixel_layer(&mut document, "layer", [0, 0, 4, 4]);
		assert!(!document.has_effects(layer).unwrap());

		let mut disabled = Effect::new(EffectKind::Stroke(StrokeEffectSettings::default()));
		disabled.enabled = false;
		document.set_tagged_block(layer, Tag::ObjectBasedEffectsLayerInfo, effects_block(true, vec![disabled.clone()])).unwrap();
		assert!(!document.has_effects(layer).unwrap());

		let enabled = Effect::new(EffectKind::ColorOverlay { color: Color::WHITE });
		document.set_tagged_block(layer, Tag::ObjectBasedEffectsLayerInfo, effects_block(false, vec![disabled.clone(), enabled.clone()])).unwrap();
		assert!(!document.has_effects(layer).unwrap());

		document.set_tagged_block(layer, Tag::ObjectBasedEffectsLayerInfo, effects_block(true, vec![disabled, enabled])).unwrap();
		assert!(document.has_effects(layer).unwrap());
		assert_eq!(document.effects(layer).unwrap().len(), 2);
	}

	#[test]
	fn effects_stack_in_fixed_order() {
		let data = EffectsData {
			effects: vec![
				Effect::new(EffectKind::Stroke(StrokeEffectSettings::default())),
				Effect::new(EffectKind::OuterGlow(GlowSettings::default())),
				Effect::new(EffectKind::ColorOverlay { color: Color::BLACK }),
				Effect::new(EffectKind::DropShadow(ShadowSettings::default())),
			],
			..Default::default()
		};
		let effects = Effects::new(&data, 90.);
		let below = effects.stacked(EffectPlacement::Below).into_iter().map(Effect::name).collect::<Vec<_>>();
		let above = effects.stacked(EffectPlacement::Above).into_iter().map(Effect::name).collect::<Vec<_>>();
		assert_eq!(below, vec!["Drop Shadow", "Outer Glow"]);
		assert_eq!(above, vec!["Color Overlay", "Stroke"]);
	}

	#[test]
	fn shadows_follow_the_global_light() {
		let mut document = Document::new(4, 4, ColorMode::Rgb);
		let layer = add_pixel_layer(&mut document, "layer", [0, 0, 4, 4]);
		let local = ShadowSettings {
			angle: 45.,
			use_global_light: false,
			..Default::default()
		};
		let data = vec![Effect::new(EffectKind::DropShadow(ShadowSettings::default())), Effect::new(EffectKind::InnerShadow(local))];
		document.set_tagged_block(layer, Tag::ObjectBasedEffectsLayerInfo, effects_block(true, data)).unwrap();

		let angles = |document: &Document| {
			document
				.effects(layer)
				.unwrap()
				.iter()
				.filter_map(|effect| match effect.kind {
					EffectKind::DropShadow(settings) | EffectKind::InnerShadow(settings) => Some(settings.angle),
					_ => None,
				})
				.collect::<Vec<_>>()
		};
		assert_eq!(angles(&document), vec![120., 45.]);
		document.set_global_angle(30.);
		assert_eq!(angles(&document), vec![30., 45.]);
	}
}
