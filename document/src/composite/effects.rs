//! Rendering of layer effects from the alpha of the layer they belong to.

use crate::effects::{Effect, EffectKind, GlowSettings, ShadowSettings, StrokeEffectSettings, StrokePosition};

use glam::{DVec2, IVec2};
use layered_raster::{Color, Image};

/// Draws one effect over the viewport. Returns `None` for effects that are not rendered.
pub(super) fn render(effect: &Effect, shape_alpha: &Image<f32>) -> Option<Image<Color>> {
	let alpha = match &effect.kind {
		EffectKind::DropShadow(settings) => drop_shadow(settings, shape_alpha),
		EffectKind::OuterGlow(settings) => outer_glow(settings, shape_alpha)?,
		EffectKind::ColorOverlay { color } => return Some(paint(shape_alpha, *color)),
		EffectKind::Stroke(settings) => stroke(settings, shape_alpha)?,
		other => {
			log::debug!("{other} effects are not rendered");
			return None;
		}
	};
	let color = match &effect.kind {
		EffectKind::DropShadow(settings) => settings.color,
		EffectKind::OuterGlow(GlowSettings { color: Some(color), .. }) | EffectKind::Stroke(StrokeEffectSettings { color: Some(color), .. }) => *color,
		_ => return None,
	};
	Some(paint(&alpha, color))
}

fn paint(alpha: &Image<f32>, color: Color) -> Image<Color> {
	alpha.map(|alpha| color.multiply_alpha(alpha))
}

/// Offset of a shadow cast by light coming from `angle` degrees.
fn shadow_offset(angle: f64, distance: f64) -> IVec2 {
	let radians = angle.to_radians();
	DVec2::new(-distance * radians.cos(), distance * radians.sin()).round().as_ivec2()
}

/// Splits an effect size into the part grown solid by the spread and the part that is blurred.
fn spread_and_blur(size: f64, spread: f64) -> (f64, f64) {
	let spread = size * (spread / 100.).clamp(0., 1.);
	(spread, size - spread)
}

fn drop_shadow(settings: &ShadowSettings, shape_alpha: &Image<f32>) -> Image<f32> {
	let (spread, blur) = spread_and_blur(settings.size, settings.spread);
	let shifted = shift(shape_alpha, shadow_offset(settings.angle, settings.distance));
	box_blur(&dilate(&shifted, spread), blur)
}

fn outer_glow(settings: &GlowSettings, shape_alpha: &Image<f32>) -> Option<Image<f32>> {
	if settings.color.is_none() {
		log::debug!("Gradient glows are not rendered");
		return None;
	}
	let (spread, blur) = spread_and_blur(settings.size, settings.spread);
	Some(box_blur(&dilate(shape_alpha, spread), blur))
}

fn stroke(settings: &StrokeEffectSettings, shape_alpha: &Image<f32>) -> Option<Image<f32>> {
	if settings.color.is_none() {
		log::debug!("Gradient and pattern stroke effects are not rendered");
		return None;
	}
	let size = settings.size;
	let (mut outer, inner) = match settings.position {
		StrokePosition::Outside => (dilate(shape_alpha, size), shape_alpha.clone()),
		StrokePosition::Inside => (shape_alpha.clone(), erode(shape_alpha, size)),
		StrokePosition::Center => (dilate(shape_alpha, size / 2.), erode(shape_alpha, size / 2.)),
	};
	outer.zip_apply(&inner, |outer, inner| (outer - inner).max(0.));
	Some(outer)
}

fn shift(plane: &Image<f32>, offset: IVec2) -> Image<f32> {
	Image::from_fn(plane.width, plane.height, |x, y| plane.sample(x as i64 - offset.x as i64, y as i64 - offset.y as i64, 0.))
}

fn disc(radius: f64) -> Vec<(i64, i64)> {
	let reach = radius.ceil() as i64;
	(-reach..=reach)
		.flat_map(|dy| (-reach..=reach).map(move |dx| (dx, dy)))
		.filter(|&(dx, dy)| ((dx * dx + dy * dy) as f64) <= radius * radius)
		.collect()
}

/// Grows coverage by a disc of `radius` pixels.
fn dilate(plane: &Image<f32>, radius: f64) -> Image<f32> {
	if radius <= 0. {
		return plane.clone();
	}
	let disc = disc(radius);
	Image::from_fn(plane.width, plane.height, |x, y| disc.iter().map(|&(dx, dy)| plane.sample(x as i64 + dx, y as i64 + dy, 0.)).fold(0., f32::max))
}

/// Shrinks coverage by a disc of `radius` pixels. Coverage is assumed to continue past the plane's edges.
fn erode(plane: &Image<f32>, radius: f64) -> Image<f32> {
	if radius <= 0. || plane.is_empty() {
		return plane.clone();
	}
	let disc = disc(radius);
	let (max_x, max_y) = (plane.width as i64 - 1, plane.height as i64 - 1);
	Image::from_fn(plane.width, plane.height, |x, y| {
		disc.iter()
			.map(|&(dx, dy)| plane.sample((x as i64 + dx).clamp(0, max_x), (y as i64 + dy).clamp(0, max_y), 0.))
			.fold(1., f32::min)
	})
}

/// Approximates a gaussian blur spanning `size` pixels with three box blur passes.
fn box_blur(plane: &Image<f32>, size: f64) -> Image<f32> {
	let radius = (size / 3.).ceil() as i64;
	if radius <= 0 {
		return plane.clone();
	}
	let mut blurred = plane.clone();
	for _ in 0..3 {
		blurred = box_blur_pass(&blurred, radius, true);
		blurred = box_blur_pass(&blurred, radius, false);
	}
	blurred
}

fn box_blur_pass(plane: &Image<f32>, radius: i64, horizontal: bool) -> Image<f32> {
	let window = (2 * radius + 1) as f32;
	Image::from_fn(plane.width, plane.height, |x, y| {
		let (x, y) = (x as i64, y as i64);
		let sum: f32 = (-radius..=radius)
			.map(|offset| if horizontal { plane.sample(x + offset, y, 0.) } else { plane.sample(x, y + offset, 0.) })
			.sum();
		sum / window
	})
}
