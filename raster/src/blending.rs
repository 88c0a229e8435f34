//! Blend equations for every [`BlendMode`], following the formulas layered image editors document for their layer modes.
//!
//! Colors enter and leave as straight (non-premultiplied) values. [`blend_colors`] performs the full
//! "source over backdrop with blend function" step, premultiplying around the mix.

use crate::blend_mode::BlendMode;
use crate::color::Color;

#[inline(always)]
pub fn blend_normal(_backdrop: f32, source: f32) -> f32 {
	source
}

#[inline(always)]
pub fn blend_multiply(backdrop: f32, source: f32) -> f32 {
	backdrop * source
}

#[inline(always)]
pub fn blend_screen(backdrop: f32, source: f32) -> f32 {
	backdrop + source - backdrop * source
}

#[inline(always)]
pub fn blend_darken(backdrop: f32, source: f32) -> f32 {
	backdrop.min(source)
}

#[inline(always)]
pub fn blend_lighten(backdrop: f32, source: f32) -> f32 {
	backdrop.max(source)
}

pub fn blend_color_dodge(backdrop: f32, source: f32) -> f32 {
	if backdrop == 0. {
		0.
	} else if source >= 1. {
		1.
	} else {
		(backdrop / (1. - source)).min(1.)
	}
}

pub fn blend_color_burn(backdrop: f32, source: f32) -> f32 {
	if backdrop >= 1. {
		1.
	} else if source == 0. {
		0.
	} else {
		1. - ((1. - backdrop) / source).min(1.)
	}
}

#[inline(always)]
pub fn blend_linear_dodge(backdrop: f32, source: f32) -> f32 {
	(backdrop + source).min(1.)
}

#[inline(always)]
pub fn blend_linear_burn(backdrop: f32, source: f32) -> f32 {
	(backdrop + source - 1.).max(0.)
}

pub fn blend_hard_light(backdrop: f32, source: f32) -> f32 {
	if source <= 0.5 {
		blend_multiply(backdrop, 2. * source)
	} else {
		blend_screen(backdrop, 2. * source - 1.)
	}
}

/// Hard light with the roles of both layers swapped.
pub fn blend_overlay(backdrop: f32, source: f32) -> f32 {
	blend_hard_light(source, backdrop)
}

pub fn blend_soft_light(backdrop: f32, source: f32) -> f32 {
	if source <= 0.5 {
		2. * backdrop * source + backdrop * backdrop * (1. - 2. * source)
	} else {
		2. * backdrop * (1. - source) + backdrop.sqrt() * (2. * source - 1.)
	}
}

pub fn blend_vivid_light(backdrop: f32, source: f32) -> f32 {
	if source <= 0.5 {
		blend_color_burn(backdrop, 2. * source)
	} else {
		blend_color_dodge(backdrop, 2. * (source - 0.5))
	}
}

pub fn blend_linear_light(backdrop: f32, source: f32) -> f32 {
	(backdrop + 2. * source - 1.).clamp(0., 1.)
}

pub fn blend_pin_light(backdrop: f32, source: f32) -> f32 {
	if source <= 0.5 { backdrop.min(2. * source) } else { backdrop.max(2. * source - 1.) }
}

pub fn blend_hard_mix(backdrop: f32, source: f32) -> f32 {
	if backdrop + source >= 1. { 1. } else { 0. }
}

#[inline(always)]
pub fn blend_difference(backdrop: f32, source: f32) -> f32 {
	(backdrop - source).abs()
}

#[inline(always)]
pub fn blend_exclusion(backdrop: f32, source: f32) -> f32 {
	backdrop + source - 2. * backdrop * source
}

#[inline(always)]
pub fn blend_subtract(backdrop: f32, source: f32) -> f32 {
	(backdrop - source).max(0.)
}

pub fn blend_divide(backdrop: f32, source: f32) -> f32 {
	if source == 0. {
		if backdrop == 0. { 0. } else { 1. }
	} else {
		(backdrop / source).min(1.)
	}
}

fn blend_rgb(backdrop: Color, source: Color, blend_fn: impl Fn(f32, f32) -> f32) -> [f32; 3] {
	[blend_fn(backdrop.r(), source.r()), blend_fn(backdrop.g(), source.g()), blend_fn(backdrop.b(), source.b())]
}

/// Returns the mixed color `B(Cb, Cs)` of the blend mode, before any alpha compositing.
pub fn apply_blend_mode(source: Color, backdrop: Color, blend_mode: BlendMode) -> [f32; 3] {
	match blend_mode {
		// Normal group
		BlendMode::Normal | BlendMode::Dissolve | BlendMode::PassThrough => source.rgb(),
		// Darken group
		BlendMode::Darken => blend_rgb(backdrop, source, blend_darken),
		BlendMode::Multiply => blend_rgb(backdrop, source, blend_multiply),
		BlendMode::ColorBurn => blend_rgb(backdrop, source, blend_color_burn),
		BlendMode::LinearBurn => blend_rgb(backdrop, source, blend_linear_burn),
		BlendMode::DarkerColor => {
			if source.luminosity() < backdrop.luminosity() {
				source.rgb()
			} else {
				backdrop.rgb()
			}
		}
		// Lighten group
		BlendMode::Lighten => blend_rgb(backdrop, source, blend_lighten),
		BlendMode::Screen => blend_rgb(backdrop, source, blend_screen),
		BlendMode::ColorDodge => blend_rgb(backdrop, source, blend_color_dodge),
		BlendMode::LinearDodge => blend_rgb(backdrop, source, blend_linear_dodge),
		BlendMode::LighterColor => {
			if source.luminosity() > backdrop.luminosity() {
				source.rgb()
			} else {
				backdrop.rgb()
			}
		}
		// Contrast group
		BlendMode::Overlay => blend_rgb(backdrop, source, blend_overlay),
		BlendMode::SoftLight => blend_rgb(backdrop, source, blend_soft_light),
		BlendMode::HardLight => blend_rgb(backdrop, source, blend_hard_light),
		BlendMode::VividLight => blend_rgb(backdrop, source, blend_vivid_light),
		BlendMode::LinearLight => blend_rgb(backdrop, source, blend_linear_light),
		BlendMode::PinLight => blend_rgb(backdrop, source, blend_pin_light),
		BlendMode::HardMix => blend_rgb(backdrop, source, blend_hard_mix),
		// Inversion group
		BlendMode::Difference => blend_rgb(backdrop, source, blend_difference),
		BlendMode::Exclusion => blend_rgb(backdrop, source, blend_exclusion),
		BlendMode::Subtract => blend_rgb(backdrop, source, blend_subtract),
		BlendMode::Divide => blend_rgb(backdrop, source, blend_divide),
		// Component group
		BlendMode::Hue => source.with_saturation(backdrop.saturation()).with_luminosity(backdrop.luminosity()).rgb(),
		BlendMode::Saturation => backdrop.with_saturation(source.saturation()).with_luminosity(backdrop.luminosity()).rgb(),
		BlendMode::Color => source.with_luminosity(backdrop.luminosity()).rgb(),
		BlendMode::Luminosity => backdrop.with_luminosity(source.luminosity()).rgb(),
	}
}

/// Composites `source` over `backdrop`, mixing their overlap with `blend_mode`.
///
/// `opacity` scales the source alpha. With straight inputs, the result is
/// `αr = αs + αb − αs·αb` and `Cr = ((1 − αs)·αb·Cb + αs·(1 − αb)·Cs + αs·αb·B(Cb, Cs)) / αr`.
#[inline(always)]
pub fn blend_colors(source: Color, backdrop: Color, blend_mode: BlendMode, opacity: f32) -> Color {
	let source_alpha = (source.a() * opacity).clamp(0., 1.);
	if source_alpha <= 0. {
		return backdrop;
	}
	let backdrop_alpha = backdrop.a();
	let result_alpha = source_alpha + backdrop_alpha - source_alpha * backdrop_alpha;
	if result_alpha <= 0. {
		return Color::TRANSPARENT;
	}

	let mixed = apply_blend_mode(source, backdrop, blend_mode);
	let backdrop_weight = (1. - source_alpha) * backdrop_alpha;
	let source_weight = source_alpha * (1. - backdrop_alpha);
	let mixed_weight = source_alpha * backdrop_alpha;
	let channel = |index: usize| ((backdrop_weight * backdrop.rgb()[index] + source_weight * source.rgb()[index] + mixed_weight * mixed[index]) / result_alpha).clamp(0., 1.);

	Color::from_rgbaf32_unchecked(channel(0), channel(1), channel(2), result_alpha)
}
