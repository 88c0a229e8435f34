use core::fmt;
use serde::{Deserialize, Serialize};

/// Adjustment carried by an adjustment layer. Its settings stay in the tagged block; adjustments are not applied when compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjustmentKind {
	BrightnessContrast,
	Levels,
	Curves,
	Exposure,
	Vibrance,
	HueSaturation,
	HueSaturationV4,
	ColorBalance,
	BlackAndWhite,
	PhotoFilter,
	ChannelMixer,
	ColorLookup,
	Invert,
	Posterize,
	Threshold,
	GradientMap,
	SelectiveColor,
}

impl AdjustmentKind {
	pub fn from_key(key: &[u8; 4]) -> Option<AdjustmentKind> {
		use AdjustmentKind::*;
		Some(match key {
			b"brit" => BrightnessContrast,
			b"levl" => Levels,
			b"curv" => Curves,
			b"expA" => Exposure,
			b"vibA" => Vibrance,
			b"hue2" => HueSaturation,
			b"hue " => HueSaturationV4,
			b"blnc" => ColorBalance,
			b"blwh" => BlackAndWhite,
			b"phfl" => PhotoFilter,
			b"mixr" => ChannelMixer,
			b"clrL" => ColorLookup,
			b"nvrt" => Invert,
			b"post" => Posterize,
			b"thrs" => Threshold,
			b"grdm" => GradientMap,
			b"selc" => SelectiveColor,
			_ => return None,
		})
	}

	pub fn key(&self) -> &'static [u8; 4] {
		match self {
			AdjustmentKind::BrightnessContrast => b"brit",
			AdjustmentKind::Levels => b"levl",
			AdjustmentKind::Curves => b"curv",
			AdjustmentKind::Exposure => b"expA",
			AdjustmentKind::Vibrance => b"vibA",
			AdjustmentKind::HueSaturation => b"hue2",
			AdjustmentKind::HueSaturationV4 => b"hue ",
			AdjustmentKind::ColorBalance => b"blnc",
			AdjustmentKind::BlackAndWhite => b"blwh",
			AdjustmentKind::PhotoFilter => b"phfl",
			AdjustmentKind::ChannelMixer => b"mixr",
			AdjustmentKind::ColorLookup => b"clrL",
			AdjustmentKind::Invert => b"nvrt",
			AdjustmentKind::Posterize => b"post",
			AdjustmentKind::Threshold => b"thrs",
			AdjustmentKind::GradientMap => b"grdm",
			AdjustmentKind::SelectiveColor => b"selc",
		}
	}

	pub fn all() -> [AdjustmentKind; 17] {
		use AdjustmentKind::*;
		[
			BrightnessContrast,
			Levels,
			Curves,
			Exposure,
			Vibrance,
			HueSaturation,
			HueSaturationV4,
			ColorBalance,
			BlackAndWhite,
			PhotoFilter,
			ChannelMixer,
			ColorLookup,
			Invert,
			Posterize,
			Threshold,
			GradientMap,
			SelectiveColor,
		]
	}
}

impl fmt::Display for AdjustmentKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			AdjustmentKind::BrightnessContrast => "Brightness/Contrast",
			AdjustmentKind::Levels => "Levels",
			AdjustmentKind::Curves => "Curves",
			AdjustmentKind::Exposure => "Exposure",
			AdjustmentKind::Vibrance => "Vibrance",
			AdjustmentKind::HueSaturation | AdjustmentKind::HueSaturationV4 => "Hue/Saturation",
			AdjustmentKind::ColorBalance => "Color Balance",
			AdjustmentKind::BlackAndWhite => "Black & White",
			AdjustmentKind::PhotoFilter => "Photo Filter",
			AdjustmentKind::ChannelMixer => "Channel Mixer",
			AdjustmentKind::ColorLookup => "Color Lookup",
			AdjustmentKind::Invert => "Invert",
			AdjustmentKind::Posterize => "Posterize",
			AdjustmentKind::Threshold => "Threshold",
			AdjustmentKind::GradientMap => "Gradient Map",
			AdjustmentKind::SelectiveColor => "Selective Color",
		};
		write!(f, "{name}")
	}
}
