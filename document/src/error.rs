use crate::layers::LayerKey;
use crate::records::{ColorMode, Compression};

use thiserror::Error;

/// A set of different errors that can occur when inspecting, restructuring, or compositing a document.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DocumentError {
	#[error("Layer names are limited to 255 UTF-16 code units, got {length}")]
	InvalidLayerName { length: usize },

	#[error("Cannot group an empty list of layers")]
	EmptyGroupingRequest,

	#[error("Artboard {0:?} has no artboard rectangle")]
	MissingArtboardGeometry(LayerKey),

	#[error("Moving {layer:?} into {target:?} would make the layer contain itself")]
	CyclicStructure { layer: LayerKey, target: LayerKey },

	#[error("Layer {0:?} does not exist in this document")]
	LayerNotFound(LayerKey),

	#[error("Layer {0:?} is not a group or artboard")]
	NotAGroup(LayerKey),

	#[error("The document root cannot be moved, deleted or regrouped")]
	RootLayer,

	#[error("Layer {0:?} is not attached to any parent")]
	Detached(LayerKey),

	#[error("Group {0:?} has no pixels of its own")]
	GroupHasNoPixels(LayerKey),

	#[error("The pass-through blend mode can only be assigned to groups, not to {0:?}")]
	PassThroughOnLayer(LayerKey),

	#[error("Malformed layer records: {0}")]
	MalformedRecords(String),

	#[error("Compositing documents in {0:?} color mode is not supported")]
	UnsupportedColorMode(ColorMode),

	#[error("Channel compression {0:?} requires an external decoder")]
	UnsupportedCompression(Compression),

	#[error("Unsupported channel bit depth {0}")]
	UnsupportedDepth(u16),

	#[error("Channel holds {actual} bytes but {expected} were expected")]
	ChannelLength { expected: usize, actual: usize },
}
