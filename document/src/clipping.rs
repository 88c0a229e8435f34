//! Clipping groups: a run of consecutive clipping layers is clipped onto the nearest non-clipping layer below it.

use crate::document::Document;
use crate::error::DocumentError;
use crate::layers::LayerKey;
use crate::records::Clipping;

impl Document {
	/// Re-derives every clip association in the document, attached or not, from sibling order and clipping flags.
	pub(crate) fn update_clipping(&mut self) {
		for node in self.layers.values_mut() {
			node.clip_layers.clear();
			node.clip_base = None;
		}

		let groups = self.layers.iter().filter(|(_, node)| node.is_group()).map(|(key, _)| key).collect::<Vec<_>>();
		for group in groups {
			let children = self.layers[group].children().to_vec();
			let mut base: Option<LayerKey> = None;
			for child in children {
				if !self.layers[child].clipping() {
					base = Some(child);
					continue;
				}
				// A clipping layer with nothing below it is drawn as a regular layer
				if let Some(base) = base {
					self.layers[base].clip_layers.push(child);
					self.layers[child].clip_base = Some(base);
				}
			}
		}
		log::trace!("Recomputed clip associations of {} layers", self.layers.len());
	}

	/// Sets or clears the clipping flag of a layer.
	pub fn set_clipping(&mut self, key: LayerKey, clipping: bool) -> Result<(), DocumentError> {
		if key == self.root() {
			return Err(DocumentError::RootLayer);
		}
		let node = self.layer_mut(key)?;
		let clipping = if clipping { Clipping::NonBase } else { Clipping::Base };
		if node.record.clipping == clipping {
			return Ok(());
		}
		node.record.clipping = clipping;
		self.update_clipping();
		Ok(())
	}

	/// Whether the layer is clipped onto a base layer. A layer flagged as clipping without a base below it is not.
	pub fn is_clipped(&self, key: LayerKey) -> Result<bool, DocumentError> {
		Ok(self.layer(key)?.clip_base.is_some())
	}
}
