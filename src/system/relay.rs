use std::sync::{Mutex, MutexGuard};

use log::{debug, trace};

use crate::material::GraphKey;
use crate::material::graph::OutputKind;
use crate::rendering::backend::{RenderCallbacks, RenderMode};
use crate::rendering::common::texture_format::fix_signed_normal_map;
use crate::rendering::common::types::RenderResult;
use crate::system::MaterialSystem;
use crate::util::ids::RenderUid;

/// One computed output, staged until the owning thread picks it up.
#[derive(Debug)]
pub struct CompletedOutput {
    pub uid: RenderUid,
    pub mode: RenderMode,
    pub graph: GraphKey,
    pub output_index: usize,
    pub result: RenderResult,
}

/// Hands computed outputs from the renderer's threads to the owning thread. The lock is only
/// held for appending and draining.
#[derive(Debug, Default)]
pub struct Mailbox {
    messages: Mutex<Vec<CompletedOutput>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CompletedOutput>> {
        self.messages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn post(&self, message: CompletedOutput) {
        self.lock().push(message);
    }

    /// Everything posted so far, in posting order.
    pub fn drain(&self) -> Vec<CompletedOutput> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl RenderCallbacks for Mailbox {
    fn output_computed(&self, uid: RenderUid, mode: RenderMode, graph: GraphKey, output_index: usize, result: RenderResult) {
        self.post(CompletedOutput {
            uid,
            mode,
            graph,
            output_index,
            result,
        });
    }
}

impl MaterialSystem {
    pub(crate) fn process_completed(&mut self, message: CompletedOutput) {
        let Some(graph) = self.graphs.get(message.graph) else {
            debug!(
                "Dropping output {} of batch {}: the graph is gone",
                message.output_index, message.uid
            );
            return;
        };

        let Some(output) = graph.outputs.get(message.output_index) else {
            debug!(
                "Dropping output {} of batch {}: the graph has no such output",
                message.output_index, message.uid
            );
            return;
        };

        let mut result = message.result;
        if self.config.signed_normal_maps {
            fix_signed_normal_map(&mut result);
        }

        match output.kind {
            OutputKind::Static(texture) => {
                trace!("Batch {}: caching {:?} for {}", message.uid, result, output.identifier);
                self.results.store(texture, result);
                if message.mode == RenderMode::Normal && !self.uploads.contains(&texture) {
                    self.uploads.push(texture);
                }
            }
            OutputKind::Dynamic(slot) => {
                let mirrored = graph
                    .output_index_by_uid(slot.mirrors)
                    .and_then(|index| graph.outputs[index].texture());

                match mirrored.and_then(|texture| self.textures.get_mut(texture)) {
                    Some(texture) => texture.preview = Some(result),
                    None => debug!("Preview of output {} has no texture to land on", slot.mirrors),
                }
            }
        }
    }

    /// Asks the host to reload every device texture with a fresh result.
    pub(crate) fn reload_uploads(&mut self) {
        for texture in std::mem::take(&mut self.uploads) {
            let Some(device_texture) = self.textures.get(texture).and_then(|texture| texture.device_texture) else {
                continue;
            };
            self.host.reload_device_texture(device_texture);
        }
    }
}
