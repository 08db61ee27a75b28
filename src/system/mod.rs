//! The owner of all procedural materials.
//!
//! Every mutation happens on the thread owning the [`MaterialSystem`]. Renderer threads only ever
//! touch the [`relay::Mailbox`], which [`MaterialSystem::update`] drains.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use log::{debug, error, trace, warn};
use slotmap::SlotMap;

use crate::io::common::loader::{HostServices, TextureLoadData};
use crate::io::descriptors::DescriptorCodec;
use crate::material::graph::GraphInstance;
use crate::material::texture::ProceduralTexture;
use crate::material::views::{GraphView, GraphViewMut};
use crate::material::{GraphKey, MaterialKey, ProceduralMaterial, TextureKey};
use crate::rendering::backend::{RenderBackend, RenderMode, RenderOptions, RunMode};
use crate::rendering::common::texture_format::from_engine_format;
use crate::rendering::common::types::RenderResult;
use crate::settings::SystemConfig;
use crate::system::registry::MaterialRegistry;
use crate::system::relay::Mailbox;
use crate::system::result_cache::ResultCache;
use crate::system::scheduler::RenderScheduler;
use crate::util::ids::{GraphInstanceId, MaterialId, RenderUid};

pub mod lifecycle;
pub mod registry;
pub mod reimport;
pub mod relay;
pub mod result_cache;
pub mod scheduler;
pub mod upload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderNotification {
    /// The renderer is done with the batch and every output of it has been processed.
    RenderFinished(RenderUid),
}

pub struct MaterialSystem {
    host: Arc<dyn HostServices>,
    codec: Box<dyn DescriptorCodec>,
    renderer: Arc<dyn RenderBackend>,
    config: SystemConfig,
    materials: SlotMap<MaterialKey, ProceduralMaterial>,
    graphs: SlotMap<GraphKey, GraphInstance>,
    textures: SlotMap<TextureKey, ProceduralTexture>,
    registry: MaterialRegistry,
    scheduler: RenderScheduler,
    mailbox: Arc<Mailbox>,
    results: ResultCache,
    /// Textures with a fresh result whose device texture needs a reload.
    uploads: Vec<TextureKey>,
    /// Image inputs of the graphs about to be submitted.
    pending_images: BTreeMap<(GraphKey, u32), String>,
    listeners: Vec<Sender<RenderNotification>>,
    reset_generation: u32,
    in_simulation: bool,
    shut_down: bool,
}

impl MaterialSystem {
    pub fn new(
        host: Arc<dyn HostServices>,
        codec: Box<dyn DescriptorCodec>,
        renderer: Arc<dyn RenderBackend>,
        config: SystemConfig,
    ) -> Self {
        let mailbox = Arc::new(Mailbox::new());
        renderer.set_callbacks(mailbox.clone());
        if config.editor_mode {
            renderer.set_options(RenderOptions::UNLIMITED);
        } else {
            renderer.set_options(config.runtime_budget);
        }

        Self {
            host,
            codec,
            renderer,
            config,
            materials: SlotMap::with_key(),
            graphs: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            registry: MaterialRegistry::new(),
            scheduler: RenderScheduler::new(),
            mailbox,
            results: ResultCache::new(),
            uploads: Vec::new(),
            pending_images: BTreeMap::new(),
            listeners: Vec::new(),
            reset_generation: 0,
            in_simulation: false,
            shut_down: false,
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn material(&self, material: MaterialKey) -> Option<&ProceduralMaterial> {
        self.materials.get(material)
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialKey, &ProceduralMaterial)> {
        self.materials.iter()
    }

    pub fn find_material(&self, path: &str) -> Option<MaterialKey> {
        self.registry.find_by_path(path)
    }

    pub fn material_by_id(&self, id: MaterialId) -> Option<MaterialKey> {
        self.registry.find_by_id(id)
    }

    pub fn texture(&self, texture: TextureKey) -> Option<&ProceduralTexture> {
        self.textures.get(texture)
    }

    pub fn graph(&self, graph: GraphKey) -> Option<GraphView<'_>> {
        let instance = self.graphs.get(graph)?;
        let material = self.materials.get(instance.material)?;
        Some(GraphView {
            key: graph,
            graph: instance,
            material,
            textures: &self.textures,
        })
    }

    /// Edits mark outputs dirty, queueing the graph is up to the caller.
    pub fn graph_mut(&mut self, graph: GraphKey) -> Option<GraphViewMut<'_>> {
        let instance = self.graphs.get_mut(graph)?;
        let material = self.materials.get_mut(instance.material)?;
        Some(GraphViewMut {
            key: graph,
            graph: instance,
            material,
            profile: self.config.compression,
        })
    }

    /// `GraphInstanceId::INVALID` when the material isn't registered or has no graph `index`.
    pub fn encode_graph_instance_id(&self, material: MaterialId, index: u16) -> GraphInstanceId {
        match self
            .registry
            .find_by_id(material)
            .and_then(|key| self.materials.get(key))
        {
            Some(found) if (index as usize) < found.graph_count() => GraphInstanceId::encode(material, index),
            _ => GraphInstanceId::INVALID,
        }
    }

    pub fn graph_instance_id(&self, graph: GraphKey) -> GraphInstanceId {
        let Some(instance) = self.graphs.get(graph) else {
            return GraphInstanceId::INVALID;
        };
        match self.materials.get(instance.material) {
            Some(material) => self.encode_graph_instance_id(material.id, instance.index),
            None => GraphInstanceId::INVALID,
        }
    }

    pub fn resolve_graph(&self, id: GraphInstanceId) -> Option<GraphKey> {
        let (material_id, index) = id.decode();
        let material = self.materials.get(self.registry.find_by_id(material_id)?)?;
        material.graphs.get(index as usize).copied()
    }

    /// Returns false when the graph is unknown or already queued.
    pub fn queue_render_graph(&mut self, graph: GraphKey) -> bool {
        if !self.graphs.contains_key(graph) {
            return false;
        }
        self.scheduler.enqueue(graph)
    }

    /// Queues every graph of `material`, true when at least one was newly queued.
    pub fn queue_render_material(&mut self, material: MaterialKey) -> bool {
        let Some(material) = self.materials.get(material) else {
            return false;
        };

        let mut queued = false;
        for graph in &material.graphs {
            queued |= self.scheduler.enqueue(*graph);
        }
        queued
    }

    pub fn queue_render_id(&mut self, id: GraphInstanceId) -> bool {
        match self.resolve_graph(id) {
            Some(graph) => self.queue_render_graph(graph),
            None => false,
        }
    }

    pub fn queued_graphs(&self) -> &[GraphKey] {
        self.scheduler.queued()
    }

    pub fn render_async(&mut self, force: bool) -> RenderUid {
        self.render(RunMode::Asynchronous, force, RenderMode::Normal)
    }

    /// Renders everything queued and processes the results before returning.
    pub fn render_sync(&mut self) -> RenderUid {
        self.render_sync_with(RenderMode::Normal)
    }

    pub(crate) fn render_sync_with(&mut self, mode: RenderMode) -> RenderUid {
        let uid = self.render(RunMode::Synchronous, true, mode);
        self.update();
        uid
    }

    fn render(&mut self, run_mode: RunMode, force: bool, mode: RenderMode) -> RenderUid {
        let renderer = self.renderer.clone();
        let submit_all = force || run_mode == RunMode::Synchronous;
        let submitted: Vec<GraphKey> = self
            .scheduler
            .select(submit_all, |uid| renderer.is_pending(uid))
            .into_iter()
            .filter(|graph| self.graphs.contains_key(*graph))
            .collect();

        if submitted.is_empty() {
            return RenderUid::INVALID;
        }

        for graph in &submitted {
            if let Some(material) = self.materials.get(self.graphs[*graph].material) {
                material.add_image_inputs(*graph, &mut self.pending_images);
            }
        }
        let images = self.load_pending_images();

        for graph in &submitted {
            let instance_id = self.graph_instance_id(*graph);
            let mut job = self.graphs[*graph].build_job(*graph, instance_id);
            for input in &mut job.inputs {
                input.image = images.get(&(*graph, input.uid)).cloned();
            }
            renderer.push(job);
        }

        let uid = renderer.run(run_mode, mode);
        if !uid.is_valid() {
            error!("The renderer refused a batch of {} graph(s)", submitted.len());
            for graph in &submitted {
                self.graphs[*graph].mark_dirty();
            }
            return RenderUid::INVALID;
        }

        trace!("Submitted {} graph(s) as batch {}", submitted.len(), uid);
        self.scheduler.commit(uid, &submitted);
        uid
    }

    fn load_pending_images(&mut self) -> BTreeMap<(GraphKey, u32), TextureLoadData> {
        let pending = std::mem::take(&mut self.pending_images);
        if !self.config.render_image_inputs {
            return BTreeMap::new();
        }

        let mut images = BTreeMap::new();
        for (binding, path) in pending {
            match self.host.read_texture(&path) {
                Some(image) if from_engine_format(image.format).is_some() => {
                    images.insert(binding, image);
                }
                Some(image) => warn!("Image input {} has unsupported format {:?}", path, image.format),
                None => warn!("Failed to load image input {}", path),
            }
        }
        images
    }

    /// Unknown handles count as completed.
    pub fn has_render_completed(&self, uid: RenderUid) -> bool {
        self.scheduler.is_complete(uid)
    }

    /// Blocks until the renderer is idle and forgets every pending batch.
    pub fn render_fence(&mut self) {
        self.renderer.flush();
        self.scheduler.clear_pending();
    }

    /// Processes computed outputs and notifies about finished batches. Called once per tick.
    pub fn update(&mut self) {
        // outputs are posted before their batch stops being pending, so every batch reconciled
        // here has all of its outputs in the drain below
        let renderer = self.renderer.clone();
        let finished = self.scheduler.reconcile(|uid| renderer.is_pending(uid));

        for message in self.mailbox.drain() {
            self.process_completed(message);
        }
        self.reload_uploads();

        for uid in finished {
            debug!("Batch {} finished", uid);
            self.listeners
                .retain(|listener| listener.send(RenderNotification::RenderFinished(uid)).is_ok());
        }
    }

    pub fn subscribe(&mut self) -> Receiver<RenderNotification> {
        let (sender, receiver) = channel();
        self.listeners.push(sender);
        receiver
    }

    /// Takes the cached result of `texture` without uploading it.
    pub fn take_result(&mut self, texture: TextureKey) -> Option<RenderResult> {
        self.results.take(texture)
    }

    pub fn has_result(&self, texture: TextureKey) -> bool {
        self.results.contains(texture)
    }

    pub fn on_enter_simulation(&mut self) {
        self.in_simulation = true;
        self.on_runtime_budget_changed(true);
    }

    pub fn on_exit_simulation(&mut self) {
        self.in_simulation = false;
        self.renderer.set_options(RenderOptions::UNLIMITED);
        self.reset_all();
    }

    pub fn set_runtime_budget(&mut self, budget: RenderOptions, apply_now: bool) {
        self.config.runtime_budget = budget;
        self.on_runtime_budget_changed(apply_now);
    }

    /// The editor keeps rendering unlimited until the simulation starts.
    pub fn on_runtime_budget_changed(&mut self, apply_now: bool) {
        if self.config.editor_mode && !self.in_simulation {
            return;
        }

        self.renderer.set_options(self.config.runtime_budget);
        if apply_now {
            self.render_async(false);
        }
    }

    /// Waits for the renderer and disposes every material. Also happens on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.render_fence();
        self.mailbox.drain();

        let materials: Vec<MaterialKey> = self.materials.keys().collect();
        for material in materials {
            self.remove(material);
        }
        self.listeners.clear();
    }
}

impl Drop for MaterialSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}
