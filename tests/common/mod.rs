#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use itertools::Itertools;
use procmat::io::common::loader::{DeviceTextureHandle, HostServices, TextureLoadData};
use procmat::io::descriptors::XmlDescriptorCodec;
use procmat::material::{GraphKey, MaterialKey, TextureKey};
use procmat::rendering::backend::{RenderBackend, RenderCallbacks, RenderMode, RenderOptions, RunMode};
use procmat::rendering::common::texture_format::calc_texture_size;
use procmat::rendering::common::types::{GraphJob, RenderResult};
use procmat::settings::SystemConfig;
use procmat::system::MaterialSystem;
use procmat::util::ids::RenderUid;
use procmat_descriptors::package::PackageDesc;
use procmat_descriptors::{PackageError, deserialize_xml};

pub const BRICKS_PACKAGE: &str = r#"
<Package>
    <Graph label="Bricks" url="pkg://bricks">
        <Input uid="1" identifier="mortar" type="Float1" widget="Slider" default="0.25" min="0" max="1"/>
        <Input uid="2" identifier="tiles" type="Integer2" default="4,8"/>
        <Input uid="3" identifier="grime" type="Image" default=""/>
        <Output uid="10" identifier="basecolor" channel="BaseColor" format="Rgba8" width="16" height="16" mipmaps="1"/>
        <Output uid="11" identifier="normal" channel="Normal" format="Rgba8" width="16" height="16" mipmaps="1"/>
        <Output uid="12" identifier="glossiness" channel="Glossiness" format="L8" width="16" height="16" mipmaps="1"/>
    </Graph>
</Package>
"#;

pub const BRICKS_MATERIAL: &str = r#"<ProceduralMaterial source="materials/bricks.pkg"/>"#;

/// Host services keeping files in memory and counting device texture operations.
#[derive(Default)]
pub struct MemoryHost {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    images: Mutex<BTreeMap<String, TextureLoadData>>,
    references: Mutex<HashMap<DeviceTextureHandle, i64>>,
    reloads: Mutex<HashMap<DeviceTextureHandle, usize>>,
}

impl MemoryHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.as_bytes().to_vec());
    }

    pub fn insert_image(&self, path: &str, image: TextureLoadData) {
        self.images.lock().unwrap().insert(path.to_string(), image);
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|data| String::from_utf8_lossy(data).to_string())
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn references(&self, texture: DeviceTextureHandle) -> i64 {
        self.references
            .lock()
            .unwrap()
            .get(&texture)
            .copied()
            .unwrap_or_default()
    }

    pub fn reloads(&self, texture: DeviceTextureHandle) -> usize {
        self.reloads
            .lock()
            .unwrap()
            .get(&texture)
            .copied()
            .unwrap_or_default()
    }
}

impl HostServices for MemoryHost {
    fn read_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    fn write_file(&self, path: &str, data: &[u8]) -> bool {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        true
    }

    fn remove_file(&self, path: &str) -> bool {
        self.files.lock().unwrap().remove(path).is_some()
    }

    fn read_texture(&self, path: &str) -> Option<TextureLoadData> {
        self.images.lock().unwrap().get(path).cloned()
    }

    fn add_ref_device_texture(&self, texture: DeviceTextureHandle) {
        *self.references.lock().unwrap().entry(texture).or_default() += 1;
    }

    fn release_device_texture(&self, texture: DeviceTextureHandle) {
        *self.references.lock().unwrap().entry(texture).or_default() -= 1;
    }

    fn reload_device_texture(&self, texture: DeviceTextureHandle) {
        *self.reloads.lock().unwrap().entry(texture).or_default() += 1;
    }
}

#[derive(Default)]
struct ManualState {
    last_uid: u32,
    staged: Vec<GraphJob>,
    pending: BTreeMap<RenderUid, (RenderMode, Vec<GraphJob>)>,
    submitted: Vec<(RenderUid, Vec<GraphJob>)>,
    callbacks: Option<Arc<dyn RenderCallbacks>>,
    options: Option<RenderOptions>,
}

/// A renderer whose asynchronous batches only complete when the test says so. Every output
/// renders to the input values of its job, printed as text and zero padded to the output size.
#[derive(Default)]
pub struct ManualRenderer {
    state: Mutex<ManualState>,
}

impl ManualRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn complete(&self, uid: RenderUid) {
        let (batch, callbacks) = {
            let mut state = self.state.lock().unwrap();
            (state.pending.remove(&uid), state.callbacks.clone())
        };

        let (Some((mode, jobs)), Some(callbacks)) = (batch, callbacks) else {
            return;
        };

        for job in &jobs {
            for output in &job.outputs {
                let size = calc_texture_size(output.width, output.height, output.mipmaps, output.format);
                let mut data = job_text(job).into_bytes();
                data.resize(size.max(data.len()), 0);
                callbacks.output_computed(
                    uid,
                    mode,
                    job.graph,
                    output.index,
                    RenderResult {
                        width: output.width,
                        height: output.height,
                        mipmap_count: output.mipmaps,
                        format: output.format,
                        data,
                    },
                );
            }
        }
    }

    pub fn complete_all(&self) {
        let uids = self.state.lock().unwrap().pending.keys().copied().collect_vec();
        uids.into_iter().for_each(|uid| self.complete(uid));
    }

    pub fn submitted(&self) -> Vec<(RenderUid, Vec<GraphJob>)> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn options(&self) -> Option<RenderOptions> {
        self.state.lock().unwrap().options
    }
}

/// What a [`ManualRenderer`] renders for `job`.
pub fn job_text(job: &GraphJob) -> String {
    job.inputs.iter().map(|input| input.value.to_string()).join(";")
}

/// Reverts the zero padding of a [`ManualRenderer`] result.
pub fn rendered_text(result: &RenderResult) -> String {
    String::from_utf8_lossy(&result.data)
        .trim_end_matches('\0')
        .to_string()
}

impl RenderBackend for ManualRenderer {
    fn load_package(&self, data: &[u8]) -> Result<PackageDesc, PackageError> {
        let package: PackageDesc = deserialize_xml(data)?;
        package.validate()?;
        Ok(package)
    }

    fn set_callbacks(&self, callbacks: Arc<dyn RenderCallbacks>) {
        self.state.lock().unwrap().callbacks = Some(callbacks);
    }

    fn set_options(&self, options: RenderOptions) {
        self.state.lock().unwrap().options = Some(options);
    }

    fn push(&self, job: GraphJob) {
        self.state.lock().unwrap().staged.push(job);
    }

    fn run(&self, run_mode: RunMode, mode: RenderMode) -> RenderUid {
        let uid = {
            let mut state = self.state.lock().unwrap();
            if state.staged.is_empty() {
                return RenderUid::INVALID;
            }

            state.last_uid += 1;
            let uid = RenderUid(state.last_uid);
            let jobs = std::mem::take(&mut state.staged);
            state.submitted.push((uid, jobs.clone()));
            state.pending.insert(uid, (mode, jobs));
            uid
        };

        if run_mode == RunMode::Synchronous {
            self.complete(uid);
        }
        uid
    }

    fn is_pending(&self, uid: RenderUid) -> bool {
        self.state.lock().unwrap().pending.contains_key(&uid)
    }

    fn flush(&self) {
        self.complete_all();
    }
}

pub struct Fixture {
    pub host: Arc<MemoryHost>,
    pub renderer: Arc<ManualRenderer>,
    pub system: MaterialSystem,
}

impl Fixture {
    pub fn new(config: SystemConfig) -> Self {
        let host = MemoryHost::new();
        host.insert("materials/bricks.pkg", BRICKS_PACKAGE);
        host.insert("materials/bricks.smtl", BRICKS_MATERIAL);

        let renderer = ManualRenderer::new();
        let system = MaterialSystem::new(
            host.clone(),
            Box::new(XmlDescriptorCodec),
            renderer.clone(),
            config,
        );

        Self { host, renderer, system }
    }

    /// Uncompressed outputs and unsigned normal maps, results stay readable.
    pub fn plain() -> Self {
        Self::new(SystemConfig {
            signed_normal_maps: false,
            ..SystemConfig::default()
        })
    }
}

/// Loads `materials/bricks.smtl` and returns it with its only graph.
pub fn load_bricks(system: &mut MaterialSystem) -> (MaterialKey, GraphKey) {
    let material = system.load("materials/bricks.smtl").unwrap();
    let graph = system.material(material).unwrap().graphs()[0];
    (material, graph)
}

pub fn texture_of(system: &MaterialSystem, graph: GraphKey, output_uid: u32) -> TextureKey {
    system.graph(graph).unwrap().output(output_uid).unwrap().texture().unwrap()
}
