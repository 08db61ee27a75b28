mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{BRICKS_MATERIAL, BRICKS_PACKAGE, texture_of};
use procmat::io::common::loader::{DeviceTextureHandle, TextureFlags};
use procmat::io::descriptors::XmlDescriptorCodec;
use procmat::io::fs::loader::FsHost;
use procmat::material::GraphKey;
use procmat::material::value::GraphValue;
use procmat::rendering::worker::renderer::WorkerRenderer;
use procmat::settings::SystemConfig;
use procmat::system::MaterialSystem;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("procmat-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("materials")).unwrap();
    dir
}

fn worker_system(dir: &Path) -> (Arc<FsHost>, MaterialSystem) {
    std::fs::write(dir.join("materials/bricks.pkg"), BRICKS_PACKAGE).unwrap();
    std::fs::write(dir.join("materials/bricks.smtl"), BRICKS_MATERIAL).unwrap();

    let host = Arc::new(FsHost::new(dir.to_str().unwrap()));
    let renderer = Arc::new(WorkerRenderer::new().unwrap());
    let system = MaterialSystem::new(
        host.clone(),
        Box::new(XmlDescriptorCodec),
        renderer,
        SystemConfig::default(),
    );
    (host, system)
}

fn set_mortar(system: &mut MaterialSystem, graph: GraphKey, value: f32) {
    assert!(
        system
            .graph_mut(graph)
            .unwrap()
            .set_value("mortar", GraphValue::Float1(value))
    );
}

#[test_log::test]
fn renders_on_the_worker_thread_end_to_end() {
    let dir = scratch_dir("worker");
    let (host, mut system) = worker_system(&dir);

    let material = system.load("materials/bricks.smtl").unwrap();
    let graph = system.material(material).unwrap().graphs()[0];
    let basecolor = texture_of(&system, graph, 10);

    let device = DeviceTextureHandle(42);
    let initial = system
        .load_texture_data("materials/bricks_diff.sub", TextureFlags::NONE, Some(device))
        .unwrap();
    assert_eq!(initial.data.len(), 16 * 16 * 4);

    set_mortar(&mut system, graph, 0.5);
    system.queue_render_graph(graph);
    let uid = system.render_async(false);
    assert!(uid.is_valid());

    let deadline = Instant::now() + Duration::from_secs(10);
    while !system.has_render_completed(uid) {
        assert!(Instant::now() < deadline, "batch {} never finished", uid);
        std::thread::sleep(Duration::from_millis(1));
        system.update();
    }

    assert_eq!(host.device_texture_state(device).map(|state| state.reloads), Some(1));
    let updated = system.populate_texture_load_data(basecolor, Some(device)).unwrap();
    assert_ne!(updated.data, initial.data);

    assert!(system.save(material, "materials/bricks.smtl"));
    assert!(dir.join("materials/bricks_ddna.sub").exists());
    let saved = std::fs::read_to_string(dir.join("materials/bricks.smtl")).unwrap();
    assert!(saved.contains("mortar"));

    system.shutdown();
    assert_eq!(host.device_texture_state(device), None);
    let _ = std::fs::remove_dir_all(dir);
}

#[test_log::test]
fn fenced_graphs_render_again_on_the_next_async_dispatch() {
    let dir = scratch_dir("fence");
    let (_host, mut system) = worker_system(&dir);

    let material = system.load("materials/bricks.smtl").unwrap();
    let graph = system.material(material).unwrap().graphs()[0];
    let basecolor = texture_of(&system, graph, 10);

    let mut batches = Vec::new();
    for value in [0.3, 0.5, 0.7] {
        set_mortar(&mut system, graph, value);
        system.queue_render_graph(graph);
        let uid = system.render_async(true);
        assert!(uid.is_valid());
        batches.push(uid);
    }

    system.render_fence();
    assert!(batches.iter().all(|uid| system.has_render_completed(*uid)));
    system.update();
    let fenced = system.populate_texture_load_data(basecolor, None).unwrap();

    set_mortar(&mut system, graph, 0.9);
    system.queue_render_graph(graph);
    let next = system.render_async(false);
    assert!(next.is_valid());
    assert!(!batches.contains(&next));
    assert!(system.queued_graphs().is_empty());

    system.render_fence();
    system.update();
    assert!(system.has_render_completed(next));
    let rendered = system.populate_texture_load_data(basecolor, None).unwrap();
    assert_ne!(rendered.data, fenced.data);

    system.shutdown();
    let _ = std::fs::remove_dir_all(dir);
}
