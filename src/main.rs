use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use itertools::Itertools;
use log::{info, trace, warn};

use procmat::io::common::loader::{DeviceTextureHandle, HostServices, TextureFlags};
use procmat::io::descriptors::XmlDescriptorCodec;
use procmat::io::fs::loader::FsHost;
use procmat::material::MaterialKey;
use procmat::rendering::worker::renderer::WorkerRenderer;
use procmat::settings::{CliArgs, OperationMode, SystemConfig};
use procmat::system::{MaterialSystem, RenderNotification};
use procmat::util::with_extension;

const DUMP_EXTENSION: &str = "raw";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    trace!("Starting with args: {:?}", args);

    let host = Arc::new(FsHost::new(&args.data_dir));
    let renderer = Arc::new(WorkerRenderer::new().context("Failed to start the renderer thread")?);
    let mut system = MaterialSystem::new(
        host.clone(),
        Box::new(XmlDescriptorCodec),
        renderer,
        SystemConfig::from(&args.system),
    );
    let notifications = system.subscribe();

    match &args.operation_mode {
        OperationMode::Render { materials } => {
            for path in materials {
                let material = system.load(path).with_context(|| format!("Failed to load {}", path))?;
                dump_textures(&mut system, host.as_ref(), material);
            }
        }
        OperationMode::Inspect { material } => {
            let material = system
                .load(material)
                .with_context(|| format!("Failed to load {}", material))?;
            inspect(&system, material);
        }
        OperationMode::Set {
            material: path,
            input,
            value,
            graph,
        } => {
            let material = system.load(path).with_context(|| format!("Failed to load {}", path))?;
            let id = system.material(material).map(|material| material.id()).unwrap_or_default();
            let Some(graph) = system.resolve_graph(system.encode_graph_instance_id(id, *graph)) else {
                bail!("{} has no graph {}", path, graph);
            };

            let changed = system
                .graph_mut(graph)
                .is_some_and(|mut view| view.set_value_text(input, value));
            if !changed {
                bail!("{} is not an input accepting \"{}\"", input, value);
            }

            system.queue_render_graph(graph);
            let uid = system.render_async(false);
            while !system.has_render_completed(uid) {
                std::thread::sleep(Duration::from_millis(5));
                system.update();
            }

            if !system.save(material, path) {
                bail!("Failed to save {}", path);
            }
            dump_textures(&mut system, host.as_ref(), material);
        }
        OperationMode::Reimport { material: path } => {
            let material = system.load(path).with_context(|| format!("Failed to load {}", path))?;
            system
                .reimport(material)
                .with_context(|| format!("Failed to reimport {}", path))?;
        }
    }

    system.shutdown();
    for notification in notifications.try_iter() {
        let RenderNotification::RenderFinished(uid) = notification;
        trace!("Batch {} finished", uid);
    }
    Ok(())
}

/// Writes the pixels of every texture next to its sidecar.
fn dump_textures(system: &mut MaterialSystem, host: &dyn HostServices, material: MaterialKey) {
    let paths = system
        .material(material)
        .map(|material| material.textures().to_vec())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|texture| system.texture(texture).map(|texture| texture.path().to_string()))
        .collect_vec();

    for (index, path) in paths.iter().enumerate() {
        let device_texture = DeviceTextureHandle(index as u64 + 1);
        match system.load_texture_data(path, TextureFlags::NONE, Some(device_texture)) {
            Some(data) => {
                let target = with_extension(path, DUMP_EXTENSION);
                if host.write_file(&target, &data.data) {
                    info!(
                        "{}: {}x{} {:?}, {} mip(s), {} bytes",
                        target,
                        data.width,
                        data.height,
                        data.format,
                        data.num_mips,
                        data.data.len()
                    );
                }
            }
            None => warn!("{}: nothing rendered", path),
        }
    }
}

fn inspect(system: &MaterialSystem, material: MaterialKey) {
    let Some(owner) = system.material(material) else {
        return;
    };

    println!("{} ({}), source {}", owner.path(), owner.id(), owner.source());
    for graph in owner.graphs().iter().filter_map(|graph| system.graph(*graph)) {
        println!("  graph {} \"{}\" [{}] {}", graph.index(), graph.label(), graph.id(), graph.url());
        for input in graph.inputs() {
            let marker = if input.is_default() { "" } else { " *" };
            println!(
                "    input {} {:?} = {}{}",
                input.identifier(),
                input.input_type(),
                input.value(),
                marker
            );
        }
        for output in graph.outputs() {
            let (width, height) = output.size();
            println!(
                "    output {} {:?} {:?} {}x{} {}",
                output.identifier(),
                output.channel(),
                output.format(),
                width,
                height,
                [
                    output.path().unwrap_or("preview"),
                    if output.is_enabled() { "enabled" } else { "disabled" },
                ]
                .iter()
                .join(", ")
            );
        }
    }
}
