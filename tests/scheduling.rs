mod common;

use common::{Fixture, load_bricks, rendered_text, texture_of};
use procmat::material::GraphKey;
use procmat::material::value::GraphValue;
use procmat::system::RenderNotification;
use procmat::util::ids::{GraphInstanceId, MaterialId, RenderUid};
use procmat_descriptors::format::PixelFormat;

fn set_mortar(fixture: &mut Fixture, graph: GraphKey, value: f32) {
    assert!(
        fixture
            .system
            .graph_mut(graph)
            .unwrap()
            .set_value("mortar", GraphValue::Float1(value))
    );
}

#[test_log::test]
fn sync_render_result_is_taken_once() {
    let mut fixture = Fixture::plain();
    let (_, graph) = load_bricks(&mut fixture.system);
    let basecolor = texture_of(&fixture.system, graph, 10);
    fixture.system.take_result(basecolor);

    set_mortar(&mut fixture, graph, 0.5);
    assert!(fixture.system.queue_render_graph(graph));
    let uid = fixture.system.render_sync();

    assert!(uid.is_valid());
    assert!(fixture.system.has_render_completed(uid));
    let result = fixture.system.take_result(basecolor).unwrap();
    assert!(!result.data.is_empty());
    assert!(fixture.system.take_result(basecolor).is_none());
}

#[test_log::test]
fn enqueue_is_idempotent() {
    let mut fixture = Fixture::plain();
    let (material, graph) = load_bricks(&mut fixture.system);

    assert!(fixture.system.queue_render_graph(graph));
    assert!(!fixture.system.queue_render_graph(graph));
    assert!(!fixture.system.queue_render_material(material));
    assert_eq!(fixture.system.queued_graphs(), &[graph]);
}

#[test_log::test]
fn rendering_with_an_empty_queue_dispatches_nothing() {
    let mut fixture = Fixture::plain();
    load_bricks(&mut fixture.system);
    let batches = fixture.renderer.submitted().len();

    assert_eq!(fixture.system.render_async(true), RenderUid::INVALID);
    assert_eq!(fixture.system.render_sync(), RenderUid::INVALID);
    assert_eq!(fixture.renderer.submitted().len(), batches);
}

#[test_log::test]
fn rapid_async_edits_collapse_into_one_more_batch() {
    let mut fixture = Fixture::plain();
    let (_, graph) = load_bricks(&mut fixture.system);
    let basecolor = texture_of(&fixture.system, graph, 10);
    let batches = fixture.renderer.submitted().len();

    set_mortar(&mut fixture, graph, 0.5);
    fixture.system.queue_render_graph(graph);
    let first = fixture.system.render_async(false);
    assert!(first.is_valid());

    set_mortar(&mut fixture, graph, 0.75);
    fixture.system.queue_render_graph(graph);
    assert_eq!(fixture.system.render_async(false), RenderUid::INVALID);
    assert_eq!(fixture.system.queued_graphs(), &[graph]);

    fixture.renderer.complete(first);
    fixture.system.update();
    assert!(fixture.system.has_render_completed(first));

    let second = fixture.system.render_async(false);
    assert!(second.is_valid());
    assert_ne!(first, second);
    fixture.renderer.complete(second);
    fixture.system.update();

    assert_eq!(fixture.renderer.submitted().len(), batches + 2);
    let result = fixture.system.take_result(basecolor).unwrap();
    assert!(rendered_text(&result).starts_with("0.75;"));
}

#[test_log::test]
fn forced_async_render_submits_graphs_still_rendering() {
    let mut fixture = Fixture::plain();
    let (_, graph) = load_bricks(&mut fixture.system);

    set_mortar(&mut fixture, graph, 0.5);
    fixture.system.queue_render_graph(graph);
    let first = fixture.system.render_async(false);

    set_mortar(&mut fixture, graph, 0.75);
    fixture.system.queue_render_graph(graph);
    let forced = fixture.system.render_async(true);

    assert!(forced.is_valid());
    assert_ne!(first, forced);
    assert!(fixture.system.queued_graphs().is_empty());
    assert!(!fixture.system.has_render_completed(first));
    assert!(!fixture.system.has_render_completed(forced));
}

#[test_log::test]
fn removing_a_material_drops_its_pending_outputs() {
    let mut fixture = Fixture::plain();
    let (material, graph) = load_bricks(&mut fixture.system);
    let basecolor = texture_of(&fixture.system, graph, 10);
    let notifications = fixture.system.subscribe();

    set_mortar(&mut fixture, graph, 0.5);
    fixture.system.queue_render_graph(graph);
    let uid = fixture.system.render_async(false);
    fixture.system.queue_render_graph(graph);

    assert!(fixture.system.remove(material));
    assert!(fixture.system.queued_graphs().is_empty());
    assert!(fixture.system.graph(graph).is_none());
    assert!(fixture.system.find_material("materials/bricks.smtl").is_none());

    fixture.renderer.complete(uid);
    fixture.system.update();

    assert!(fixture.system.has_render_completed(uid));
    assert!(fixture.system.take_result(basecolor).is_none());
    assert_eq!(notifications.try_recv(), Ok(RenderNotification::RenderFinished(uid)));
}

#[test_log::test]
fn fence_waits_for_outstanding_batches() {
    let mut fixture = Fixture::plain();
    let (_, graph) = load_bricks(&mut fixture.system);
    let basecolor = texture_of(&fixture.system, graph, 10);
    fixture.system.take_result(basecolor);

    set_mortar(&mut fixture, graph, 0.5);
    fixture.system.queue_render_graph(graph);
    let uid = fixture.system.render_async(false);
    assert!(!fixture.system.has_render_completed(uid));

    fixture.system.render_fence();
    assert!(fixture.system.has_render_completed(uid));

    fixture.system.update();
    assert!(fixture.system.take_result(basecolor).is_some());

    set_mortar(&mut fixture, graph, 0.75);
    fixture.system.queue_render_graph(graph);
    let next = fixture.system.render_async(false);
    assert!(next.is_valid());
    assert_ne!(next, uid);
    assert!(fixture.system.queued_graphs().is_empty());
}

#[test_log::test]
fn finished_batches_are_announced_once() {
    let mut fixture = Fixture::plain();
    let (_, graph) = load_bricks(&mut fixture.system);
    let notifications = fixture.system.subscribe();

    fixture.system.queue_render_graph(graph);
    let uid = fixture.system.render_sync();
    fixture.system.update();

    assert_eq!(notifications.try_iter().collect::<Vec<_>>(), vec![RenderNotification::RenderFinished(uid)]);
}

#[test_log::test]
fn graph_instance_ids_resolve_while_the_material_lives() {
    let mut fixture = Fixture::plain();
    let (material, graph) = load_bricks(&mut fixture.system);
    let id = fixture.system.material(material).unwrap().id();
    assert_eq!(id, MaterialId(1));

    let encoded = fixture.system.encode_graph_instance_id(id, 0);
    assert_eq!(encoded, GraphInstanceId(0x0001_0000));
    assert_eq!(encoded.decode(), (id, 0));
    assert_eq!(fixture.system.graph_instance_id(graph), encoded);
    assert_eq!(fixture.system.resolve_graph(encoded), Some(graph));

    assert_eq!(fixture.system.encode_graph_instance_id(id, 1), GraphInstanceId::INVALID);
    assert_eq!(fixture.system.encode_graph_instance_id(MaterialId(9), 0), GraphInstanceId::INVALID);

    fixture.system.remove(material);
    assert_eq!(fixture.system.resolve_graph(encoded), None);
    assert!(!fixture.system.queue_render_id(encoded));
}

#[test_log::test]
fn signed_normal_maps_are_converted() {
    let mut fixture = Fixture::new(Default::default());
    fixture.host.insert(
        "materials/bricks.smtl",
        r#"<ProceduralMaterial source="materials/bricks.pkg"><Output uid="11" compressed="true"/></ProceduralMaterial>"#,
    );
    let (_, graph) = load_bricks(&mut fixture.system);
    let normal = texture_of(&fixture.system, graph, 11);
    let basecolor = texture_of(&fixture.system, graph, 10);

    let view = fixture.system.graph(graph).unwrap();
    assert_eq!(view.output(11).unwrap().format(), PixelFormat::Bc5);
    assert_eq!(view.output(10).unwrap().format(), PixelFormat::Rgba8);

    let normal = fixture.system.take_result(normal).unwrap();
    let basecolor = fixture.system.take_result(basecolor).unwrap();
    assert_eq!(normal.data.len(), 256);
    assert_eq!(rendered_text(&basecolor), "0.25;4,8;");
    assert_ne!(rendered_text(&normal), "0.25;4,8;");
}
