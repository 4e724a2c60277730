//! End-to-end frames through the render pipe.

use skein_render::skeleton::ClippingAttachment;
use skein_render::{
    Attachment, BlendMode, BufferBatcher, ClipState, Color, ContainerId, MeshAttachment, PolygonClipper,
    RegionAttachment, RenderConfig, SceneCollector, Skeleton, SkeletonRenderPipe,
    SkeletonRenderable, SlotObjectTransform, StaticPose, TextureId, TextureRegion, VertexData,
    VERTEX_STRIDE,
};

#[derive(Default)]
struct Scene {
    collected: Vec<(ContainerId, SlotObjectTransform)>,
}

impl SceneCollector for Scene {
    fn collect_renderables(&mut self, container: ContainerId, transform: &SlotObjectTransform) {
        self.collected.push((container, *transform));
    }
}

fn add_region(skeleton: &mut Skeleton, slot: &str, texture: u32, size: f32) {
    let id = skeleton.add_attachment(Attachment::Region(RegionAttachment::new(
        slot,
        TextureRegion::full(TextureId(texture)),
        size,
        size,
    )));
    skeleton.set_attachment(slot, Some(id)).unwrap();
}

fn add_clip(skeleton: &mut Skeleton, slot: &str, end_slot: Option<usize>) {
    let id = skeleton.add_attachment(Attachment::Clipping(ClippingAttachment::new(
        slot,
        VertexData::unweighted(vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0]),
        end_slot,
    )));
    skeleton.set_attachment(slot, Some(id)).unwrap();
}

fn skeleton(slots: &[&str]) -> Skeleton {
    let mut skeleton = Skeleton::new();
    skeleton.add_bone("root", None).unwrap();
    for slot in slots {
        skeleton.add_slot(slot, "root").unwrap();
    }
    skeleton
}

fn frame(
    pipe: &mut SkeletonRenderPipe<PolygonClipper>,
    renderables: &mut [&mut SkeletonRenderable<StaticPose>],
) -> BufferBatcher {
    let mut batcher = BufferBatcher::default();
    batcher.begin_frame();
    pipe.begin_frame();
    for renderable in renderables.iter_mut() {
        pipe.add_renderable(&mut **renderable, &mut batcher, &mut Scene::default());
    }
    batcher
}

fn pipe() -> SkeletonRenderPipe<PolygonClipper> {
    SkeletonRenderPipe::new(PolygonClipper::new(), &RenderConfig::default())
}

#[test]
fn test_single_region_end_to_end() {
    let config = RenderConfig::default();
    let mut first = skeleton(&["body"]);
    add_region(&mut first, "body", 0, 2.0);
    let mut second = skeleton(&["body"]);
    add_region(&mut second, "body", 0, 2.0);
    let mut a = SkeletonRenderable::new(first, StaticPose, &config);
    let mut b = SkeletonRenderable::new(second, StaticPose, &config);

    let mut pipe = pipe();
    let batcher = frame(&mut pipe, &mut [&mut a, &mut b]);

    assert_eq!(batcher.vertex_count(), 8);
    assert_eq!(batcher.attributes().len(), 8 * VERTEX_STRIDE);
    assert_eq!(batcher.indices(), &[0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
    assert_eq!(batcher.batches().len(), 1);

    let vertices = batcher.vertices();
    assert_eq!(vertices[0].position, [-1.0, -1.0]);
    assert_eq!(vertices[0].uv, [0.0, 1.0]);
    assert_eq!(vertices[2].position, [1.0, 1.0]);
    for vertex in vertices {
        assert_eq!(vertex.color, 0xFFFF_FFFF);
        assert_eq!(vertex.texture_round, 0);
    }
}

#[test]
fn test_round_pixels_from_config() {
    let config = RenderConfig::from_toml_str("round_pixels = true").unwrap();
    let mut skeleton = skeleton(&["body"]);
    add_region(&mut skeleton, "body", 0, 2.0);
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &config);

    let batcher = frame(&mut pipe(), &mut [&mut renderable]);
    assert!(batcher.vertices().iter().all(|v| v.round_pixels()));
}

#[test]
fn test_clip_region_applies_until_end_slot() {
    let mut skeleton = skeleton(&["mask", "inside", "after"]);
    add_clip(&mut skeleton, "mask", Some(1));
    add_region(&mut skeleton, "inside", 0, 20.0);
    add_region(&mut skeleton, "after", 0, 20.0);
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());

    let mut pipe = pipe();
    let batcher = frame(&mut pipe, &mut [&mut renderable]);

    let stats = pipe.stats();
    assert_eq!(stats.clipped_entries, 1);
    assert_eq!(stats.entries_submitted, 1);
    assert_eq!(pipe.coordinator().state(), ClipState::Idle);

    // The clipped quarter comes first, the untouched quad last.
    let vertices = batcher.vertices();
    let clipped = &vertices[..vertices.len() - 4];
    assert!(!clipped.is_empty());
    for vertex in clipped {
        assert!(vertex.position[0] >= -1e-4 && vertex.position[0] <= 10.0001);
        assert!(vertex.position[1] >= -1e-4 && vertex.position[1] <= 10.0001);
        assert!(vertex.uv[0] >= 0.5 - 1e-4);
    }
    assert_eq!(vertices[vertices.len() - 4].position, [-10.0, -10.0]);
}

#[test]
fn test_unmatched_clip_closes_at_walk_end() {
    let mut skeleton = skeleton(&["before", "mask", "after"]);
    add_region(&mut skeleton, "before", 0, 20.0);
    add_clip(&mut skeleton, "mask", None);
    add_region(&mut skeleton, "after", 0, 20.0);
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());

    let mut pipe = pipe();
    for _ in 0..2 {
        frame(&mut pipe, &mut [&mut renderable]);
        let stats = pipe.stats();
        assert_eq!(stats.entries_submitted, 1);
        assert_eq!(stats.clipped_entries, 1);
        assert_eq!(pipe.coordinator().state(), ClipState::Idle);
    }
}

#[test]
fn test_fully_clipped_attachment_contributes_nothing() {
    let mut skeleton = skeleton(&["mask", "far"]);
    add_clip(&mut skeleton, "mask", None);
    let mut far = RegionAttachment::new("far", TextureRegion::full(TextureId(0)), 2.0, 2.0);
    far.set_transform(-50.0, -50.0, 0.0, 1.0, 1.0);
    let far = skeleton.add_attachment(Attachment::Region(far));
    skeleton.set_attachment("far", Some(far)).unwrap();
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());

    let mut pipe = pipe();
    let batcher = frame(&mut pipe, &mut [&mut renderable]);
    assert_eq!(pipe.stats().clipped_away, 1);
    assert_eq!(batcher.vertex_count(), 0);
}

#[test]
fn test_clipper_released_after_walk() {
    let mut skeleton = skeleton(&["mask", "tinted"]);
    add_clip(&mut skeleton, "mask", None);
    add_region(&mut skeleton, "tinted", 0, 4.0);
    skeleton.slots_mut()[1].dark_color = Some(Color::new(0.2, 0.2, 0.2, 1.0));
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());

    let mut pipe = pipe();
    let batcher = frame(&mut pipe, &mut [&mut renderable]);
    assert_eq!(pipe.stats().clipped_entries, 1);
    assert!(batcher.vertex_count() >= 3);
    assert_eq!(pipe.coordinator().clipper().piece_count(), 0);
}

#[test]
fn test_cache_buffers_stable_across_frames() {
    let mut skeleton = skeleton(&["body"]);
    add_region(&mut skeleton, "body", 0, 2.0);
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());
    let mut pipe = pipe();

    frame(&mut pipe, &mut [&mut renderable]);
    let id = renderable.cache().find(0, "body").unwrap();
    let buffer = renderable.cache().entry(id).unwrap().vertices().as_ptr();

    for _ in 0..3 {
        renderable.update(0.016);
        frame(&mut pipe, &mut [&mut renderable]);
        assert_eq!(renderable.cache().find(0, "body"), Some(id));
        assert_eq!(renderable.cache().entry(id).unwrap().vertices().as_ptr(), buffer);
    }
    assert_eq!(renderable.cache().len(), 1);
}

#[test]
fn test_attachment_swap_rebuilds_registrations() {
    let mut skeleton = skeleton(&["hand"]);
    add_region(&mut skeleton, "hand", 0, 2.0);
    let sword = skeleton.add_attachment(Attachment::Region(RegionAttachment::new(
        "sword",
        TextureRegion::full(TextureId(5)),
        1.0,
        8.0,
    )));
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());
    let mut pipe = pipe();

    assert!(pipe.validate_renderable(&mut renderable));
    frame(&mut pipe, &mut [&mut renderable]);

    renderable.skeleton_mut().set_attachment("hand", Some(sword)).unwrap();
    assert!(pipe.validate_renderable(&mut renderable));
    let batcher = frame(&mut pipe, &mut [&mut renderable]);

    assert_eq!(renderable.cache().len(), 2);
    assert_eq!(batcher.batches()[0].textures, vec![TextureId(5)]);
    assert_eq!(pipe.outstanding_entries(), 2);

    pipe.destroy_renderable(renderable.id());
    assert_eq!(pipe.outstanding_entries(), 0);
}

fn cape_skeleton(tip_bone: usize) -> Skeleton {
    let mut skeleton = Skeleton::new();
    skeleton.add_bone("root", None).unwrap();
    skeleton.add_bone("tip", Some("root")).unwrap();
    skeleton.bones_mut()[1].x = 10.0;
    skeleton.add_slot("cape", "root").unwrap();

    // Vertex 0 on root, vertex 1 on tip, vertex 2 split evenly.
    let bones = vec![1, 0, 1, tip_bone, 2, 0, tip_bone];
    let vertices = vec![
        0.0, 0.0, 1.0, //
        0.0, 0.0, 1.0, //
        0.0, 4.0, 0.5, 0.0, 4.0, 0.5,
    ];
    let mesh = MeshAttachment::new(
        "cape",
        TextureRegion::full(TextureId(2)),
        VertexData::weighted(bones, vertices),
        &[0.0, 0.0, 1.0, 0.0, 0.5, 1.0],
        vec![0, 1, 2],
    );
    let id = skeleton.add_attachment(Attachment::Mesh(mesh));
    skeleton.set_attachment("cape", Some(id)).unwrap();
    skeleton
}

fn add_mesh(skeleton: &mut Skeleton, slot: &str, uvs: &[f32], triangles: Vec<u16>) {
    let id = skeleton.add_attachment(Attachment::Mesh(MeshAttachment::new(
        slot,
        TextureRegion::full(TextureId(0)),
        VertexData::unweighted(vec![1.0, 1.0, 4.0, 1.0, 1.0, 4.0]),
        uvs,
        triangles,
    )));
    skeleton.set_attachment(slot, Some(id)).unwrap();
}

#[test]
fn test_weighted_mesh_packs_all_vertices() {
    let mut skeleton = cape_skeleton(1);
    skeleton.slots_mut()[0].blend_mode = BlendMode::Additive;
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());

    let batcher = frame(&mut pipe(), &mut [&mut renderable]);
    let positions: Vec<[f32; 2]> = batcher.vertices().iter().map(|v| v.position).collect();
    assert_eq!(positions, vec![[0.0, 0.0], [10.0, 0.0], [5.0, 4.0]]);
    assert_eq!(batcher.indices(), &[0, 1, 2]);
    assert_eq!(batcher.batches()[0].blend_mode, BlendMode::Additive);
}

#[test]
fn test_partial_weighted_deform_ignored() {
    let mut skeleton = cape_skeleton(1);
    skeleton.slots_mut()[0].deform = vec![0.5, 0.5];
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());

    let batcher = frame(&mut pipe(), &mut [&mut renderable]);
    let positions: Vec<[f32; 2]> = batcher.vertices().iter().map(|v| v.position).collect();
    assert_eq!(positions, vec![[0.0, 0.0], [10.0, 0.0], [5.0, 4.0]]);
}

#[test]
fn test_unknown_weight_bone_skips_only_its_slot() {
    let mut skeleton = cape_skeleton(9);
    skeleton.add_slot("body", "root").unwrap();
    add_region(&mut skeleton, "body", 0, 2.0);
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());

    let mut pipe = pipe();
    let batcher = frame(&mut pipe, &mut [&mut renderable]);
    assert_eq!(batcher.vertex_count(), 4);
    assert_eq!(pipe.stats().entries_submitted, 1);
    let cape = renderable.cache().find(0, "cape").unwrap();
    assert!(!renderable.cache().entry(cape).unwrap().is_drawable());
}

#[test]
fn test_mesh_with_short_uvs_contributes_nothing() {
    let mut plain = skeleton(&["body", "flag"]);
    add_region(&mut plain, "body", 0, 2.0);
    add_mesh(&mut plain, "flag", &[0.0, 0.0, 1.0, 0.0], vec![0, 1, 2]);
    let mut plain = SkeletonRenderable::new(plain, StaticPose, &RenderConfig::default());

    let mut clipped = skeleton(&["mask", "flag", "body"]);
    add_clip(&mut clipped, "mask", None);
    add_mesh(&mut clipped, "flag", &[0.0, 0.0, 1.0, 0.0], vec![0, 1, 2]);
    add_region(&mut clipped, "body", 0, 2.0);
    let mut clipped = SkeletonRenderable::new(clipped, StaticPose, &RenderConfig::default());

    let mut pipe = pipe();
    let batcher = frame(&mut pipe, &mut [&mut plain]);
    assert_eq!(batcher.vertex_count(), 4);
    assert!(batcher.vertices().iter().all(|v| v.color == 0xFFFF_FFFF));

    let batcher = frame(&mut pipe, &mut [&mut clipped]);
    assert_eq!(pipe.stats().clipped_entries, 1);
    assert!(batcher.vertex_count() >= 3);
    assert_eq!(pipe.coordinator().state(), ClipState::Idle);
}

#[test]
fn test_mesh_index_past_vertices_contributes_nothing() {
    let mut skeleton = skeleton(&["mask", "flag"]);
    add_clip(&mut skeleton, "mask", None);
    add_mesh(&mut skeleton, "flag", &[0.0; 6], vec![0, 1, 5]);
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());

    let mut pipe = pipe();
    let batcher = frame(&mut pipe, &mut [&mut renderable]);
    assert_eq!(batcher.vertex_count(), 0);
    assert_eq!(pipe.stats().total_entries(), 0);
    assert!(renderable.cache().is_empty());
}

#[test]
fn test_slot_objects_follow_bones() {
    let mut skeleton = skeleton(&["body", "hand"]);
    add_region(&mut skeleton, "body", 0, 2.0);
    skeleton.bones_mut()[0].x = 7.0;
    skeleton.slots_mut()[1].color.a = 0.5;
    let mut renderable = SkeletonRenderable::new(skeleton, StaticPose, &RenderConfig::default());
    renderable.add_slot_object("hand", ContainerId(42)).unwrap();

    let mut scene = Scene::default();
    let mut batcher = BufferBatcher::default();
    pipe().add_renderable(&mut renderable, &mut batcher, &mut scene);

    assert_eq!(scene.collected.len(), 1);
    let (container, transform) = scene.collected[0];
    assert_eq!(container, ContainerId(42));
    assert_eq!(transform.x, 7.0);
    assert_eq!(transform.alpha, 0.5);
}
