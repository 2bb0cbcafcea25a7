use morphblocks::{
    ApplyBlockFactory, FfdLatticeBlockFactory, MeshSourceBlockFactory, ObjWriterBlockFactory,
    PointSourceBlockFactory, ProjectBlockFactory, RbfWarpBlockFactory, StitchBlockFactory,
    TranslateBlockFactory,
};
use morphcore::{BlockContext, BlockError, DataContainer, EventBus, TriMesh};
use morphruntime::BlockFactory;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

fn test_context(
    inputs: Vec<(&str, DataContainer)>,
    config: Vec<(&str, &str)>,
) -> BlockContext {
    let bus = EventBus::new(100);
    let block_id = Uuid::new_v4();
    let mut ctx = BlockContext::new(block_id, bus.create_emitter(Uuid::new_v4(), block_id));
    for (name, container) in inputs {
        ctx.inputs.insert(name.to_string(), container);
    }
    for (key, value) in config {
        ctx.config.insert(key.to_string(), value.to_string());
    }
    ctx
}

fn config_of(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Unit square in the xy plane, split along the diagonal.
fn unit_square() -> TriMesh {
    TriMesh::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}

fn temp_path(suffix: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("morph-test-{}{}", Uuid::new_v4(), suffix))
}

#[tokio::test]
async fn translate_emits_uniform_field() {
    let block = TranslateBlockFactory
        .create(&config_of(&[("direction", "0 0 2")]))
        .unwrap();
    let ctx = test_context(vec![("geometry", DataContainer::store(unit_square()))], vec![]);

    let output = block.execute(ctx).await.unwrap();
    let field = output.outputs["displacements"].as_coord_field().unwrap();

    assert_eq!(field.len(), 4);
    for vid in 0..4u64 {
        // Magnitude defaults to the direction's own length.
        assert_eq!(field[&vid], [0.0, 0.0, 2.0]);
    }
}

#[tokio::test]
async fn translate_magnitude_overrides_direction_length() {
    let block = TranslateBlockFactory
        .create(&config_of(&[("direction", "0 0 2"), ("magnitude", "0.5")]))
        .unwrap();
    let ctx = test_context(vec![("geometry", DataContainer::store(unit_square()))], vec![]);

    let output = block.execute(ctx).await.unwrap();
    let field = output.outputs["displacements"].as_coord_field().unwrap();
    assert_eq!(field[&0], [0.0, 0.0, 0.5]);
}

#[test]
fn translate_rejects_a_malformed_direction() {
    let err = TranslateBlockFactory
        .create(&config_of(&[("direction", "up and away")]))
        .err()
        .expect("not a coordinate triplet");
    assert!(matches!(err, BlockError::ConfigParse { ref key, .. } if key == "direction"));
}

#[tokio::test]
async fn apply_displaces_matching_vertices_only() {
    let mut field = BTreeMap::new();
    field.insert(0u64, [0.0, 0.0, 1.0]);
    field.insert(99u64, [5.0, 5.0, 5.0]);

    let block = ApplyBlockFactory.create(&HashMap::new()).unwrap();
    let ctx = test_context(
        vec![
            ("geometry", DataContainer::store(unit_square())),
            ("displacements", DataContainer::store(field)),
        ],
        vec![],
    );

    let output = block.execute(ctx).await.unwrap();
    let deformed = output.outputs["geometry"].as_mesh().unwrap();

    assert_eq!(deformed.vertices[0], [0.0, 0.0, 1.0]);
    // Vertices without a displacement key stay put; the stray key is dropped.
    assert_eq!(deformed.vertices[1], [1.0, 0.0, 0.0]);
    assert_eq!(deformed.vertex_count(), 4);
}

#[tokio::test]
async fn stitch_offsets_the_second_connectivity() {
    let block = StitchBlockFactory.create(&HashMap::new()).unwrap();
    let ctx = test_context(
        vec![
            ("geometry", DataContainer::store(unit_square())),
            ("geometry2", DataContainer::store(unit_square())),
        ],
        vec![],
    );

    let output = block.execute(ctx).await.unwrap();
    let stitched = output.outputs["geometry"].as_mesh().unwrap();

    assert_eq!(stitched.vertex_count(), 8);
    assert_eq!(stitched.triangle_count(), 4);
    assert_eq!(stitched.triangles[2], [4, 5, 6]);
    assert_eq!(stitched.triangles[3], [4, 6, 7]);
}

#[tokio::test]
async fn stitch_passes_a_lone_geometry_through() {
    let block = StitchBlockFactory.create(&HashMap::new()).unwrap();
    let ctx = test_context(vec![("geometry", DataContainer::store(unit_square()))], vec![]);

    let output = block.execute(ctx).await.unwrap();
    let mesh = output.outputs["geometry"].as_mesh().unwrap();
    assert_eq!(*mesh, unit_square());
}

#[tokio::test]
async fn ffd_blends_node_displacements_over_contained_vertices() {
    let block = FfdLatticeBlockFactory
        .create(&config_of(&[
            ("origin", "0 0 0"),
            ("span", "1 1 1"),
            ("dims", "2 2 2"),
        ]))
        .unwrap();
    let mesh = TriMesh::new(vec![[0.5, 0.5, 0.0], [3.0, 0.0, 0.0]], vec![]);
    let ctx = test_context(
        vec![
            ("geometry", DataContainer::store(mesh)),
            // All eight lattice nodes move the same way.
            ("displacements", DataContainer::store(vec![[0.0, 0.0, 1.0]; 8])),
        ],
        vec![],
    );

    let output = block.execute(ctx).await.unwrap();
    let field = output.outputs["displacements"].as_coord_field().unwrap();

    // The Bernstein weights sum to one, so a rigid node move passes through.
    assert!((field[&0][2] - 1.0).abs() < 1e-12);
    // A vertex outside the lattice box is untouched.
    assert_eq!(field[&1], [0.0, 0.0, 0.0]);
}

#[tokio::test]
async fn ffd_weights_follow_the_node_ordering() {
    let block = FfdLatticeBlockFactory
        .create(&config_of(&[("origin", "0 0 0"), ("span", "1 1 1")]))
        .unwrap();
    let mesh = TriMesh::new(vec![[0.5, 0.0, 0.0]], vec![]);
    // Only the second node (i=1, j=0, k=0 in x-fastest order) is displaced.
    let mut controls = vec![[0.0, 0.0, 0.0]; 8];
    controls[1] = [1.0, 0.0, 0.0];
    let ctx = test_context(
        vec![
            ("geometry", DataContainer::store(mesh)),
            ("displacements", DataContainer::store(controls)),
        ],
        vec![],
    );

    let output = block.execute(ctx).await.unwrap();
    let field = output.outputs["displacements"].as_coord_field().unwrap();
    // Halfway along x, on the y=0 z=0 face: weight is B1(0.5) = 0.5.
    assert!((field[&0][0] - 0.5).abs() < 1e-12);
}

#[tokio::test]
async fn ffd_defaults_to_the_bounding_box() {
    let block = FfdLatticeBlockFactory.create(&HashMap::new()).unwrap();
    let ctx = test_context(
        vec![
            ("geometry", DataContainer::store(unit_square())),
            ("displacements", DataContainer::store(vec![[0.0, 0.0, 1.0]; 8])),
        ],
        vec![],
    );

    let output = block.execute(ctx).await.unwrap();
    let field = output.outputs["displacements"].as_coord_field().unwrap();
    // The square is flat in z; the degenerate axis pins to the lattice face
    // and every vertex still sits inside the box.
    assert_eq!(field.len(), 4);
    for vid in 0..4u64 {
        assert!((field[&vid][2] - 1.0).abs() < 1e-12);
    }
}

#[tokio::test]
async fn ffd_rejects_a_mismatched_node_count() {
    let block = FfdLatticeBlockFactory.create(&HashMap::new()).unwrap();
    let ctx = test_context(
        vec![
            ("geometry", DataContainer::store(unit_square())),
            ("displacements", DataContainer::store(vec![[0.0, 0.0, 1.0]; 4])),
        ],
        vec![],
    );

    let err = block.execute(ctx).await.err().expect("2x2x2 needs 8 nodes");
    assert!(matches!(err, BlockError::ExecutionFailed(_)));
}

#[test]
fn ffd_rejects_degenerate_dims() {
    let err = FfdLatticeBlockFactory
        .create(&config_of(&[("dims", "1 2 2")]))
        .err()
        .expect("an axis with one node has no span");
    assert!(matches!(err, BlockError::ConfigParse { ref key, .. } if key == "dims"));

    let err = FfdLatticeBlockFactory
        .create(&config_of(&[("dims", "two by two")]))
        .err()
        .expect("not a count triplet");
    assert!(matches!(err, BlockError::ConfigParse { ref key, .. } if key == "dims"));
}

#[tokio::test]
async fn project_snaps_vertices_onto_the_target() {
    let block = ProjectBlockFactory.create(&HashMap::new()).unwrap();
    let mesh = TriMesh::new(
        vec![[0.25, 0.25, 1.0], [2.0, 2.0, 5.0], [-1.0, 0.5, 0.5]],
        vec![[0, 1, 2]],
    );
    let ctx = test_context(
        vec![
            ("geometry", DataContainer::store(mesh)),
            ("target", DataContainer::store(unit_square())),
        ],
        vec![],
    );

    let output = block.execute(ctx).await.unwrap();
    let projected = output.outputs["geometry"].as_mesh().unwrap();

    // Straight drop onto the square's interior.
    assert!(morphcore::geometry::dist(projected.vertices[0], [0.25, 0.25, 0.0]) < 1e-12);
    // Far outside: the nearest point is the corner.
    assert!(morphcore::geometry::dist(projected.vertices[1], [1.0, 1.0, 0.0]) < 1e-12);
    // Off the side: the nearest point is on the edge.
    assert!(morphcore::geometry::dist(projected.vertices[2], [0.0, 0.5, 0.0]) < 1e-12);
    // Connectivity is untouched.
    assert_eq!(projected.triangles, vec![[0, 1, 2]]);
}

#[tokio::test]
async fn project_requires_a_triangulated_target() {
    let block = ProjectBlockFactory.create(&HashMap::new()).unwrap();
    let target = TriMesh::new(vec![[0.0, 0.0, 0.0]], vec![]);
    let ctx = test_context(
        vec![
            ("geometry", DataContainer::store(unit_square())),
            ("target", DataContainer::store(target)),
        ],
        vec![],
    );

    let err = block.execute(ctx).await.err().expect("a point cloud is not a surface");
    assert!(matches!(err, BlockError::ExecutionFailed(_)));
}

#[tokio::test]
async fn rbf_interpolates_a_single_control_node() {
    let block = RbfWarpBlockFactory
        .create(&config_of(&[("kernel", "gaussian"), ("radius", "10")]))
        .unwrap();
    let mesh = TriMesh::new(
        vec![[0.0, 0.0, 0.0], [5.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
        vec![[0, 1, 2]],
    );
    let ctx = test_context(
        vec![
            ("geometry", DataContainer::store(mesh)),
            ("nodes", DataContainer::store(vec![[0.0, 0.0, 0.0]])),
            ("displacements", DataContainer::store(vec![[1.0, 0.0, 0.0]])),
        ],
        vec![],
    );

    let output = block.execute(ctx).await.unwrap();
    let field = output.outputs["displacements"].as_coord_field().unwrap();

    // At the control node the interpolant reproduces the control exactly.
    assert!((field[&0][0] - 1.0).abs() < 1e-12);
    assert_eq!(field[&0][1], 0.0);
    // Five units away, scaled by the radius: exp(-(0.5)^2).
    let expected = (-0.25f64).exp();
    assert!((field[&1][0] - expected).abs() < 1e-12);
}

#[tokio::test]
async fn rbf_rejects_mismatched_control_arrays() {
    let block = RbfWarpBlockFactory.create(&HashMap::new()).unwrap();
    let ctx = test_context(
        vec![
            ("geometry", DataContainer::store(unit_square())),
            (
                "nodes",
                DataContainer::store(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
            ),
            ("displacements", DataContainer::store(vec![[1.0, 0.0, 0.0]])),
        ],
        vec![],
    );

    let err = block.execute(ctx).await.err().expect("2 nodes, 1 displacement");
    assert!(matches!(err, BlockError::ExecutionFailed(_)));
}

#[test]
fn rbf_rejects_unknown_kernel_and_bad_radius() {
    let err = RbfWarpBlockFactory
        .create(&config_of(&[("kernel", "sinc")]))
        .err()
        .expect("unknown kernel");
    assert!(matches!(err, BlockError::ConfigParse { ref key, .. } if key == "kernel"));

    let err = RbfWarpBlockFactory
        .create(&config_of(&[("radius", "-1")]))
        .err()
        .expect("negative support radius");
    assert!(matches!(err, BlockError::ConfigParse { ref key, .. } if key == "radius"));
}

#[tokio::test]
async fn point_source_parses_inline_rows() {
    let block = PointSourceBlockFactory
        .create(&config_of(&[("points", "0 0 0; 1, 2, 3")]))
        .unwrap();
    let ctx = test_context(vec![], vec![]);

    let output = block.execute(ctx).await.unwrap();
    let points = output.outputs["points"].as_coords().unwrap();
    assert_eq!(points, [[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]]);
}

#[test]
fn point_source_needs_a_data_source() {
    let err = PointSourceBlockFactory
        .create(&HashMap::new())
        .err()
        .expect("neither 'points' nor 'file'");
    assert!(matches!(err, BlockError::ConfigParse { .. }));
}

#[tokio::test]
async fn obj_round_trips_through_writer_and_source() {
    let path = temp_path(".obj");

    let writer = ObjWriterBlockFactory
        .create(&config_of(&[("file", path.to_str().unwrap())]))
        .unwrap();
    let ctx = test_context(vec![("geometry", DataContainer::store(unit_square()))], vec![]);
    writer.execute(ctx).await.unwrap();

    let reader = MeshSourceBlockFactory
        .create(&config_of(&[("file", path.to_str().unwrap())]))
        .unwrap();
    let output = reader.execute(test_context(vec![], vec![])).await.unwrap();
    let mesh = output.outputs["geometry"].as_mesh().unwrap();

    assert_eq!(*mesh, unit_square());
    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn obj_source_fans_polygons_into_triangles() {
    let path = temp_path(".obj");
    std::fs::write(
        &path,
        "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1/1/1 2/2/2 3/3/3 4/4/4\n",
    )
    .unwrap();

    let reader = MeshSourceBlockFactory
        .create(&config_of(&[("file", path.to_str().unwrap())]))
        .unwrap();
    let output = reader.execute(test_context(vec![], vec![])).await.unwrap();
    let mesh = output.outputs["geometry"].as_mesh().unwrap();

    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn obj_source_rejects_out_of_range_faces() {
    let path = temp_path(".obj");
    std::fs::write(&path, "v 0 0 0\nv 1 0 0\nf 1 2 9\n").unwrap();

    let reader = MeshSourceBlockFactory
        .create(&config_of(&[("file", path.to_str().unwrap())]))
        .unwrap();
    let err = reader
        .execute(test_context(vec![], vec![]))
        .await
        .err()
        .expect("face references vertex 9");
    assert!(matches!(err, BlockError::ExecutionFailed(_)));
    std::fs::remove_file(&path).ok();
}
