use {
    nalgebra as na,
    rig_animate::{
        import::{
            row_major, ImportBone, ImportMesh, ImportNode, VertexWeight,
            IDENTITY,
        },
        AnimationError, MalformedAsset, Skeleton, SkeletonBuilder,
        SkinnedMesh, MAX_BONES,
    },
    rig_arena::{Arena, ArenaAlloc},
};

fn bone(name: &str, weights: &[(u32, f32)]) -> ImportBone {
    ImportBone {
        name: name.to_owned(),
        offset: IDENTITY,
        weights: weights.iter().map(|&(v, w)| VertexWeight(v, w)).collect(),
    }
}

fn mesh(name: &str, vertices: usize, bones: Vec<ImportBone>) -> ImportMesh {
    ImportMesh {
        name: name.to_owned(),
        positions: vec![[0.0; 3]; vertices],
        bones,
    }
}

/// root -> [a -> [a1, a2], b, c -> [c1]]
fn tree() -> ImportNode {
    ImportNode::new("root")
        .with_child(
            ImportNode::new("a")
                .with_child(ImportNode::new("a1"))
                .with_child(ImportNode::new("a2")),
        )
        .with_child(ImportNode::new("b"))
        .with_child(ImportNode::new("c").with_child(ImportNode::new("c1")))
}

fn build<'a>(
    arena: &'a Arena,
    root: &ImportNode,
    meshes: &[ImportMesh],
) -> Result<(Skeleton<'a>, Vec<SkinnedMesh<'a>>), AnimationError> {
    let mut skins = meshes
        .iter()
        .map(|mesh| SkinnedMesh::build(arena, mesh))
        .collect::<Result<Vec<_>, _>>()?;
    let skeleton = SkeletonBuilder::new(arena).build(root, meshes, &mut skins)?;
    Ok((skeleton, skins))
}

fn visit(skeleton: &Skeleton<'_>, index: usize, seen: &mut [usize]) {
    seen[index] += 1;
    for child in skeleton.children(index) {
        assert_eq!(skeleton.node(child).parent(), Some(index));
        visit(skeleton, child, seen);
    }
}

#[test]
fn traversal_visits_every_node_once() {
    let arena = Arena::new("flatten", 1 << 16).unwrap();
    let root = tree();
    let (skeleton, _) = build(&arena, &root, &[]).unwrap();

    assert_eq!(skeleton.node_count(), root.count());
    assert_eq!(skeleton.node_count(), 7);

    let roots: Vec<_> = skeleton
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| node.parent().is_none())
        .map(|(index, _)| index)
        .collect();
    assert_eq!(roots, [0]);

    let mut seen = vec![0; skeleton.node_count()];
    visit(&skeleton, 0, &mut seen);
    assert!(seen.iter().all(|&count| count == 1));

    for (index, node) in skeleton.nodes().iter().enumerate() {
        if let Some(parent) = node.parent() {
            assert!(parent < index);
        }
    }
}

#[test]
fn children_are_contiguous() {
    let arena = Arena::new("flatten", 1 << 16).unwrap();
    let (skeleton, _) = build(&arena, &tree(), &[]).unwrap();

    let names = |index| {
        skeleton
            .children(index)
            .map(|child| skeleton.node(child).name())
            .collect::<Vec<_>>()
    };

    assert_eq!(names(0), ["a", "b", "c"]);
    assert_eq!(skeleton.children(0).collect::<Vec<_>>(), [1, 2, 3]);
    assert_eq!(names(skeleton.find_node("a").unwrap()), ["a1", "a2"]);
    assert_eq!(names(skeleton.find_node("c").unwrap()), ["c1"]);
    assert!(names(skeleton.find_node("b").unwrap()).is_empty());
}

#[test]
fn bone_indices_are_dense() {
    let arena = Arena::new("bones", 1 << 16).unwrap();
    let meshes = [
        mesh("body", 2, vec![bone("c1", &[(0, 1.0)]), bone("a", &[(1, 1.0)])]),
        mesh("cape", 1, vec![bone("a", &[]), bone("b", &[(0, 1.0)])]),
    ];
    let (skeleton, skins) = build(&arena, &tree(), &meshes).unwrap();

    assert_eq!(skeleton.bone_count(), 3);
    let mut bones: Vec<_> =
        skeleton.nodes().iter().filter_map(|node| node.bone()).collect();
    bones.sort_unstable();
    assert_eq!(bones, [0, 1, 2]);

    // Assigned in node order.
    let node_of = |bone| skeleton.node(skeleton.bone_node(bone).unwrap()).name();
    assert_eq!(node_of(0), "a");
    assert_eq!(node_of(1), "b");
    assert_eq!(node_of(2), "c1");

    // Mesh local indices are remapped to skeleton bone indices.
    let body = skins[0].influences().unwrap();
    assert_eq!(body[0].bones[0], 2);
    assert_eq!(body[1].bones[0], 0);
    let cape = skins[1].influences().unwrap();
    assert_eq!(cape[0].bones[0], 1);
}

#[test]
fn bone_offsets_follow_bone_indices() {
    let arena = Arena::new("offsets", 1 << 16).unwrap();
    let offset = na::Matrix4::new_translation(&na::Vector3::new(0.0, -2.0, 0.0));
    let mut spine = bone("b", &[]);
    spine.offset = row_major(&offset);

    let meshes = [mesh("body", 1, vec![spine, bone("a", &[])])];
    let (skeleton, _) = build(&arena, &tree(), &meshes).unwrap();

    assert_eq!(skeleton.bone_offsets()[0], na::Matrix4::identity());
    assert_eq!(skeleton.bone_offsets()[1], offset);
}

#[test]
fn unknown_bone_is_rejected() {
    let arena = Arena::new("unknown", 1 << 16).unwrap();
    let meshes = [mesh("body", 1, vec![bone("tail", &[(0, 1.0)])])];

    match build(&arena, &tree(), &meshes) {
        Err(AnimationError::MalformedAsset {
            source: MalformedAsset::UnknownBone { name },
        }) => assert_eq!(name, "tail"),
        other => panic!("Unexpected result {:?}", other.map(|_| ())),
    }
}

#[test]
fn mismatched_offsets_are_rejected() {
    let arena = Arena::new("mismatch", 1 << 16).unwrap();
    let mut shifted = bone("a", &[]);
    shifted.offset[3] = 1.0;

    let meshes = [
        mesh("body", 1, vec![bone("a", &[])]),
        mesh("cape", 1, vec![shifted]),
    ];

    assert!(matches!(
        build(&arena, &tree(), &meshes),
        Err(AnimationError::MalformedAsset {
            source: MalformedAsset::MismatchedOffset { .. }
        })
    ));
}

#[test]
fn mismatched_offset_leaves_skins_untouched() {
    let arena = Arena::new("mismatch", 1 << 16).unwrap();
    let mut shifted = bone("a", &[(0, 1.0)]);
    shifted.offset[3] = 1.0;

    let meshes = [
        mesh("body", 2, vec![bone("c1", &[(0, 1.0)]), bone("a", &[(1, 1.0)])]),
        mesh("cape", 1, vec![shifted]),
    ];
    let mut skins = meshes
        .iter()
        .map(|mesh| SkinnedMesh::build(&arena, mesh))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let result = SkeletonBuilder::new(&arena)
        .build(&tree(), &meshes, &mut skins)
        .map(|_| ());
    assert!(matches!(
        result,
        Err(AnimationError::MalformedAsset {
            source: MalformedAsset::MismatchedOffset { .. }
        })
    ));

    // Still mesh local indices.
    let body = skins[0].influences().unwrap();
    assert_eq!(body[0].bones[0], 0);
    assert_eq!(body[1].bones[0], 1);
}

#[test]
fn empty_name_finds_nothing() {
    let arena = Arena::new("names", 1 << 16).unwrap();
    let root = tree().with_child(ImportNode::new("x".repeat(64)));
    let (skeleton, _) = build(&arena, &root, &[]).unwrap();

    assert!(skeleton.nodes().iter().any(|node| node.name().is_empty()));
    assert_eq!(skeleton.find_node(""), None);
    assert_eq!(skeleton.find_node("b"), Some(2));
}

#[test]
fn too_many_bones() {
    let arena = Arena::new("crowd", 1 << 20).unwrap();
    let count = MAX_BONES + 1;

    let root = (0..count).fold(ImportNode::new("root"), |root, index| {
        root.with_child(ImportNode::new(format!("bone{}", index)))
    });
    let meshes = [mesh(
        "crowd",
        1,
        (0..count).map(|index| bone(&format!("bone{}", index), &[])).collect(),
    )];

    assert_eq!(
        build(&arena, &root, &meshes).map(|_| ()),
        Err(AnimationError::CapacityExceeded { bones: count })
    );
}

#[test]
fn exactly_max_bones_fit() {
    let arena = Arena::new("crowd", 1 << 20).unwrap();

    let root = (0..MAX_BONES).fold(ImportNode::new("root"), |root, index| {
        root.with_child(ImportNode::new(format!("bone{}", index)))
    });
    let meshes = [mesh(
        "crowd",
        1,
        (0..MAX_BONES)
            .map(|index| bone(&format!("bone{}", index), &[]))
            .collect(),
    )];

    let (skeleton, _) = build(&arena, &root, &meshes).unwrap();
    assert_eq!(skeleton.bone_count(), MAX_BONES);
    assert_eq!(skeleton.node(MAX_BONES).bone(), Some(MAX_BONES - 1));
}

#[test]
fn out_of_memory_is_reported() {
    let arena = Arena::new("tiny", 64).unwrap();
    assert_eq!(
        build(&arena, &tree(), &[]).map(|_| ()),
        Err(AnimationError::OutOfMemory {
            source: rig_arena::OutOfMemory
        })
    );
    assert_eq!(arena.available(), 64);
}
