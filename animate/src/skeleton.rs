use {
    crate::{
        error::{AnimationError, MalformedAsset},
        import::{ImportMesh, ImportNode},
        mesh::SkinnedMesh,
        name::Name,
    },
    nalgebra as na,
    rig_arena::ArenaAlloc,
};

/// Size of the skinning matrix buffer.
pub const MAX_BONES: usize = 256;

/// Single node of the flattened scene tree.
#[derive(Clone, Copy, Debug)]
pub struct SkeletonNode {
    local: na::Matrix4<f32>,
    name: Name,
    parent: Option<u32>,
    first_child: Option<u32>,
    next_sibling: Option<u32>,
    bone: Option<u8>,
    is_mesh_node: bool,
}

impl Default for SkeletonNode {
    fn default() -> Self {
        SkeletonNode {
            local: na::Matrix4::identity(),
            name: Name::default(),
            parent: None,
            first_child: None,
            next_sibling: None,
            bone: None,
            is_mesh_node: false,
        }
    }
}

impl SkeletonNode {
    /// Bind pose transform relative to parent.
    pub fn local(&self) -> &na::Matrix4<f32> {
        &self.local
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent.map(|index| index as usize)
    }

    pub fn first_child(&self) -> Option<usize> {
        self.first_child.map(|index| index as usize)
    }

    pub fn next_sibling(&self) -> Option<usize> {
        self.next_sibling.map(|index| index as usize)
    }

    /// Index of the bone this node drives, if any.
    pub fn bone(&self) -> Option<usize> {
        self.bone.map(usize::from)
    }

    pub fn is_bone(&self) -> bool {
        self.bone.is_some()
    }

    /// Mesh nodes do not pass their transform on to children.
    pub fn is_mesh_node(&self) -> bool {
        self.is_mesh_node
    }
}

/// Flattened node tree with bind pose bone offsets.
///
/// Node 0 is the root. Children of every node occupy a contiguous index
/// range and every parent precedes its children.
#[derive(Clone, Copy, Debug)]
pub struct Skeleton<'a> {
    nodes: &'a [SkeletonNode],
    bone_offsets: &'a [na::Matrix4<f32>],
}

impl<'a> Skeleton<'a> {
    pub fn nodes(&self) -> &'a [SkeletonNode] {
        self.nodes
    }

    pub fn node(&self, index: usize) -> &'a SkeletonNode {
        &self.nodes[index]
    }

    pub fn root(&self) -> &'a SkeletonNode {
        &self.nodes[0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn bone_count(&self) -> usize {
        self.bone_offsets.len()
    }

    /// Inverse bind matrices indexed by bone.
    pub fn bone_offsets(&self) -> &'a [na::Matrix4<f32>] {
        self.bone_offsets
    }

    /// Linear lookup by node name.
    ///
    /// Empty name never matches, nodes with dropped names are not found.
    pub fn find_node(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.nodes.iter().position(|node| node.name == *name)
    }

    /// Index of the node that drives `bone`.
    pub fn bone_node(&self, bone: usize) -> Option<usize> {
        self.nodes.iter().position(|node| node.bone() == Some(bone))
    }

    pub fn children(&self, index: usize) -> Children<'a> {
        Children {
            nodes: self.nodes,
            next: self.nodes[index].first_child,
        }
    }
}

/// Iterator over indices of node's children.
#[derive(Clone, Debug)]
pub struct Children<'a> {
    nodes: &'a [SkeletonNode],
    next: Option<u32>,
}

impl Iterator for Children<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.next? as usize;
        self.next = self.nodes[index].next_sibling;
        Some(index)
    }
}

/// Builds [`Skeleton`] from importer node tree and mesh bone lists.
#[derive(Debug)]
pub struct SkeletonBuilder<'a, A> {
    arena: &'a A,
}

impl<'a, A> SkeletonBuilder<'a, A>
where
    A: ArenaAlloc,
{
    pub fn new(arena: &'a A) -> Self {
        SkeletonBuilder { arena }
    }

    /// Flattens the tree under `root`, assigns dense bone indices
    /// and remaps bone indices of `skins` into skeleton bone indices.
    ///
    /// Node array and bone offsets are allocated on the left side.
    /// Temporary tables live on the right side and are freed on return.
    ///
    /// # Panics
    ///
    /// Panics if `skins` and `meshes` differ in length.
    #[tracing::instrument(skip(self, root, meshes, skins))]
    pub fn build(
        &self,
        root: &ImportNode,
        meshes: &[ImportMesh],
        skins: &mut [SkinnedMesh<'_>],
    ) -> Result<Skeleton<'a>, AnimationError> {
        assert_eq!(meshes.len(), skins.len());

        let node_count = root.count();
        let nodes = self
            .arena
            .alloc_slice_left_with(node_count, |_| SkeletonNode::default())?;

        // Importer nodes by flat index, for lookups by full name.
        let mut sources =
            self.arena.scratch(node_count, |_| None::<&ImportNode>)?;
        flatten(root, nodes, &mut sources, self.arena)?;

        // Skeleton node of every mesh bone, later replaced by its bone index.
        let bone_refs = meshes.iter().map(|mesh| mesh.bones.len()).sum();
        let mut bone_of_ref = self.arena.scratch(bone_refs, |_| 0usize)?;
        let mut tagged = self.arena.scratch(node_count, |_| false)?;

        let mesh_bones = meshes.iter().flat_map(|mesh| &mesh.bones);
        for (slot, bone) in bone_of_ref.iter_mut().zip(mesh_bones.clone()) {
            let node = find_source(&sources, &bone.name).ok_or_else(|| {
                MalformedAsset::UnknownBone {
                    name: bone.name.clone(),
                }
            })?;
            tagged[node] = true;
            *slot = node;
        }

        let bone_count = tagged.iter().filter(|&&tagged| tagged).count();
        if bone_count > MAX_BONES {
            return Err(AnimationError::CapacityExceeded { bones: bone_count });
        }

        let mut next_bone = 0;
        for (node, &tagged) in nodes.iter_mut().zip(tagged.iter()) {
            if tagged {
                node.bone = Some(next_bone as u8);
                next_bone += 1;
            }
        }

        let bone_offsets = self
            .arena
            .alloc_slice_left_with(bone_count, |_| na::Matrix4::identity())?;
        let mut assigned = self.arena.scratch(bone_count, |_| false)?;

        // Every offset is checked before any skin is touched.
        for (slot, bone) in bone_of_ref.iter_mut().zip(mesh_bones) {
            let index = match nodes[*slot].bone() {
                Some(index) => index,
                None => unreachable!("Bone nodes are tagged above"),
            };

            let offset = bone.offset_matrix();
            if assigned[index] {
                if !bit_identical(&bone_offsets[index], &offset) {
                    return Err(MalformedAsset::MismatchedOffset {
                        name: bone.name.clone(),
                    }
                    .into());
                }
            } else {
                bone_offsets[index] = offset;
                assigned[index] = true;
            }
            *slot = index;
        }

        let mut first_ref = 0;
        for (mesh, skin) in meshes.iter().zip(skins.iter_mut()) {
            let remap = &bone_of_ref[first_ref..][..mesh.bones.len()];
            first_ref += mesh.bones.len();

            if let Some(influences) = skin.influences_mut() {
                for influence in influences {
                    for bone in &mut influence.bones {
                        *bone = remap[*bone as usize] as u32;
                    }
                }
            }
        }

        tracing::debug!(
            "Skeleton built with {} nodes and {} bones",
            node_count,
            bone_count
        );

        Ok(Skeleton {
            nodes,
            bone_offsets,
        })
    }
}

/// Writes the tree under `root` into `nodes` in depth-first order.
/// Children of one node take a contiguous range reserved before
/// descending into any of them.
fn flatten<'n, A>(
    root: &'n ImportNode,
    nodes: &mut [SkeletonNode],
    sources: &mut [Option<&'n ImportNode>],
    arena: &A,
) -> Result<(), AnimationError>
where
    A: ArenaAlloc,
{
    // Every node is pushed once, so the stack never outgrows the tree.
    let mut pending = arena.scratch(nodes.len(), |_| (root, 0usize))?;
    let mut top = 1;
    let mut used = 1;

    while top > 0 {
        top -= 1;
        let (node, index) = pending[top];
        let first_child = used;
        used += node.children.len();

        // Parent and sibling links are written when the slot is reserved.
        sources[index] = Some(node);
        let slot = &mut nodes[index];
        slot.local = node.local_transform();
        slot.name = Name::new(&node.name);
        slot.first_child = if node.children.is_empty() {
            None
        } else {
            Some(first_child as u32)
        };
        slot.is_mesh_node = node.is_mesh_node();

        let count = node.children.len();
        for offset in 0..count {
            let child = &mut nodes[first_child + offset];
            child.parent = Some(index as u32);
            if offset + 1 < count {
                child.next_sibling = Some((first_child + offset + 1) as u32);
            }
        }

        // Reversed so that the first child is taken first.
        for (offset, child) in node.children.iter().enumerate().rev() {
            pending[top] = (child, first_child + offset);
            top += 1;
        }
    }

    debug_assert_eq!(used, nodes.len());
    Ok(())
}

fn find_source(sources: &[Option<&ImportNode>], name: &str) -> Option<usize> {
    sources
        .iter()
        .position(|source| source.map_or(false, |node| node.name == name))
}

fn bit_identical(a: &na::Matrix4<f32>, b: &na::Matrix4<f32>) -> bool {
    a.iter().zip(b.iter()).all(|(a, b)| a.to_bits() == b.to_bits())
}
