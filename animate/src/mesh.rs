use {
    crate::{
        error::{AnimationError, MalformedAsset},
        import::ImportMesh,
        name::Name,
    },
    bytemuck::{Pod, Zeroable},
    nalgebra as na,
    rig_arena::ArenaAlloc,
};

/// Slots with smaller weight are considered free.
pub const WEIGHT_EPSILON: f32 = 0.001;

/// Up to four bones influencing single vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct VertexInfluence {
    pub bones: [u32; 4],
    pub weights: [f32; 4],
}

unsafe impl Zeroable for VertexInfluence {}
unsafe impl Pod for VertexInfluence {}

impl VertexInfluence {
    /// Puts influence into the first free slot.
    /// Returns `false` if all four slots are taken.
    pub fn push(&mut self, bone: u32, weight: f32) -> bool {
        match self.weights.iter().position(|&w| w < WEIGHT_EPSILON) {
            Some(slot) => {
                self.bones[slot] = bone;
                self.weights[slot] = weight;
                true
            }
            None => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: na::Point3<f32>,
    pub max: na::Point3<f32>,
}

impl Aabb {
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let first = na::Point3::from(*first);
        Some(rest.iter().fold(
            Aabb {
                min: first,
                max: first,
            },
            |aabb, p| {
                let p = na::Vector3::from(*p);
                Aabb {
                    min: aabb.min.coords.inf(&p).into(),
                    max: aabb.max.coords.sup(&p).into(),
                }
            },
        ))
    }
}

/// Mesh with per-vertex bone influences.
///
/// Right after [`SkinnedMesh::build`] bone indices refer to the mesh's own
/// bone list. Skeleton construction remaps them to skeleton bone indices.
///
/// [`SkinnedMesh::build`]: SkinnedMesh::build
#[derive(Debug)]
pub struct SkinnedMesh<'a> {
    name: Name,
    vertex_count: usize,
    aabb: Option<Aabb>,
    influences: Option<&'a mut [VertexInfluence]>,
}

impl<'a> SkinnedMesh<'a> {
    #[tracing::instrument(skip(arena, mesh), fields(mesh = %mesh.name))]
    pub fn build<A>(
        arena: &'a A,
        mesh: &ImportMesh,
    ) -> Result<Self, AnimationError>
    where
        A: ArenaAlloc,
    {
        let vertex_count = mesh.vertex_count();

        let influences = if mesh.has_bones() {
            let influences = arena
                .alloc_slice_left_with(vertex_count, |_| {
                    VertexInfluence::default()
                })?;

            for (index, bone) in mesh.bones.iter().enumerate() {
                for weight in &bone.weights {
                    let vertex = influences
                        .get_mut(weight.0 as usize)
                        .ok_or_else(|| MalformedAsset::VertexOutOfRange {
                            bone: bone.name.clone(),
                            vertex: weight.0,
                            count: vertex_count,
                        })?;

                    if !vertex.push(index as u32, weight.1) {
                        tracing::trace!(
                            "Vertex {} has more than 4 influences, \
                             bone `{}` dropped",
                            weight.0,
                            bone.name
                        );
                    }
                }
            }
            Some(influences)
        } else {
            None
        };

        Ok(SkinnedMesh {
            name: Name::new(&mesh.name),
            vertex_count,
            aabb: Aabb::from_points(&mesh.positions),
            influences,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn aabb(&self) -> Option<&Aabb> {
        self.aabb.as_ref()
    }

    pub fn influences(&self) -> Option<&[VertexInfluence]> {
        self.influences.as_deref()
    }

    pub(crate) fn influences_mut(&mut self) -> Option<&mut [VertexInfluence]> {
        self.influences.as_deref_mut()
    }
}
