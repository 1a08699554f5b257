use bevy_ecs::prelude::*;

use crate::components::{TransformComponent, WorldTransformComponent};

/// Parent chains deeper than this are treated as cyclic and cut off.
const MAX_HIERARCHY_DEPTH: usize = 64;

/// Computes world-space transform matrices for every entity with a local
/// transform, composing the full parent chain.
pub fn world_transform_system(
    query: Query<(Entity, &TransformComponent)>,
    locals: Query<&TransformComponent>,
    mut commands: Commands,
) {
    for (entity, local) in query.iter() {
        let matrix = compose_world_matrix(local, &locals);
        // Insert will overwrite if it exists already.
        commands.entity(entity).insert(WorldTransformComponent { matrix });
    }
}

fn compose_world_matrix(local: &TransformComponent, locals: &Query<&TransformComponent>) -> glam::Mat4 {
    let mut matrix = local.local_matrix();
    let mut parent = local.parent;
    let mut depth = 0;
    while let Some(p) = parent {
        if depth == MAX_HIERARCHY_DEPTH {
            break;
        }
        let Ok(parent_local) = locals.get(p) else { break };
        matrix = parent_local.local_matrix() * matrix;
        parent = parent_local.parent;
        depth += 1;
    }
    matrix
}
