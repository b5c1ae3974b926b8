use glam::{Mat4, Vec3};

use crate::records::{PointParticle, Vertex};
use crate::types::Transform;

/// Geometry for one drawable object plus its current and previous tick placement.
///
/// Which placement fields a batch reads depends on its render type: lerp
/// triangle/line types read both matrices, 3D text reads the world positions,
/// and plain mesh types expect vertices already in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub model_matrix: Mat4,
    pub prev_model_matrix: Mat4,
    pub world_pos: Vec3,
    pub prev_world_pos: Vec3,
}

impl Model {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            model_matrix: Mat4::IDENTITY,
            prev_model_matrix: Mat4::IDENTITY,
            world_pos: Vec3::ZERO,
            prev_world_pos: Vec3::ZERO,
        }
    }

    pub fn with_matrices(mut self, current: Mat4, previous: Mat4) -> Self {
        self.model_matrix = current;
        self.prev_model_matrix = previous;
        self
    }

    pub fn with_transforms(self, current: &Transform, previous: &Transform) -> Self {
        self.with_matrices(current.to_matrix(), previous.to_matrix())
    }

    pub fn with_positions(mut self, current: Vec3, previous: Vec3) -> Self {
        self.world_pos = current;
        self.prev_world_pos = previous;
        self
    }

    /// Overwrite the placement without touching geometry. Used by entities that
    /// keep one model and re-submit it every tick.
    pub fn set_transforms(&mut self, current: &Transform, previous: &Transform) {
        self.model_matrix = current.to_matrix();
        self.prev_model_matrix = previous.to_matrix();
        self.world_pos = current.position;
        self.prev_world_pos = previous.position;
    }

    /// Bake `matrix` into the vertex positions.
    pub fn transform_vertices(mut self, matrix: Mat4) -> Self {
        for v in &mut self.vertices {
            v.position = matrix
                .transform_point3(Vec3::from_array(v.position))
                .to_array();
        }
        self
    }

    pub fn set_color(mut self, color: [f32; 4]) -> Self {
        for v in &mut self.vertices {
            v.color = color;
        }
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }
}

/// A cloud of point particles and the same cloud one tick earlier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloudModel {
    pub points: Vec<PointParticle>,
    pub prev_points: Vec<PointParticle>,
}

impl PointCloudModel {
    pub fn new(points: Vec<PointParticle>) -> Self {
        Self {
            prev_points: points.clone(),
            points,
        }
    }

    pub fn with_previous(points: Vec<PointParticle>, prev_points: Vec<PointParticle>) -> Self {
        Self {
            points,
            prev_points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_both_matrices() {
        let cur = Transform::from_position(Vec3::X);
        let prev = Transform::default();
        let m = Model::new(vec![Vertex::at([0.0; 3])], vec![0]).with_transforms(&cur, &prev);
        assert_eq!(m.model_matrix, cur.to_matrix());
        assert_eq!(m.prev_model_matrix, Mat4::IDENTITY);
    }

    #[test]
    fn transform_vertices_bakes_translation() {
        let m = Model::new(vec![Vertex::at([1.0, 0.0, 0.0])], vec![0])
            .transform_vertices(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(m.vertices[0].position, [1.0, 2.0, 0.0]);
    }

    #[test]
    fn point_cloud_new_duplicates_previous() {
        let p = PointParticle::new(Vec3::ZERO, [1.0; 4], 1.0, false);
        let cloud = PointCloudModel::new(vec![p, p]);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.prev_points.len(), 2);
    }
}
