//! Small built-in meshes for demos, tests and debug overlays.

use crate::model::Model;
use crate::records::Vertex;

/// Single triangle in the XY plane.
pub fn unit_triangle() -> Model {
    Model::new(
        vec![
            Vertex::new([-0.5, -0.5, 0.0], [1.0, 0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([0.5, -0.5, 0.0], [0.0, 1.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([0.0, 0.5, 0.0], [0.0, 0.0, 1.0, 1.0], [0.5, 1.0]),
        ],
        vec![0, 1, 2],
    )
}

/// Unit quad in the XY plane, two triangles.
pub fn unit_quad() -> Model {
    Model::new(
        vec![
            Vertex::new([-0.5, -0.5, 0.0], [1.0; 4], [0.0, 0.0]),
            Vertex::new([0.5, -0.5, 0.0], [1.0; 4], [1.0, 0.0]),
            Vertex::new([0.5, 0.5, 0.0], [1.0; 4], [1.0, 1.0]),
            Vertex::new([-0.5, 0.5, 0.0], [1.0; 4], [0.0, 1.0]),
        ],
        vec![0, 1, 2, 2, 3, 0],
    )
}

/// Unit cube centred on the origin, 24 vertices so each face has its own uvs.
pub fn unit_cube() -> Model {
    let p = 0.5_f32;
    let w = [1.0_f32; 4];
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex::new([-p, -p,  p], w, [0.0, 0.0]),
        Vertex::new([ p, -p,  p], w, [1.0, 0.0]),
        Vertex::new([ p,  p,  p], w, [1.0, 1.0]),
        Vertex::new([-p,  p,  p], w, [0.0, 1.0]),
        // -Z face
        Vertex::new([ p, -p, -p], w, [0.0, 0.0]),
        Vertex::new([-p, -p, -p], w, [1.0, 0.0]),
        Vertex::new([-p,  p, -p], w, [1.0, 1.0]),
        Vertex::new([ p,  p, -p], w, [0.0, 1.0]),
        // +X face
        Vertex::new([ p, -p,  p], w, [0.0, 0.0]),
        Vertex::new([ p, -p, -p], w, [1.0, 0.0]),
        Vertex::new([ p,  p, -p], w, [1.0, 1.0]),
        Vertex::new([ p,  p,  p], w, [0.0, 1.0]),
        // -X face
        Vertex::new([-p, -p, -p], w, [0.0, 0.0]),
        Vertex::new([-p, -p,  p], w, [1.0, 0.0]),
        Vertex::new([-p,  p,  p], w, [1.0, 1.0]),
        Vertex::new([-p,  p, -p], w, [0.0, 1.0]),
        // +Y face
        Vertex::new([-p,  p,  p], w, [0.0, 0.0]),
        Vertex::new([ p,  p,  p], w, [1.0, 0.0]),
        Vertex::new([ p,  p, -p], w, [1.0, 1.0]),
        Vertex::new([-p,  p, -p], w, [0.0, 1.0]),
        // -Y face
        Vertex::new([-p, -p, -p], w, [0.0, 0.0]),
        Vertex::new([ p, -p, -p], w, [1.0, 0.0]),
        Vertex::new([ p, -p,  p], w, [1.0, 1.0]),
        Vertex::new([-p, -p,  p], w, [0.0, 1.0]),
    ];
    #[rustfmt::skip]
    let indices = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    Model::new(vertices, indices)
}

/// Grid floor as a line list on the XZ plane.
pub fn grid_lines(half_extent: i32, spacing: f32) -> Model {
    let color = [0.4, 0.4, 0.4, 1.0];
    let extent = half_extent as f32 * spacing;
    let mut vertices = Vec::new();

    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        // Lines along X
        vertices.push(Vertex::new([-extent, 0.0, offset], color, [0.0, 0.0]));
        vertices.push(Vertex::new([extent, 0.0, offset], color, [0.0, 0.0]));
        // Lines along Z
        vertices.push(Vertex::new([offset, 0.0, -extent], color, [0.0, 0.0]));
        vertices.push(Vertex::new([offset, 0.0, extent], color, [0.0, 0.0]));
    }
    let indices = (0..vertices.len() as u32).collect();
    Model::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_indices_in_range() {
        let cube = unit_cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertex_count()));
    }

    #[test]
    fn grid_line_count() {
        let grid = grid_lines(2, 1.0);
        // 5 rows, 2 lines each, 2 vertices per line
        assert_eq!(grid.vertex_count(), 20);
        assert_eq!(grid.index_count(), 20);
    }
}
