//! # Primitive Shape Generation
//!
//! Generators for the editor's built-in shapes. All shapes are Y-up.

use super::GeometryData;

/// Generate a unit cube centered at the origin
///
/// Returns a cube with vertices from -0.5 to 0.5 on all axes.
/// Each face has its own four vertices so normals stay flat.
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();

    #[rustfmt::skip]
    let positions = [
        // Front face
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // Back face
        [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5, -0.5, -0.5],
        // Left face
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
        // Right face
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        // Top face
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // Bottom face
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
    ];

    let face_normals = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    data.vertices = positions.to_vec();
    data.normals = face_normals
        .iter()
        .flat_map(|normal| std::iter::repeat(*normal).take(4))
        .collect();

    // Two counter-clockwise triangles per face
    for face in 0..6u32 {
        let base = face * 4;
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate a horizontal plane in the XZ plane
///
/// # Arguments
/// * `width` - Extent along X
/// * `depth` - Extent along Z
/// * `width_segments` - Number of subdivisions along X
/// * `depth_segments` - Number of subdivisions along Z
///
/// Returns a plane centered at the origin with its normal pointing up (+Y).
pub fn generate_plane(width: f32, depth: f32, width_segments: u32, depth_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let d_segs = depth_segments.max(1);

    for row in 0..=d_segs {
        let v = row as f32 / d_segs as f32;
        let pos_z = (v - 0.5) * depth;

        for col in 0..=w_segs {
            let u = col as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, 0.0, pos_z]);
            data.normals.push([0.0, 1.0, 0.0]);
        }
    }

    // Counter-clockwise when viewed from above
    for row in 0..d_segs {
        for col in 0..w_segs {
            let i = row * (w_segs + 1) + col;
            let next_row = i + w_segs + 1;

            data.indices.extend_from_slice(&[i, next_row, i + 1]);
            data.indices.extend_from_slice(&[next_row, next_row + 1, i + 1]);
        }
    }

    data
}

/// Generate the 12 edges of a box centered at the origin as a line list
///
/// # Arguments
/// * `size` - Full extent of the box along X, Y and Z
pub fn generate_box_edges(size: [f32; 3]) -> GeometryData {
    let mut data = GeometryData::new();
    let [hx, hy, hz] = [size[0] * 0.5, size[1] * 0.5, size[2] * 0.5];

    data.vertices = vec![
        [-hx, -hy, -hz],
        [hx, -hy, -hz],
        [hx, -hy, hz],
        [-hx, -hy, hz],
        [-hx, hy, -hz],
        [hx, hy, -hz],
        [hx, hy, hz],
        [-hx, hy, hz],
    ];

    #[rustfmt::skip]
    let indices = vec![
        // Bottom ring
        0, 1,  1, 2,  2, 3,  3, 0,
        // Top ring
        4, 5,  5, 6,  6, 7,  7, 4,
        // Verticals
        0, 4,  1, 5,  2, 6,  3, 7,
    ];
    data.indices = indices;

    data
}

/// Generate a square grid of lines in the XZ plane
///
/// # Arguments
/// * `size` - Full extent along X and Z
/// * `divisions` - Number of cells per side
pub fn generate_grid_lines(size: f32, divisions: u32) -> GeometryData {
    let mut data = GeometryData::new();
    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;

    for i in 0..=divisions {
        let offset = -half + i as f32 * step;
        let base = data.vertices.len() as u32;
        data.vertices.extend_from_slice(&[
            [offset, 0.0, -half],
            [offset, 0.0, half],
            [-half, 0.0, offset],
            [half, 0.0, offset],
        ]);
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 3]);
    }

    data
}
