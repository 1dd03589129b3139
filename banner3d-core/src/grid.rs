//! Grid layout for the banner cubes
//!
//! Cells are laid out on the XZ plane: columns run along +X, rows along +Z.
//! Cell `(row, column)` has index `row * columns + column`.
use std::sync::Arc;

use nalgebra::{Matrix4, Point3};

use crate::error::{BannerError, Result};
use crate::geometry::Mesh;
use crate::material::Material;
use crate::scene::{InstancedMesh, Node};
use crate::transform::Transform;

/// Largest grid accepted, in cells
pub const MAX_CELLS: u64 = 250_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub rows: u32,
    pub columns: u32,
    pub cell_width: f32,
    pub cell_depth: f32,
    pub gap: f32,
    pub center: Point3<f32>,
}

impl GridLayout {
    pub fn new(
        rows: u32,
        columns: u32,
        cell_width: f32,
        cell_depth: f32,
        gap: f32,
        center: Point3<f32>,
    ) -> Result<Self> {
        if rows == 0 || columns == 0 {
            return Err(BannerError::InvalidGrid(format!(
                "grid needs at least one cell, got {rows} rows x {columns} columns"
            )));
        }
        let cells = u64::from(rows) * u64::from(columns);
        if cells > MAX_CELLS {
            return Err(BannerError::InvalidGrid(format!(
                "{rows} rows x {columns} columns is {cells} cells, more than {MAX_CELLS}"
            )));
        }
        if !(cell_width > 0.0 && cell_depth > 0.0) {
            return Err(BannerError::InvalidGrid(format!(
                "cell size must be positive, got {cell_width}x{cell_depth}"
            )));
        }
        if !(gap >= 0.0) {
            return Err(BannerError::InvalidGrid(format!(
                "gap must not be negative, got {gap}"
            )));
        }
        Ok(Self {
            rows,
            columns,
            cell_width,
            cell_depth,
            gap,
            center,
        })
    }

    /// Take the cell footprint from the mesh's bounding box.
    pub fn for_mesh(
        rows: u32,
        columns: u32,
        mesh: &Mesh,
        gap: f32,
        center: Point3<f32>,
    ) -> Result<Self> {
        let size = mesh.bounds().size();
        Self::new(rows, columns, size.x, size.z, gap, center)
    }

    pub fn len(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full extent along X and Z, gaps included.
    pub fn extent(&self) -> (f32, f32) {
        (
            (self.cell_width + self.gap) * self.columns as f32,
            (self.cell_depth + self.gap) * self.rows as f32,
        )
    }

    /// World position of a cell's center; the grid is centered on `center`.
    pub fn position(&self, row: u32, column: u32) -> Point3<f32> {
        let (full_width, full_depth) = self.extent();
        let pitch_x = self.cell_width + self.gap;
        let pitch_z = self.cell_depth + self.gap;
        Point3::new(
            self.center.x + column as f32 * pitch_x + pitch_x / 2.0 - full_width / 2.0,
            self.center.y,
            self.center.z + row as f32 * pitch_z + pitch_z / 2.0 - full_depth / 2.0,
        )
    }

    pub fn index(&self, row: u32, column: u32) -> usize {
        row as usize * self.columns as usize + column as usize
    }

    /// `(row, column)` of an index, `None` past the last cell.
    pub fn cell(&self, index: usize) -> Option<(u32, u32)> {
        if index >= self.len() {
            return None;
        }
        let columns = self.columns as usize;
        Some(((index / columns) as u32, (index % columns) as u32))
    }

    /// Every cell position in index order.
    pub fn positions(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.columns).map(move |column| self.position(row, column)))
    }
}

/// One cube node per cell, in index order. All cubes share `mesh`.
pub fn create_cubes(layout: &GridLayout, mesh: Arc<Mesh>, material: Material) -> Vec<Node> {
    let base = Node::new(mesh, material);
    layout
        .positions()
        .map(|position| {
            let mut cube = base.clone();
            cube.transform = Transform::from_position(position);
            cube
        })
        .collect()
}

/// The whole grid as a single instanced mesh.
pub fn create_instanced_cubes(
    layout: &GridLayout,
    mesh: Arc<Mesh>,
    material: Material,
) -> InstancedMesh {
    let mut cubes = InstancedMesh::new(mesh, material, layout.len());
    for (index, position) in layout.positions().enumerate() {
        cubes.set_matrix_at(index, Matrix4::new_translation(&position.coords));
    }
    cubes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banner_layout() -> GridLayout {
        GridLayout::new(145, 145, 100.0, 100.0, 10.0, Point3::origin()).unwrap()
    }

    #[test]
    fn test_positions_are_symmetric_about_center() {
        let layout = banner_layout();
        for (row, column) in [(0, 0), (3, 140), (72, 72), (144, 0)] {
            let p = layout.position(row, column);
            let mirror = layout.position(layout.rows - 1 - row, layout.columns - 1 - column);
            assert!((p.x + mirror.x).abs() < 1e-2, "x not mirrored at ({row}, {column})");
            assert!((p.z + mirror.z).abs() < 1e-2, "z not mirrored at ({row}, {column})");
        }
        // Odd dimensions put the middle cell on the origin
        let middle = layout.position(72, 72);
        assert!(middle.coords.norm() < 1e-2);
    }

    #[test]
    fn test_neighbouring_cells_are_one_pitch_apart() {
        let layout = banner_layout();
        let a = layout.position(10, 20);
        let b = layout.position(10, 21);
        let c = layout.position(11, 20);
        assert!((b.x - a.x - 110.0).abs() < 1e-2);
        assert!((c.z - a.z - 110.0).abs() < 1e-2);
        assert_eq!(a.y, 0.0);
    }

    #[test]
    fn test_center_offsets_every_cell() {
        let center = Point3::new(5.0, -3.0, 7.0);
        let layout = GridLayout::new(2, 4, 10.0, 10.0, 2.0, center).unwrap();
        let first = layout.position(0, 0);
        let last = layout.position(1, 3);
        assert!(((first.x + last.x) / 2.0 - center.x).abs() < 1e-4);
        assert!(((first.z + last.z) / 2.0 - center.z).abs() < 1e-4);
        assert_eq!(first.y, -3.0);
    }

    #[test]
    fn test_index_and_cell_agree() {
        let layout = GridLayout::new(3, 5, 1.0, 1.0, 0.0, Point3::origin()).unwrap();
        assert_eq!(layout.index(2, 4), 14);
        assert_eq!(layout.cell(14), Some((2, 4)));
        assert_eq!(layout.cell(15), None);
    }

    #[test]
    fn test_rejects_empty_grid() {
        assert!(GridLayout::new(0, 5, 1.0, 1.0, 0.0, Point3::origin()).is_err());
        assert!(GridLayout::new(5, 5, 0.0, 1.0, 0.0, Point3::origin()).is_err());
        assert!(GridLayout::new(5, 5, 1.0, 1.0, -1.0, Point3::origin()).is_err());
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let origin = Point3::origin();
        assert!(GridLayout::new(500, 500, 1.0, 1.0, 0.0, origin).is_ok());
        assert!(matches!(
            GridLayout::new(501, 500, 1.0, 1.0, 0.0, origin),
            Err(BannerError::InvalidGrid(_))
        ));
        assert!(matches!(
            GridLayout::new(u32::MAX, u32::MAX, 1.0, 1.0, 0.0, origin),
            Err(BannerError::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_for_mesh_uses_bounding_box() {
        let mesh = Mesh::rounded_box(100.0, 100.0, 100.0, 2, 6.0).unwrap();
        let layout = GridLayout::for_mesh(4, 4, &mesh, 10.0, Point3::origin()).unwrap();
        assert!((layout.cell_width - 100.0).abs() < 1e-3);
        assert!((layout.cell_depth - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_create_cubes_in_index_order() {
        let layout = GridLayout::new(3, 4, 10.0, 10.0, 1.0, Point3::origin()).unwrap();
        let mesh = Arc::new(Mesh::rounded_box(10.0, 10.0, 10.0, 1, 1.0).unwrap());
        let cubes = create_cubes(&layout, mesh.clone(), Material::glass());
        assert_eq!(cubes.len(), 12);
        let expected = layout.position(2, 1);
        assert_eq!(cubes[layout.index(2, 1)].transform.position, expected.coords);

        let instanced = create_instanced_cubes(&layout, mesh, Material::glass());
        assert_eq!(instanced.count(), 12);
        let origin = instanced.transforms[7].transform_point(&Point3::origin());
        assert_eq!(origin, layout.position(1, 3));
    }
}
