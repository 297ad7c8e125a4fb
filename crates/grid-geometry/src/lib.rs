//! Grid geometry for NWP model domains.
//!
//! Every supported grid answers the same five questions: how many
//! points it has, which point is nearest a coordinate, where a point
//! sits geographically, what its 3×3 neighborhood is, and how large a
//! cell is locally. Terrain-aware lookup is built on those answers and
//! shared across all grid kinds.

pub mod gaussian;
pub mod laea;
pub mod lambert;
pub mod projection;
pub mod regular;
pub mod rotated;
pub mod stereographic;

pub use gaussian::GaussianGrid;
pub use laea::LambertAzimuthalProjection;
pub use lambert::LambertConformalProjection;
pub use projection::{Projection, ProjectionGrid};
pub use regular::RegularGrid;
pub use rotated::RotatedGrid;
pub use stereographic::StereographicProjection;

/// Maximum elevation mismatch accepted by terrain-optimised lookup, in
/// metres.
pub const TERRAIN_ELEVATION_TOLERANCE: f32 = 100.0;

/// Maximum horizontal displacement accepted by terrain-optimised
/// lookup, in cell units.
pub const TERRAIN_DISTANCE_CELLS: f64 = 1.5;

/// A model grid: a flat enumeration of cells with geographic lookup.
pub trait Grid: Send + Sync {
    /// Total number of grid points.
    fn count(&self) -> usize;

    /// Index of the grid point nearest to a coordinate, or `None` when
    /// the coordinate is outside the grid.
    fn find_point(&self, lat: f64, lon: f64) -> Option<usize>;

    /// Geographic coordinates (lat, lon) of a grid point.
    fn coordinates(&self, index: usize) -> (f64, f64);

    /// The up-to-3×3 neighborhood around a grid point, including the
    /// point itself. Neighbors outside the grid are omitted.
    fn neighborhood(&self, index: usize) -> Vec<usize>;

    /// Approximate local cell extent in degrees (dlat, dlon).
    fn cell_size_deg(&self, index: usize) -> (f64, f64);

    /// Nearest point whose surface elevation best matches a target.
    ///
    /// Searches the 3×3 neighborhood of the nearest point and accepts
    /// the neighbor minimising `|elev − target|`, provided the mismatch
    /// stays under 100 m and the neighbor lies within 1.5 cells of the
    /// requested coordinate. Over sea (target ≤ 0) the nearest sea
    /// point wins regardless of the target. Falls back to the nearest
    /// point.
    ///
    /// Returns the chosen index and its elevation from `elevations`,
    /// which must be indexed by grid point.
    fn find_point_terrain_optimised(
        &self,
        lat: f64,
        lon: f64,
        target_elevation: f32,
        elevations: &[f32],
    ) -> Option<(usize, f32)> {
        let nearest = self.find_point(lat, lon)?;
        let elev_of = |i: usize| elevations.get(i).copied().unwrap_or(f32::NAN);

        let (dlat_cell, dlon_cell) = self.cell_size_deg(nearest);
        let distance_cells = |i: usize| {
            let (plat, plon) = self.coordinates(i);
            let dy = (plat - lat) / dlat_cell;
            let mut dlon = plon - lon;
            if dlon > 180.0 {
                dlon -= 360.0;
            } else if dlon < -180.0 {
                dlon += 360.0;
            }
            let dx = dlon / dlon_cell;
            (dx * dx + dy * dy).sqrt()
        };

        let neighbors = self.neighborhood(nearest);

        if target_elevation <= 0.0 {
            // Sea location: the nearest sea point wins.
            let sea = neighbors
                .iter()
                .copied()
                .filter(|&i| elev_of(i) <= 0.0)
                .min_by(|&a, &b| distance_cells(a).total_cmp(&distance_cells(b)));
            if let Some(i) = sea {
                return Some((i, elev_of(i)));
            }
            return Some((nearest, elev_of(nearest)));
        }

        let best = neighbors
            .iter()
            .copied()
            .filter(|&i| {
                let e = elev_of(i);
                e.is_finite()
                    && (e - target_elevation).abs() < TERRAIN_ELEVATION_TOLERANCE
                    && distance_cells(i) <= TERRAIN_DISTANCE_CELLS
            })
            .min_by(|&a, &b| {
                (elev_of(a) - target_elevation)
                    .abs()
                    .total_cmp(&(elev_of(b) - target_elevation).abs())
            });

        match best {
            Some(i) => Some((i, elev_of(i))),
            None => Some((nearest, elev_of(nearest))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 0.02° grid around the Alps with a synthetic elevation field:
    /// the nearest cell to the query sits on a ridge while one neighbor
    /// lies in the valley.
    fn alpine_fixture() -> (RegularGrid, Vec<f32>) {
        let grid = RegularGrid::new(100, 100, 45.9, 7.7, 0.02, 0.02);
        let mut elev = vec![1006.0_f32; grid.count()];
        let center = grid.find_point(46.88, 8.67).unwrap();
        // One neighbor down in the valley, one further up.
        let n = grid.neighborhood(center);
        elev[n[0]] = 1710.0;
        elev[n[1]] = 600.0;
        (grid, elev)
    }

    #[test]
    fn test_terrain_optimised_prefers_matching_elevation() {
        let (grid, elev) = alpine_fixture();
        let (idx, model_elev) = grid
            .find_point_terrain_optimised(46.88, 8.67, 650.0, &elev)
            .unwrap();
        assert_eq!(model_elev, 600.0);
        assert_ne!(idx, grid.find_point(46.88, 8.67).unwrap());
    }

    #[test]
    fn test_nearest_selection_ignores_elevation() {
        let (grid, elev) = alpine_fixture();
        let nearest = grid.find_point(46.88, 8.67).unwrap();
        assert_eq!(elev[nearest], 1006.0);
    }

    #[test]
    fn test_terrain_optimised_falls_back_when_out_of_tolerance() {
        let (grid, elev) = alpine_fixture();
        // 2500 m target: no neighbor within 100 m, nearest wins.
        let (idx, model_elev) = grid
            .find_point_terrain_optimised(46.88, 8.67, 2500.0, &elev)
            .unwrap();
        assert_eq!(idx, grid.find_point(46.88, 8.67).unwrap());
        assert_eq!(model_elev, 1006.0);
    }

    #[test]
    fn test_sea_rule_prefers_sea_points() {
        let grid = RegularGrid::new(10, 10, 53.0, 4.0, 0.1, 0.1);
        let mut elev = vec![12.0_f32; grid.count()];
        let nearest = grid.find_point(53.5, 4.5).unwrap();
        let neighbors = grid.neighborhood(nearest);
        elev[neighbors[2]] = -2.0;
        let (idx, model_elev) = grid
            .find_point_terrain_optimised(53.5, 4.5, 0.0, &elev)
            .unwrap();
        assert_eq!(idx, neighbors[2]);
        assert!(model_elev <= 0.0);
    }
}
