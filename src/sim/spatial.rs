//! Spatial Query Service
//!
//! The simulation never inspects the level directly. It asks a
//! [`SpatialQuery`] whether a point is walkable, whether two points can see
//! each other, and where the nearest safe point is. Level generation and
//! pathfinding live outside this crate; [`TileGrid`] is a small grid
//! implementation used by the headless runner and the tests, and
//! [`OpenField`] is the "no level loaded" fallback where everything passes.

use bevy::prelude::*;
use std::sync::Arc;

use super::constants::NEAREST_WALKABLE_SEARCH_RADIUS;

/// Contract consumed from the level/world collaborator.
pub trait SpatialQuery: Send + Sync + 'static {
    /// True iff the tile containing `point` can be occupied.
    fn is_walkable(&self, point: Vec2) -> bool;

    /// True iff no blocking tile lies between the two points.
    fn has_line_of_sight(&self, from: Vec2, to: Vec2) -> bool;

    /// Nearest walkable point to `point` (the point itself if already walkable).
    fn clamp_position(&self, point: Vec2) -> Vec2 {
        if self.is_walkable(point) {
            return point;
        }
        nearest_walkable(self, point).unwrap_or(point)
    }

    /// Where stranded party members are sent, if the level has one.
    fn spawn_point(&self) -> Option<Vec2> {
        None
    }

    /// Level size in tiles, if bounded.
    fn bounds(&self) -> Option<Vec2> {
        None
    }
}

/// Tile containing a point.
pub fn tile_of(point: Vec2) -> IVec2 {
    IVec2::new(point.x.floor() as i32, point.y.floor() as i32)
}

fn tile_center(tile: IVec2) -> Vec2 {
    Vec2::new(tile.x as f32 + 0.5, tile.y as f32 + 0.5)
}

/// Expanding ring search for the closest walkable tile center.
pub fn nearest_walkable<S: SpatialQuery + ?Sized>(space: &S, point: Vec2) -> Option<Vec2> {
    let origin = tile_of(point);
    for radius in 1..=NEAREST_WALKABLE_SEARCH_RADIUS {
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                // Perimeter of the ring only
                if dx.abs() != radius && dy.abs() != radius {
                    continue;
                }
                let candidate = tile_center(origin + IVec2::new(dx, dy));
                if space.is_walkable(candidate) {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

/// Unbounded level where every point is walkable and visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenField;

impl SpatialQuery for OpenField {
    fn is_walkable(&self, _point: Vec2) -> bool {
        true
    }

    fn has_line_of_sight(&self, _from: Vec2, _to: Vec2) -> bool {
        true
    }
}

/// Rectangular tile level. Out-of-bounds tiles are walls.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: i32,
    height: i32,
    walkable: Vec<bool>,
    spawn: Option<Vec2>,
}

impl TileGrid {
    /// Every tile walkable.
    pub fn open(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            walkable: vec![true; (width * height).max(0) as usize],
            spawn: None,
        }
    }

    /// Parse a level from text rows: `#` wall, `.` floor, `S` floor + spawn point.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, String> {
        let height = rows.len();
        if height == 0 {
            return Err("level must have at least one row".to_string());
        }
        let width = rows[0].as_ref().chars().count();
        if width == 0 {
            return Err("level rows must not be empty".to_string());
        }

        let mut walkable = Vec::with_capacity(width * height);
        let mut spawn = None;
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(format!(
                    "row {} has {} tiles, expected {}",
                    y,
                    row.chars().count(),
                    width
                ));
            }
            for (x, c) in row.chars().enumerate() {
                match c {
                    '#' => walkable.push(false),
                    '.' => walkable.push(true),
                    'S' => {
                        walkable.push(true);
                        spawn = Some(tile_center(IVec2::new(x as i32, y as i32)));
                    }
                    other => {
                        return Err(format!("unknown tile '{}' at ({}, {})", other, x, y));
                    }
                }
            }
        }

        Ok(Self {
            width: width as i32,
            height: height as i32,
            walkable,
            spawn,
        })
    }

    pub fn set_walkable(&mut self, tile: IVec2, walkable: bool) {
        if let Some(index) = self.index(tile) {
            self.walkable[index] = walkable;
        }
    }

    pub fn set_spawn(&mut self, spawn: Vec2) {
        self.spawn = Some(spawn);
    }

    fn index(&self, tile: IVec2) -> Option<usize> {
        if tile.x < 0 || tile.y < 0 || tile.x >= self.width || tile.y >= self.height {
            return None;
        }
        Some((tile.y * self.width + tile.x) as usize)
    }

    fn tile_walkable(&self, tile: IVec2) -> bool {
        self.index(tile).map(|i| self.walkable[i]).unwrap_or(false)
    }
}

impl SpatialQuery for TileGrid {
    fn is_walkable(&self, point: Vec2) -> bool {
        self.tile_walkable(tile_of(point))
    }

    /// Bresenham walk over tiles. A diagonal step needs both side tiles open,
    /// so sight can't slip between two walls touching at a corner.
    fn has_line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        let start = tile_of(from);
        let end = tile_of(to);
        if start == end {
            return true;
        }

        let dx = (end.x - start.x).abs();
        let dy = (end.y - start.y).abs();
        let step = IVec2::new((end.x - start.x).signum(), (end.y - start.y).signum());

        let mut current = start;
        if dx >= dy {
            let mut error = dx / 2;
            while current.x != end.x {
                let previous = current;
                current.x += step.x;
                error -= dy;
                if error < 0 {
                    current.y += step.y;
                    error += dx;
                    if !self.tile_walkable(IVec2::new(current.x, previous.y))
                        || !self.tile_walkable(IVec2::new(previous.x, current.y))
                    {
                        return false;
                    }
                }
                if !self.tile_walkable(current) {
                    return false;
                }
            }
        } else {
            let mut error = dy / 2;
            while current.y != end.y {
                let previous = current;
                current.y += step.y;
                error -= dx;
                if error < 0 {
                    current.x += step.x;
                    error += dy;
                    if !self.tile_walkable(IVec2::new(current.x, previous.y))
                        || !self.tile_walkable(IVec2::new(previous.x, current.y))
                    {
                        return false;
                    }
                }
                if !self.tile_walkable(current) {
                    return false;
                }
            }
        }
        true
    }

    fn spawn_point(&self) -> Option<Vec2> {
        self.spawn
    }

    fn bounds(&self) -> Option<Vec2> {
        Some(Vec2::new(self.width as f32, self.height as f32))
    }
}

/// Resource handle to the active spatial service.
#[derive(Resource, Clone)]
pub struct Spatial(pub Arc<dyn SpatialQuery>);

impl Spatial {
    pub fn new(query: impl SpatialQuery) -> Self {
        Self(Arc::new(query))
    }
}

impl Default for Spatial {
    fn default() -> Self {
        Self::new(OpenField)
    }
}

impl std::ops::Deref for Spatial {
    type Target = dyn SpatialQuery;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> TileGrid {
        TileGrid::from_rows(&[
            "#######",
            "#S....#",
            "#..#..#",
            "#..#..#",
            "#######",
        ])
        .unwrap()
    }

    #[test]
    fn test_walls_and_bounds_are_not_walkable() {
        let grid = level();
        assert!(grid.is_walkable(Vec2::new(1.5, 1.5)));
        assert!(!grid.is_walkable(Vec2::new(3.5, 2.5)));
        assert!(!grid.is_walkable(Vec2::new(-0.5, 1.5)));
        assert!(!grid.is_walkable(Vec2::new(10.0, 1.5)));
        assert_eq!(grid.spawn_point(), Some(Vec2::new(1.5, 1.5)));
    }

    #[test]
    fn test_wall_blocks_line_of_sight() {
        let grid = level();
        assert!(!grid.has_line_of_sight(Vec2::new(1.5, 2.5), Vec2::new(5.5, 2.5)));
        assert!(grid.has_line_of_sight(Vec2::new(1.5, 1.5), Vec2::new(5.5, 1.5)));
        assert!(grid.has_line_of_sight(Vec2::new(2.2, 2.5), Vec2::new(2.8, 2.5)));
    }

    #[test]
    fn test_clamp_position_finds_nearest_floor() {
        let grid = level();
        let clamped = grid.clamp_position(Vec2::new(3.5, 3.5));
        assert!(grid.is_walkable(clamped));
        assert!(clamped.distance(Vec2::new(3.5, 3.5)) < 1.5);

        let already_ok = Vec2::new(4.2, 1.7);
        assert_eq!(grid.clamp_position(already_ok), already_ok);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = TileGrid::from_rows(&["###", "#."]).unwrap_err();
        assert!(err.contains("row 1"));
    }
}
