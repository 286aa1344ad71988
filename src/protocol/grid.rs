//! The Minesweeper grid: tiles, neighbor geometry, and the masked/unmasked
//! snapshot views handed to players and spectators respectively.

use serde::{Deserialize, Serialize};

/// A single grid coordinate. `x` is the column, `z` the row (matching the
/// client's 3D world axes, where the grid lies flat on the X/Z plane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub z: i32,
}

impl Coord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tile {
    pub is_mine: bool,
    pub is_revealed: bool,
    pub neighbor_mines: u8,
}

/// A fixed N×N grid of tiles, stored row-major.
#[derive(Debug, Clone)]
pub struct Grid {
    size: i32,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(size: i32) -> Self {
        let area = (size * size).max(0) as usize;
        Self {
            size,
            tiles: vec![Tile::default(); area],
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn area(&self) -> i32 {
        self.size * self.size
    }

    pub fn in_bounds(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && x < self.size && z < self.size
    }

    fn index(&self, x: i32, z: i32) -> usize {
        (z * self.size + x) as usize
    }

    pub fn tile(&self, x: i32, z: i32) -> &Tile {
        &self.tiles[self.index(x, z)]
    }

    pub fn tile_mut(&mut self, x: i32, z: i32) -> &mut Tile {
        let idx = self.index(x, z);
        &mut self.tiles[idx]
    }

    /// All in-bounds coordinates, row-major.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        let size = self.size;
        (0..size).flat_map(move |z| (0..size).map(move |x| Coord::new(x, z)))
    }

    /// The closed 3×3 neighborhood of `(x, z)` (including the tile itself),
    /// clipped to the grid bounds.
    pub fn closed_neighborhood(&self, x: i32, z: i32) -> Vec<Coord> {
        let mut out = Vec::with_capacity(9);
        for dz in -1..=1 {
            for dx in -1..=1 {
                let nx = x + dx;
                let nz = z + dz;
                if self.in_bounds(nx, nz) {
                    out.push(Coord::new(nx, nz));
                }
            }
        }
        out
    }

    /// The 8-neighborhood of `(x, z)` (excluding the tile itself), clipped
    /// to the grid bounds.
    pub fn open_neighbors(&self, x: i32, z: i32) -> impl Iterator<Item = Coord> + '_ {
        self.closed_neighborhood(x, z)
            .into_iter()
            .filter(move |c| !(c.x == x && c.z == z))
    }

    pub fn count_mines(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_mine).count()
    }
}

/// A single revealed-tile record as delivered to players and journaled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RevealedTile {
    pub x: i32,
    pub z: i32,
    #[serde(rename = "isMine")]
    pub is_mine: bool,
    #[serde(rename = "neighborMines")]
    pub neighbor_mines: u8,
}

/// A masked tile as seen by players: unrevealed tiles hide `isMine` and
/// `neighborMines` entirely (invariant 7 / testable property 8).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClientTile {
    pub x: i32,
    pub z: i32,
    #[serde(rename = "isRevealed")]
    pub is_revealed: bool,
    #[serde(rename = "isMine", skip_serializing_if = "Option::is_none")]
    pub is_mine: Option<bool>,
    #[serde(rename = "neighborMines", skip_serializing_if = "Option::is_none")]
    pub neighbor_mines: Option<u8>,
}

/// The unmasked "god view" tile as seen by spectators and admins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpectatorTile {
    pub x: i32,
    pub z: i32,
    #[serde(rename = "isRevealed")]
    pub is_revealed: bool,
    #[serde(rename = "isMine")]
    pub is_mine: bool,
    #[serde(rename = "neighborMines")]
    pub neighbor_mines: u8,
}

impl Grid {
    pub fn client_view(&self) -> Vec<ClientTile> {
        self.coords()
            .map(|c| {
                let t = self.tile(c.x, c.z);
                ClientTile {
                    x: c.x,
                    z: c.z,
                    is_revealed: t.is_revealed,
                    is_mine: t.is_revealed.then_some(t.is_mine),
                    neighbor_mines: t.is_revealed.then_some(t.neighbor_mines),
                }
            })
            .collect()
    }

    pub fn spectator_view(&self) -> Vec<SpectatorTile> {
        self.coords()
            .map(|c| {
                let t = self.tile(c.x, c.z);
                SpectatorTile {
                    x: c.x,
                    z: c.z,
                    is_revealed: t.is_revealed,
                    is_mine: t.is_mine,
                    neighbor_mines: t.neighbor_mines,
                }
            })
            .collect()
    }

    pub fn all_mines(&self) -> Vec<Coord> {
        self.coords().filter(|c| self.tile(c.x, c.z).is_mine).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_neighborhood_clips_to_bounds() {
        let grid = Grid::new(5);
        let corner = grid.closed_neighborhood(0, 0);
        assert_eq!(corner.len(), 4, "corner tile has only 4 tiles in its closed 3x3");

        let center = grid.closed_neighborhood(2, 2);
        assert_eq!(center.len(), 9, "interior tile has a full 3x3 neighborhood");
    }

    #[test]
    fn open_neighbors_excludes_self() {
        let grid = Grid::new(5);
        let neighbors: Vec<_> = grid.open_neighbors(2, 2).collect();
        assert_eq!(neighbors.len(), 8);
        assert!(!neighbors.contains(&Coord::new(2, 2)));
    }

    #[test]
    fn client_view_masks_unrevealed_tiles() {
        let mut grid = Grid::new(3);
        grid.tile_mut(1, 1).is_mine = true;
        grid.tile_mut(1, 1).neighbor_mines = 0;
        grid.tile_mut(0, 0).is_revealed = true;
        grid.tile_mut(0, 0).neighbor_mines = 1;

        let view = grid.client_view();
        let hidden = view.iter().find(|t| t.x == 1 && t.z == 1).unwrap();
        assert!(hidden.is_mine.is_none());
        assert!(hidden.neighbor_mines.is_none());

        let revealed = view.iter().find(|t| t.x == 0 && t.z == 0).unwrap();
        assert_eq!(revealed.is_mine, Some(false));
        assert_eq!(revealed.neighbor_mines, Some(1));
    }

    #[test]
    fn spectator_view_never_masks() {
        let mut grid = Grid::new(3);
        grid.tile_mut(1, 1).is_mine = true;
        let view = grid.spectator_view();
        let tile = view.iter().find(|t| t.x == 1 && t.z == 1).unwrap();
        assert!(tile.is_mine);
    }
}
