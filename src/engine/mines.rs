//! Mine placement and neighbor counting.
//!
//! Placement is deferred until the first accepted reveal of a game
//! (first-click safety, invariant 2). Rather than retrying on collisions
//! until `mines_count` mines land outside the safe zone, legal positions are
//! shuffled and the first `mines_count` are taken — behaviourally
//! indistinguishable from rejection sampling and immune to the pathological
//! worst case of a dense grid (§9, "Random mine placement").

use std::collections::{HashSet, VecDeque};

use rand::seq::SliceRandom;

use crate::protocol::grid::{Coord, Grid, RevealedTile};

/// Place `mines_count` mines outside the closed 3x3 neighborhood of
/// `(safe_x, safe_z)`, then compute `neighbor_mines` for every non-mine
/// tile. No-op (beyond the neighbor-count pass) if more mines are requested
/// than legal positions exist; that is a config-validation error, not an
/// engine-runtime one (see `EngineConfig::validate`).
pub fn place_mines(grid: &mut Grid, safe_x: i32, safe_z: i32, mines_count: i32) {
    let safe_zone: HashSet<Coord> = grid.closed_neighborhood(safe_x, safe_z).into_iter().collect();
    let mut candidates: Vec<Coord> = grid.coords().filter(|c| !safe_zone.contains(c)).collect();

    let mut rng = rand::rng();
    candidates.shuffle(&mut rng);

    let count = mines_count.max(0) as usize;
    for coord in candidates.into_iter().take(count) {
        grid.tile_mut(coord.x, coord.z).is_mine = true;
    }

    compute_neighbor_counts(grid);
}

fn compute_neighbor_counts(grid: &mut Grid) {
    let coords: Vec<Coord> = grid.coords().collect();
    for c in coords {
        if grid.tile(c.x, c.z).is_mine {
            continue;
        }
        let count = grid
            .open_neighbors(c.x, c.z)
            .filter(|n| grid.tile(n.x, n.z).is_mine)
            .count() as u8;
        grid.tile_mut(c.x, c.z).neighbor_mines = count;
    }
}

/// Reveal `(x, z)` and, if it has zero adjacent mines, cascade outward
/// through every zero-neighbor-mine tile reachable via the 8-neighborhood
/// (flood reveal). An explicit worklist is used instead of recursion so a
/// pathological grid cannot overflow the stack (§9, "Flood fill").
///
/// Returns the ordered list of newly revealed tiles, click site first.
/// Tiles already revealed are never re-visited or re-emitted.
pub fn flood_reveal(grid: &mut Grid, x: i32, z: i32) -> Vec<RevealedTile> {
    let mut revealed = Vec::new();
    let mut queue = VecDeque::new();
    let mut queued: HashSet<Coord> = HashSet::new();

    let start = Coord::new(x, z);
    queue.push_back(start);
    queued.insert(start);

    while let Some(c) = queue.pop_front() {
        if grid.tile(c.x, c.z).is_revealed {
            continue;
        }

        let tile = grid.tile_mut(c.x, c.z);
        tile.is_revealed = true;
        let is_mine = tile.is_mine;
        let neighbor_mines = tile.neighbor_mines;

        revealed.push(RevealedTile {
            x: c.x,
            z: c.z,
            is_mine,
            neighbor_mines,
        });

        if !is_mine && neighbor_mines == 0 {
            for n in grid.open_neighbors(c.x, c.z) {
                if !grid.tile(n.x, n.z).is_revealed && queued.insert(n) {
                    queue.push_back(n);
                }
            }
        }
    }

    revealed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_mines_respects_safe_zone_and_count() {
        for _ in 0..50 {
            let mut grid = Grid::new(8);
            place_mines(&mut grid, 4, 4, 10);

            assert_eq!(grid.count_mines(), 10);
            for c in grid.closed_neighborhood(4, 4) {
                assert!(!grid.tile(c.x, c.z).is_mine, "safe zone tile {c:?} has a mine");
            }
        }
    }

    #[test]
    fn neighbor_counts_match_actual_adjacency() {
        let mut grid = Grid::new(6);
        place_mines(&mut grid, 0, 0, 8);

        for c in grid.coords() {
            let tile = grid.tile(c.x, c.z);
            if tile.is_mine {
                continue;
            }
            let expected = grid
                .open_neighbors(c.x, c.z)
                .filter(|n| grid.tile(n.x, n.z).is_mine)
                .count() as u8;
            assert_eq!(tile.neighbor_mines, expected, "mismatch at {c:?}");
        }
    }

    #[test]
    fn flood_reveal_only_descends_through_zero_tiles() {
        let mut grid = Grid::new(5);
        place_mines(&mut grid, 0, 0, 1);
        let revealed = flood_reveal(&mut grid, 0, 0);

        assert!(!revealed.is_empty());
        assert_eq!(revealed[0].x, 0);
        assert_eq!(revealed[0].z, 0);

        // Every revealed tile besides the click site must be reachable
        // through a chain of zero-neighbor tiles.
        let revealed_coords: HashSet<Coord> =
            revealed.iter().map(|t| Coord::new(t.x, t.z)).collect();
        for t in &revealed {
            if t.x == 0 && t.z == 0 {
                continue;
            }
            let coord = Coord::new(t.x, t.z);
            let has_zero_neighbor = grid
                .open_neighbors(coord.x, coord.z)
                .any(|n| revealed_coords.contains(&n) && grid.tile(n.x, n.z).neighbor_mines == 0);
            assert!(has_zero_neighbor, "{coord:?} unreachable via zero-tile cascade");
        }
    }

    #[test]
    fn flood_reveal_stops_at_mine_click() {
        let mut grid = Grid::new(5);
        grid.tile_mut(2, 2).is_mine = true;
        let revealed = flood_reveal(&mut grid, 2, 2);
        assert_eq!(revealed.len(), 1);
        assert!(revealed[0].is_mine);
    }

    #[test]
    fn flood_reveal_never_revisits_a_tile() {
        let mut grid = Grid::new(5);
        place_mines(&mut grid, 0, 0, 0);
        let revealed = flood_reveal(&mut grid, 0, 0);
        let mut seen = HashSet::new();
        for t in &revealed {
            assert!(seen.insert((t.x, t.z)), "tile ({},{}) revealed twice", t.x, t.z);
        }
    }
}
