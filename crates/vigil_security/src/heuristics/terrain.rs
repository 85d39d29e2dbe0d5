//! Blocks a player's bounding box touches.

use vigil_core::constants::{PLAYER_HEIGHT, PLAYER_WIDTH};
use vigil_core::{BlockPos, Location, Material};

use crate::host::WorldView;

fn footprint(at: Location, wide: bool) -> (i32, i32, i32, i32) {
    let half = PLAYER_WIDTH / 2.0;
    let x0 = (at.x - half).floor() as i32;
    let z0 = (at.z - half).floor() as i32;
    if wide {
        (x0, x0 + 1, z0, z0 + 1)
    } else {
        (x0, (at.x + half).floor() as i32, z0, (at.z + half).floor() as i32)
    }
}

fn collect<W: WorldView + ?Sized>(
    world: &W,
    xs: (i32, i32),
    ys: (i32, i32),
    zs: (i32, i32),
) -> Vec<Material> {
    let mut blocks = Vec::new();
    for y in ys.0..=ys.1 {
        for x in xs.0..=xs.1 {
            for z in zs.0..=zs.1 {
                // Unloaded chunks are skipped
                if let Some(material) = world.block_at(BlockPos::new(x, y, z)) {
                    blocks.push(material);
                }
            }
        }
    }
    blocks
}

/// Blocks overlapping the player's body, feet to head.
pub(crate) fn body_blocks<W: WorldView + ?Sized>(world: &W, at: Location) -> Vec<Material> {
    let (x0, x1, z0, z1) = footprint(at, false);
    let y0 = at.y.floor() as i32;
    let y1 = ((at.y + PLAYER_HEIGHT).floor() as i32).max(y0 + 1);
    collect(world, (x0, x1), (y0, y1), (z0, z1))
}

/// Blocks under the player's feet, including the neighbouring columns.
pub(crate) fn floor_blocks<W: WorldView + ?Sized>(world: &W, at: Location) -> Vec<Material> {
    let (x0, x1, z0, z1) = footprint(at, true);
    let y = at.y.floor() as i32 - 1;
    collect(world, (x0, x1), (y, y), (z0, z1))
}
