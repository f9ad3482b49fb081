//! Synthetic grid-world trajectories.
//!
//! States are `1 x size x size` images with a single lit cell at the agent's
//! position; the goal is the bottom-right corner.

use levin_loss::{ImageState, LevinLossResult, Trajectory};
use Move::{Down, Right};

/// Up, down, left, right.
pub const GRID_ACTIONS: usize = 4;

#[derive(Debug, Clone, Copy)]
enum Move {
    Down,
    Right,
}

impl Move {
    const fn action(self) -> usize {
        match self {
            Self::Down => 1,
            Self::Right => 3,
        }
    }
}

fn grid_state(size: usize, row: usize, col: usize) -> LevinLossResult<ImageState> {
    let mut data = vec![0.0; size * size];
    data[row * size + col] = 1.0;
    ImageState::new([1, size, size], data)
}

/// Walks `moves` from the top-left corner, recording every visited state
/// including the goal.
fn walk(
    size: usize,
    moves: &[Move],
    solution_pi: f64,
    expanded: f64,
) -> LevinLossResult<Trajectory<ImageState>> {
    let (mut row, mut col) = (0, 0);
    let mut states = vec![grid_state(size, row, col)?];
    for &step in moves {
        match step {
            Down => row += 1,
            Right => col += 1,
        }
        states.push(grid_state(size, row, col)?);
    }

    let goal_distance = moves.len();
    let solution_costs = (0..states.len())
        .map(|step| (goal_distance - step) as f64)
        .collect();

    let actions = moves.iter().map(|step| step.action()).collect();
    Trajectory::new(states, actions, solution_pi, expanded, solution_costs)
}

/// Two solved 3x3 episodes with differing search effort.
pub fn sample_trajectories() -> LevinLossResult<Vec<Trajectory<ImageState>>> {
    Ok(vec![
        walk(3, &[Down, Down, Right, Right], 0.05, 42.0)?,
        walk(3, &[Right, Down, Right, Down], 0.2, 9.0)?,
    ])
}
