//! Random on-screen placement for replicated toasts.

use popcast_core::presenter::Placement;
use popcast_core::{Bounds, Position};
use rand::RngExt;

#[derive(Debug, Clone, Copy)]
pub struct RandomPlacement {
    bounds: Bounds,
}

impl RandomPlacement {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Placement for RandomPlacement {
    fn place(&mut self) -> Position {
        let (max_x, max_y) = self.bounds.max_origin();
        let mut rng = rand::rng();
        self.bounds
            .clamp(rng.random_range(0..max_x), rng.random_range(0..max_y))
    }
}
