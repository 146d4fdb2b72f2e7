use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::random::{random_color, random_point, random_points};

#[derive(Debug, thiserror::Error)]
pub enum DnaError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("no stashed snapshot on this polygon")]
    NoSnapshot,
}

/// a vertex. coordinates are pixel indices bounded by the canvas, so a vertex is
/// always addressable in the target buffer. replaced wholesale during mutation,
/// never edited in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// un-premultiplied fill color, all four channels 0..=255.
/// the byte convention matches the scorer's interleaved-RGBA buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// owned copy of a polygon's points + color, held while a trial mutation is live
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    points: Vec<Point>,
    color: Color,
}

/// explicit stash state machine. the stash-before-mutate discipline is enforced
/// here rather than by caller convention: mutate/pop in `Clean` fail with
/// `NoSnapshot` instead of silently corrupting the polygon.
#[derive(Clone, Debug, Default)]
pub enum MutationState {
    #[default]
    Clean,
    Pending(Snapshot),
}

/// a polygon with a fixed vertex count (>= 3) and a uniform translucent fill.
/// insertion order of vertices defines winding; array order in the genome
/// defines draw order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
    pub color: Color,

    // trial-mutation bookkeeping, never persisted
    #[serde(skip)]
    state: MutationState,
}

impl Polygon {
    /// vertex count is fixed for the polygon's lifetime, so it is validated once here
    pub fn new(points: Vec<Point>, color: Color) -> Result<Self, DnaError> {
        if points.len() < 3 {
            return Err(DnaError::InvalidArgument("polygon needs at least 3 vertices"));
        }
        Ok(Self {
            points,
            color,
            state: MutationState::Clean,
        })
    }

    pub fn random<R: Rng>(
        rng: &mut R,
        num_points: usize,
        width: u32,
        height: u32,
    ) -> Result<Self, DnaError> {
        Self::new(random_points(rng, num_points, width, height), random_color(rng))
    }

    /// capture a deep copy of the current points + color. overwriting a prior
    /// snapshot is legal: it is exactly the accept path, where the kept mutation
    /// becomes the new baseline for the next trial.
    pub fn stash(&mut self) {
        profiling::scope!("stash");
        self.state = MutationState::Pending(Snapshot {
            points: self.points.clone(),
            color: self.color,
        });
    }

    /// apply exactly one atomic perturbation: with probability `p_recolor` replace
    /// the fill color, otherwise replace one randomly-chosen vertex with a fresh
    /// random point. one small step per call keeps each trial independently
    /// evaluable; the split is a tunable (see Settings::p_recolor).
    ///
    /// requires a prior `stash` so the trial is always revertible.
    pub fn mutate<R: Rng>(
        &mut self,
        rng: &mut R,
        max_x: u32,
        max_y: u32,
        p_recolor: f32,
    ) -> Result<(), DnaError> {
        profiling::scope!("mutate");
        if matches!(self.state, MutationState::Clean) {
            return Err(DnaError::NoSnapshot);
        }
        if rng.random::<f32>() < p_recolor {
            self.color = random_color(rng);
        } else {
            let vi = rng.random_range(0..self.points.len());
            self.points[vi] = random_point(rng, max_x, max_y);
        }
        Ok(())
    }

    /// restore the stashed points + color, discarding the trial mutation
    pub fn pop(&mut self) -> Result<(), DnaError> {
        match std::mem::take(&mut self.state) {
            MutationState::Pending(snap) => {
                self.points = snap.points;
                self.color = snap.color;
                Ok(())
            }
            MutationState::Clean => Err(DnaError::NoSnapshot),
        }
    }

    /// keep the trial mutation and drop the snapshot
    pub fn commit(&mut self) -> Result<(), DnaError> {
        match std::mem::take(&mut self.state) {
            MutationState::Pending(_) => Ok(()),
            MutationState::Clean => Err(DnaError::NoSnapshot),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, MutationState::Pending(_))
    }
}

/// the full polygon population plus canvas dimensions. array order is
/// back-to-front compositing order. population size is fixed for the run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Genome {
    pub width: u32,
    pub height: u32,
    pub polys: Vec<Polygon>,
}

impl Genome {
    pub fn new_random<R: Rng>(
        rng: &mut R,
        polygon_count: usize,
        vertex_count: usize,
        width: u32,
        height: u32,
    ) -> Result<Self, DnaError> {
        profiling::scope!("Genome::new_random");
        if width == 0 || height == 0 {
            return Err(DnaError::InvalidArgument("canvas dimensions must be non-zero"));
        }
        if polygon_count == 0 {
            return Err(DnaError::InvalidArgument("population must not be empty"));
        }
        let polys = (0..polygon_count)
            .map(|_| Polygon::random(rng, vertex_count, width, height))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { width, height, polys })
    }
}
