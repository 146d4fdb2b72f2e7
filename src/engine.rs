use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::dna::{DnaError, Genome};
use crate::fitness::{match_percent, max_difference, pixel_difference, visualize, FitnessError};
use crate::render::Renderer;
use crate::settings::Settings;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("target buffer is {actual} bytes, expected {expected} for {width}x{height} rgba")]
    BadTarget {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Dna(#[from] DnaError),
    #[error(transparent)]
    Fitness(#[from] FitnessError),
}

/// what one round did, for stats sinks and tests
#[derive(Clone, Copy, Debug)]
pub struct StepOutcome {
    /// round number, counted from 1 (equals the mutations counter after the round)
    pub round: u64,
    /// population index that was mutated this round
    pub polygon: usize,
    pub accepted: bool,
    /// best match percentage after the round
    pub match_percent: f64,
}

/// the population controller. owns the genome, the seeded PRNG, the immutable
/// target buffer and all per-run counters; one instance per optimization run.
///
/// each `step` is one round: select the next polygon round-robin, stash it,
/// mutate it, render the full composite, score against the target, then commit
/// on a strict improvement or pop the snapshot otherwise. the accept rule makes
/// `last_match` non-decreasing across rounds, which is the core invariant.
pub struct Engine {
    rng: Pcg32,
    settings: Settings,
    renderer: Box<dyn Renderer + Send>,
    pub genome: Genome,
    target_rgba: Vec<u8>,
    /// composite of the best accepted state, kept in sync with the genome
    pub current_rgba: Vec<u8>,
    /// worst-case pixel difference for this canvas, the normalization denominator
    max_difference: u64,
    /// best match percentage so far; non-decreasing
    pub last_match: f64,
    /// round-robin cursor into the population
    next_mutable: usize,
    /// rounds attempted, accept or reject
    pub mutations: u64,
    /// rounds whose mutation was accepted
    pub breakthroughs: u64,
    rounds_since_breakthrough: u64,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("settings", &self.settings)
            .field("genome", &self.genome)
            .field("last_match", &self.last_match)
            .field("next_mutable", &self.next_mutable)
            .field("mutations", &self.mutations)
            .field("breakthroughs", &self.breakthroughs)
            .field("rounds_since_breakthrough", &self.rounds_since_breakthrough)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// `target_rgba` is the decoded target image as interleaved RGBA bytes.
    /// it must be exactly width * height * 4 bytes; anything else is a setup
    /// error the run cannot recover from.
    pub fn new(
        target_rgba: Vec<u8>,
        width: u32,
        height: u32,
        settings: Settings,
        mut renderer: Box<dyn Renderer + Send>,
    ) -> Result<Self, EngineError> {
        profiling::scope!("Engine::new");

        let expected = width as usize * height as usize * 4;
        if expected == 0 || target_rgba.len() != expected {
            return Err(EngineError::BadTarget {
                width,
                height,
                expected,
                actual: target_rgba.len(),
            });
        }

        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let genome = Genome::new_random(
            &mut rng,
            settings.polygon_count,
            settings.vertex_count,
            width,
            height,
        )?;

        let current_rgba = renderer.render(&genome);
        let max_diff = max_difference(width, height);
        let last_match = match_percent(pixel_difference(&target_rgba, &current_rgba)?, max_diff);

        Ok(Self {
            rng,
            settings,
            renderer,
            genome,
            target_rgba,
            current_rgba,
            max_difference: max_diff,
            last_match,
            next_mutable: 0,
            mutations: 0,
            breakthroughs: 0,
            rounds_since_breakthrough: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.genome.width
    }

    pub fn height(&self) -> u32 {
        self.genome.height
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// run one round. a scoring failure here means the renderer produced a
    /// wrongly-sized buffer, which is fatal for the run, never retried.
    pub fn step(&mut self) -> Result<StepOutcome, EngineError> {
        profiling::scope!("step");

        let idx = self.next_mutable;
        let (w, h) = (self.genome.width, self.genome.height);
        {
            let poly = &mut self.genome.polys[idx];
            poly.stash();
            poly.mutate(&mut self.rng, w, h, self.settings.p_recolor)?;
        }

        let rendered = self.renderer.render(&self.genome);
        let difference = pixel_difference(&self.target_rgba, &rendered)?;
        let trial_match = match_percent(difference, self.max_difference);

        let accepted = trial_match > self.last_match;
        if accepted {
            self.genome.polys[idx].commit()?;
            self.current_rgba = rendered;
            self.last_match = trial_match;
            self.breakthroughs += 1;
            self.rounds_since_breakthrough = 0;
            log::debug!(
                "breakthrough: round {} polygon {} match {:.4}%",
                self.mutations + 1,
                idx,
                trial_match
            );
        } else {
            self.genome.polys[idx].pop()?;
            self.rounds_since_breakthrough += 1;
        }

        self.mutations += 1;
        self.next_mutable = (self.next_mutable + 1) % self.genome.polys.len();

        Ok(StepOutcome {
            round: self.mutations,
            polygon: idx,
            accepted,
            match_percent: self.last_match,
        })
    }

    /// check the configured stopping conditions against the current state
    pub fn should_stop(&self) -> bool {
        let stop = &self.settings.stop;
        if let Some(max) = stop.max_rounds {
            if self.mutations >= max {
                return true;
            }
        }
        if let Some(target) = stop.target_match {
            if self.last_match >= target {
                return true;
            }
        }
        if let Some(limit) = stop.stagnation_rounds {
            if self.rounds_since_breakthrough >= limit {
                return true;
            }
        }
        false
    }

    /// drive rounds until a stopping condition fires. with unbounded
    /// StopSettings this never returns; callers wanting external control should
    /// drive `step` themselves (see engine_thread).
    pub fn run(&mut self) -> Result<(), EngineError> {
        while !self.should_stop() {
            self.step()?;
        }
        Ok(())
    }

    /// per-pixel similarity overlay of the current composite against the target
    /// (diagnostic only, no role in accept/reject)
    pub fn diff_overlay(&self) -> Result<Vec<u8>, FitnessError> {
        visualize(&self.target_rgba, &self.current_rgba)
    }
}
