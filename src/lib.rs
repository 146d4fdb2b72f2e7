pub mod dna;
pub mod engine;
pub mod engine_thread;
pub mod fitness;
pub mod random;
pub mod render;
pub mod settings;

pub use dna::{Color, DnaError, Genome, Point, Polygon};
pub use engine::{Engine, EngineError, StepOutcome};
pub use engine_thread::{spawn_engine, EngineCommand, EngineHandle, EngineUpdate};
pub use fitness::{match_percent, max_difference, pixel_difference, visualize, FitnessError};
pub use render::{CpuRenderer, Renderer};
pub use settings::{Settings, StopSettings};
