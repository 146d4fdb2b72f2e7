use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::engine::{Engine, EngineError};

/// messages from the controlling side to the engine thread
pub enum EngineCommand {
    Start,
    Pause,
    Stop,
}

/// stats pushed to the controlling side after rounds. a dropped receiver is
/// fine: sends are fire-and-forget and the optimizer does not depend on them.
#[derive(Clone, Debug)]
pub struct EngineUpdate {
    /// current best composite (arc to avoid cloning large buffers per update)
    pub rgba: Arc<[u8]>,
    pub match_percent: f64,
    pub mutations: u64,
    pub breakthroughs: u64,
    pub polygons: usize,
}

/// throttles stats updates so the channel does not carry one full frame per round
struct UpdateGate {
    counter: u64,
    interval: u64,
}

impl UpdateGate {
    fn new(interval: u64) -> Self {
        Self {
            counter: 0,
            interval: interval.max(1),
        }
    }

    #[inline]
    fn should_send(&mut self) -> bool {
        self.counter += 1;
        self.counter % self.interval == 0
    }
}

pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    pub updates: mpsc::Receiver<EngineUpdate>,
    handle: thread::JoinHandle<Result<Engine, EngineError>>,
}

impl EngineHandle {
    /// returns false if the engine thread has already exited
    pub fn send(&self, cmd: EngineCommand) -> bool {
        self.commands.send(cmd).is_ok()
    }

    /// wait for the thread to finish and get the engine (and its final genome) back
    pub fn join(self) -> Result<Engine, EngineError> {
        self.handle.join().expect("engine thread panicked")
    }
}

fn snapshot(engine: &Engine) -> EngineUpdate {
    EngineUpdate {
        rgba: Arc::from(engine.current_rgba.as_slice()),
        match_percent: engine.last_match,
        mutations: engine.mutations,
        breakthroughs: engine.breakthroughs,
        polygons: engine.genome.polys.len(),
    }
}

/// spawn the optimizer on a background thread. the thread starts paused; send
/// `Start` to begin stepping. rounds never overlap: the loop runs one round at a
/// time and checks for commands between rounds. the thread exits on `Stop`, on a
/// satisfied stopping condition, or on a fatal engine error.
pub fn spawn_engine(engine: Engine) -> EngineHandle {
    let (command_tx, command_rx) = mpsc::channel();
    let (update_tx, update_rx) = mpsc::channel();

    let handle = thread::Builder::new()
        .name("engine".to_owned())
        .spawn(move || {
            let mut engine = engine;
            let mut gate = UpdateGate::new(engine.settings().update_every);
            let mut running = false;

            // initial state so the receiver has a frame before the first round
            let _ = update_tx.send(snapshot(&engine));

            loop {
                profiling::scope!("engine_thread_loop");

                if let Ok(cmd) = command_rx.try_recv() {
                    match cmd {
                        EngineCommand::Start => running = true,
                        EngineCommand::Pause => running = false,
                        EngineCommand::Stop => break,
                    }
                }

                if running {
                    engine.step()?;

                    if gate.should_send() {
                        let _ = update_tx.send(snapshot(&engine));
                    }

                    if engine.should_stop() {
                        break;
                    }
                } else {
                    // avoid busy-waiting while paused
                    thread::sleep(Duration::from_millis(10));
                }
            }

            let _ = update_tx.send(snapshot(&engine));
            Ok(engine)
        })
        .expect("spawn engine thread");

    EngineHandle {
        commands: command_tx,
        updates: update_rx,
        handle,
    }
}
