//! Single-writer driver around [`GameEngine`].
//!
//! The session is the only owner of the engine. Wall time is turned into
//! fixed ticks by [`GameTime`], autosave runs on the same thread, and a
//! multi-threaded host talks to it through a command channel ([`Session::run`]),
//! so ticks and player actions never interleave.

use std::time::Duration;

use crossbeam_channel::{select, tick, Receiver, Sender};
use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::{GameEngine, OfflineEarnings};
use crate::save::{PersistenceError, PersistenceGateway};
use crate::state::{GameView, GeneratorId};
use crate::time::{Clock, GameTime};

/// A player action forwarded by the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Click,
    BuyGenerator(GeneratorId),
    BuyUpgrade(String),
    Prestige,
}

/// Messages accepted by [`Session::run`].
#[derive(Debug)]
pub enum Command {
    Action {
        action: Action,
        reply: Option<Sender<bool>>,
    },
    View {
        reply: Sender<GameView>,
    },
    Save,
    HardReset,
    Shutdown,
}

pub struct Session<G, C> {
    engine: GameEngine,
    gateway: G,
    clock: C,
    time: GameTime,
    last_save_ms: u64,
}

impl<G: PersistenceGateway, C: Clock> Session<G, C> {
    /// Load the saved game (or start fresh), credit offline income and start the clock.
    pub fn open(config: EngineConfig, mut gateway: G, clock: C) -> (Self, OfflineEarnings) {
        let now = clock.now_ms();
        let mut time =
            GameTime::new(config.ticks_per_sec).with_max_step(config.offline.max_elapsed_ms);
        time.update(now);

        let mut engine = GameEngine::new(config);
        let offline = engine.start(&mut gateway, now);

        let mut session = Self {
            engine,
            gateway,
            clock,
            time,
            last_save_ms: now,
        };
        // Persist the credit right away so a crash cannot grant it twice.
        if offline.gain > 0.0 {
            session.autosave(now);
        }
        (session, offline)
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn view(&self) -> GameView {
        self.engine.view()
    }

    /// Catch the engine up with the clock. Returns the number of ticks run.
    pub fn advance(&mut self) -> u32 {
        let now = self.clock.now_ms();
        let ticks = self.time.update(now);
        if ticks > 0 {
            self.engine.tick(ticks as f64 * self.time.seconds_per_tick());
        }
        if now.saturating_sub(self.last_save_ms) >= self.engine.config().autosave_interval_ms {
            self.autosave(now);
        }
        ticks
    }

    pub fn dispatch(&mut self, action: Action) -> bool {
        let ok = match &action {
            Action::Click => self.engine.click(),
            Action::BuyGenerator(id) => self.engine.buy_generator(*id),
            Action::BuyUpgrade(id) => self.engine.buy_upgrade(id),
            Action::Prestige => self.engine.prestige(),
        };
        if !ok {
            debug!("{:?} rejected", action);
        }
        ok
    }

    /// Snapshot the engine and hand it to the gateway.
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        let now = self.clock.now_ms();
        let snapshot = self.engine.snapshot(now);
        self.last_save_ms = now;
        self.gateway.save(&snapshot)
    }

    /// Periodic save: a failure is logged and retried at the next interval.
    fn autosave(&mut self, now: u64) {
        let snapshot = self.engine.snapshot(now);
        self.last_save_ms = now;
        if let Err(e) = self.gateway.save(&snapshot) {
            warn!("autosave failed: {e}");
        }
    }

    /// Delete the stored game and start over from nothing.
    pub fn hard_reset(&mut self) -> Result<(), PersistenceError> {
        self.engine.hard_reset();
        let now = self.clock.now_ms();
        self.time.reset();
        self.time.update(now);
        self.last_save_ms = now;
        self.gateway.clear()
    }

    /// Accrue the time up to now, save once, and give the gateway back.
    pub fn shutdown(mut self) -> G {
        let now = self.clock.now_ms();
        let ticks = self.time.update(now);
        if ticks > 0 {
            self.engine.tick(ticks as f64 * self.time.seconds_per_tick());
        }
        self.autosave(now);
        info!("session closed after {} ticks", self.time.total_ticks);
        self.gateway
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Action { action, reply } => {
                self.advance();
                let ok = self.dispatch(action);
                if let Some(reply) = reply {
                    let _ = reply.send(ok);
                }
            }
            Command::View { reply } => {
                self.advance();
                let _ = reply.send(self.view());
            }
            Command::Save => {
                if let Err(e) = self.save() {
                    warn!("save failed: {e}");
                }
            }
            Command::HardReset => {
                if let Err(e) = self.hard_reset() {
                    warn!("clearing saved game failed: {e}");
                }
            }
            Command::Shutdown => {}
        }
    }

    /// Event loop for a threaded host. Ticks at the configured cadence and
    /// serves commands until `Shutdown` arrives or every sender is dropped.
    pub fn run(mut self, commands: Receiver<Command>) -> G {
        let ticker = tick(tick_period(self.engine.config().ticks_per_sec));
        info!("session running at {} ticks/s", self.engine.config().ticks_per_sec);

        loop {
            select! {
                recv(commands) -> msg => match msg {
                    Ok(Command::Shutdown) | Err(_) => break,
                    Ok(command) => self.handle(command),
                },
                recv(ticker) -> _ => {
                    self.advance();
                }
            }
        }
        self.shutdown()
    }
}

/// Timer period for the event loop; never shorter than 1 ms.
fn tick_period(ticks_per_sec: u32) -> Duration {
    let ms = 1000 / u64::from(ticks_per_sec.max(1));
    Duration::from_millis(ms.max(1))
}
