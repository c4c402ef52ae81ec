//! Headless game runner implementation.

use std::io::{self, BufRead, Write};

use hex_core::config::GameConfig;
use hex_core::error::Result as CoreResult;
use hex_core::game::Game;
use hex_core::snapshot::{MemoryStore, SaveStore};
use hex_core::view::Opacity;

use crate::ascii_visualizer::{render_view, AsciiConfig};
use crate::protocol::{Command, Response, PROTOCOL_VERSION};

/// Drives one game from protocol commands.
pub struct HeadlessRunner {
    game: Game,
    store: Box<dyn SaveStore>,
}

impl HeadlessRunner {
    /// Start a game from `seed` with an in-memory save store.
    pub fn new(config: GameConfig, seed: u64) -> CoreResult<Self> {
        Self::with_store(config, seed, Box::new(MemoryStore::new()))
    }

    /// Start a game from `seed`, saving to `store`.
    pub fn with_store(config: GameConfig, seed: u64, store: Box<dyn SaveStore>) -> CoreResult<Self> {
        Ok(Self {
            game: Game::new(config, seed)?,
            store,
        })
    }

    /// The game being played.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// The greeting sent before any command.
    pub fn ready(&self) -> Response {
        let shape = self.game.level().shape();
        Response::Ready {
            version: PROTOCOL_VERSION.to_string(),
            seed: self.game.seed(),
            time: self.game.time(),
            width: shape.width(),
            height: shape.height(),
        }
    }

    /// Apply one command and produce its response.
    pub fn handle(&mut self, cmd: &Command) -> Response {
        let name = cmd.name();
        match self.dispatch(cmd) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(cmd = name, error = %e, "Command failed");
                Response::error(e.to_string(), Some(name))
            }
        }
    }

    fn dispatch(&mut self, cmd: &Command) -> CoreResult<Response> {
        match *cmd {
            Command::Move { direction } => {
                let moved = self.game.move_player(direction)?;
                self.finish_turn(cmd, Some(moved), None)
            }
            Command::Rest => {
                self.game.rest()?;
                self.finish_turn(cmd, None, None)
            }
            Command::Cast { direction } => {
                let spike = self.game.cast(direction)?;
                self.finish_turn(cmd, None, Some(spike))
            }
            Command::View { ascii } => {
                let cells = self.game.view();
                let ascii = ascii.then(|| {
                    let config = AsciiConfig {
                        use_color: false,
                        show_legend: false,
                    };
                    render_view(&cells, self.game.level().shape(), &config)
                });
                Ok(Response::View {
                    time: self.game.time(),
                    cells: cells
                        .into_iter()
                        .filter(|c| c.opacity != Opacity::Hidden)
                        .collect(),
                    ascii,
                })
            }
            Command::Hash => Ok(Response::StateHash {
                time: self.game.time(),
                hash: self.game.state_hash(),
            }),
            Command::Save => {
                self.game.save(self.store.as_mut())?;
                Ok(Response::ack(cmd.name()))
            }
            Command::Load => match Game::load(self.store.as_ref())? {
                Some(game) => {
                    self.game = game;
                    self.game.run_until_input()?;
                    Ok(Response::Loaded {
                        seed: self.game.seed(),
                        time: self.game.time(),
                        hash: self.game.state_hash(),
                    })
                }
                None => Ok(Response::error("No saved game", Some(cmd.name()))),
            },
            Command::Quit => Ok(Response::Bye),
        }
    }

    fn finish_turn(
        &mut self,
        cmd: &Command,
        moved: Option<bool>,
        spike: Option<hex_core::entity::EntityId>,
    ) -> CoreResult<Response> {
        let turns = self.game.run_until_input()?;
        let pos = self.game.player_position()?;
        Ok(Response::Turn {
            cmd: cmd.name().to_string(),
            time: self.game.time(),
            x: pos.x,
            y: pos.y,
            moved,
            spike,
            turns,
            hash: self.game.state_hash(),
        })
    }

    /// Serve the protocol until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        output.write_all(self.ready().to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match Command::from_json(line) {
                Ok(cmd) => {
                    tracing::debug!(cmd = cmd.name(), "Command received");
                    if cmd == Command::Quit {
                        break;
                    }
                    self.handle(&cmd)
                }
                Err(e) => Response::error(format!("Parse error: {e}"), None),
            };
            output.write_all(response.to_json_line().as_bytes())?;
            output.flush()?;
        }

        output.write_all(Response::Bye.to_json_line().as_bytes())?;
        output.flush()
    }
}
