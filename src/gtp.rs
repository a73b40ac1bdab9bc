//! Go Text Protocol (GTP) host.
//!
//! GTP is a line-oriented protocol for driving Go programs from a controller
//! such as Sabaki or GoGui. [`GtpHost`] reads one command per line and
//! replies with the command echoed, a result line starting with `=` (success)
//! or `?` (failure), and a terminating blank line:
//!
//! ```text
//! 1 protocol_version
//! =1 2
//!
//! ```
//!
//! ## Supported Commands
//!
//! - `protocol_version` - GTP protocol version (2)
//! - `name` / `version` - Engine name and version
//! - `known_command <cmd>` - Whether a command is registered
//! - `list_commands` - All registered commands
//! - `quit` - End the session
//! - `boardsize <size>` - New empty board of the given size (9, 13 or 19)
//! - `clear_board` - Empty the board, keeping size and komi
//! - `komi <value>` - Set komi
//! - `play <color> <vertex>` - Play a move
//! - `genmove <color>` - Ask the configured [`MoveSelector`] for a move
//! - `showboard` - Draw the board
//! - `undo [n]` - Take back the last move, or the last `n`
//!
//! Further commands can be added with [`GtpHost::register`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::board::{BoardError, Point, Stone};
use crate::constants::{
    column_index, column_letter, DEFAULT_ENGINE_NAME, DEFAULT_ENGINE_VERSION, DEFAULT_KOMI,
    DEFAULT_SIZE, PROTOCOL_VERSION,
};
use crate::legality::IllegalReason;
use crate::session::{GameSession, Move, TurnOrder};

/// Failure text for a `?` reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GtpError {
    #[error("unknown command")]
    UnknownCommand,
    #[error("{0}")]
    Malformed(String),
    #[error("unacceptable size")]
    UnsupportedBoardSize,
    #[error("illegal move: {0}")]
    IllegalMove(IllegalReason),
    #[error("cannot undo")]
    CannotUndo,
    #[error("{0}")]
    Genmove(String),
}

fn malformed(message: &str) -> GtpError {
    GtpError::Malformed(message.to_string())
}

fn no_args(args: &[&str]) -> Result<(), GtpError> {
    match args {
        [] => Ok(()),
        _ => Err(malformed("expected no arguments")),
    }
}

fn one_arg<'a>(args: &[&'a str]) -> Result<&'a str, GtpError> {
    match args {
        [arg] => Ok(*arg),
        [] => Err(malformed("missing argument")),
        _ => Err(malformed("too many arguments")),
    }
}

/// A command handler. Receives the host and the arguments after the command name.
pub type Handler = Arc<dyn Fn(&mut GtpHost, &[&str]) -> Result<String, GtpError> + Send + Sync>;

/// What a [`MoveSelector`] decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Move(Move),
    Resign,
}

/// Source of moves for `genmove`.
///
/// The selector only sees the session read-only; its choice is played through
/// [`GameSession::play`] so an error or an illegal suggestion leaves the game
/// as it was. `deadline` is set when the host has a genmove timeout; answers
/// arriving after it are discarded.
pub trait MoveSelector: Send {
    fn select_move(
        &mut self,
        session: &GameSession,
        stone: Stone,
        deadline: Option<Instant>,
    ) -> anyhow::Result<Selection>;
}

impl<F> MoveSelector for F
where
    F: FnMut(&GameSession, Stone, Option<Instant>) -> anyhow::Result<Selection> + Send,
{
    fn select_move(
        &mut self,
        session: &GameSession,
        stone: Stone,
        deadline: Option<Instant>,
    ) -> anyhow::Result<Selection> {
        (*self)(session, stone, deadline)
    }
}

/// `genmove` behavior when no selector is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenmoveFallback {
    /// Pass for the requested color.
    #[default]
    Pass,
    /// Reply with a failure.
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GtpConfig {
    pub name: String,
    pub version: String,
    pub board_size: usize,
    pub komi: f64,
    pub genmove_fallback: GenmoveFallback,
    pub genmove_timeout: Option<Duration>,
}

impl Default for GtpConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ENGINE_NAME.to_string(),
            version: DEFAULT_ENGINE_VERSION.to_string(),
            board_size: DEFAULT_SIZE,
            komi: DEFAULT_KOMI,
            genmove_fallback: GenmoveFallback::default(),
            genmove_timeout: None,
        }
    }
}

/// One framed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub echo: String,
    pub id: Option<String>,
    pub result: Result<String, String>,
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, text) = match &self.result {
            Ok(text) => ('=', text),
            Err(text) => ('?', text),
        };
        let id = self.id.as_deref().unwrap_or_default();
        write!(f, "{}\n{prefix}{id} {text}\n\n", self.echo)
    }
}

/// GTP session state: engine identity, options, and the game it drives.
pub struct GtpHost {
    config: GtpConfig,
    session: GameSession,
    commands: BTreeMap<String, Handler>,
    selector: Option<Box<dyn MoveSelector>>,
    active: bool,
}

impl Default for GtpHost {
    fn default() -> Self {
        Self::new()
    }
}

impl GtpHost {
    /// Create a host with default settings.
    pub fn new() -> Self {
        Self::with_config(GtpConfig::default())
            .expect("DEFAULT_SIZE is one of SUPPORTED_SIZES")
    }

    /// Create a host that reports `name` from the `name` command.
    pub fn with_name(name: impl Into<String>) -> Self {
        let mut host = Self::new();
        host.config.name = name.into();
        host
    }

    pub fn with_config(config: GtpConfig) -> Result<Self, BoardError> {
        // GTP lets the controller play either color at any time
        let session = GameSession::with_turn_order(config.board_size, TurnOrder::Free)?;
        let mut host = Self {
            config,
            session,
            commands: BTreeMap::new(),
            selector: None,
            active: true,
        };
        host.register("protocol_version", |_, args| {
            no_args(args)?;
            Ok(PROTOCOL_VERSION.to_string())
        });
        host.register("name", |host, args| {
            no_args(args)?;
            Ok(host.config.name.clone())
        });
        host.register("version", |host, args| {
            no_args(args)?;
            Ok(host.config.version.clone())
        });
        host.register("known_command", known_command);
        host.register("list_commands", |host, args| {
            no_args(args)?;
            Ok(host.commands().collect::<Vec<_>>().join("\n"))
        });
        host.register("quit", |host, args| {
            no_args(args)?;
            host.active = false;
            Ok(String::new())
        });
        host.register("boardsize", boardsize);
        host.register("clear_board", |host, args| {
            no_args(args)?;
            host.session.clear();
            Ok(String::new())
        });
        host.register("komi", komi);
        host.register("play", play);
        host.register("genmove", genmove);
        host.register("showboard", |host, args| {
            no_args(args)?;
            Ok(format!("\n{}", host.session.board().to_string().trim_end()))
        });
        host.register("undo", undo);
        Ok(host)
    }

    /// Add or replace a command.
    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: Fn(&mut GtpHost, &[&str]) -> Result<String, GtpError> + Send + Sync + 'static,
    {
        self.commands.insert(name.to_lowercase(), Arc::new(handler));
    }

    pub fn set_selector(&mut self, selector: impl MoveSelector + 'static) {
        self.selector = Some(Box::new(selector));
    }

    pub fn clear_selector(&mut self) {
        self.selector = None;
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn config(&self) -> &GtpConfig {
        &self.config
    }

    pub fn komi(&self) -> f64 {
        self.config.komi
    }

    /// False once `quit` has been processed.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Registered command names, in a stable order.
    pub fn commands(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.keys().map(String::as_str)
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_lowercase())
    }

    /// Process one line of input.
    ///
    /// Returns `None` for blank and comment lines, which get no reply.
    pub fn evaluate(&mut self, line: &str) -> Option<String> {
        self.respond(line).map(|r| r.to_string())
    }

    /// Like [`GtpHost::evaluate`] but returns the unformatted reply.
    pub fn respond(&mut self, line: &str) -> Option<Response> {
        // Everything after `#` is a comment
        let line = line.split_once('#').map_or(line, |(head, _)| head).trim();
        if line.is_empty() {
            return None;
        }
        let (id, rest) = split_id(line);
        let mut words = rest.split_whitespace();
        let result = match words.next() {
            Some(command) => {
                let args: Vec<&str> = words.collect();
                self.execute(&command.to_lowercase(), &args)
            }
            None => Err(malformed("missing command")),
        };
        debug!(line, ok = result.is_ok(), "gtp command");
        Some(Response {
            echo: line.to_string(),
            id: id.map(str::to_string),
            result: result.map_err(|e| e.to_string()),
        })
    }

    fn execute(&mut self, command: &str, args: &[&str]) -> Result<String, GtpError> {
        let handler = self
            .commands
            .get(command)
            .cloned()
            .ok_or(GtpError::UnknownCommand)?;
        handler(self, args)
    }

    /// Run the command loop until `quit` or end of input.
    ///
    /// Lines that are not valid UTF-8 are decoded lossily and answered like any
    /// other line.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> anyhow::Result<()> {
        info!(name = %self.config.name, size = self.session.size(), "gtp session started");
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "failed to read command");
                    return Err(e.into());
                }
            }
            let line = String::from_utf8_lossy(&buf);
            if matches!(line, Cow::Owned(_)) {
                warn!("command line is not valid UTF-8");
            }
            if let Some(reply) = self.evaluate(&line) {
                output.write_all(reply.as_bytes())?;
                output.flush()?;
            }
            if !self.active {
                info!("gtp session ended by quit");
                break;
            }
        }
        Ok(())
    }
}

/// Split an optional leading decimal id from the command text.
fn split_id(line: &str) -> (Option<&str>, &str) {
    let is_id = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) if is_id(head) => (Some(head), rest.trim_start()),
        None if is_id(line) => (Some(line), ""),
        _ => (None, line),
    }
}

/// A parsed vertex: a board point or a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertex {
    Pass,
    Point(Point),
}

/// Parse vertex notation such as `D4` or `pass` for a `size` board.
///
/// Columns are letters skipping `I`; row 1 is the bottom edge, so `A1` maps
/// to `(0, size - 1)`.
pub fn parse_vertex(text: &str, size: usize) -> Result<Vertex, GtpError> {
    if text.eq_ignore_ascii_case("pass") {
        return Ok(Vertex::Pass);
    }
    let mut chars = text.chars();
    let col = chars
        .next()
        .and_then(column_index)
        .ok_or_else(|| malformed("invalid vertex"))?;
    let row: usize = chars
        .as_str()
        .parse()
        .map_err(|_| malformed("invalid vertex"))?;
    if row == 0 || row > size || col >= size {
        return Err(GtpError::IllegalMove(IllegalReason::OutOfBounds));
    }
    Ok(Vertex::Point((col, size - row)))
}

/// Vertex notation for an on-board point.
pub fn format_vertex((x, y): Point, size: usize) -> String {
    format!("{}{}", column_letter(x), size - y)
}

pub fn parse_color(text: &str) -> Result<Stone, GtpError> {
    match text.to_lowercase().as_str() {
        "b" | "black" => Ok(Stone::Black),
        "w" | "white" => Ok(Stone::White),
        _ => Err(malformed("invalid color")),
    }
}

fn known_command(host: &mut GtpHost, args: &[&str]) -> Result<String, GtpError> {
    let name = one_arg(args)?;
    Ok(host.is_known(name).to_string())
}

fn boardsize(host: &mut GtpHost, args: &[&str]) -> Result<String, GtpError> {
    let size: usize = one_arg(args)?
        .parse()
        .map_err(|_| malformed("boardsize not an integer"))?;
    host.session = GameSession::with_turn_order(size, TurnOrder::Free)
        .map_err(|_| GtpError::UnsupportedBoardSize)?;
    host.config.board_size = size;
    Ok(String::new())
}

fn komi(host: &mut GtpHost, args: &[&str]) -> Result<String, GtpError> {
    let komi: f64 = one_arg(args)?
        .parse()
        .map_err(|_| malformed("komi not a float"))?;
    host.config.komi = komi;
    Ok(String::new())
}

fn play(host: &mut GtpHost, args: &[&str]) -> Result<String, GtpError> {
    let [color, vertex] = args else {
        return Err(malformed("expected a color and a vertex"));
    };
    let stone = parse_color(color)?;
    let mv = match parse_vertex(vertex, host.session.size())? {
        Vertex::Pass => Move::pass(stone),
        Vertex::Point((x, y)) => Move::play(x, y, stone),
    };
    host.session
        .play(mv)
        .map_err(|e| GtpError::IllegalMove(e.reason))?;
    Ok(String::new())
}

/// `undo` takes back one move, `undo <n>` takes back `n`.
fn undo(host: &mut GtpHost, args: &[&str]) -> Result<String, GtpError> {
    let count: usize = match args {
        [] => 1,
        [count] => count
            .parse()
            .map_err(|_| malformed("undo count not an integer"))?,
        _ => return Err(malformed("too many arguments")),
    };
    host.session
        .undo(count)
        .map_err(|_| GtpError::CannotUndo)?;
    Ok(String::new())
}

fn genmove(host: &mut GtpHost, args: &[&str]) -> Result<String, GtpError> {
    let stone = parse_color(one_arg(args)?)?;

    let Some(mut selector) = host.selector.take() else {
        return match host.config.genmove_fallback {
            GenmoveFallback::Pass => {
                host.session
                    .play(Move::pass(stone))
                    .map_err(|e| GtpError::IllegalMove(e.reason))?;
                Ok("pass".to_string())
            }
            GenmoveFallback::Fail => Err(GtpError::Genmove("genmove not available".to_string())),
        };
    };

    let deadline = host.config.genmove_timeout.map(|t| Instant::now() + t);
    let selection = selector.select_move(&host.session, stone, deadline);
    host.selector = Some(selector);

    let selection = selection.map_err(|e| {
        warn!(error = %e, "move selection failed");
        GtpError::Genmove(format!("move selection failed: {e}"))
    })?;
    if deadline.is_some_and(|d| Instant::now() > d) {
        warn!("move selection exceeded its deadline");
        return Err(GtpError::Genmove("move selection timed out".to_string()));
    }

    let mv = match selection {
        Selection::Resign => return Ok("resign".to_string()),
        Selection::Move(mv) => mv,
    };
    if mv.stone() != stone {
        warn!(%mv, %stone, "selector answered for the wrong color");
        return Err(GtpError::Genmove("selected move has the wrong color".to_string()));
    }
    host.session.play(mv).map_err(|e| {
        warn!(%mv, reason = %e.reason, "selector chose an illegal move");
        GtpError::Genmove(format!("selected move is illegal: {}", e.reason))
    })?;
    Ok(match mv.point() {
        Some(p) => format_vertex(p, host.session.size()),
        None => "pass".to_string(),
    })
}
