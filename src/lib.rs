//! Sente GTP: a Go rules engine and a Go Text Protocol host.
//!
//! The rules engine tracks stones, groups and liberties, resolves captures,
//! and enforces the simple ko rule. The GTP host exposes it to controllers
//! over a line-oriented request/response channel.
//!
//! ## Modules
//!
//! - [`constants`] - Supported sizes, protocol constants, defaults
//! - [`board`] - Board storage and group/liberty traversal
//! - [`legality`] - Move legality evaluation
//! - [`ko`] - Single-ply ko restriction
//! - [`session`] - Authoritative game state and move history
//! - [`gtp`] - GTP command host
//! - [`selector`] - Random move selection for `genmove`
//!
//! ## Example
//!
//! ```
//! use sente_gtp::board::{Color, Stone};
//! use sente_gtp::gtp::GtpHost;
//! use sente_gtp::session::{GameSession, Move};
//!
//! // Direct rules API
//! let mut game = GameSession::new(19).unwrap();
//! game.play(Move::play(3, 3, Stone::Black)).unwrap();
//! assert_eq!(game.color_at(3, 3).unwrap(), Color::Black);
//!
//! // Protocol host
//! let mut host = GtpHost::new();
//! let reply = host.evaluate("1 protocol_version").unwrap();
//! assert_eq!(reply, "1 protocol_version\n=1 2\n\n");
//! ```

pub mod board;
pub mod constants;
pub mod gtp;
pub mod ko;
pub mod legality;
pub mod selector;
pub mod session;
