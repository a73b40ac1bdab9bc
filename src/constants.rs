//! Board sizes, protocol constants, and engine defaults.

use crate::board::Point;

// =============================================================================
// Board Geometry
// =============================================================================

/// Board sizes accepted by `boardsize` and [`crate::session::GameSession::new`].
pub const SUPPORTED_SIZES: [usize; 3] = [9, 13, 19];

/// Board size used when none is configured.
pub const DEFAULT_SIZE: usize = 19;

/// Public coordinate that is never playable, distinct from a pass.
pub const RESERVED_SENTINEL: Point = (0, 0);

/// Column letters used by vertex notation. `I` is skipped.
const COLUMNS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// The vertex letter for column `x`.
pub fn column_letter(x: usize) -> char {
    COLUMNS.get(x).map(|&b| b as char).unwrap_or('?')
}

/// The column index for a vertex letter, case-insensitive.
pub fn column_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    COLUMNS.iter().position(|&b| b as char == upper)
}

// =============================================================================
// Protocol
// =============================================================================

/// GTP protocol version reported by `protocol_version`.
pub const PROTOCOL_VERSION: &str = "2";

/// Engine name reported by `name` until one is configured.
pub const DEFAULT_ENGINE_NAME: &str = "Engine using Sente GTP";

/// Engine version reported by `version` until one is configured.
pub const DEFAULT_ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Komi (compensation points for White).
pub const DEFAULT_KOMI: f64 = 7.5;

/// Consecutive passes that end the game.
pub const PASSES_TO_END: u32 = 2;
