//! Error types for parsing snapshots and move text.

/// Errors from parsing a FEN piece-placement field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// The placement does not have exactly 8 ranks.
    #[error("expected 8 ranks in placement, found {found}")]
    WrongRankCount {
        /// Number of ranks found.
        found: usize,
    },
    /// A rank describes more or fewer than 8 squares.
    #[error("rank {rank} describes {length} squares, expected 8")]
    BadRankLength {
        /// Rank number, 1..8.
        rank: u8,
        /// Number of squares described.
        length: usize,
    },
    /// An unrecognized character in the placement.
    #[error("invalid placement character: '{character}'")]
    InvalidChar {
        /// The invalid character.
        character: char,
    },
}

/// Errors from parsing move text such as `e7e8q`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveParseError {
    /// The text is not 4 or 5 characters long.
    #[error("move \"{text}\" must be 4 or 5 characters")]
    BadLength {
        /// The offending text.
        text: String,
    },
    /// One of the squares is not valid algebraic notation.
    #[error("invalid square in move \"{text}\"")]
    InvalidSquare {
        /// The offending text.
        text: String,
    },
    /// The promotion letter is not one of n, b, r, q.
    #[error("invalid promotion piece '{character}'")]
    InvalidPromotion {
        /// The offending letter.
        character: char,
    },
}
