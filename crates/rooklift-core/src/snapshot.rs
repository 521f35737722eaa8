//! Full 64-square occupancy readouts.

use std::fmt;
use std::str::FromStr;

use crate::color::Color;
use crate::engine::Occupancy;
use crate::error::PlacementError;
use crate::piece::Piece;
use crate::square::Square;

/// Piece placement of the standard starting position.
pub const STARTING_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

/// Occupancy of every real square at one instant.
///
/// Carries no game state (side to move, castling rights); it is what a
/// board sensor reports and what the reconciler rearranges.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Snapshot {
    squares: [Option<Piece>; Square::COUNT],
}

impl Snapshot {
    /// A board with no pieces.
    pub const fn empty() -> Snapshot {
        Snapshot {
            squares: [None; Square::COUNT],
        }
    }

    /// The standard starting layout.
    pub fn starting_position() -> Snapshot {
        // The constant is well-formed; an empty board would only hide a typo.
        STARTING_PLACEMENT.parse().unwrap_or_else(|_| Snapshot::empty())
    }

    /// Copy the occupancy of any [`Occupancy`] source.
    pub fn capture<O: Occupancy + ?Sized>(source: &O) -> Snapshot {
        let mut snapshot = Snapshot::empty();
        for sq in Square::all() {
            snapshot.squares[sq.index()] = source.piece_at(sq);
        }
        snapshot
    }

    /// Piece on `sq`, if any.
    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// Put `piece` on `sq` (or clear it with `None`), returning what was there.
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) -> Option<Piece> {
        std::mem::replace(&mut self.squares[sq.index()], piece)
    }

    /// Iterate over occupied squares in index order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.get(sq).map(|piece| (sq, piece)))
    }

    /// Number of occupied squares.
    pub fn count(&self) -> usize {
        self.squares.iter().filter(|p| p.is_some()).count()
    }

    /// The FEN piece-placement field for this layout.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for rank in (0u8..8).rev() {
            let mut empty = 0;
            for file in 0u8..8 {
                let Some(sq) = Square::from_coords(file, rank) else {
                    continue;
                };
                match self.get(sq) {
                    Some(piece) => {
                        if empty > 0 {
                            out.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        out.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out
    }

    /// The same physical layout described from the other side of the board.
    pub fn mirrored(&self) -> Snapshot {
        let mut mirrored = Snapshot::empty();
        for sq in Square::all() {
            mirrored.squares[sq.index()] = self.get(sq.mirror());
        }
        mirrored
    }

    /// Return a pretty-printable 8x8 grid, drawn from `perspective`'s side.
    pub fn pretty(&self, perspective: Color) -> PrettySnapshot<'_> {
        PrettySnapshot {
            snapshot: self,
            perspective,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Snapshot {
        Snapshot::empty()
    }
}

impl Occupancy for Snapshot {
    fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.get(sq)
    }
}

impl FromStr for Snapshot {
    type Err = PlacementError;

    /// Parse a FEN piece-placement field. Trailing FEN fields, if present,
    /// are ignored.
    fn from_str(s: &str) -> Result<Snapshot, PlacementError> {
        let field = s.split_whitespace().next().unwrap_or("");
        let ranks: Vec<&str> = field.split('/').collect();
        if ranks.len() != 8 {
            return Err(PlacementError::WrongRankCount { found: ranks.len() });
        }

        let mut snapshot = Snapshot::empty();
        for (row, text) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file: u8 = 0;
            for c in text.chars() {
                if let Some(run) = c.to_digit(10) {
                    if !(1..=8).contains(&run) {
                        return Err(PlacementError::InvalidChar { character: c });
                    }
                    file += run as u8;
                } else {
                    let piece =
                        Piece::from_fen_char(c).ok_or(PlacementError::InvalidChar { character: c })?;
                    let sq = Square::from_coords(file, rank).ok_or(PlacementError::BadRankLength {
                        rank: rank + 1,
                        length: file as usize + 1,
                    })?;
                    snapshot.squares[sq.index()] = Some(piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(PlacementError::BadRankLength {
                    rank: rank + 1,
                    length: file as usize,
                });
            }
        }
        Ok(snapshot)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.placement())
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot(\"{}\")", self.placement())
    }
}

/// Wrapper for printing a snapshot as a grid.
pub struct PrettySnapshot<'a> {
    snapshot: &'a Snapshot,
    perspective: Color,
}

impl fmt::Display for PrettySnapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (ranks, files): (Vec<u8>, Vec<u8>) = match self.perspective {
            Color::White => ((0..8).rev().collect(), (0..8).collect()),
            Color::Black => ((0..8).collect(), (0..8).rev().collect()),
        };
        for &rank in &ranks {
            write!(f, "{}  ", rank + 1)?;
            let row: Vec<String> = files
                .iter()
                .map(|&file| {
                    Square::from_coords(file, rank)
                        .and_then(|sq| self.snapshot.get(sq))
                        .map_or('.', Piece::fen_char)
                        .to_string()
                })
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        let legend: Vec<String> = files
            .iter()
            .map(|&file| char::from(b'a' + file).to_string())
            .collect();
        write!(f, "   {}", legend.join(" "))
    }
}
