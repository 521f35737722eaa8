//! Board squares, off-board storage slots, and the locations a relocation
//! can start or end at.

use std::fmt;
use std::str::FromStr;

use crate::color::Color;
use crate::piece::{Piece, PieceKind};

/// A real square on the 8x8 board, rank-major: a1 = 0, h1 = 7, h8 = 63.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    /// Number of real squares.
    pub const COUNT: usize = 64;

    pub const A1: Square = Square(0);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A8: Square = Square(56);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);

    /// Create a square from its index, `None` if not in 0..63.
    #[inline]
    pub const fn new(index: u8) -> Option<Square> {
        if index < 64 { Some(Square(index)) } else { None }
    }

    /// Create a square from a rank and a file, both 0..7.
    #[inline]
    pub const fn from_coords(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    /// Parse algebraic notation ("e4").
    pub fn from_algebraic(s: &str) -> Option<Square> {
        let &[file, rank] = s.as_bytes() else {
            return None;
        };
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return None;
        }
        Square::from_coords(file - b'a', rank - b'1')
    }

    /// Zero-based index (0..63).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw index as a byte.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Rank 0..7 (0 = rank 1).
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    /// File 0..7 (0 = a-file).
    #[inline]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    /// The square seen from the other side of the board (`63 - index`).
    #[inline]
    pub const fn mirror(self) -> Square {
        Square(63 - self.0)
    }

    /// Shift by a signed number of squares, `None` if it leaves the board.
    pub fn shifted(self, delta: i8) -> Option<Square> {
        let target = i16::from(self.0) + i16::from(delta);
        u8::try_from(target).ok().and_then(Square::new)
    }

    /// Iterate over all 64 squares in index order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0u8..64).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        write!(f, "{file}{rank}")
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Square({self})")
    }
}

/// One of the twelve off-board storage slots, identified on the wire by a
/// negative id in -12..=-1.
///
/// Ids -1..=-6 are the group nearest the robot's home side, -7..=-12 the far
/// group. Within a group the order is rook, bishop, knight, queen, king,
/// pawn.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(i8);

impl Slot {
    /// Number of storage slots.
    pub const COUNT: usize = 12;

    const GROUP_ORDER: [PieceKind; 6] = [
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Queen,
        PieceKind::King,
        PieceKind::Pawn,
    ];

    /// Create a slot from its wire id, `None` unless in -12..=-1.
    pub const fn new(id: i8) -> Option<Slot> {
        if id <= -1 && id >= -12 { Some(Slot(id)) } else { None }
    }

    /// The slot where `piece` is parked, seen from `perspective`.
    ///
    /// White pieces use the near group when the board is played from the
    /// white side. From the black side the groups swap, so a slot id always
    /// names the same physical parking place.
    pub fn for_piece(piece: Piece, perspective: Color) -> Slot {
        let position = Self::GROUP_ORDER
            .iter()
            .position(|&kind| kind == piece.kind)
            .unwrap_or(0) as i8;
        let near_group = piece.color == perspective;
        let base = if near_group { -1 } else { -7 };
        Slot(base - position)
    }

    /// The piece parked here, seen from `perspective`. Inverse of
    /// [`Slot::for_piece`].
    pub fn piece(self, perspective: Color) -> Piece {
        let offset = (-1 - self.0) as usize;
        let (group, position) = (offset / 6, offset % 6);
        let color = if group == 0 { perspective } else { !perspective };
        Piece::new(Self::GROUP_ORDER[position], color)
    }

    /// Wire id (-12..=-1).
    #[inline]
    pub const fn id(self) -> i8 {
        self.0
    }

    /// Iterate over all twelve slots, -1 first.
    pub fn all() -> impl Iterator<Item = Slot> {
        (1i8..=12).map(|n| Slot(-n))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}

/// Either end of a relocation: a real square or an off-board slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Board(Square),
    OffBoard(Slot),
}

impl Location {
    /// Signed index as sent on the wire: 0..63 for squares, -12..-1 for slots.
    #[inline]
    pub const fn wire_index(self) -> i8 {
        match self {
            Location::Board(square) => square.raw() as i8,
            Location::OffBoard(slot) => slot.id(),
        }
    }

    /// Build a location from a signed wire index.
    pub fn from_wire_index(index: i8) -> Option<Location> {
        if index >= 0 {
            Square::new(index as u8).map(Location::Board)
        } else {
            Slot::new(index).map(Location::OffBoard)
        }
    }

    /// The real square, if this is one.
    #[inline]
    pub const fn square(self) -> Option<Square> {
        match self {
            Location::Board(square) => Some(square),
            Location::OffBoard(_) => None,
        }
    }
}

impl From<Square> for Location {
    fn from(square: Square) -> Location {
        Location::Board(square)
    }
}

impl From<Slot> for Location {
    fn from(slot: Slot) -> Location {
        Location::OffBoard(slot)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Board(square) => write!(f, "{square}"),
            Location::OffBoard(slot) => write!(f, "{slot}"),
        }
    }
}

impl FromStr for Location {
    type Err = ();

    /// Accepts algebraic squares ("e2") and slot ids ("-6").
    fn from_str(s: &str) -> Result<Location, ()> {
        if let Some(square) = Square::from_algebraic(s) {
            return Ok(Location::Board(square));
        }
        let id: i8 = s.parse().map_err(|_| ())?;
        Slot::new(id).map(Location::OffBoard).ok_or(())
    }
}
