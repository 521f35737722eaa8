//! Relocation command encoding.
//!
//! ```text
//! bits 31-24: from location  (signed byte, squares mirrored for Black)
//! bits 23-16: offset x       (percent, -100..=100, two's complement)
//! bits 15-8:  offset y       (percent, -100..=100, two's complement)
//! bits  7-0:  to location    (signed byte, squares mirrored for Black)
//! ```

use std::fmt;

use crate::color::Color;
use crate::piece::Piece;
use crate::square::{Location, Slot};

/// Sub-square position of a piece, each axis a fraction in `[-1, 1]` of half
/// a square. `(0, 0)` is the square center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    /// The square center.
    pub const CENTER: Offset = Offset { x: 0.0, y: 0.0 };

    /// Create an offset, clamping both axes into `[-1, 1]`.
    pub fn new(x: f32, y: f32) -> Offset {
        Offset {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    /// Return `true` for the square center.
    pub fn is_centered(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) }
}

/// Scale a fraction to a whole percentage in -100..=100.
fn to_percent(fraction: f32) -> i8 {
    if fraction.is_nan() {
        return 0;
    }
    (fraction * 100.0).clamp(-100.0, 100.0) as i8
}

/// A packed 32-bit relocation command.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command(u32);

impl Command {
    /// Wrap a raw 32-bit word.
    #[inline]
    pub const fn from_raw(raw: u32) -> Command {
        Command(raw)
    }

    /// The raw 32-bit word.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The 16 most significant bits: from location and offset x.
    #[inline]
    pub const fn upper_half(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Signed from field as it appears on the wire.
    #[inline]
    pub const fn from_field(self) -> i8 {
        (self.0 >> 24) as u8 as i8
    }

    /// Signed offset-x field in percent.
    #[inline]
    pub const fn offset_x_field(self) -> i8 {
        (self.0 >> 16) as u8 as i8
    }

    /// Signed offset-y field in percent.
    #[inline]
    pub const fn offset_y_field(self) -> i8 {
        (self.0 >> 8) as u8 as i8
    }

    /// Signed to field as it appears on the wire.
    #[inline]
    pub const fn to_field(self) -> i8 {
        self.0 as u8 as i8
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Command({:#010x} from={} dx={} dy={} to={})",
            self.0,
            self.from_field(),
            self.offset_x_field(),
            self.offset_y_field(),
            self.to_field()
        )
    }
}

/// Map a location to its wire byte for `perspective`.
///
/// Real squares are mirrored when the board is played from the black side;
/// slot ids already denote physical places and pass through untouched.
fn wire_byte(location: Location, perspective: Color) -> u8 {
    let index = match (location, perspective) {
        (Location::Board(square), Color::Black) => square.mirror().raw() as i8,
        _ => location.wire_index(),
    };
    index as u8
}

/// Encode a relocation of the piece at `from` (sitting at `offset` within its
/// square) to `to`. Total and pure.
pub fn encode(from: Location, to: Location, offset: Offset, perspective: Color) -> Command {
    let mut dx = to_percent(offset.x);
    let mut dy = to_percent(offset.y);
    if perspective == Color::Black {
        dx = -dx;
        dy = -dy;
    }

    let from = u32::from(wire_byte(from, perspective));
    let to = u32::from(wire_byte(to, perspective));
    let dx = u32::from(dx as u8);
    let dy = u32::from(dy as u8);

    Command(from << 24 | dx << 16 | dy << 8 | to)
}

/// The off-board slot that stores `piece` when the board is seen from
/// `perspective`.
#[inline]
pub fn off_board_square(piece: Piece, perspective: Color) -> Slot {
    Slot::for_piece(piece, perspective)
}

#[cfg(test)]
mod tests {
    use super::{Command, Offset, encode, to_percent};
    use crate::color::Color;
    use crate::square::{Location, Slot, Square};

    fn loc(index: i8) -> Location {
        Location::from_wire_index(index).unwrap()
    }

    fn e(name: &str) -> Location {
        Location::Board(Square::from_algebraic(name).unwrap())
    }

    #[test]
    fn centered_white_move_packs_indices() {
        let cmd = encode(e("e2"), e("e4"), Offset::CENTER, Color::White);
        assert_eq!(cmd.raw(), 0x0C00_001C);
        assert_eq!(cmd.from_field(), 12);
        assert_eq!(cmd.to_field(), 28);
        assert_eq!(cmd.upper_half(), 0x0C00);
    }

    #[test]
    fn negative_fields_use_twos_complement() {
        let slot = Location::OffBoard(Slot::new(-6).unwrap());
        let cmd = encode(e("e7"), slot, Offset::new(-0.5, 0.25), Color::White);
        assert_eq!(cmd.raw() >> 24, 52);
        assert_eq!((cmd.raw() >> 16) & 0xFF, 0xCE);
        assert_eq!((cmd.raw() >> 8) & 0xFF, 25);
        assert_eq!(cmd.raw() & 0xFF, 0xFA);
        assert_eq!(cmd.to_field(), -6);
        assert_eq!(cmd.offset_x_field(), -50);
    }

    #[test]
    fn offsets_clamp_to_full_percent() {
        assert_eq!(to_percent(3.0), 100);
        assert_eq!(to_percent(-7.5), -100);
        assert_eq!(to_percent(f32::NAN), 0);
        let cmd = encode(e("a1"), e("a2"), Offset { x: 2.0, y: -2.0 }, Color::White);
        assert_eq!(cmd.offset_x_field(), 100);
        assert_eq!(cmd.offset_y_field(), -100);
    }

    #[test]
    fn black_perspective_mirrors_squares_and_offsets() {
        let offsets = [
            Offset::CENTER,
            Offset::new(0.3, -0.7),
            Offset::new(-1.0, 1.0),
        ];
        for from in 0i8..64 {
            for to in 0i8..64 {
                for offset in offsets {
                    let black = encode(loc(from), loc(to), offset, Color::Black);
                    let negated = Offset { x: -offset.x, y: -offset.y };
                    let white = encode(loc(63 - from), loc(63 - to), negated, Color::White);
                    assert_eq!(black, white, "from={from} to={to} offset={offset:?}");
                }
            }
        }
    }

    #[test]
    fn slots_are_not_mirrored() {
        for id in -12i8..=-1 {
            for perspective in Color::ALL {
                let cmd = encode(loc(id), e("d4"), Offset::CENTER, perspective);
                assert_eq!(cmd.from_field(), id);
                let cmd = encode(e("d4"), loc(id), Offset::CENTER, perspective);
                assert_eq!(cmd.to_field(), id);
            }
        }
    }

    #[test]
    fn encode_is_total_over_all_locations() {
        for from in -12i8..64 {
            for to in -12i8..64 {
                for perspective in Color::ALL {
                    let a = encode(loc(from), loc(to), Offset::new(0.1, 0.9), perspective);
                    let b = encode(loc(from), loc(to), Offset::new(0.1, 0.9), perspective);
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn debug_shows_fields() {
        let text = format!("{:?}", Command::from_raw(0xFA00_0010));
        assert!(text.contains("from=-6"), "{text}");
        assert!(text.contains("to=16"), "{text}");
    }
}
