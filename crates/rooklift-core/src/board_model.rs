//! The board as the robot sees it: a position, where each piece sits inside
//! its square, and which side of the table is White.

use crate::codec::Offset;
use crate::color::Color;
use crate::engine::Occupancy;
use crate::piece::Piece;
use crate::snapshot::Snapshot;
use crate::square::{Location, Square};

/// Sub-square offsets for all 64 real squares. Starts fully centered.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetTable([Offset; Square::COUNT]);

impl OffsetTable {
    /// All squares centered.
    pub const fn centered() -> OffsetTable {
        OffsetTable([Offset::CENTER; Square::COUNT])
    }

    /// Offset recorded for `sq`.
    #[inline]
    pub fn get(&self, sq: Square) -> Offset {
        self.0[sq.index()]
    }

    /// Record an offset for `sq`.
    #[inline]
    pub fn set(&mut self, sq: Square, offset: Offset) {
        self.0[sq.index()] = offset;
    }

    /// The same physical offsets described from the other side of the board.
    pub fn mirrored(&self) -> OffsetTable {
        let mut mirrored = OffsetTable::centered();
        for sq in Square::all() {
            let offset = self.get(sq.mirror());
            mirrored.set(sq, Offset::new(-offset.x, -offset.y));
        }
        mirrored
    }
}

impl Default for OffsetTable {
    fn default() -> OffsetTable {
        OffsetTable::centered()
    }
}

/// A position `P` plus the physical bookkeeping the robot needs.
///
/// `P` is whatever owns occupancy: the external engine's position for the
/// game in progress, or a [`Snapshot`] for a raw physical layout being
/// reconciled.
#[derive(Debug, Clone)]
pub struct BoardModel<P> {
    position: P,
    offsets: OffsetTable,
    perspective: Color,
}

impl<P: Occupancy> BoardModel<P> {
    /// Wrap `position` with all pieces centered.
    pub fn new(position: P, perspective: Color) -> BoardModel<P> {
        BoardModel {
            position,
            offsets: OffsetTable::centered(),
            perspective,
        }
    }

    /// The position owning occupancy.
    #[inline]
    pub fn position(&self) -> &P {
        &self.position
    }

    /// Mutable access to the position.
    #[inline]
    pub fn position_mut(&mut self) -> &mut P {
        &mut self.position
    }

    /// Replace the position, keeping offsets and perspective.
    pub fn set_position(&mut self, position: P) {
        self.position = position;
    }

    /// Piece on `sq`.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.position.piece_at(sq)
    }

    /// Offset of the piece standing at `location`. Slots are always centered.
    pub fn offset(&self, location: Location) -> Offset {
        match location {
            Location::Board(sq) => self.offsets.get(sq),
            Location::OffBoard(_) => Offset::CENTER,
        }
    }

    /// Record a measured offset for `sq`.
    pub fn set_offset(&mut self, sq: Square, offset: Offset) {
        self.offsets.set(sq, offset);
    }

    /// Center `location` after a piece was placed on or removed from it.
    pub fn center(&mut self, location: Location) {
        if let Location::Board(sq) = location {
            self.offsets.set(sq, Offset::CENTER);
        }
    }

    /// The whole offset table.
    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    /// Replace the whole offset table.
    pub fn set_offsets(&mut self, offsets: OffsetTable) {
        self.offsets = offsets;
    }

    /// Which color sits on the robot's rank 1 side.
    #[inline]
    pub fn perspective(&self) -> Color {
        self.perspective
    }

    /// Change the perspective.
    pub fn set_perspective(&mut self, perspective: Color) {
        self.perspective = perspective;
    }

    /// Copy the current occupancy.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.position)
    }
}

impl BoardModel<Snapshot> {
    /// Switch perspective without changing anything physically: squares and
    /// offsets are re-expressed from the new side.
    pub fn reorient(&mut self, perspective: Color) {
        if perspective == self.perspective {
            return;
        }
        self.position = self.position.mirrored();
        self.offsets = self.offsets.mirrored();
        self.perspective = perspective;
    }
}
