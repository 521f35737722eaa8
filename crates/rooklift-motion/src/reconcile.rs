//! Bringing a physical layout in line with a target layout, one relocation
//! at a time.
//!
//! Each call to [`iter_reset_board`] looks at the two layouts afresh and
//! makes the single most useful relocation:
//!
//! 1. Squares that already match are ignored.
//! 2. A piece that some empty target square needs is moved straight there.
//! 3. A piece nothing needs is cleared: off a target square onto a free
//!    square, otherwise back to its storage slot.
//! 4. An unmatched target square is supplied. If a needed piece sits on it,
//!    that piece is first moved aside; if it is empty, the piece comes from
//!    its storage slot.
//! 5. Once nothing is left to move, the target is adopted as the current
//!    layout.
//!
//! A free square is one that is empty now and empty in the target. Pieces
//! parked there in step 3 or 4 are picked up again by step 2.

use std::sync::atomic::{AtomicBool, Ordering};

use rooklift_core::{BoardModel, Color, Location, Occupancy, Piece, Snapshot, Square, off_board_square};
use rooklift_link::CommandSink;
use tracing::{debug, info};

use crate::error::{RelocationAborted, ResetError};
use crate::translate::{Relocation, relocate};

/// What one reconciliation call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetProgress {
    /// One piece was moved; call again.
    Relocated(Relocation),
    /// The layouts match and the target was adopted.
    Done,
}

impl ResetProgress {
    #[inline]
    pub fn is_done(self) -> bool {
        matches!(self, ResetProgress::Done)
    }
}

/// The target's occupancy expressed in the squares of a board seen from
/// `perspective`.
fn aligned_target<T: Occupancy>(target: &BoardModel<T>, perspective: Color) -> Snapshot {
    let mirrored = target.perspective() != perspective;
    let mut aligned = Snapshot::empty();
    for sq in Square::all() {
        let source = if mirrored { sq.mirror() } else { sq };
        aligned.set(sq, target.piece_at(source));
    }
    aligned
}

/// The mismatch between two layouts, recomputed on every call.
struct Mismatch {
    /// Target squares not yet holding their piece.
    targets: Vec<(Square, Piece)>,
    /// Current squares whose piece differs from the target's.
    current: Vec<(Square, Piece)>,
    /// First square empty in both layouts.
    free: Option<Square>,
}

impl Mismatch {
    fn between(current: &Snapshot, target: &Snapshot) -> Mismatch {
        let mut mismatch = Mismatch {
            targets: Vec::new(),
            current: Vec::new(),
            free: None,
        };
        for sq in Square::all() {
            let (have, want) = (current.get(sq), target.get(sq));
            if have == want {
                if have.is_none() && mismatch.free.is_none() {
                    mismatch.free = Some(sq);
                }
                continue;
            }
            if let Some(piece) = want {
                mismatch.targets.push((sq, piece));
            }
            if let Some(piece) = have {
                mismatch.current.push((sq, piece));
            }
        }
        mismatch
    }

    fn needed(&self, piece: Piece) -> bool {
        self.targets.iter().any(|&(_, wanted)| wanted == piece)
    }
}

/// Pick the next relocation, or `None` once the layouts match.
fn next_relocation(current: &Snapshot, target: &Snapshot, perspective: Color) -> Option<Relocation> {
    let mismatch = Mismatch::between(current, target);

    // Direct placement onto an empty target square.
    for &(to, piece) in &mismatch.targets {
        if current.get(to).is_some() {
            continue;
        }
        if let Some(&(from, _)) = mismatch.current.iter().find(|&&(_, have)| have == piece) {
            debug!(%from, %to, "direct placement");
            return Some(Relocation::new(from, to));
        }
    }

    // Clear pieces nothing is waiting for.
    for &(from, piece) in &mismatch.current {
        if mismatch.needed(piece) {
            continue;
        }
        let storage = Location::from(off_board_square(piece, perspective));
        let to = match (target.get(from), mismatch.free) {
            (Some(_), Some(free)) => Location::Board(free),
            _ => storage,
        };
        debug!(%from, %to, "clearing unneeded piece");
        return Some(Relocation::new(from, to));
    }

    // Supply the first unmatched target square.
    if let Some(&(to, piece)) = mismatch.targets.first() {
        if let Some(occupant) = current.get(to) {
            let aside = match mismatch.free {
                Some(free) => Location::Board(free),
                None => off_board_square(occupant, perspective).into(),
            };
            debug!(from = %to, to = %aside, "moving needed piece aside");
            return Some(Relocation::new(to, aside));
        }
        let from = off_board_square(piece, perspective);
        debug!(%from, %to, "supplying from storage");
        return Some(Relocation::new(from, to));
    }

    None
}

/// Number of squares where `current` and `target` disagree.
pub fn mismatched_squares<T: Occupancy>(current: &BoardModel<Snapshot>, target: &BoardModel<T>) -> usize {
    let aligned = aligned_target(target, current.perspective());
    Square::all()
        .filter(|&sq| current.piece_at(sq) != aligned.get(sq))
        .count()
}

/// Make at most one relocation that brings `current` closer to `target`.
///
/// `current` is the physical layout. Its snapshot follows every successful
/// relocation, so repeated calls converge without re-sensing the board.
/// When nothing is left to move, the target's occupancy and perspective
/// replace `current`'s and [`ResetProgress::Done`] is returned.
///
/// On a link failure both layouts are left exactly as they were.
pub fn iter_reset_board<S, T>(
    sink: &mut S,
    current: &mut BoardModel<Snapshot>,
    target: &BoardModel<T>,
) -> Result<ResetProgress, RelocationAborted>
where
    S: CommandSink + ?Sized,
    T: Occupancy,
{
    let perspective = current.perspective();
    let aligned = aligned_target(target, perspective);

    let Some(relocation) = next_relocation(current.position(), &aligned, perspective) else {
        current.reorient(target.perspective());
        current.set_position(target.snapshot());
        info!("physical board matches target");
        return Ok(ResetProgress::Done);
    };

    relocate(sink, current, relocation.from, relocation.to)
        .into_result()
        .map_err(|fault| RelocationAborted {
            step: 0,
            from: relocation.from,
            to: relocation.to,
            fault,
        })?;
    relocation.apply_to(current.position_mut(), perspective);
    Ok(ResetProgress::Relocated(relocation))
}

/// Run [`iter_reset_board`] until the layouts match.
///
/// `stop` is checked between relocations; an in-flight relocation always
/// completes. At most `max_steps` relocations are made, and `on_step` sees
/// the board after each one. Returns the number of relocations on success.
pub fn reset_board<S, T, F>(
    sink: &mut S,
    current: &mut BoardModel<Snapshot>,
    target: &BoardModel<T>,
    max_steps: usize,
    stop: &AtomicBool,
    mut on_step: F,
) -> Result<usize, ResetError>
where
    S: CommandSink + ?Sized,
    T: Occupancy,
    F: FnMut(Relocation, &BoardModel<Snapshot>),
{
    let mut steps = 0;
    loop {
        if steps >= max_steps && mismatched_squares(current, target) > 0 {
            return Err(ResetError::StepLimit { steps });
        }
        if stop.load(Ordering::Acquire) {
            info!(steps, "reset stopped");
            return Err(ResetError::Stopped { steps });
        }
        match iter_reset_board(sink, current, target) {
            Ok(ResetProgress::Done) => return Ok(steps),
            Ok(ResetProgress::Relocated(relocation)) => {
                steps += 1;
                on_step(relocation, current);
            }
            Err(source) => return Err(ResetError::Aborted { steps, source }),
        }
    }
}
