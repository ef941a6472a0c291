//! Strongly typed, zero-cost identifier wrappers.
//!
//! Network ids (`LineId`, `BlockId`, `PlatformId`, `StationId`) are dense
//! indices assigned by the network builder, so `id.index()` addresses the
//! network's `Vec`s directly.  `TrainId` is an operator-facing number drawn
//! from a per-line pool and is *not* an index.
//!
//! A running train is identified by a [`TrainKey`] (owning line + id) and
//! addressed inside the simulation by a [`TrainRef`], a generational arena
//! key that goes stale once the train is removed.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a directed rail line (one direction of service).
    pub struct LineId(u32);
}

typed_id! {
    /// Operator-facing train number, recycled through a per-line pool.
    pub struct TrainId(u32);
}

typed_id! {
    /// Globally unique, monotonically increasing trip number.
    pub struct TripId(u64);
}

typed_id! {
    /// Index of a track block.
    pub struct BlockId(u32);
}

typed_id! {
    /// Index of a platform.  Each platform belongs to exactly one line.
    pub struct PlatformId(u32);
}

typed_id! {
    /// Index of a station (a group of platforms, one per line served).
    pub struct StationId(u32);
}

typed_id! {
    /// Passenger number, assigned by whoever generates demand.
    pub struct PassengerId(u64);
}

// ── TrainKey ──────────────────────────────────────────────────────────────────

/// Identity of a train: the line whose pool owns the id, plus the id.
///
/// The key never changes while the train exists, even after a U-turn moves
/// the train onto the opposite line.  The id is returned to `line`'s pool.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainKey {
    pub line:  LineId,
    pub train: TrainId,
}

impl TrainKey {
    #[inline]
    pub fn new(line: LineId, train: TrainId) -> Self {
        Self { line, train }
    }
}

impl fmt::Display for TrainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}/T{}", self.line.0, self.train.0)
    }
}

// ── TrainRef ──────────────────────────────────────────────────────────────────

slotmap::new_key_type! {
    /// Generational arena key of a live train.
    ///
    /// A `TrainRef` held after its train was removed never resolves to a
    /// different train: the slot's generation has moved on.
    pub struct TrainRef;
}
