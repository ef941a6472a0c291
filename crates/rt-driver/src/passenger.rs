//! Passengers as seen by the rail core: where they wait, where they go.

use std::str::FromStr;

use rt_core::{DailyTime, PassengerId, PlatformId, RailError};

#[derive(Clone, Debug, PartialEq)]
pub struct Passenger {
    pub id:              PassengerId,
    pub origin:          PlatformId,
    pub destination:     PlatformId,
    /// Times a full train left this passenger behind.
    pub denied_boarding: u32,
    pub boarded_at:      Option<DailyTime>,
}

impl Passenger {
    pub fn new(id: PassengerId, origin: PlatformId, destination: PlatformId) -> Self {
        Self {
            id,
            origin,
            destination,
            denied_boarding: 0,
            boarded_at:      None,
        }
    }
}

/// Operator restriction on passenger movement at one platform, for one train.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PassengerRestriction {
    Boarding,
    Alighting,
    Both,
}

impl PassengerRestriction {
    #[inline]
    pub fn blocks_boarding(self) -> bool {
        matches!(self, Self::Boarding | Self::Both)
    }

    #[inline]
    pub fn blocks_alighting(self) -> bool {
        matches!(self, Self::Alighting | Self::Both)
    }
}

impl FromStr for PassengerRestriction {
    type Err = RailError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boarding"  => Ok(Self::Boarding),
            "alighting" => Ok(Self::Alighting),
            "both"      => Ok(Self::Both),
            other => Err(RailError::Parse(format!(
                "invalid restriction {other:?}: expected boarding, alighting or both"
            ))),
        }
    }
}
