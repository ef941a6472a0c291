//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use tracing::info;

use rt_control::RailContext;
use rt_core::SimConfig;
use rt_driver::Passenger;
use rt_network::RailNetwork;
use rt_schedule::{HeadwayWindow, TrainTrip, TripIdGen, compose_trips};

use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`] — start time, tick length, total ticks, seed, …
/// - [`RailNetwork`] — built and validated by `rt_network`
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                          |
/// |----------------------|----------------------------------|
/// | `.headways(v)`       | no scheduled service             |
/// | `.trips(v)`          | no pre-built trips               |
/// | `.passengers(v)`     | empty platforms                  |
/// | `.first_trip_id(n)`  | 1                                |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, Arc::new(network))
///     .headways(windows)
///     .passengers(demand)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:        SimConfig,
    network:       Arc<RailNetwork>,
    headways:      Vec<HeadwayWindow>,
    trips:         Vec<TrainTrip>,
    passengers:    Vec<Passenger>,
    first_trip_id: u64,
}

impl SimBuilder {
    pub fn new(config: SimConfig, network: Arc<RailNetwork>) -> Self {
        Self {
            config,
            network,
            headways:      Vec::new(),
            trips:         Vec::new(),
            passengers:    Vec::new(),
            first_trip_id: 1,
        }
    }

    /// Headway windows, expanded into trips at build time in the order
    /// given.
    pub fn headways(mut self, windows: Vec<HeadwayWindow>) -> Self {
        self.headways = windows;
        self
    }

    /// Trips built elsewhere, queued alongside the composed ones.
    pub fn trips(mut self, trips: Vec<TrainTrip>) -> Self {
        self.trips = trips;
        self
    }

    /// Passengers waiting at their origin platform at tick 0.
    pub fn passengers(mut self, passengers: Vec<Passenger>) -> Self {
        self.passengers = passengers;
        self
    }

    pub fn first_trip_id(mut self, first: u64) -> Self {
        self.first_trip_id = first;
        self
    }

    /// Validate inputs, compose the timetable and return a ready-to-run
    /// [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        if self.config.tick_duration_secs == 0 {
            return Err(SimError::Config("tick_duration_secs must be positive".into()));
        }

        // ── Trip ids continue past any supplied trip ──────────────────────
        let first = self
            .trips
            .iter()
            .map(|t| t.id.0 + 1)
            .max()
            .unwrap_or(0)
            .max(self.first_trip_id);
        let ids = TripIdGen::new(first);

        let mut trips = compose_trips(&self.network, &self.headways, &ids)?;
        trips.extend(self.trips);
        for trip in &trips {
            if self.network.line(trip.line).is_none() {
                return Err(SimError::Config(format!("trip {} runs on unknown line {}", trip.id, trip.line)));
            }
        }
        let trip_count = trips.len();

        let rail = RailContext::new(Arc::clone(&self.network), trips, ids);
        let passenger_count = self.passengers.len();
        for p in self.passengers {
            let origin = p.origin;
            if !rail.add_passenger(p) {
                return Err(SimError::UnknownOrigin(origin));
            }
        }

        #[cfg(feature = "parallel")]
        let pool = match self.config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SimError::Config(e.to_string()))?,
            ),
            None => None,
        };

        info!(
            trips = trip_count,
            passengers = passenger_count,
            start = %self.config.start_time,
            ticks = self.config.total_ticks,
            "simulation built"
        );

        Ok(Sim {
            clock: self.config.make_clock(),
            config: self.config,
            rail,
            #[cfg(feature = "parallel")]
            pool,
        })
    }
}
