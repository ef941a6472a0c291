//! Unit tests for rt-core primitives.

#[cfg(test)]
mod ids {
    use crate::{LineId, PlatformId, TrainId, TrainKey, TripId};

    #[test]
    fn index_roundtrip() {
        let id = PlatformId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(PlatformId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(LineId::INVALID.0, u32::MAX);
        assert_eq!(TripId::INVALID.0, u64::MAX);
        assert!(!TrainId::default().is_valid());
    }

    #[test]
    fn train_key_orders_by_line_then_train() {
        let a = TrainKey::new(LineId(0), TrainId(9));
        let b = TrainKey::new(LineId(1), TrainId(1));
        assert!(a < b);
        assert_eq!(a.to_string(), "L0/T9");
    }

    #[test]
    fn display() {
        assert_eq!(TrainId(7).to_string(), "TrainId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::{DailyTime, SimClock, Tick};

    #[test]
    fn parse_and_print() {
        let t = DailyTime::parse("06:05:30").unwrap();
        assert_eq!(t, DailyTime::from_hms(6, 5, 30));
        assert_eq!(t.to_string(), "06:05:30");
    }

    #[test]
    fn parse_without_seconds() {
        assert_eq!("07:30".parse::<DailyTime>().unwrap(), DailyTime::from_hms(7, 30, 0));
    }

    #[test]
    fn accepts_after_midnight_service() {
        let t = DailyTime::parse("25:10:00").unwrap();
        assert_eq!(t.secs(), 25 * 3_600 + 600);
        assert_eq!(t.to_string(), "25:10:00");
    }

    #[test]
    fn rejects_malformed() {
        assert!(DailyTime::parse("6").is_err());
        assert!(DailyTime::parse("06:61:00").is_err());
        assert!(DailyTime::parse("06:00:00:00").is_err());
        assert!(DailyTime::parse("ab:cd").is_err());
    }

    #[test]
    fn secs_since_saturates() {
        let a = DailyTime::from_hms(6, 0, 0);
        let b = DailyTime::from_hms(6, 0, 45);
        assert_eq!(b.secs_since(a), 45);
        assert_eq!(a.secs_since(b), 0);
    }

    #[test]
    fn clock_now_follows_ticks() {
        let mut clock = SimClock::new(DailyTime::from_hms(6, 0, 0), 5);
        assert_eq!(clock.now(), DailyTime::from_hms(6, 0, 0));
        clock.advance();
        clock.advance();
        assert_eq!(clock.current_tick, Tick(2));
        assert_eq!(clock.now(), DailyTime::from_hms(6, 0, 10));
        assert_eq!(clock.elapsed_secs(), 10);
        assert_eq!(clock.time_of(Tick(12)), DailyTime::from_hms(6, 1, 0));
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..16 {
            assert_eq!(a.gen_range(0..1_000u32), b.gen_range(0..1_000u32));
        }
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = SimRng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
    }
}

#[cfg(test)]
mod sync {
    use std::sync::{Arc, Mutex};

    use crate::lock;

    #[test]
    fn lock_recovers_from_poison() {
        let m = Arc::new(Mutex::new(3));
        let m2 = Arc::clone(&m);
        let _ = std::thread::spawn(move || {
            let _g = m2.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(m.is_poisoned());
        assert_eq!(*lock(&m), 3);
    }
}
