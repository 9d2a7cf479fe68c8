use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tickflow::{
    Boundary, DuplicatePolicy, HistoryConfig, HistoryError, HistoryStore, InMemoryHistory,
    TickflowError, TickflowResult, TimeIndexPolicy,
};

fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn seeded(samples: &[(i64, char)]) -> TickflowResult<InMemoryHistory<char>> {
    let history = InMemoryHistory::new();
    for &(secs, value) in samples {
        history.push(t(secs), value)?;
    }
    Ok(history)
}

#[test]
fn extrapolated_end_on_duplicate_timestamp_returns_last_inserted() -> TickflowResult<()> {
    init_tracing();
    let history = seeded(&[(1, 'A'), (5, 'B'), (5, 'C')])?;

    for requested in DuplicatePolicy::ALL {
        let sample = history
            .boundary_sample(t(5), Boundary::End, TimeIndexPolicy::Extrapolate, requested)?
            .expect("extrapolated end yields a sample");
        assert_eq!(sample.value, 'C');
    }
    Ok(())
}

#[test]
fn inclusive_includes_and_exclusive_excludes_exact_end() -> TickflowResult<()> {
    let history = seeded(&[(1, 'A'), (3, 'B'), (5, 'C')])?;

    let inclusive = history.values_between(
        t(0),
        t(5),
        TimeIndexPolicy::Inclusive,
        TimeIndexPolicy::Inclusive,
    )?;
    assert!(inclusive.iter().any(|s| s.time == t(5)));

    let exclusive = history.values_between(
        t(0),
        t(5),
        TimeIndexPolicy::Inclusive,
        TimeIndexPolicy::Exclusive,
    )?;
    assert!(exclusive.iter().all(|s| s.time < t(5)));
    assert_eq!(exclusive.len(), 2);
    Ok(())
}

#[test]
fn extrapolate_between_samples_never_reports_no_data() -> TickflowResult<()> {
    let history = seeded(&[(10, 'A'), (20, 'B'), (30, 'C')])?;

    for secs in [11, 15, 19, 25, 29, 35] {
        let end = history.boundary_sample(
            t(secs),
            Boundary::End,
            TimeIndexPolicy::Extrapolate,
            DuplicatePolicy::LastValue,
        )?;
        let end = end.expect("end edge yields a sample");
        assert!(end.time <= t(secs));
    }

    for secs in [5, 11, 15, 25, 29] {
        let start = history.boundary_sample(
            t(secs),
            Boundary::Start,
            TimeIndexPolicy::Extrapolate,
            DuplicatePolicy::LastValue,
        )?;
        let start = start.expect("start edge yields a sample");
        assert!(start.time >= t(secs));
    }
    Ok(())
}

#[test]
fn non_extrapolating_miss_is_empty_not_error() -> TickflowResult<()> {
    let history = seeded(&[(10, 'A'), (20, 'B')])?;

    for policy in [TimeIndexPolicy::Inclusive, TimeIndexPolicy::Exclusive] {
        let edge =
            history.boundary_sample(t(15), Boundary::End, policy, DuplicatePolicy::LastValue)?;
        assert!(edge.is_none());

        let range = history.values_between(t(12), t(18), policy, policy)?;
        assert!(range.is_empty());
    }
    Ok(())
}

#[test]
fn inverted_range_is_a_fault() {
    let history = seeded(&[(1, 'A')]).unwrap();
    let err = history
        .values_between(t(9), t(1), TimeIndexPolicy::Inclusive, TimeIndexPolicy::Inclusive)
        .unwrap_err();
    assert!(matches!(err, HistoryError::InvalidRange { .. }));

    let err: TickflowError = err.into();
    assert!(err.is_history());
}

#[test]
fn out_of_order_push_surfaces_through_top_level_error() {
    let result = seeded(&[(5, 'A'), (4, 'B')]);
    assert!(matches!(
        result,
        Err(TickflowError::History(HistoryError::OutOfOrder { .. }))
    ));
}

#[test]
fn windowed_history_only_answers_retained_samples() -> TickflowResult<()> {
    init_tracing();
    let config = HistoryConfig::default()
        .with_max_ticks(100)
        .with_window(Duration::seconds(10));
    let history = InMemoryHistory::with_config(config)?;

    for secs in 0..=30 {
        history.push(t(secs), secs)?;
    }

    assert_eq!(history.first_time()?, Some(t(20)));
    assert_eq!(history.len()?, 11);

    let stand_in = history.boundary_sample(
        t(5),
        Boundary::Start,
        TimeIndexPolicy::Extrapolate,
        DuplicatePolicy::LastValue,
    )?;
    assert_eq!(stand_in.map(|s| s.value), Some(20));
    Ok(())
}

#[test]
fn concurrent_readers_and_writer() -> TickflowResult<()> {
    let history: Arc<InMemoryHistory<i64>> = Arc::new(InMemoryHistory::new());

    let writer = {
        let history = Arc::clone(&history);
        thread::spawn(move || -> Result<(), HistoryError> {
            for secs in 0..200 {
                history.push(t(secs), secs)?;
            }
            Ok(())
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let history = Arc::clone(&history);
            thread::spawn(move || -> Result<(), HistoryError> {
                for _ in 0..50 {
                    let window = history.values_between(
                        t(0),
                        t(199),
                        TimeIndexPolicy::Inclusive,
                        TimeIndexPolicy::Inclusive,
                    )?;
                    assert!(window.windows(2).all(|w| w[0].time <= w[1].time));
                }
                Ok(())
            })
        })
        .collect();

    writer.join().expect("writer thread panicked")?;
    for reader in readers {
        reader.join().expect("reader thread panicked")?;
    }

    assert_eq!(history.len()?, 200);
    Ok(())
}

#[test]
fn store_is_usable_as_trait_object() -> TickflowResult<()> {
    let store: Box<dyn HistoryStore<char>> = Box::new(seeded(&[(1, 'A'), (2, 'B')])?);
    let times = store.times_between(
        t(1),
        t(2),
        TimeIndexPolicy::Exclusive,
        TimeIndexPolicy::Inclusive,
    )?;
    assert_eq!(times, vec![t(2)]);
    Ok(())
}
