mod test_signals;

use std::fs;

use sdrecorder::pcm;
use sdrecorder::signal_processing::HighpassFilter;
use sdrecorder::simulation::{FlakySink, ReadStep, ScriptedSource, SinkFault};
use sdrecorder::storage::FileSink;
use sdrecorder::{CaptureError, IterationOutcome, PipelineDriver};

use test_signals::{filtered_reference, scratch_dir, test_config, two_tone_capture};

const BATCH: usize = 512;

fn filter() -> HighpassFilter {
    HighpassFilter::new(16000.0, 20.0)
}

#[test]
fn test_stream_length_matches_persisted_batches() {
    let input = two_tone_capture(50.0, 440.0, 6000.0, 800.0, BATCH * 20 + 100);
    let config = test_config(BATCH);

    let mut driver = PipelineDriver::new(
        ScriptedSource::new(input.clone(), 16000),
        filter(),
        FlakySink::new(),
        &config,
    )
    .unwrap();

    let stats = driver.run_for(100);
    let sink = driver.sink();

    assert_eq!(stats.batches_persisted, 21);
    assert_eq!(stats.batches_dropped, 0);
    assert_eq!(sink.data().len(), input.len() * 2);
    assert_eq!(sink.data().len() as u64, stats.bytes_persisted);
    assert_eq!(
        sink.persisted().iter().sum::<usize>(),
        sink.data().len(),
        "every byte belongs to exactly one successful append"
    );

    // Batched processing equals filtering the whole stream at once, in order
    assert_eq!(pcm::decode(sink.data()), filtered_reference(&input, 20.0));
}

#[test]
fn test_partial_read_appends_only_valid_bytes() {
    let input = two_tone_capture(5.0, 1000.0, 4000.0, 0.0, BATCH * 4);
    let config = test_config(BATCH);

    let source = ScriptedSource::new(input.clone(), 16000).with_steps([
        ReadStep::Full,
        ReadStep::Partial(100),
        ReadStep::Full,
    ]);
    let mut driver = PipelineDriver::new(source, filter(), FlakySink::new(), &config).unwrap();

    driver.step();
    let outcome = driver.step();
    assert!(matches!(outcome, IterationOutcome::Persisted { samples: 100 }));

    driver.run_for(10);

    assert_eq!(driver.source().delivered()[..3], [BATCH, 100, BATCH]);
    assert_eq!(driver.sink().persisted()[..3], [BATCH * 2, 200, BATCH * 2]);
    assert_eq!(pcm::decode(driver.sink().data()), filtered_reference(&input, 20.0));
}

#[test]
fn test_timeout_skips_iteration() {
    let input = vec![1200i16; BATCH * 3];
    let config = test_config(BATCH);

    let source =
        ScriptedSource::new(input.clone(), 16000).with_steps([ReadStep::Full, ReadStep::Timeout]);
    let mut driver = PipelineDriver::new(source, filter(), FlakySink::new(), &config).unwrap();

    assert!(matches!(driver.step(), IterationOutcome::Persisted { .. }));
    assert!(matches!(driver.step(), IterationOutcome::NoData));
    let stats = driver.run_for(10);

    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.batches_persisted, 3);
    assert_eq!(driver.sink().attempts(), 3);
    assert_eq!(pcm::decode(driver.sink().data()), filtered_reference(&input, 20.0));
}

#[test]
fn test_bus_fault_counted_apart_from_timeouts() {
    let input = vec![900i16; BATCH * 2];
    let config = test_config(BATCH);

    let source = ScriptedSource::new(input.clone(), 16000).with_steps([
        ReadStep::Fault,
        ReadStep::Full,
        ReadStep::Timeout,
    ]);
    let mut driver = PipelineDriver::new(source, filter(), FlakySink::new(), &config).unwrap();

    match driver.step() {
        IterationOutcome::BusError { error } => {
            assert!(matches!(error, CaptureError::AudioStream(_)));
            assert!(!error.is_transient());
        }
        other => panic!("expected bus error, got {:?}", other),
    }
    assert!(matches!(driver.step(), IterationOutcome::Persisted { samples: BATCH }));
    assert!(matches!(driver.step(), IterationOutcome::NoData));
    let stats = driver.run_for(10);

    assert_eq!(stats.bus_errors, 1);
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.batches_persisted, 2);
    assert_eq!(driver.sink().attempts(), 2);
    assert_eq!(pcm::decode(driver.sink().data()), filtered_reference(&input, 20.0));
}

#[test]
fn test_open_failure_drops_only_that_batch() {
    let input = two_tone_capture(30.0, 700.0, 5000.0, 300.0, BATCH * 6);
    let config = test_config(BATCH);

    let sink = FlakySink::new()
        .with_fault(2, SinkFault::OpenFailure)
        .with_fault(4, SinkFault::OpenFailure);
    let mut driver =
        PipelineDriver::new(ScriptedSource::new(input.clone(), 16000), filter(), sink, &config)
            .unwrap();

    let outcomes: Vec<IterationOutcome> = (0..7).map(|_| driver.step()).collect();
    assert!(matches!(outcomes[2], IterationOutcome::Dropped { samples: BATCH, .. }));
    assert!(matches!(outcomes[3], IterationOutcome::Persisted { samples: BATCH }));
    assert!(matches!(outcomes[6], IterationOutcome::Closed));

    let stats = driver.stats().clone();
    assert_eq!(stats.batches_persisted, 4);
    assert_eq!(stats.batches_dropped, 2);
    assert_eq!(stats.samples_dropped, (BATCH * 2) as u64);

    // The filter runs over dropped batches too, so surviving batches match
    // the continuous reference with the dropped ranges cut out.
    let reference = filtered_reference(&input, 20.0);
    let expected: Vec<i16> = reference
        .chunks(BATCH)
        .enumerate()
        .filter(|(i, _)| *i != 2 && *i != 4)
        .flat_map(|(_, chunk)| chunk.iter().copied())
        .collect();
    assert_eq!(pcm::decode(driver.sink().data()), expected);
}

#[test]
fn test_short_write_is_not_retried() {
    let input = vec![500i16; BATCH * 3];
    let config = test_config(BATCH);

    let sink = FlakySink::new().with_fault(1, SinkFault::ShortWrite(10));
    let mut driver =
        PipelineDriver::new(ScriptedSource::new(input, 16000), filter(), sink, &config).unwrap();

    match driver.step() {
        IterationOutcome::Persisted { .. } => {}
        other => panic!("unexpected outcome {:?}", other),
    }
    match driver.step() {
        IterationOutcome::Dropped { error, .. } => {
            assert!(matches!(
                error,
                CaptureError::ShortWrite {
                    expected: 1024,
                    written: 10
                }
            ));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    driver.step();

    assert_eq!(driver.sink().attempts(), 3);
    assert_eq!(driver.sink().data().len(), BATCH * 2 * 2 + 10);
}

#[test]
fn test_medium_removed_and_restored() {
    let dir = scratch_dir("medium-removed");
    let card = dir.join("card");
    let parked = dir.join("parked");
    fs::create_dir(&card).unwrap();

    let mut config = test_config(BATCH);
    config.storage.root = card.clone();
    config.storage.output_file = "capture.raw".into();
    config.storage.sync_on_close = false;

    let input = two_tone_capture(10.0, 2000.0, 3000.0, -400.0, BATCH * 3);
    let mut driver = PipelineDriver::new(
        ScriptedSource::new(input.clone(), 16000),
        filter(),
        FileSink::from_config(&config.storage),
        &config,
    )
    .unwrap();

    assert!(matches!(driver.step(), IterationOutcome::Persisted { .. }));

    fs::rename(&card, &parked).unwrap();
    match driver.step() {
        IterationOutcome::Dropped { error, .. } => {
            assert!(matches!(error, CaptureError::StorageOpen { .. }));
        }
        other => panic!("expected dropped batch, got {:?}", other),
    }

    fs::rename(&parked, &card).unwrap();
    assert!(matches!(driver.step(), IterationOutcome::Persisted { .. }));

    let written = pcm::read_raw_file(config.storage.output_path()).unwrap();
    let reference = filtered_reference(&input, 20.0);
    let mut expected = reference[..BATCH].to_vec();
    expected.extend_from_slice(&reference[BATCH * 2..]);
    assert_eq!(written, expected);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_independent_runs_are_bit_identical() {
    let input = two_tone_capture(5.0, 1000.0, 9000.0, 2500.0, BATCH * 8 + 17);
    let config = test_config(BATCH);

    let run = || {
        let mut driver = PipelineDriver::new(
            ScriptedSource::new(input.clone(), 16000),
            filter(),
            FlakySink::new(),
            &config,
        )
        .unwrap();
        driver.run_for(usize::MAX);
        driver.into_sink().data().to_vec()
    };

    assert_eq!(run(), run());
}
