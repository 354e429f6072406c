//! Integration tests for blocks that keep state across passes.

mod common;

use common::{assert_float_eq, assert_slice_eq, expect_signal, ramp_signal};
use daqflow::pipeline::blocks::{Centerer, Ensure2D, FeatureExtractor, Filter, Script, Windower};
use daqflow::pipeline::{
    passthrough, segment, AnyBlock, BlockResult, BuiltinBlock, Graph, Signal, Value,
};
use daqflow::{series, ScriptEngine};

fn lowpass() -> Filter {
    Filter::new(vec![0.2], vec![1.0, -0.8], 0).unwrap()
}

fn channel_means(signal: &Signal) -> BlockResult<Vec<f64>> {
    Ok(signal
        .rows()
        .map(|row| row.iter().sum::<f64>() / row.len() as f64)
        .collect())
}

fn peak(signal: &Signal) -> BlockResult<Vec<f64>> {
    Ok(vec![signal
        .as_slice()
        .iter()
        .fold(0.0f64, |acc, x| acc.max(x.abs()))])
}

#[test]
fn test_streamed_filter_matches_one_shot() {
    let recording = ramp_signal(2, 12);
    let mut streamed = Graph::compile(lowpass()).unwrap();

    let mut rows = vec![Vec::new(), Vec::new()];
    for chunk in segment(&recording, 4, 0).unwrap() {
        let out = expect_signal(streamed.run(chunk).unwrap());
        for (c, row) in rows.iter_mut().enumerate() {
            row.extend_from_slice(out.row(c));
        }
    }

    let mut one_shot = Graph::compile(lowpass()).unwrap();
    let whole = expect_signal(one_shot.run(recording).unwrap());
    for (c, row) in rows.iter().enumerate() {
        assert_slice_eq(row, whole.row(c), 1e-9);
    }
}

#[test]
fn test_windowed_filter_outputs_agree_on_overlap() {
    let mut graph = Graph::compile(series![
        Windower::new(6),
        Filter::new(vec![0.2], vec![1.0, -0.8], 3).unwrap()
    ])
    .unwrap();

    let mut previous: Option<Signal> = None;
    for chunk in segment(&ramp_signal(2, 12), 3, 0).unwrap() {
        let out = expect_signal(graph.run(chunk).unwrap());
        assert_eq!(out.shape(), (2, 6));
        if let Some(prev) = &previous {
            for c in 0..2 {
                assert_slice_eq(&out.row(c)[..3], &prev.row(c)[3..], 1e-9);
            }
        }
        previous = Some(out);
    }
    assert_eq!(graph.passes(), 4);
}

#[test]
fn test_clear_between_trials() {
    let trial_a = ramp_signal(1, 4);
    let trial_b = Signal::from_rows(&[[5.0, -5.0]]).unwrap();

    let mut reused = Graph::compile(series![Windower::new(4), lowpass()]).unwrap();
    reused.run(trial_a).unwrap();
    reused.clear();
    let after_clear = reused.run(trial_b.clone()).unwrap();

    let mut fresh = Graph::compile(series![Windower::new(4), lowpass()]).unwrap();
    assert_eq!(after_clear, fresh.run(trial_b).unwrap());
}

#[test]
fn test_state_persists_without_clear() {
    let mut graph = Graph::compile(Windower::new(4)).unwrap();
    let sample = Signal::from_rows(&[[1.0, 2.0]]).unwrap();

    let first = graph.run(sample.clone()).unwrap();
    let second = graph.run(sample).unwrap();
    assert_ne!(first, second);
    assert_eq!(
        second,
        Value::Signal(Signal::from_rows(&[[1.0, 2.0, 1.0, 2.0]]).unwrap())
    );
}

#[test]
fn test_windower_rejects_channel_change_until_clear() {
    let mut graph = Graph::compile(Windower::new(4)).unwrap();
    graph.run(ramp_signal(2, 2)).unwrap();
    assert!(graph.run(ramp_signal(3, 2)).is_err());

    graph.clear_block("Windower").unwrap();
    assert!(graph.run(ramp_signal(3, 2)).is_ok());
}

#[test]
fn test_feature_layout_recorded() {
    let extractor = FeatureExtractor::new()
        .with_feature("mean", channel_means)
        .with_feature("peak", peak);
    let mut graph = Graph::compile(series![Windower::new(3), extractor]).unwrap();

    let out = graph
        .run(Signal::from_rows(&[[3.0], [-6.0]]).unwrap())
        .unwrap();
    assert_eq!(out, Value::Vector(vec![1.0, -2.0, 6.0]));

    let extractor = match graph.block("FeatureExtractor").and_then(AnyBlock::as_builtin) {
        Some(BuiltinBlock::FeatureExtractor(fe)) => fe,
        other => panic!("unexpected {:?}", other.map(|b| b.name().to_string())),
    };
    assert_eq!(extractor.feature_range("mean"), Some(0..2));
    assert_eq!(extractor.feature_range("peak"), Some(2..3));

    graph.clear();
    let cleared = match graph.block("FeatureExtractor").and_then(AnyBlock::as_builtin) {
        Some(BuiltinBlock::FeatureExtractor(fe)) => fe.feature_indices().count(),
        _ => unreachable!(),
    };
    assert_eq!(cleared, 0);
}

#[test]
fn test_raw_and_features_side_by_side() {
    let extractor = FeatureExtractor::new().with_feature("mean", channel_means);
    let mut graph = Graph::compile(series![
        Windower::new(2),
        passthrough(series![Centerer::new(), extractor])
    ])
    .unwrap();

    let out = graph.run(Signal::from_rows(&[[4.0]]).unwrap()).unwrap();
    let items = out.as_tuple().unwrap();
    assert_eq!(items[0], Value::Signal(Signal::from_rows(&[[0.0, 4.0]]).unwrap()));
    assert_eq!(items[1], Value::Vector(vec![0.0]));
}

#[test]
fn test_vector_to_scripted_rms() {
    let engine = ScriptEngine::new();
    let mut graph = Graph::compile(series![
        Ensure2D::row(),
        Centerer::new(),
        Script::new(&engine, "rms", "rms(x[0])").unwrap()
    ])
    .unwrap();

    let out = graph.run(vec![1.0, 2.0, 3.0]).unwrap();
    assert_float_eq(out.as_scalar().unwrap(), (2.0f64 / 3.0).sqrt(), 1e-12);
}

#[test]
fn test_column_orientation_feeds_windower() {
    let mut graph = Graph::compile(series![Ensure2D::col(), Windower::new(2)]).unwrap();
    // A column vector is three channels of one sample each.
    let out = expect_signal(graph.run(vec![1.0, 2.0, 3.0]).unwrap());
    assert_eq!(out, Signal::from_rows(&[[0.0, 1.0], [0.0, 2.0], [0.0, 3.0]]).unwrap());
}
