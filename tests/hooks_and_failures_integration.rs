//! Integration tests for hook dispatch, failure propagation and taps.

mod common;

use common::builders::{EventLog, FaultyBlock, SensorFault};
use daqflow::pipeline::blocks::Callable;
use daqflow::pipeline::{
    passthrough, ExecutionError, Graph, Node, PipelineError, TapBridge, Value,
};
use daqflow::{parallel, series};
use std::time::Duration;

#[test]
fn test_hooks_fire_in_order_before_next_block() {
    let log = EventLog::new();
    let mut graph = Graph::compile(series![
        Node::new(log.block("a", |x| x + 1.0))
            .with_hook(log.hook("h1"))
            .with_hook(log.hook("h2")),
        log.block("b", |x| x * 2.0)
    ])
    .unwrap();

    graph.run(1.0).unwrap();
    assert_eq!(log.events(), vec!["run:a", "h1=2.0", "h2=2.0", "run:b"]);
}

#[test]
fn test_parallel_hooks_follow_declaration_order() {
    let log = EventLog::new();
    let mut graph = Graph::compile(series![
        Node::new(log.block("src", |x| x)).with_hook(log.hook("src")),
        parallel![
            Node::new(log.block("left", |x| x + 1.0)).with_hook(log.hook("left")),
            passthrough(Node::new(log.block("inner", |x| -x)).with_hook(log.hook("inner"))),
            Node::new(log.block("right", |x| x * 3.0)).with_hook(log.hook("right"))
        ]
    ])
    .unwrap();

    graph.run(2.0).unwrap();
    assert_eq!(
        log.events(),
        vec![
            "run:src", "src=2.0", "run:left", "left=3.0", "run:inner", "inner=-2.0",
            "run:right", "right=6.0",
        ]
    );
}

#[test]
fn test_hooks_do_not_change_results() {
    let log = EventLog::new();
    let build = |with_hooks: bool| {
        let mut first = Node::new(Callable::map("a", |x| x * 3.0));
        let mut second = Node::new(Callable::map("b", |x| x - 1.0));
        if with_hooks {
            first = first.with_hook(log.hook("a"));
            second = second.with_hook(log.hook("b"));
        }
        Graph::compile(series![first, passthrough(second)]).unwrap()
    };

    let mut plain = build(false);
    let mut hooked = build(true);
    for x in [0.0, 1.5, -7.0] {
        assert_eq!(plain.run(x).unwrap(), hooked.run(x).unwrap());
    }
    assert_eq!(log.events().len(), 6);
}

#[test]
fn test_block_error_propagates_verbatim() {
    let log = EventLog::new();
    let mut graph = Graph::compile(series![
        Node::new(log.block("pre", |x| x)).with_hook(log.hook("pre")),
        Node::custom(FaultyBlock { limit: 10.0 }).with_hook(log.hook("faulty")),
        Node::new(log.block("post", |x| x)).with_hook(log.hook("post"))
    ])
    .unwrap();

    let err = graph.run(50.0).unwrap_err();
    match err {
        PipelineError::Execution(ExecutionError::Block { block, source, .. }) => {
            assert_eq!(block, "faulty");
            assert_eq!(
                source.downcast_ref::<SensorFault>(),
                Some(&SensorFault { channel: 3 })
            );
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(log.events(), vec!["run:pre", "pre=50.0"]);

    // The caller may skip the sample and keep going.
    log.clear();
    assert_eq!(graph.run(5.0).unwrap(), Value::Scalar(5.0));
    assert_eq!(
        log.events(),
        vec!["run:pre", "pre=5.0", "faulty=5.0", "run:post", "post=5.0"]
    );
    assert_eq!(graph.passes(), 1);
}

#[test]
fn test_hook_error_aborts_before_downstream() {
    let log = EventLog::new();
    let mut graph = Graph::compile(series![
        Node::new(log.block("a", |x| x))
            .with_hook(log.hook("first"))
            .with_hook(|_: &Value| -> anyhow::Result<()> { anyhow::bail!("display gone") })
            .with_hook(log.hook("never")),
        log.block("b", |x| x)
    ])
    .unwrap();

    let err = graph.run(1.0).unwrap_err();
    match err.as_execution() {
        Some(ExecutionError::Hook { block, index, source, .. }) => {
            assert_eq!(block, "a");
            assert_eq!(*index, 1);
            assert_eq!(source.to_string(), "display gone");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(log.events(), vec!["run:a", "first=1.0"]);
}

#[test]
fn test_failure_inside_parallel_skips_later_branches() {
    let log = EventLog::new();
    let mut graph = Graph::compile(parallel![
        Node::new(log.block("ok", |x| x)).with_hook(log.hook("ok")),
        Node::custom(FaultyBlock { limit: 0.0 }),
        Node::new(log.block("later", |x| x)).with_hook(log.hook("later"))
    ])
    .unwrap();

    assert!(graph.run(1.0).is_err());
    assert_eq!(log.events(), vec!["run:ok", "ok=1.0"]);
}

#[test]
fn test_taps_cross_threads() {
    let bridge = TapBridge::new();
    let mut graph = Graph::compile(series![
        Node::new(Callable::map("raw", |x| x)).with_hook(bridge.hook("raw")),
        Node::new(Callable::map("scaled", |x| x * 10.0)).with_hook(bridge.hook("scaled"))
    ])
    .unwrap();

    let producer = std::thread::spawn(move || {
        for i in 0..3 {
            graph.run(i as f64).unwrap();
        }
        graph.passes()
    });
    assert_eq!(producer.join().unwrap(), 3);

    let mut taps = Vec::new();
    while let Some(tap) = bridge.recv_timeout(Duration::from_millis(100)) {
        taps.push(tap);
    }
    assert_eq!(taps.len(), 6);
    assert_eq!(taps[5].block, "scaled");
    assert_eq!(taps[5].pass, 3);
    assert_eq!(taps[5].value, Value::Scalar(20.0));
    assert!(taps.windows(2).all(|w| w[0].captured_at <= w[1].captured_at));
    assert_eq!(bridge.dropped(), 0);
}
