//! End-to-end behavior of the trace/compile/cache/replay pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracejit::{Arg, CacheConfig, Error, Jit, SignatureError, StaticValue, Tensor, TraceError};

fn matmul_jit(traces: Arc<AtomicUsize>) -> Jit {
    Jit::new("matmul", move |ctx, args| {
        traces.fetch_add(1, Ordering::SeqCst);
        let a = args.tensor(0)?;
        let b = args.tensor(1)?;
        Ok(vec![ctx.matmul(a, b)?])
    })
}

#[test]
fn test_traces_once_per_signature() {
    let traces = Arc::new(AtomicUsize::new(0));
    let jit = matmul_jit(Arc::clone(&traces));

    let a = Tensor::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    let b = Tensor::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();

    for _ in 0..5 {
        jit.call(&[Arg::tensor(a.clone()), Arg::tensor(b.clone())])
            .unwrap();
    }

    assert_eq!(traces.load(Ordering::SeqCst), 1);
    let stats = jit.stats();
    assert_eq!(stats.compilations, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 4);
}

#[test]
fn test_shape_change_recompiles() {
    let traces = Arc::new(AtomicUsize::new(0));
    let jit = matmul_jit(Arc::clone(&traces));

    // Two calls at (2, 3) x (3, 2), then one at (4, 5) x (5, 4).
    let a23 = Tensor::from_fn(2, 3, |r, c| (r * 3 + c) as f64);
    let b32 = Tensor::from_fn(3, 2, |r, c| (r * 2 + c) as f64);
    jit.call(&[Arg::tensor(a23.clone()), Arg::tensor(b32.clone())])
        .unwrap();
    jit.call(&[Arg::tensor(a23), Arg::tensor(b32)]).unwrap();

    let a45 = Tensor::from_fn(4, 5, |r, c| (r + c) as f64);
    let b54 = Tensor::from_fn(5, 4, |r, c| (r + c) as f64);
    jit.call(&[Arg::tensor(a45), Arg::tensor(b54)]).unwrap();

    assert_eq!(traces.load(Ordering::SeqCst), 2);
    let stats = jit.stats();
    assert_eq!(stats.compilations, 2);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(jit.len(), 2);
}

#[test]
fn test_static_change_recompiles() {
    let traces = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&traces);
    let jit = Jit::new("shift", move |ctx, args| {
        counter.fetch_add(1, Ordering::SeqCst);
        let x = args.tensor(0)?;
        let offset = ctx.constant(args.static_int(1)? as f64)?;
        Ok(vec![ctx.add(x, offset)?])
    });

    let x = Tensor::vector(vec![1.0, 2.0]);
    let out = jit
        .call(&[Arg::tensor(x.clone()), Arg::int(10)])
        .unwrap();
    assert_eq!(out[0].data(), &[11.0, 12.0]);

    let out = jit.call(&[Arg::tensor(x.clone()), Arg::int(20)]).unwrap();
    assert_eq!(out[0].data(), &[21.0, 22.0]);

    // Same static again hits the first entry.
    jit.call(&[Arg::tensor(x), Arg::int(10)]).unwrap();

    assert_eq!(traces.load(Ordering::SeqCst), 2);
    assert_eq!(jit.stats().compilations, 2);
}

#[test]
fn test_replay_matches_trace_output() {
    // Bit-identical results on hit and miss paths for the same inputs.
    let jit = Jit::new("poly", |ctx, args| {
        let x = args.tensor(0)?;
        let c1 = ctx.constant(0.5)?;
        let c2 = ctx.constant(1.0e-7)?;
        let sq = ctx.mul(x, x)?;
        let scaled = ctx.mul(sq, c1)?;
        Ok(vec![ctx.add(scaled, c2)?])
    });

    let x = Tensor::vector(vec![0.1, 0.2, 0.30000000000000004, 1.0e16]);
    let first = jit.call(&[Arg::tensor(x.clone())]).unwrap();
    let second = jit.call(&[Arg::tensor(x)]).unwrap();

    assert_eq!(first[0].data(), second[0].data());
    for (a, b) in first[0].data().iter().zip(second[0].data()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_content_change_does_not_recompile() {
    let traces = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&traces);
    let jit = Jit::new("sum", move |ctx, args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ctx.reduce_sum(args.tensor(0)?, None)?])
    });

    for k in 0..10 {
        let x = Tensor::vector(vec![f64::from(k); 8]);
        let out = jit.call(&[Arg::tensor(x)]).unwrap();
        assert_eq!(out[0].as_scalar().unwrap(), f64::from(k) * 8.0);
    }

    assert_eq!(traces.load(Ordering::SeqCst), 1);
}

#[test]
fn test_data_dependent_branch_rejected() {
    // A host-level branch needs the concrete contents of a dynamic
    // argument; tracing refuses instead of baking in one side.
    let jit = Jit::new("clamp_if_big", |ctx, args| {
        let x = args.tensor(0)?;
        let first = ctx.concrete_scalar(x)?;
        let out = if first > 100.0 { ctx.constant(100.0)? } else { x };
        Ok(vec![out])
    });

    let err = jit.call(&[Arg::tensor(Tensor::scalar(7.0))]).unwrap_err();
    assert!(matches!(err, Error::Trace(TraceError::DataDependentBranch)));

    // Nothing was cached for the failed signature.
    assert!(jit.is_empty());
    assert_eq!(jit.stats().compilations, 0);
}

#[test]
fn test_select_replaces_branching() {
    // Both branches become part of the graph; the condition is evaluated
    // elementwise at run time.
    let jit = Jit::new("relu", |ctx, args| {
        let x = args.tensor(0)?;
        let zero = ctx.constant(0.0)?;
        let positive = ctx.gt(x, zero)?;
        Ok(vec![ctx.select(positive, x, zero)?])
    });

    let out = jit
        .call(&[Arg::tensor(Tensor::vector(vec![-2.0, -0.5, 0.0, 3.0]))])
        .unwrap();
    assert_eq!(out[0].data(), &[0.0, 0.0, 0.0, 3.0]);

    let out = jit
        .call(&[Arg::tensor(Tensor::vector(vec![5.0, -5.0, 1.0, -1.0]))])
        .unwrap();
    assert_eq!(out[0].data(), &[5.0, 0.0, 1.0, 0.0]);

    assert_eq!(jit.stats().compilations, 1);
}

#[test]
fn test_capacity_eviction() {
    let traces = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&traces);
    let jit = Jit::with_config("neg", CacheConfig { capacity: 2 }, move |ctx, args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(vec![ctx.neg(args.tensor(0)?)?])
    });

    let call = |n: usize| {
        jit.call(&[Arg::tensor(Tensor::vector(vec![1.0; n]))])
            .unwrap();
    };

    call(1);
    call(2);
    call(1); // refresh the length-1 entry
    call(3); // evicts the length-2 entry
    call(1); // still cached
    call(2); // re-traced

    assert_eq!(traces.load(Ordering::SeqCst), 4);
    let stats = jit.stats();
    assert_eq!(stats.evictions, 2);
    assert_eq!(jit.len(), 2);
}

#[test]
fn test_clear_forces_retrace() {
    let traces = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&traces);
    let jit = Jit::new("id", move |_, args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(vec![args.tensor(0)?])
    });

    let x = Tensor::scalar(1.0);
    jit.call(&[Arg::tensor(x.clone())]).unwrap();
    jit.clear();
    jit.call(&[Arg::tensor(x)]).unwrap();

    assert_eq!(traces.load(Ordering::SeqCst), 2);
    assert_eq!(jit.stats().compilations, 2);
    assert_eq!(jit.len(), 1);
}

#[test]
fn test_nan_static_is_unhashable() {
    let err = Arg::float(f64::NAN).unwrap_err();
    assert!(matches!(err, SignatureError::UnhashableStatic { .. }));

    // Negative zero and positive zero are distinct signatures (distinct
    // bit patterns), which is fine; they just compile separately.
    let a = StaticValue::float(0.0).unwrap();
    let b = StaticValue::float(-0.0).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_stats_snapshot_serializes() {
    let jit = Jit::new("id", |_, args| Ok(vec![args.tensor(0)?]));
    jit.call(&[Arg::tensor(Tensor::scalar(1.0))]).unwrap();
    jit.call(&[Arg::tensor(Tensor::scalar(2.0))]).unwrap();

    let json = serde_json::to_value(jit.stats()).unwrap();
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["compilations"], 1);
    assert_eq!(json["evictions"], 0);
}

#[test]
fn test_mixed_static_kinds() -> anyhow::Result<()> {
    let jit = Jit::new("affine", |ctx, args| {
        let x = args.tensor(0)?;
        let scale = ctx.constant(args.static_float(1)?)?;
        let negate = args.static_bool(2)?;
        let scaled = ctx.mul(x, scale)?;
        Ok(vec![if negate { ctx.neg(scaled)? } else { scaled }])
    });

    let x = Tensor::vector(vec![1.0, 2.0]);
    let out = jit.call(&[
        Arg::tensor(x.clone()),
        Arg::float(3.0)?,
        Arg::boolean(false),
    ])?;
    assert_eq!(out[0].data(), &[3.0, 6.0]);

    let out = jit.call(&[Arg::tensor(x), Arg::float(3.0)?, Arg::boolean(true)])?;
    assert_eq!(out[0].data(), &[-3.0, -6.0]);

    assert_eq!(jit.stats().compilations, 2);
    Ok(())
}
