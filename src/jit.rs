//! The JIT driver: signature, cache lookup, tracing, compilation, dispatch.

use crate::error::Error;
use std::sync::Arc;
use tracejit_cache::{Arg, CacheConfig, CacheStats, CompiledCache, Signature, StaticValue};
use tracejit_exec::{default_passes, lower, Program, Tensor};
use tracejit_trace::{TraceCtx, TraceError, TracedValue};
use tracejit_utils::Stopwatch;
use tracing::debug;

/// View of the call arguments handed to a staging function.
///
/// Dynamic arguments appear as traced placeholders; static arguments appear
/// as their concrete values, so the staging function may freely branch on
/// them (a different static value is a different signature and re-traces).
pub struct TraceArgs {
    slots: Vec<TraceSlot>,
}

enum TraceSlot {
    Tensor(TracedValue),
    Static(StaticValue),
}

impl TraceArgs {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The placeholder for a dynamic argument.
    pub fn tensor(&self, index: usize) -> Result<TracedValue, TraceError> {
        match self.slot(index)? {
            TraceSlot::Tensor(v) => Ok(*v),
            TraceSlot::Static(_) => Err(TraceError::TensorArgExpected { index }),
        }
    }

    pub fn static_int(&self, index: usize) -> Result<i64, TraceError> {
        self.static_value(index)?
            .as_int()
            .ok_or(TraceError::WrongStaticKind {
                index,
                expected: "int",
            })
    }

    pub fn static_bool(&self, index: usize) -> Result<bool, TraceError> {
        self.static_value(index)?
            .as_bool()
            .ok_or(TraceError::WrongStaticKind {
                index,
                expected: "bool",
            })
    }

    pub fn static_str(&self, index: usize) -> Result<&str, TraceError> {
        self.static_value(index)?
            .as_str()
            .ok_or(TraceError::WrongStaticKind {
                index,
                expected: "str",
            })
    }

    pub fn static_float(&self, index: usize) -> Result<f64, TraceError> {
        self.static_value(index)?
            .as_float()
            .ok_or(TraceError::WrongStaticKind {
                index,
                expected: "float",
            })
    }

    fn slot(&self, index: usize) -> Result<&TraceSlot, TraceError> {
        self.slots.get(index).ok_or(TraceError::ArgOutOfRange {
            index,
            len: self.slots.len(),
        })
    }

    fn static_value(&self, index: usize) -> Result<&StaticValue, TraceError> {
        match self.slot(index)? {
            TraceSlot::Static(v) => Ok(v),
            TraceSlot::Tensor(_) => Err(TraceError::StaticArgExpected { index }),
        }
    }
}

/// Staging function signature: builds the traced computation from abstract
/// arguments.
pub type StageFn = dyn Fn(&mut TraceCtx, &TraceArgs) -> Result<Vec<TracedValue>, Error> + Send + Sync;

/// A jitted function: a staging function plus its compilation cache.
///
/// The staging function must be pure: its outputs may depend only on its
/// arguments. It runs once per distinct call signature; any side effect it
/// performs happens during that one trace and is silently skipped on every
/// cache-hit replay.
pub struct Jit {
    name: String,
    stage: Arc<StageFn>,
    cache: CompiledCache,
}

impl Jit {
    pub fn new<F>(name: impl Into<String>, stage: F) -> Self
    where
        F: Fn(&mut TraceCtx, &TraceArgs) -> Result<Vec<TracedValue>, Error>
            + Send
            + Sync
            + 'static,
    {
        Self::with_config(name, CacheConfig::default(), stage)
    }

    pub fn with_config<F>(name: impl Into<String>, config: CacheConfig, stage: F) -> Self
    where
        F: Fn(&mut TraceCtx, &TraceArgs) -> Result<Vec<TracedValue>, Error>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            stage: Arc::new(stage),
            cache: CompiledCache::new(config),
        }
    }

    /// Invoke with concrete arguments.
    ///
    /// Computes the call signature, reuses the compiled program for a known
    /// signature, and otherwise traces the staging function once, compiles
    /// the resulting graph and caches the program. The compile step runs
    /// under the cache lock, so a new signature is compiled exactly once
    /// even under concurrent callers.
    pub fn call(&self, args: &[Arg]) -> Result<Vec<Tensor>, Error> {
        let signature = Signature::of(args);
        let (program, compiled) = self
            .cache
            .get_or_compile(&signature, || self.trace_and_compile(args))?;

        if compiled {
            debug!(function = %self.name, signature = %signature, "compiled new signature");
        }

        let tensors: Vec<Tensor> = args
            .iter()
            .filter_map(|arg| match arg {
                Arg::Tensor(t) => Some(t.clone()),
                Arg::Static(_) => None,
            })
            .collect();
        Ok(program.execute(&tensors)?)
    }

    /// Cache counters. `compilations` increments once per distinct
    /// signature actually compiled.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of cached programs.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop all compiled programs; the next call per signature re-traces.
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn trace_and_compile(&self, args: &[Arg]) -> Result<Program, Error> {
        let sw = Stopwatch::start_new();
        let mut ctx = TraceCtx::new();

        let mut slots = Vec::with_capacity(args.len());
        let mut dynamic_index = 0;
        for (position, arg) in args.iter().enumerate() {
            match arg {
                Arg::Tensor(t) => {
                    let placeholder = ctx.placeholder(
                        dynamic_index,
                        format!("arg{position}"),
                        t.dtype(),
                        t.shape(),
                    )?;
                    slots.push(TraceSlot::Tensor(placeholder));
                    dynamic_index += 1;
                }
                Arg::Static(v) => slots.push(TraceSlot::Static(v.clone())),
            }
        }
        let trace_args = TraceArgs { slots };

        let outputs = (self.stage)(&mut ctx, &trace_args)?;
        let mut graph = ctx.finish(&outputs)?;

        default_passes().run_all(&mut graph)?;
        let program = lower(&graph)?;

        debug!(
            function = %self.name,
            elapsed = ?sw.elapsed(),
            instrs = program.instr_count(),
            "trace and compile finished"
        );
        Ok(program)
    }
}
