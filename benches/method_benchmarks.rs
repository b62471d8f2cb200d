//! Benchmarks for method compilation.
//!
//! - Signatures: binding cost across parameter shapes
//! - Frames: the finalize pass with and without a managed frame
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use extgen::prelude::*;
use extgen::{ConservativeWriteDetector, Result};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Body that touches every parameter and allocates `locals` boxed temporaries.
struct SyntheticBody {
    params: Vec<String>,
    locals: usize,
}

impl BodyCompiler for SyntheticBody {
    fn compile_body(&mut self, body: &mut BodyContext<'_>) -> Result<BodyOutcome> {
        for name in &self.params {
            body.record_use(name)?;
        }
        for i in 0..self.locals {
            let name = format!("tmp{i}");
            body.declare_local(&name, LowLevelType::Variable, Span::default())?;
            body.record_use(&name)?;
            body.emit(0, format!("ZEPHIR_INIT_NVAR(tmp{i});"));
            body.request_stack_growth();
        }
        body.emit_return(0, ReturnMacro::Null);
        Ok(BodyOutcome::ending_with(StatementKind::Return))
    }
}

fn signature(count: usize) -> MethodDecl {
    let mut decl = MethodDecl::new("run");
    for i in 0..count {
        let param = match i % 4 {
            0 => ParameterDecl::new(format!("p{i}")),
            1 => ParameterDecl::typed(format!("p{i}"), LowLevelType::Int).mandatory(),
            2 => ParameterDecl::typed(format!("p{i}"), LowLevelType::String)
                .with_default(Literal::Null),
            _ => ParameterDecl::new(format!("p{i}")).with_cast("App\\Model"),
        };
        decl = decl.with_param(param);
    }
    decl
}

fn signature_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let facts = OptimizationFacts::new().with_writes(ConservativeWriteDetector::new().with_written("p0"));
    let ctx = CompileContext::new("App\\Service").with_facts(facts);

    let mut group = c.benchmark_group("method/parameters");
    for count in [0usize, 4, 16, 64] {
        let decl = signature(count);
        let params: Vec<String> = decl.parameters.iter().map(|p| p.name.clone()).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &decl, |b, decl| {
            b.iter(|| {
                let mut body = SyntheticBody {
                    params: params.clone(),
                    locals: 0,
                };
                let mut diagnostics = Diagnostics::new();
                let method = compile(black_box(decl), &ctx, &mut body, &mut diagnostics).unwrap();
                end_profiling_frame();
                black_box(method.code.len())
            });
        });
    }
    group.finish();
}

fn frame_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let ctx = CompileContext::new("App\\Service");
    let decl = MethodDecl::new("run");

    let mut group = c.benchmark_group("method/frames");
    for locals in [0usize, 32, 256] {
        group.bench_with_input(BenchmarkId::new("locals", locals), &locals, |b, &locals| {
            b.iter(|| {
                let mut body = SyntheticBody {
                    params: Vec::new(),
                    locals,
                };
                let mut diagnostics = Diagnostics::new();
                let method = compile(&decl, &ctx, &mut body, &mut diagnostics).unwrap();
                end_profiling_frame();
                black_box(method.stack_grown)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, signature_benchmarks, frame_benchmarks);
criterion_main!(benches);
