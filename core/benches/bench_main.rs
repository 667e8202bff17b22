use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use twig_core::ast::{Binding, Node, ParamDef};
use twig_core::interp::{EvalConfig, EvaluationContext};
use twig_core::op::{BinaryOperator, compile, evaluate};
use twig_core::typ::Type;
use twig_core::val::Value;

fn unfolded(specialize: bool) -> EvalConfig {
    EvalConfig {
        specialize,
        fold_constants: false,
        ..EvalConfig::default()
    }
}

// Benchmark 1: comparison over statically typed operands, generic vs specialized
fn bench_comparison(c: &mut Criterion) {
    let node = Node::binary(
        BinaryOperator::Ge,
        Node::reference("a", Type::Long),
        Node::reference("b", Type::Long),
    );
    let ctx = EvaluationContext::default()
        .with_global("a", Value::Long(7))
        .with_global("b", Value::Long(3));

    let generic = compile(&node, &unfolded(false));
    c.bench_function("compare_long_generic", |b| {
        b.iter(|| black_box(evaluate(generic.as_ref(), &ctx).unwrap()))
    });

    let specialized = compile(&node, &unfolded(true));
    c.bench_function("compare_long_specialized", |b| {
        b.iter(|| black_box(evaluate(specialized.as_ref(), &ctx).unwrap()))
    });
}

// Benchmark 2: constant folding of a long addition chain
fn bench_folding(c: &mut Criterion) {
    let chain = (2..=100i64).fold(Node::constant(1i64), |acc, i| {
        Node::binary(BinaryOperator::Add, acc, Node::constant(i))
    });
    let ctx = EvaluationContext::default();

    let folded = compile(&chain, &EvalConfig::default());
    c.bench_function("eval_constant_folded", |b| {
        b.iter(|| black_box(evaluate(folded.as_ref(), &ctx).unwrap()))
    });

    let plain = compile(&chain, &unfolded(true));
    c.bench_function("eval_constant_unfolded", |b| {
        b.iter(|| black_box(evaluate(plain.as_ref(), &ctx).unwrap()))
    });
}

fn fib_program() -> Arc<Node> {
    let n = || Node::reference("n", Type::Long);
    let fib = |x: Arc<Node>| Node::call(Node::reference("fib", Type::Function), vec![x]);
    let body = Node::if_(
        Node::binary(BinaryOperator::Lt, n(), Node::constant(2i64)),
        n(),
        Node::binary(
            BinaryOperator::Add,
            fib(Node::binary(BinaryOperator::Sub, n(), Node::constant(1i64))),
            fib(Node::binary(BinaryOperator::Sub, n(), Node::constant(2i64))),
        ),
    );
    Node::let_(
        vec![Binding::name(
            "fib",
            Node::function(vec![ParamDef::new("n", Type::Long)], Type::Long, body),
        )],
        Node::call(Node::reference("fib", Type::Function), vec![Node::constant(18i64)]),
    )
}

// Benchmark 3: recursive user function calls
fn bench_calls(c: &mut Criterion) {
    let program = fib_program();
    let ctx = EvaluationContext::default();
    for (name, specialize) in [("fib_generic", false), ("fib_specialized", true)] {
        let op = compile(&program, &unfolded(specialize));
        c.bench_function(name, |b| b.iter(|| black_box(evaluate(op.as_ref(), &ctx).unwrap())));
    }
}

criterion_group!(benches, bench_comparison, bench_folding, bench_calls);
criterion_main!(benches);
