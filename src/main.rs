use std::process;
use trace_ir::config::TraceConfig;
use trace_ir::embedding::trace;
use trace_ir::ops::{add, cond, greater, project, sin};
use trace_ir::runtime::{apply_program, lower_program, ConcreteEvaluator, TraceVal};
use trace_ir::{diagnostics, logging, IrResult, Program, Type, Value};

fn print_program(config: &TraceConfig, title: &str, program: &Program) {
    let mut printer = config.printer();
    printer.print_program(program);
    println!("{title}:\n{}\n", printer.finish());
}

fn evaluate(program: &Program, args: Vec<Value>) -> IrResult<TraceVal> {
    let args = args.into_iter().map(TraceVal::Value).collect();
    apply_program(&ConcreteEvaluator, program, args)
}

fn run(config: &TraceConfig) -> IrResult<()> {
    let sum = add(&1.0f32, &2.0f32)?;
    println!("add(1.0, 2.0) = {sum}\n");

    let program = trace(|_| add(&1.0f32, &2.0f32), &[])?;
    print_program(config, "traced add", &program);

    let program = trace(
        |params| {
            let x = &params[0];
            let above = greater(x, &1.0f32)?;
            cond(&above, || add(x, &sin(&1.0f32)?), || Ok(1.0f32))
        },
        &[Type::float()],
    )?;
    print_program(config, "conditional", &program);
    for x in [0.5f32, 3.0] {
        let result = evaluate(&program, vec![Value::f32(x)])?;
        println!("conditional({x}) = {result}");
    }
    println!();

    let lowered = lower_program(&program)?;
    print_program(config, "conditional, lowered", &lowered);

    let pair = Type::tuple([Type::float(), Type::float()]);
    let program = trace(
        |params| add(&project(&params[0], 0)?, &project(&params[0], 1)?),
        &[pair],
    )?;
    print_program(config, "tuple sum", &program);
    let result = evaluate(
        &program,
        vec![Value::Tuple(vec![Value::f32(1.0), Value::f32(2.0)])],
    )?;
    println!("tuple sum((1.0, 2.0)) = {result}");
    Ok(())
}

fn main() {
    let config = TraceConfig::from_env();
    logging::init(&config);

    if let Err(error) = run(&config) {
        diagnostics::report_error(&error);
        process::exit(if error.is_internal() { 2 } else { 1 });
    }
}
