//! End-to-end call dispatch through the public API.

use std::cell::Cell;
use std::rc::Rc;

use kea_vm::{
    Access, Address, Binary, BinaryOp, Call, Class, Define, Frame, Function, HostError,
    HostObject, HostRegistry, Instance, Instruction, InstructionBox, KeaError, Literal, Load,
    NativeFunction, ParsingError, PushLiteral, RuntimeErrorKind, Unit, Value, Vm, VmConfig,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn at(line: u32) -> Address {
    Address::new("main.kea", line)
}

fn num(n: f64) -> Box<dyn Instruction> {
    PushLiteral::boxed(at(1), Literal::Number(n))
}

fn args(instructions: Vec<Box<dyn Instruction>>) -> InstructionBox {
    InstructionBox::from(instructions)
}

fn params(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// `fn <name>(a, b) { a <op> b }`
fn binary_fn(name: &str, op: BinaryOp) -> Function {
    let body = args(vec![
        Load::boxed(at(2), "a"),
        Load::boxed(at(2), "b"),
        Binary::boxed(at(2), op),
    ]);
    Function::new(name, params(&["a", "b"]), body)
}

fn runtime_kind(err: &KeaError) -> &RuntimeErrorKind {
    err.as_runtime().expect("runtime error").kind()
}

fn neg(_addr: &Address, args: &[Value]) -> kea_vm::Result<Value> {
    Ok(Value::Number(-args[0].as_number().unwrap_or_default()))
}

#[derive(Debug, Default)]
struct Counter {
    calls: Cell<u32>,
}

impl HostObject for Counter {
    fn type_name(&self) -> &str {
        "Counter"
    }
}

fn host_registry() -> HostRegistry {
    let mut host = HostRegistry::new();
    host.register::<Counter, _>("toString", 0, |counter, _addr, _args| {
        counter.calls.set(counter.calls.get() + 1);
        Ok(Value::from(format!("Counter({})", counter.calls.get())))
    })
    .unwrap()
    .register::<Counter, _>("add", 1, |_counter, _addr, args| {
        let n = args[0].as_number().ok_or(HostError::InvalidArgument {
            index: 0,
            message: "expected a number".to_string(),
        })?;
        Ok(Value::Number(n + 1.0))
    })
    .unwrap()
    .register::<Counter, _>("reparse", 0, |_counter, addr, _args| {
        Err(HostError::Kea(
            ParsingError::new(addr, "unexpected token", "Check syntax!").into(),
        ))
    })
    .unwrap();
    host
}

fn host_vm() -> (Vm, Rc<Counter>) {
    let counter = Rc::new(Counter::default());
    let mut vm = Vm::new().with_host(host_registry());
    vm.define_global("c", Value::Host(counter.clone()));
    (vm, counter)
}

#[test]
fn test_global_function_call() {
    init_tracing();
    let mut vm = Vm::new();
    vm.define_global("add", binary_fn("add", BinaryOp::Add));

    let program = args(vec![Call::boxed(
        at(3),
        "add",
        args(vec![num(2.0), num(3.0)]),
        false,
        true,
    )]);
    vm.run(&program).unwrap();
    assert_eq!(vm.stack().as_slice(), &[Value::Number(5.0)]);
}

#[test]
fn test_first_param_binds_first_argument() {
    let mut vm = Vm::new();
    vm.define_global("sub", binary_fn("sub", BinaryOp::Sub));

    let program = args(vec![Call::boxed(
        at(3),
        "sub",
        args(vec![num(10.0), num(3.0)]),
        false,
        true,
    )]);
    vm.run(&program).unwrap();
    assert_eq!(vm.stack().as_slice(), &[Value::Number(7.0)]);
}

#[test]
fn test_global_arity_mismatch() {
    let mut vm = Vm::new();
    vm.define_global("add", binary_fn("add", BinaryOp::Add));

    let program = args(vec![Call::boxed(at(4), "add", args(vec![num(1.0)]), false, true)]);
    let err = vm.run(&program).unwrap_err();
    let runtime = err.as_runtime().unwrap();
    assert_eq!(runtime.line(), 4);
    assert!(runtime.message().contains("add(1/2)"));
    assert_eq!(runtime.hint(), "Check arguments amount!");
}

#[test]
fn test_builtin_call_and_arity() {
    let mut vm = Vm::new();
    vm.define_builtin(NativeFunction::pure("neg", 1, neg));

    let ok = args(vec![Call::boxed(at(5), "neg", args(vec![num(4.0)]), false, true)]);
    vm.run(&ok).unwrap();
    assert_eq!(vm.stack().as_slice(), &[Value::Number(-4.0)]);

    let bad = args(vec![Call::boxed(
        at(6),
        "neg",
        args(vec![num(1.0), num(2.0)]),
        false,
        true,
    )]);
    let err = vm.run(&bad).unwrap_err();
    assert!(err.as_runtime().unwrap().message().contains("neg(2/1)"));
}

#[test]
fn test_instance_method_arity_uses_qualified_name() {
    let body = args(vec![
        Load::boxed(at(2), "v"),
        Load::boxed(at(2), "self"),
        Access::boxed(at(2), "x"),
        Binary::boxed(at(2), BinaryOp::Add),
    ]);
    let class = Rc::new(Class::new("Point").with_method(
        "setX",
        Function::new("setX", params(&["v"]), body),
    ));
    let point = Instance::new(class);
    point.set_field("x", Value::Number(1.0));

    let mut vm = Vm::new();
    vm.define_global("p", point);

    let bad = args(vec![
        Load::boxed(at(7), "p"),
        Call::boxed(at(7), "setX", args(vec![num(1.0), num(2.0)]), true, true),
    ]);
    let err = vm.run(&bad).unwrap_err();
    let runtime = err.as_runtime().unwrap();
    assert_eq!(runtime.line(), 7);
    assert!(runtime.message().contains("Point->setX(2/1)"));

    let mut vm = Vm::new();
    let point = Instance::new(Rc::new(Class::new("Point").with_method(
        "setX",
        Function::new(
            "setX",
            params(&["v"]),
            args(vec![
                Load::boxed(at(2), "v"),
                Load::boxed(at(2), "self"),
                Access::boxed(at(2), "x"),
                Binary::boxed(at(2), BinaryOp::Add),
            ]),
        ),
    )));
    point.set_field("x", Value::Number(1.0));
    vm.define_global("p", point);
    let ok = args(vec![
        Load::boxed(at(8), "p"),
        Call::boxed(at(8), "setX", args(vec![num(41.0)]), true, true),
    ]);
    vm.run(&ok).unwrap();
    assert_eq!(vm.stack().as_slice(), &[Value::Number(42.0)]);
}

#[test]
fn test_instance_missing_method() {
    let mut vm = Vm::new();
    vm.define_global("p", Instance::new(Rc::new(Class::new("Point"))));

    let program = args(vec![
        Load::boxed(at(9), "p"),
        Call::boxed(at(9), "greet", InstructionBox::new(), true, true),
    ]);
    let err = vm.run(&program).unwrap_err();
    assert!(matches!(
        runtime_kind(&err),
        RuntimeErrorKind::NotFound { name } if name == "Point->greet"
    ));
    assert_eq!(err.address().line(), 9);
}

#[test]
fn test_unit_call_and_errors() {
    let unit = Unit::new("math")
        .with_field("two", 2.0)
        .with_field(
            "twice",
            Function::new(
                "twice",
                params(&["n"]),
                args(vec![
                    Load::boxed(at(2), "n"),
                    Load::boxed(at(2), "two"),
                    Binary::boxed(at(2), BinaryOp::Mul),
                ]),
            ),
        );
    let mut vm = Vm::new();
    vm.define_global("math", unit);

    let ok = args(vec![
        Load::boxed(at(10), "math"),
        Call::boxed(at(10), "twice", args(vec![num(21.0)]), true, true),
    ]);
    vm.run(&ok).unwrap();
    assert_eq!(vm.stack().as_slice(), &[Value::Number(42.0)]);

    let missing = args(vec![
        Load::boxed(at(11), "math"),
        Call::boxed(at(11), "tau", InstructionBox::new(), true, true),
    ]);
    let err = vm.run(&missing).unwrap_err();
    assert!(matches!(
        runtime_kind(&err),
        RuntimeErrorKind::NotFound { name } if name == "math->tau"
    ));

    let wrong_arity = args(vec![
        Load::boxed(at(12), "math"),
        Call::boxed(at(12), "twice", InstructionBox::new(), true, true),
    ]);
    let err = vm.run(&wrong_arity).unwrap_err();
    assert!(err.as_runtime().unwrap().message().contains("math->twice(0/1)"));

    let not_callable = args(vec![
        Load::boxed(at(13), "math"),
        Call::boxed(at(13), "two", InstructionBox::new(), true, true),
    ]);
    let err = vm.run(&not_callable).unwrap_err();
    assert!(matches!(
        runtime_kind(&err),
        RuntimeErrorKind::NotCallable { name, .. } if name == "math->two"
    ));
}

#[test]
fn test_unit_builtin_member() {
    let mut vm = Vm::new();
    vm.define_global(
        "math",
        Unit::new("math").with_field("neg", Value::builtin(NativeFunction::pure("neg", 1, neg))),
    );

    let ok = args(vec![
        Load::boxed(at(40), "math"),
        Call::boxed(at(40), "neg", args(vec![num(3.0)]), true, true),
    ]);
    vm.run(&ok).unwrap();
    assert_eq!(vm.stack().as_slice(), &[Value::Number(-3.0)]);

    let bad = args(vec![
        Load::boxed(at(41), "math"),
        Call::boxed(at(41), "neg", args(vec![num(1.0), num(2.0)]), true, true),
    ]);
    let err = vm.run(&bad).unwrap_err();
    let runtime = err.as_runtime().unwrap();
    assert_eq!(runtime.line(), 41);
    assert!(runtime.message().contains("math->neg(2/1)"));
    assert_eq!(vm.stack().as_slice(), &[Value::Number(-3.0)]);
}

#[test]
fn test_instance_builtin_member_discarded() {
    let class = Rc::new(
        Class::new("Point").with_method("neg", Value::builtin(NativeFunction::pure("neg", 1, neg))),
    );
    let mut vm = Vm::new();
    vm.define_global("p", Instance::new(class));

    let ok = args(vec![
        num(100.0),
        Load::boxed(at(42), "p"),
        Call::boxed(at(42), "neg", args(vec![num(3.0)]), true, false),
    ]);
    vm.run(&ok).unwrap();
    assert_eq!(vm.stack().as_slice(), &[Value::Number(100.0)]);

    let bad = args(vec![
        Load::boxed(at(43), "p"),
        Call::boxed(at(43), "neg", args(vec![num(1.0), num(2.0)]), true, false),
    ]);
    let err = vm.run(&bad).unwrap_err();
    assert!(matches!(
        runtime_kind(&err),
        RuntimeErrorKind::InvalidArgsAmount { name, actual: 2, expected: 1 } if name == "Point->neg"
    ));
    assert_eq!(vm.stack().as_slice(), &[Value::Number(100.0)]);
}

#[test]
fn test_host_method_invoked_once_and_pushed() {
    init_tracing();
    let (mut vm, counter) = host_vm();

    let program = args(vec![
        Load::boxed(at(14), "c"),
        Call::boxed(at(14), "toString", InstructionBox::new(), true, true),
    ]);
    vm.run(&program).unwrap();
    assert_eq!(counter.calls.get(), 1);
    assert_eq!(vm.stack().as_slice(), &[Value::string("Counter(1)")]);
}

#[test]
fn test_host_method_with_argument() {
    let (mut vm, _counter) = host_vm();

    let program = args(vec![
        Load::boxed(at(15), "c"),
        Call::boxed(at(15), "add", args(vec![num(1.0)]), true, true),
    ]);
    vm.run(&program).unwrap();
    assert_eq!(vm.stack().as_slice(), &[Value::Number(2.0)]);
}

#[test]
fn test_host_method_not_found() {
    let (mut vm, _counter) = host_vm();

    let program = args(vec![
        Load::boxed(at(16), "c"),
        Call::boxed(at(16), "missing", InstructionBox::new(), true, true),
    ]);
    let err = vm.run(&program).unwrap_err();
    let runtime = err.as_runtime().unwrap();
    assert_eq!(runtime.message(), "host func not found: Counter->missing");
    assert_eq!(runtime.line(), 16);

    // Wrong argument count resolves no method.
    let program = args(vec![
        Load::boxed(at(17), "c"),
        Call::boxed(at(17), "add", InstructionBox::new(), true, true),
    ]);
    let err = vm.run(&program).unwrap_err();
    assert!(matches!(
        runtime_kind(&err),
        RuntimeErrorKind::HostMethodNotFound { type_name, name }
            if type_name == "Counter" && name == "add"
    ));
}

#[test]
fn test_primitive_receiver_is_host_call() {
    let mut vm = Vm::new();
    let program = args(vec![
        num(1.0),
        Call::boxed(at(18), "floor", InstructionBox::new(), true, true),
    ]);
    let err = vm.run(&program).unwrap_err();
    assert_eq!(
        err.as_runtime().unwrap().message(),
        "host func not found: Number->floor"
    );
}

#[test]
fn test_host_kea_error_passes_through() {
    let (mut vm, _counter) = host_vm();

    let program = args(vec![
        Load::boxed(at(19), "c"),
        Call::boxed(at(19), "reparse", InstructionBox::new(), true, true),
    ]);
    let err = vm.run(&program).unwrap_err();
    match err {
        KeaError::Parsing(parsing) => {
            assert_eq!(parsing.message(), "unexpected token");
            assert_eq!(parsing.address().line(), 19);
        }
        other => panic!("expected parsing error, got {other:?}"),
    }
}

#[test]
fn test_host_failure_is_wrapped() {
    let (mut vm, _counter) = host_vm();

    let program = args(vec![
        Load::boxed(at(20), "c"),
        Call::boxed(
            at(20),
            "add",
            args(vec![PushLiteral::boxed(at(20), Literal::Bool(true))]),
            true,
            true,
        ),
    ]);
    let err = vm.run(&program).unwrap_err();
    match runtime_kind(&err) {
        RuntimeErrorKind::HostCall { message } => {
            assert!(message.contains("expected a number"));
        }
        other => panic!("expected host call error, got {other:?}"),
    }
    assert_eq!(err.address().line(), 20);
}

#[test]
fn test_discarded_results_leave_stack_unchanged() {
    let mut vm = Vm::new();
    vm.define_global("add", binary_fn("add", BinaryOp::Add));
    vm.define_builtin(NativeFunction::pure("neg", 1, neg));

    let program = args(vec![
        num(100.0),
        Call::boxed(at(21), "add", args(vec![num(1.0), num(2.0)]), false, false),
        Call::boxed(at(22), "neg", args(vec![num(3.0)]), false, false),
    ]);
    vm.run(&program).unwrap();
    assert_eq!(vm.stack().as_slice(), &[Value::Number(100.0)]);
}

#[test]
fn test_host_result_discarded() {
    let (mut vm, counter) = host_vm();

    let program = args(vec![
        Load::boxed(at(23), "c"),
        Call::boxed(at(23), "toString", InstructionBox::new(), true, false),
    ]);
    vm.run(&program).unwrap();
    assert_eq!(counter.calls.get(), 1);
    assert!(vm.stack().is_empty());
}

#[test]
fn test_empty_body_yields_null() {
    let mut vm = Vm::new();
    vm.define_global("noop", Function::new("noop", vec![], InstructionBox::new()));

    let program = args(vec![Call::boxed(at(24), "noop", InstructionBox::new(), false, true)]);
    vm.run(&program).unwrap();
    assert_eq!(vm.stack().as_slice(), &[Value::Null]);
}

#[test]
fn test_local_binding_shadows_global() {
    let mut vm = Vm::new();
    vm.define_global(
        "pick",
        Function::new("pick", vec![], args(vec![num(1.0)])),
    );
    let local = Rc::new(Frame::with_parent(vm.globals().clone()));
    local.set(
        "pick",
        Value::from(Function::new("pick", vec![], args(vec![num(2.0)]))),
    );

    let program = args(vec![Call::boxed(at(25), "pick", InstructionBox::new(), false, true)]);
    vm.run_in(&program, &local).unwrap();
    vm.run(&program).unwrap();
    assert_eq!(
        vm.stack().as_slice(),
        &[Value::Number(2.0), Value::Number(1.0)]
    );
}

#[test]
fn test_global_not_found_and_not_callable() {
    let mut vm = Vm::new();
    vm.define_global("x", 1.0);

    let missing = args(vec![Call::boxed(at(26), "nope", InstructionBox::new(), false, true)]);
    let err = vm.run(&missing).unwrap_err();
    assert!(matches!(
        runtime_kind(&err),
        RuntimeErrorKind::NotFound { name } if name == "nope"
    ));
    assert_eq!(
        err.as_runtime().unwrap().hint(),
        "Check name for mistakes and args amount!"
    );

    let not_callable = args(vec![Call::boxed(at(27), "x", InstructionBox::new(), false, true)]);
    let err = vm.run(&not_callable).unwrap_err();
    assert!(matches!(
        runtime_kind(&err),
        RuntimeErrorKind::NotCallable { name, .. } if name == "x"
    ));
}

#[test]
fn test_rerun_is_idempotent() {
    let mut vm = Vm::new();
    vm.define_global("add", binary_fn("add", BinaryOp::Add));
    let program = args(vec![Call::boxed(
        at(28),
        "add",
        args(vec![num(2.0), num(3.0)]),
        false,
        true,
    )]);

    vm.run(&program).unwrap();
    vm.run(&program).unwrap();
    assert_eq!(
        vm.stack().as_slice(),
        &[Value::Number(5.0), Value::Number(5.0)]
    );
}

#[test]
fn test_locals_do_not_leak_between_calls() {
    let body = args(vec![
        Load::boxed(at(2), "a"),
        Define::boxed(at(2), "tmp"),
        Load::boxed(at(2), "tmp"),
    ]);
    let mut vm = Vm::new();
    vm.define_global("keep", Function::new("keep", params(&["a"]), body));

    let program = args(vec![
        Call::boxed(at(29), "keep", args(vec![num(1.0)]), false, true),
        Call::boxed(at(30), "keep", args(vec![num(2.0)]), false, true),
    ]);
    vm.run(&program).unwrap();
    assert_eq!(
        vm.stack().as_slice(),
        &[Value::Number(1.0), Value::Number(2.0)]
    );
    assert!(!vm.globals().has("tmp"));
}

#[test]
fn test_recursion_hits_call_depth_limit() {
    let config = VmConfig {
        max_call_depth: Some(8),
        ..VmConfig::default()
    };
    let mut vm = Vm::with_config(config).unwrap();
    let body = args(vec![Call::boxed(at(31), "forever", InstructionBox::new(), false, true)]);
    vm.define_global("forever", Function::new("forever", vec![], body));

    let program = args(vec![Call::boxed(at(32), "forever", InstructionBox::new(), false, true)]);
    let err = vm.run(&program).unwrap_err();
    assert!(matches!(
        runtime_kind(&err),
        RuntimeErrorKind::CallDepthExceeded { limit: 8 }
    ));
    assert_eq!(vm.call_depth(), 0);
}
