use std::time::Instant;

use super::*;
use crate::error::ErrorClass;

type TestMachine = Machine<Vec<u8>, Vec<u8>>;

/// Assembles `text`, round-trips it through the ORC container, and builds a machine for it.
fn machine(memory_size: u32, text: &str) -> TestMachine {
  let instructions = parse_assembly(text).unwrap();
  from_records(Program::from_instructions(memory_size, &instructions))
}

fn from_records(program: Program) -> TestMachine {
  let program = Program::from_bytes(&program.to_bytes()).unwrap();
  Machine::new(program, Vec::new(), Vec::new()).unwrap()
}

fn run(memory_size: u32, text: &str) -> (Result<()>, TestMachine) {
  let mut machine = machine(memory_size, text);
  let result = machine.run();
  (result, machine)
}

fn output(machine: &TestMachine) -> String {
  String::from_utf8_lossy(machine.output()).into_owned()
}

fn diagnostics(machine: &TestMachine) -> String {
  String::from_utf8_lossy(machine.diagnostics()).into_owned()
}

/// Returns the error underneath the `Fault` annotation.
fn fault_source(error: &Error) -> &Error {
  match error {
    Error::Fault { source, .. } => &**source,
    other                       => panic!("expected a fault, got {:?}", other)
  }
}

#[test]
fn prints_character() {
  let (result, machine) = run(1, "SET(0, 65)\nOUT(0)");
  assert!(result.is_ok());
  assert_eq!(output(&machine), "A");
  assert!(machine.diagnostics().is_empty());
}

#[test]
fn out_writes_low_byte() {
  let (result, machine) = run(2, "
    SET(0, 321)   # 0x141
    SET(1, -191)  # 0x...41
    OUT(0)
    OUT(1)
  ");
  assert!(result.is_ok());
  assert_eq!(output(&machine), "AA");
}

#[test]
fn memory_starts_zeroed() {
  let machine = machine(5, "NOP");
  assert_eq!(machine.memory().cells(), &[0, 0, 0, 0, 0]);
}

#[test]
fn empty_program_halts_immediately() {
  let mut machine = from_records(Program::new(3, vec![]));
  assert!(machine.is_halted());
  assert!(machine.run().is_ok());
  assert_eq!(machine.ip(), 0);
}

#[test]
fn load_double_indirection() {
  let (result, machine) = run(5, "
    SET(0, 2)
    SET(1, 5)
    SET(2, 99)
    LOAD(3, 0)
  ");
  assert!(result.is_ok());
  assert_eq!(machine.memory().cells(), &[2, 5, 99, 99, 0]);
}

#[test]
fn store_double_indirection() {
  let (result, machine) = run(5, "
    SET(0, 4)
    SET(1, 7)
    STORE(0, 1)
  ");
  assert!(result.is_ok());
  assert_eq!(machine.memory().cells(), &[4, 7, 0, 0, 7]);
}

#[test]
fn load_checks_indirect_address() {
  let (result, machine) = run(5, "
    SET(0, 5)
    LOAD(1, 0)
  ");
  let error = result.unwrap_err();
  assert_eq!(error.class(), ErrorClass::Address);
  assert!(matches!(fault_source(&error), Error::InvalidAddress { value: 5, size: 5 }));
  assert_eq!(machine.ip(), 1);
}

#[test]
fn store_checks_indirect_address() {
  let (result, _) = run(3, "
    SET(0, -1)
    STORE(0, 1)
  ");
  let error = result.unwrap_err();
  assert!(matches!(fault_source(&error), Error::InvalidAddress { value: -1, size: 3 }));
}

#[test]
fn jump_to_stored_index() {
  let mut machine = machine(2, "
    SET(0, 4)
    SET(1, 65)
    JMP(0)
    SET(1, 66)    # jumped over
    OUT(1)
  ");
  for _ in 0..3 {
    machine.step().unwrap();
  }
  assert_eq!(machine.ip(), 4);

  machine.run().unwrap();
  assert_eq!(output(&machine), "A");
}

#[test]
fn loop_with_jump_and_skip() {
  // Counts down from 3, printing each digit.
  let (result, machine) = run(6, "
    SET(0, 3)     # counter
    SET(1, -1)    # step
    SET(2, 48)    # '0'
    SET(4, 6)     # loop start
    SET(5, 12)    # exit
    NOP
    ADD(3, 0, 2)  # 6: loop
    OUT(3)
    ADD(0, 0, 1)
    SGZ(0)
    JMP(5)
    JMP(4)
    NOP           # 12: exit
  ");
  assert!(result.is_ok());
  assert_eq!(output(&machine), "321");
  assert_eq!(machine.memory().read(0).unwrap(), 0);
}

#[test]
fn jump_out_of_program_is_fatal() {
  let (result, machine) = run(1, "
    SET(0, 2)
    JMP(0)
  ");
  let error = result.unwrap_err();
  assert_eq!(error.class(), ErrorClass::Address);
  assert!(matches!(
    fault_source(&error),
    Error::InvalidInstructionIndex { value: 2, count: 2 }
  ));
  assert_eq!(machine.ip(), 1);

  let (result, _) = run(1, "
    SET(0, -1)
    JMP(0)
  ");
  assert!(matches!(
    fault_source(&result.unwrap_err()),
    Error::InvalidInstructionIndex { value: -1, .. }
  ));
}

#[test]
fn sgz_skips_on_positive() {
  let (_, machine) = run(2, "
    SET(0, 1)
    SGZ(0)
    SET(1, 1)
  ");
  assert_eq!(machine.memory().read(1).unwrap(), 0);
}

#[test]
fn sgz_does_not_skip_on_zero_or_negative() {
  let (_, machine) = run(2, "
    SGZ(0)
    SET(1, 1)
  ");
  assert_eq!(machine.memory().read(1).unwrap(), 1);

  let (_, machine) = run(2, "
    SET(0, -5)
    SGZ(0)
    SET(1, 1)
  ");
  assert_eq!(machine.memory().read(1).unwrap(), 1);
}

#[test]
fn sgz_on_last_instruction_halts() {
  let (result, machine) = run(1, "
    SET(0, 1)
    SGZ(0)
  ");
  assert!(result.is_ok());
  assert!(machine.is_halted());
}

#[test]
fn arithmetic() {
  let (result, machine) = run(8, "
    SET(0, 17)
    SET(1, 5)
    SET(2, -7)
    ADD(3, 0, 1)
    MUL(4, 0, 2)
    DIV(5, 0, 1)
    MOD(6, 0, 1)
    DIV(7, 2, 1)
  ");
  assert!(result.is_ok());
  assert_eq!(machine.memory().cells(), &[17, 5, -7, 22, -119, 3, 2, -1]);
}

#[test]
fn arithmetic_wraps() {
  let program = Program::from_instructions(6, &[
    Instruction::Set { address: 0, value: i64::MAX },
    Instruction::Set { address: 1, value: 1 },
    Instruction::Set { address: 2, value: i64::MIN },
    Instruction::Set { address: 3, value: -1 },
    Instruction::Add { destination: 4, left: 0, right: 1 },
    Instruction::Div { destination: 5, left: 2, right: 3 },
  ]);
  let mut machine = from_records(program);
  machine.run().unwrap();

  assert_eq!(machine.memory().read(4).unwrap(), i64::MIN);
  assert_eq!(machine.memory().read(5).unwrap(), i64::MIN);
}

#[test]
fn division_by_zero_is_recoverable() {
  let (result, machine) = run(3, "
    SET(0, 7)
    DIV(0, 1, 2)
    SET(1, 9)
  ");
  assert!(result.is_ok());
  assert_eq!(machine.memory().cells(), &[7, 9, 0]);
  assert_eq!(diagnostics(&machine), "instruction 1: cannot divide by zero\n");
}

#[test]
fn modulo_by_zero_is_recoverable() {
  let (result, machine) = run(3, "
    SET(0, 7)
    SET(1, 4)
    MOD(0, 1, 2)
    OUT(0)
  ");
  assert!(result.is_ok());
  assert_eq!(machine.memory().read(0).unwrap(), 7);
  assert!(diagnostics(&machine).contains("cannot divide by zero"));
  assert_eq!(machine.output(), &vec![7u8]);
}

#[test]
fn division_checks_each_operand() {
  // (dividend, divisor) pairs where exactly one of them is zero.
  for (left, right) in &[(0, 5), (5, 0)] {
    for opcode in &["DIV", "MOD"] {
      let text = format!("
        SET(0, 7)
        SET(1, {})
        SET(2, {})
        {}(0, 1, 2)
      ", left, right, opcode);
      let (result, machine) = run(3, &text);

      assert!(result.is_ok());
      assert_eq!(
        machine.memory().cells(),
        &[7, *left, *right],
        "{}({}, {}) changed the destination", opcode, left, right
      );
      assert_eq!(diagnostics(&machine), "instruction 3: cannot divide by zero\n");
    }
  }
}

#[test]
fn bad_destination_beats_division_by_zero() {
  let (result, _) = run(3, "DIV(3, 1, 2)");
  assert_eq!(result.unwrap_err().class(), ErrorClass::Address);
}

#[test]
fn out_of_range_address_aborts() {
  let (result, machine) = run(4, "
    SET(0, 65)
    OUT(0)
    SET(4, 1)
    OUT(0)
  ");
  let error = result.unwrap_err();
  assert!(error.is_fatal());
  assert_eq!(error.exit_code(), 70);
  assert!(matches!(error, Error::Fault { ip: 2, .. }));
  assert!(matches!(fault_source(&error), Error::InvalidAddress { value: 4, size: 4 }));
  assert_eq!(
    error.to_string(),
    "instruction 2 `SET(4, 1)`: invalid address 4: memory has 4 cells"
  );

  // Nothing after the fault ran.
  assert_eq!(output(&machine), "A");
  assert_eq!(machine.ip(), 2);
  assert!(!machine.is_halted());
}

#[test]
fn negative_address_aborts() {
  let (result, _) = run(4, "OUT(-1)");
  assert!(matches!(fault_source(&result.unwrap_err()), Error::InvalidAddress { value: -1, .. }));
}

#[test]
fn unknown_opcode_is_recoverable() {
  let program = Program::new(1, vec![
    EncodedInstruction::new(0x7F, [1, 2, 3]),
    encode_instruction(&Instruction::Set { address: 0, value: 1 }),
  ]);
  let mut machine = from_records(program);

  assert!(machine.run().is_ok());
  assert_eq!(machine.memory().read(0).unwrap(), 1);
  assert_eq!(
    diagnostics(&machine),
    "instruction 0: invalid instruction: unknown opcode 0x7F\n"
  );
}

#[test]
fn sleep_blocks() {
  let start = Instant::now();
  let (result, machine) = run(1, "
    SET(0, 20)
    SLEEP(0)
  ");
  assert!(result.is_ok());
  assert!(start.elapsed() >= Duration::from_millis(20));
  assert!(machine.is_halted());
}

#[test]
fn sleep_ignores_negative_duration() {
  let (result, _) = run(1, "
    SET(0, -1000)
    SLEEP(0)
  ");
  assert!(result.is_ok());
}

#[test]
fn runs_are_deterministic() {
  let text = "
    SET(1, 72)
    SET(2, 3)
    MUL(3, 1, 2)
    OUT(1)
    LOAD(4, 2)
    OUT(3)
  ";
  let (first, a) = run(6, text);
  let (second, b) = run(6, text);

  assert!(first.is_ok() && second.is_ok());
  let (memory_a, output_a, _) = a.into_parts();
  let (memory_b, output_b, _) = b.into_parts();
  assert_eq!(output_a, output_b);
  assert_eq!(memory_a, memory_b);
}

#[test]
fn step_after_halt_does_nothing() {
  let (_, mut machine) = run(1, "NOP");
  assert!(machine.is_halted());
  machine.step().unwrap();
  assert_eq!(machine.ip(), 1);
}

#[test]
fn display_shows_state() {
  let mut machine = machine(2, "
    SET(0, 65)
    OUT(0)
  ");
  machine.step().unwrap();

  let text = machine.to_string();
  assert!(text.starts_with("IP: 1\tRunning."));
  assert!(text.contains("SET(0, 65)"));
  assert!(text.contains("* --> CODE[1] ="));
  assert!(text.contains("M[0] ="));
}
