use std::io::{stdin, stdout, BufRead, IsTerminal, Write};

use colored::Colorize;
use console::Term;

use crate::runtime::{Registers, Termination};
use crate::symbol::Opcode;

/// Line-oriented terminal the interpreter talks to.
pub trait Console {
    /// Read one line of input without its line ending. `None` once input is exhausted.
    fn read_line(&mut self) -> Option<String>;

    fn print_char(&mut self, ch: char);

    fn print_decimal(&mut self, value: i64);

    /// Called for every decoded instruction before it executes.
    fn print_trace(&mut self, _addr: i64, _ir: i64, _opcode: Opcode) {}

    fn print_termination(&mut self, termination: &Termination);

    fn print_registers(&mut self, registers: &Registers);
}

/// Process stdin/stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct Terminal {
    /// Plain output, suited for blackbox tests
    minimal: bool,
    /// Echo every instruction to stderr
    trace: bool,
}

impl Terminal {
    pub fn new(minimal: bool, trace: bool) -> Self {
        Terminal { minimal, trace }
    }
}

impl Console for Terminal {
    fn read_line(&mut self) -> Option<String> {
        if stdin().is_terminal() {
            if !self.minimal {
                print!("{} ", ">".cyan());
                let _ = stdout().flush();
            }
            return Term::stdout().read_line().ok();
        }
        let mut buf = String::new();
        match stdin().lock().read_line(&mut buf) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(buf.trim_end_matches(|c: char| c == '\n' || c == '\r').to_owned()),
        }
    }

    fn print_char(&mut self, ch: char) {
        println!("{ch}");
    }

    fn print_decimal(&mut self, value: i64) {
        println!("{value}");
    }

    fn print_trace(&mut self, addr: i64, ir: i64, opcode: Opcode) {
        if self.trace {
            let line = format!("{addr:>4}  0x{:04x}  {opcode}", ir & 0xFFFF);
            eprintln!("{}", line.dimmed());
        }
    }

    fn print_termination(&mut self, termination: &Termination) {
        match (termination, self.minimal) {
            (Termination::Halted, true) => println!("Halted"),
            (Termination::Halted, false) => println!("\n{:>12}", "Halted".cyan()),
            (Termination::Faulted(fault), true) => println!("Faulted {fault}"),
            (Termination::Faulted(fault), false) => println!("\n{:>12} {fault}", "Faulted".red()),
        }
    }

    fn print_registers(&mut self, registers: &Registers) {
        if self.minimal {
            for (name, value) in registers.iter() {
                println!("{name} {value}");
            }
            return;
        }

        let border = "─".repeat(38);
        println!("\x1b[2m┌{border}┐\x1b[0m");
        println!(
            "\x1b[2m│\x1b[0m {:<6} \x1b[3m{:<6}  {:>20}\x1b[0m  \x1b[2m│\x1b[0m",
            "", "hex", "int"
        );
        for (name, value) in registers.iter() {
            println!(
                "\x1b[2m│\x1b[0m \x1b[1m{name:<6}\x1b[0m 0x{:04x}  {value:>20}  \x1b[2m│\x1b[0m",
                value & 0xFFFF
            );
        }
        println!("\x1b[2m└{border}┘\x1b[0m");
    }
}

