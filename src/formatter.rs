use crate::language::ir::{Atom, Equation, Program, Var};
use std::collections::HashMap;
use std::fmt;

/// Renders programs as
///
/// ```text
/// (v0:f32[]) =>
///   v1:f32[] = add(v0:f32[], 1.0)
///   return v1:f32[]
/// ```
///
/// Variables are numbered in order of first appearance, so the output only
/// depends on the structure of the program.
pub struct PrettyPrinter {
    lines: Vec<(usize, String)>,
    depth: usize,
    indent: usize,
    names: HashMap<Var, usize>,
}

impl Default for PrettyPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl PrettyPrinter {
    pub fn new() -> Self {
        Self::with_indent(2)
    }

    pub fn with_indent(indent: usize) -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
            indent,
            names: HashMap::new(),
        }
    }

    fn print_line(&mut self, line: String) {
        self.lines.push((self.depth, line));
    }

    fn var_name(&mut self, var: &Var) -> String {
        let next = self.names.len();
        let idx = *self.names.entry(var.clone()).or_insert(next);
        format!("v{idx}:{}", var.ty())
    }

    fn atom(&mut self, atom: &Atom) -> String {
        match atom {
            Atom::Var(var) => self.var_name(var),
            Atom::Value(value) => value.to_string(),
        }
    }

    fn arglist<'a>(&mut self, atoms: impl IntoIterator<Item = &'a Atom>) -> String {
        let rendered: Vec<String> = atoms.into_iter().map(|atom| self.atom(atom)).collect();
        format!("({})", rendered.join(", "))
    }

    pub fn print_program(&mut self, program: &Program) {
        let params: Vec<String> = program
            .params
            .iter()
            .map(|param| self.var_name(param))
            .collect();
        self.print_line(format!("({}) =>", params.join(", ")));
        self.depth += 1;
        for eqn in &program.equations {
            self.print_equation(eqn);
        }
        let result = self.atom(&program.result);
        self.print_line(format!("return {result}"));
        self.depth -= 1;
    }

    pub fn print_equation(&mut self, eqn: &Equation) {
        // Arguments first: they were bound before the binder.
        let args = self.arglist(&eqn.args);
        let binder = self.var_name(&eqn.binder);
        self.print_line(format!("{binder} = {}{args}", eqn.primitive));
        self.depth += 1;
        for sub in &eqn.subprograms {
            self.print_program(sub);
        }
        self.depth -= 1;
    }

    pub fn finish(self) -> String {
        let indent = self.indent;
        self.lines
            .into_iter()
            .map(|(depth, line)| format!("{}{}", " ".repeat(depth * indent), line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn format_program(program: &Program) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_program(program);
    printer.finish()
}

pub fn format_equation(eqn: &Equation) -> String {
    let mut printer = PrettyPrinter::new();
    printer.print_equation(eqn);
    printer.finish()
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_program(self))
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_equation(self))
    }
}
