//! Typed VCL fragments and their text rendering.
//!
//! Snippet bodies are built from these types and rendered in one place, so
//! the compiler can be tested on structure and formatting stays uniform.

use std::fmt::{self, Display, Write};

const INDENT: &str = "  ";

/// A VCL expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Quoted string literal. The compiler only emits validated values
    /// here; none contain `"`.
    Str(String),
    Int(i64),
    /// Variable, header or backend identifier.
    Var(String),
    /// `a + b + ...`
    Concat(Vec<Expr>),
    /// `name(args...)`
    Call(String, Vec<Expr>),
}

impl Expr {
    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(name.into(), args)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Str(s) => write!(f, "\"{}\"", s),
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Var(name) => f.write_str(name),
            Expr::Concat(parts) => write_joined(f, parts, " + "),
            Expr::Call(name, args) => {
                write!(f, "{}(", name)?;
                write_joined(f, args, ", ")?;
                f.write_str(")")
            }
        }
    }
}

fn write_joined<T: Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// A boolean condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cond {
    /// Header or variable is set (non-empty).
    IsSet(String),
    Eq(Expr, Expr),
    Lt(Expr, Expr),
    /// `lhs ~ "regex"`
    Matches(Expr, String),
    And(Vec<Cond>),
    Or(Vec<Cond>),
}

impl Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cond::IsSet(name) => f.write_str(name),
            Cond::Eq(a, b) => write!(f, "{} == {}", a, b),
            Cond::Lt(a, b) => write!(f, "{} < {}", a, b),
            Cond::Matches(a, re) => write!(f, "{} ~ \"{}\"", a, re),
            Cond::And(parts) => write_joined(f, parts, " && "),
            Cond::Or(parts) => write_joined(f, parts, " || "),
        }
    }
}

/// Terminating action for `return (...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pass,
    Hash,
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Pass => f.write_str("pass"),
            Action::Hash => f.write_str("hash"),
        }
    }
}

/// Label of one `switch` case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseLabel {
    Exact(String),
    Regex(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub label: CaseLabel,
    pub body: Vec<Stmt>,
}

/// A VCL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Comment(String),
    Set { target: String, value: Expr },
    /// `set target += value;`
    Append { target: String, value: Expr },
    Unset(String),
    DeclareLocal { name: String, ty: String },
    If { cond: Cond, then: Vec<Stmt>, otherwise: Vec<Stmt> },
    Switch { subject: Expr, cases: Vec<Case> },
    Return(Expr),
    ReturnAction(Action),
}

impl Stmt {
    pub fn comment(text: impl Into<String>) -> Self {
        Stmt::Comment(text.into())
    }

    pub fn set(target: impl Into<String>, value: Expr) -> Self {
        Stmt::Set {
            target: target.into(),
            value,
        }
    }

    pub fn unset(target: impl Into<String>) -> Self {
        Stmt::Unset(target.into())
    }

    pub fn when(cond: Cond, then: Vec<Stmt>) -> Self {
        Stmt::If {
            cond,
            then,
            otherwise: Vec::new(),
        }
    }
}

fn pad<W: Write>(out: &mut W, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        out.write_str(INDENT)?;
    }
    Ok(())
}

/// Render statements at the given nesting depth.
pub fn render_block<W: Write>(stmts: &[Stmt], depth: usize, out: &mut W) -> fmt::Result {
    for stmt in stmts {
        render_stmt(stmt, depth, out)?;
    }
    Ok(())
}

fn render_stmt<W: Write>(stmt: &Stmt, depth: usize, out: &mut W) -> fmt::Result {
    pad(out, depth)?;
    match stmt {
        Stmt::Comment(text) => writeln!(out, "# {}", text),
        Stmt::Set { target, value } => writeln!(out, "set {} = {};", target, value),
        Stmt::Append { target, value } => writeln!(out, "set {} += {};", target, value),
        Stmt::Unset(target) => writeln!(out, "unset {};", target),
        Stmt::DeclareLocal { name, ty } => writeln!(out, "declare local {} {};", name, ty),
        Stmt::Return(expr) => writeln!(out, "return {};", expr),
        Stmt::ReturnAction(action) => writeln!(out, "return ({});", action),
        Stmt::If { cond, then, otherwise } => {
            writeln!(out, "if ({}) {{", cond)?;
            render_block(then, depth + 1, out)?;
            if !otherwise.is_empty() {
                pad(out, depth)?;
                out.write_str("} else {\n")?;
                render_block(otherwise, depth + 1, out)?;
            }
            pad(out, depth)?;
            writeln!(out, "}}")
        }
        Stmt::Switch { subject, cases } => {
            writeln!(out, "switch ({}) {{", subject)?;
            for case in cases {
                pad(out, depth)?;
                match &case.label {
                    CaseLabel::Exact(lit) => writeln!(out, "case \"{}\":", lit)?,
                    CaseLabel::Regex(re) => writeln!(out, "case ~ \"{}\":", re)?,
                }
                render_block(&case.body, depth + 1, out)?;
                pad(out, depth + 1)?;
                out.write_str("break;\n")?;
            }
            pad(out, depth)?;
            writeln!(out, "}}")
        }
    }
}

/// A custom subroutine with an optional return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subroutine {
    pub name: String,
    pub return_type: Option<String>,
    pub body: Vec<Stmt>,
}

impl Display for Subroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.return_type {
            Some(ty) => writeln!(f, "sub {} {} {{", self.name, ty)?,
            None => writeln!(f, "sub {} {{", self.name)?,
        }
        render_block(&self.body, 1, f)?;
        writeln!(f, "}}")
    }
}

/// Value of a backend or probe property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    Seconds(u64),
    Int(u64),
    Bool(bool),
    Str(String),
    /// Several string literals, joined by the platform.
    Lines(Vec<String>),
    Block(Vec<Property>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: &'static str,
    pub value: PropValue,
}

impl Property {
    pub fn new(key: &'static str, value: PropValue) -> Self {
        Self { key, value }
    }
}

fn render_properties<W: Write>(props: &[Property], depth: usize, out: &mut W) -> fmt::Result {
    for prop in props {
        pad(out, depth)?;
        match &prop.value {
            PropValue::Seconds(n) => writeln!(out, ".{} = {}s;", prop.key, n)?,
            PropValue::Int(n) => writeln!(out, ".{} = {};", prop.key, n)?,
            PropValue::Bool(b) => writeln!(out, ".{} = {};", prop.key, b)?,
            PropValue::Str(s) => writeln!(out, ".{} = \"{}\";", prop.key, s)?,
            PropValue::Lines(lines) => {
                let quoted: Vec<String> = lines.iter().map(|l| format!("\"{}\"", l)).collect();
                writeln!(out, ".{} = {};", prop.key, quoted.join(" "))?
            }
            PropValue::Block(inner) => {
                writeln!(out, ".{} = {{", prop.key)?;
                render_properties(inner, depth + 1, out)?;
                pad(out, depth)?;
                writeln!(out, "}}")?
            }
        }
    }
    Ok(())
}

/// `backend <name> { ... }` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDecl {
    pub name: String,
    pub properties: Vec<Property>,
}

impl Display for BackendDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "backend {} {{", self.name)?;
        render_properties(&self.properties, 1, f)?;
        writeln!(f, "}}")
    }
}

/// The body of one snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Backends(Vec<BackendDecl>),
    Subroutine(Subroutine),
    Statements(Vec<Stmt>),
}

impl Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Backends(decls) => {
                for decl in decls {
                    write!(f, "{}", decl)?;
                }
                Ok(())
            }
            Fragment::Subroutine(sub) => write!(f, "{}", sub),
            Fragment::Statements(stmts) => render_block(stmts, 0, f),
        }
    }
}
