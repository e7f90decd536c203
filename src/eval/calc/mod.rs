//! A small integer calculator used as the binary's evaluation engine.
//!
//! One statement per line (or `;`). A statement is `name = expr` or a bare
//! `expr`. Its value is rendered on the same output row as its source line, so
//! output stays beside the code in a side-by-side layout; statements sharing a
//! line are joined with `; `. Arithmetic is checked `i64`. `sleep(ms)` waits
//! cooperatively and evaluates to `ms`, which makes long-running evaluations
//! (and aborting them) easy to try out.
//!
//! ```text
//! x = 6 * 7      ->  x = 42
//! x / 2          ->  21
//! ```

mod lexer;
mod parser;

use super::{CancelToken, Engine, EvaluationResult, Interrupted, SourceSpan};
use lexer::Lexer;
use parser::{BinOp, Expr, Parser, Stmt};
use rustc_hash::FxHashMap;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity at which `sleep` re-checks the cancel token
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Error reported back to the shell as a `Failure`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcError {
    pub message: String,
    pub span: SourceSpan,
}

impl CalcError {
    pub fn new(message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

impl std::error::Error for CalcError {}

/// Why evaluation stopped early
enum Halt {
    Error(CalcError),
    Interrupted,
}

impl From<CalcError> for Halt {
    fn from(err: CalcError) -> Self {
        Halt::Error(err)
    }
}

impl From<Interrupted> for Halt {
    fn from(_: Interrupted) -> Self {
        Halt::Interrupted
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Calculator
    }
}

impl Engine for Calculator {
    fn run(&self, source: &str, cancel: &CancelToken) -> Result<EvaluationResult, Interrupted> {
        let program = match Lexer::new(source)
            .tokenize()
            .and_then(|tokens| Parser::new(tokens).parse_program())
        {
            Ok(program) => program,
            Err(err) => return Ok(failure(err)),
        };

        let mut session = Session {
            vars: FxHashMap::default(),
            cancel,
        };

        let line_starts = line_starts(source);
        let mut rows: Vec<String> = Vec::new();
        for stmt in &program {
            let value = match session.exec(stmt) {
                Ok(value) => value,
                Err(Halt::Error(err)) => return Ok(failure(err)),
                Err(Halt::Interrupted) => return Err(Interrupted),
            };

            let line = line_starts.partition_point(|&start| start <= stmt.span().start) - 1;
            if rows.len() <= line {
                rows.resize(line + 1, String::new());
            }
            let row = &mut rows[line];
            if !row.is_empty() {
                row.push_str("; ");
            }
            row.push_str(&value);
        }

        Ok(EvaluationResult::success(rows.join("\n")))
    }
}

/// Char offset at which each line begins
fn line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(
        source
            .chars()
            .enumerate()
            .filter(|&(_, c)| c == '\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

fn failure(err: CalcError) -> EvaluationResult {
    EvaluationResult::failure(err.message, Some(err.span))
}

struct Session<'a> {
    vars: FxHashMap<String, i64>,
    cancel: &'a CancelToken,
}

impl Session<'_> {
    fn exec(&mut self, stmt: &Stmt) -> Result<String, Halt> {
        self.cancel.check()?;
        match stmt {
            Stmt::Assign { name, value } => {
                let v = self.eval(value)?;
                self.vars.insert(name.clone(), v);
                Ok(format!("{} = {}", name, v))
            }
            Stmt::Expr(expr) => Ok(self.eval(expr)?.to_string()),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<i64, Halt> {
        match expr {
            Expr::Int(n, _) => Ok(*n),
            Expr::Var(name, span) => self.vars.get(name).copied().ok_or_else(|| {
                Halt::Error(CalcError::new(
                    format!("undefined variable '{}'", name),
                    *span,
                ))
            }),
            Expr::Neg(operand, span) => {
                let v = self.eval(operand)?;
                v.checked_neg()
                    .ok_or_else(|| CalcError::new("integer overflow", *span).into())
            }
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                apply(*op, l, r, *span).map_err(Halt::from)
            }
            Expr::Call {
                name,
                args,
                name_span,
                span,
            } => self.call(name, args, *name_span, *span),
        }
    }

    fn call(
        &mut self,
        name: &str,
        args: &[Expr],
        name_span: SourceSpan,
        span: SourceSpan,
    ) -> Result<i64, Halt> {
        match name {
            "sleep" => {
                if args.len() != 1 {
                    return Err(CalcError::new(
                        format!("sleep expects 1 argument, got {}", args.len()),
                        span,
                    )
                    .into());
                }
                let ms = self.eval(&args[0])?;
                if ms < 0 {
                    return Err(CalcError::new(
                        "sleep duration must not be negative",
                        args[0].span(),
                    )
                    .into());
                }
                self.sleep(Duration::from_millis(ms as u64))?;
                Ok(ms)
            }
            _ => Err(CalcError::new(format!("unknown function '{}'", name), name_span).into()),
        }
    }

    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now() + duration;
        loop {
            self.cancel.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

fn apply(op: BinOp, l: i64, r: i64, span: SourceSpan) -> Result<i64, CalcError> {
    if matches!(op, BinOp::Div | BinOp::Rem) && r == 0 {
        return Err(CalcError::new("division by zero", span));
    }
    let value = match op {
        BinOp::Add => l.checked_add(r),
        BinOp::Sub => l.checked_sub(r),
        BinOp::Mul => l.checked_mul(r),
        BinOp::Div => l.checked_div(r),
        BinOp::Rem => l.checked_rem(r),
    };
    value.ok_or_else(|| CalcError::new("integer overflow", span))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> EvaluationResult {
        Calculator.run(src, &CancelToken::new()).expect("not interrupted")
    }

    #[test]
    fn test_single_expression() {
        assert_eq!(run("1+1"), EvaluationResult::success("2"));
        assert_eq!(run("-(2 + 3) * 4 % 7"), EvaluationResult::success("-6"));
    }

    #[test]
    fn test_output_rows_follow_source_lines() {
        assert_eq!(
            run("x = 1\n\n# c\nx + 1"),
            EvaluationResult::success("x = 1\n\n\n2")
        );

        let src = "# setup\nx = 6 * 7\n\ny = x / 2; y - 1\n";
        assert_eq!(run(src), EvaluationResult::success("\nx = 42\n\ny = 21; 20"));
    }

    #[test]
    fn test_long_chain_evaluates() {
        assert_eq!(run(&["1"; 500].join("+")), EvaluationResult::success("500"));
    }

    #[test]
    fn test_incomplete_expression() {
        assert_eq!(
            run("1+"),
            EvaluationResult::failure("unexpected end of input", Some(SourceSpan::point(2)))
        );
    }

    #[test]
    fn test_runtime_errors_carry_spans() {
        assert_eq!(
            run("a = 1\nb + a"),
            EvaluationResult::failure("undefined variable 'b'", Some(SourceSpan::new(6, 7)))
        );
        assert_eq!(
            run("7 / (1 - 1)"),
            EvaluationResult::failure("division by zero", Some(SourceSpan::new(0, 10)))
        );
        assert_eq!(
            run("9223372036854775807 + 1"),
            EvaluationResult::failure("integer overflow", Some(SourceSpan::new(0, 23)))
        );
        assert_eq!(
            run("nap(1)"),
            EvaluationResult::failure("unknown function 'nap'", Some(SourceSpan::new(0, 3)))
        );
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(run("# nothing\n\n"), EvaluationResult::success(""));
    }

    #[test]
    fn test_sleep_returns_duration() {
        assert_eq!(run("sleep(1) + 1"), EvaluationResult::success("2"));
    }

    #[test]
    fn test_cancelled_before_first_statement() {
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(Calculator.run("1", &cancel), Err(Interrupted));
    }

    #[test]
    fn test_cancel_interrupts_sleep() {
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let worker = thread::spawn(move || Calculator.run("sleep(60000)", &remote));

        thread::sleep(Duration::from_millis(30));
        cancel.cancel();

        let outcome = worker.join().expect("worker thread");
        assert_eq!(outcome, Err(Interrupted));
    }
}
