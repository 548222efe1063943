//! Expression evaluator

use super::builtins::{register_builtins, BuiltinCtx, BuiltinFn};
use super::env::{child_env, EnvRef, Environment};
use super::error::{InterpResult, RuntimeError};
use super::host::Host;
use super::value::{Closure, RangeValue, Value};
use crate::ast::{
    BinOp, Binder, Block, Expr, FnLit, LiteralPattern, MatchArm, Pattern, Program, Span, Spanned,
    Stmt, UnOp,
};
use crate::config::Config;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Captured environments are pruned of dead entries once this many pile up
const MIN_PRUNE_THRESHOLD: usize = 256;

/// The interpreter
pub struct Interpreter<'h> {
    config: Config,
    /// Output sink and timer for built-ins
    host: &'h mut dyn Host,
    /// Root environment of the program
    global_env: EnvRef,
    /// Builtin functions
    builtins: HashMap<String, BuiltinFn>,
    /// Current user-function call depth
    recursion_depth: usize,
    /// Environments captured by closures. A closure stored in the frame it
    /// captures forms an `Rc` cycle, so these are cleared when the run ends.
    captured: Vec<Weak<RefCell<Environment>>>,
    prune_at: usize,
}

impl<'h> Interpreter<'h> {
    /// Create a new interpreter
    pub fn new(config: Config, host: &'h mut dyn Host) -> Self {
        let mut builtins = HashMap::new();
        register_builtins(&mut builtins);
        Interpreter {
            config,
            host,
            global_env: Environment::new().into_ref(),
            builtins,
            recursion_depth: 0,
            captured: Vec::new(),
            prune_at: MIN_PRUNE_THRESHOLD,
        }
    }

    /// Root environment the program's top-level bindings live in
    pub fn global_env(&self) -> &EnvRef {
        &self.global_env
    }

    /// Run a program: its value is the trailing expression's, or Unit
    pub fn run_program(&mut self, program: &Program) -> InterpResult<Value> {
        let env = Rc::clone(&self.global_env);
        self.eval_sequence(&program.stmts, program.tail.as_deref(), &env)
    }

    /// Statements then the optional trailing expression, starting in `env`
    fn eval_sequence(
        &mut self,
        stmts: &[Spanned<Stmt>],
        tail: Option<&Spanned<Expr>>,
        env: &EnvRef,
    ) -> InterpResult<Value> {
        let mut frame = Rc::clone(env);
        for stmt in stmts {
            if let Some(next) = self.exec_stmt(stmt, &frame)? {
                frame = next;
            }
        }
        match tail {
            Some(expr) => self.eval(expr, &frame),
            None => Ok(Value::Unit),
        }
    }

    /// Evaluate a block in a fresh frame
    fn eval_block(&mut self, block: &Block, env: &EnvRef) -> InterpResult<Value> {
        let frame = child_env(env);
        self.eval_sequence(&block.stmts, block.tail.as_deref(), &frame)
    }

    /// Frame that a new binding of `name` goes into. A name already bound in
    /// `env` gets a child frame so closures holding `env` keep the old value.
    fn binding_frame(env: &EnvRef, name: &str) -> Option<EnvRef> {
        env.borrow().has_own(name).then(|| child_env(env))
    }

    /// Execute one statement; returns the frame the rest of the sequence
    /// runs in when the statement opened one
    fn exec_stmt(&mut self, stmt: &Spanned<Stmt>, env: &EnvRef) -> InterpResult<Option<EnvRef>> {
        match &stmt.node {
            Stmt::Let { name, value, .. } => {
                let value = self.eval(value, env)?;
                if let Binder::Name(name) = &name.node {
                    let shadow = Self::binding_frame(env, name);
                    let target = shadow.as_ref().unwrap_or(env);
                    target.borrow_mut().define(name.clone(), value);
                    return Ok(shadow);
                }
            }

            Stmt::FnDecl { name, func } => {
                let shadow = Self::binding_frame(env, &name.node);
                let target = shadow.as_ref().unwrap_or(env);
                // Bind the name first so the body can find itself by lookup
                target.borrow_mut().define(name.node.clone(), Value::Unit);
                let closure = self.make_closure(func, target);
                target.borrow_mut().define(name.node.clone(), closure);
                return Ok(shadow);
            }

            Stmt::For { var, iter, body } => {
                let range = match self.eval(iter, env)? {
                    Value::Range(range) => range,
                    other => {
                        return Err(RuntimeError::not_iterable(other.type_name()).at(iter.span));
                    }
                };
                for i in range.iter() {
                    // Each iteration gets its own binding of the loop variable
                    let frame = child_env(env);
                    if let Binder::Name(name) = &var.node {
                        frame.borrow_mut().define(name.clone(), Value::Int(i));
                    }
                    self.eval_sequence(&body.stmts, body.tail.as_deref(), &frame)?;
                }
            }

            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
            }
        }
        Ok(None)
    }

    /// Evaluate an expression with automatic stack growth for deep recursion
    fn eval(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<Value> {
        let (red_zone, growth) = (self.config.stack_red_zone, self.config.stack_growth);
        stacker::maybe_grow(red_zone, growth, || self.eval_inner(expr, env))
    }

    /// Inner eval implementation
    fn eval_inner(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<Value> {
        match &expr.node {
            Expr::IntLit(n) => Ok(Value::Int(*n)),
            Expr::StringLit(s) => Ok(Value::string(s)),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),

            Expr::Var(name) => env
                .borrow()
                .get(name)
                .ok_or_else(|| RuntimeError::undefined_variable(name).at(expr.span)),

            Expr::Binary { left, op, right } => {
                // Short-circuit evaluation for logical operators
                if matches!(op, BinOp::And | BinOp::Or) {
                    let lhs = self.eval_bool(left, env)?;
                    return match (op, lhs) {
                        (BinOp::And, false) => Ok(Value::Bool(false)),
                        (BinOp::Or, true) => Ok(Value::Bool(true)),
                        _ => Ok(Value::Bool(self.eval_bool(right, env)?)),
                    };
                }
                let lhs = self.eval(left, env)?;
                let rhs = self.eval(right, env)?;
                eval_binary(*op, &lhs, &rhs).map_err(|e| e.at(expr.span))
            }

            Expr::Unary { op, expr: operand } => {
                let value = self.eval(operand, env)?;
                eval_unary(*op, &value).map_err(|e| e.at(expr.span))
            }

            Expr::Call { callee, args } => self.eval_call(callee, args, expr.span, env),

            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_bool(cond, env)? {
                    self.eval_block(then_branch, env)
                } else if let Some(else_expr) = else_branch {
                    self.eval(else_expr, env)
                } else {
                    Ok(Value::Unit)
                }
            }

            Expr::Match { subject, arms } => {
                let value = self.eval(subject, env)?;
                self.eval_match(&value, arms, subject.span, env)
            }

            Expr::Range {
                start,
                end,
                inclusive,
            } => {
                let start = self.eval_int(start, env)?;
                let end = self.eval_int(end, env)?;
                Ok(Value::Range(RangeValue::new(start, end, *inclusive)))
            }

            Expr::Block(block) => self.eval_block(block, env),

            Expr::Fn(func) => Ok(self.make_closure(func, env)),
        }
    }

    fn eval_bool(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<bool> {
        let value = self.eval(expr, env)?;
        value
            .as_bool()
            .ok_or_else(|| RuntimeError::type_mismatch("bool", value.type_name()).at(expr.span))
    }

    fn eval_int(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<i64> {
        let value = self.eval(expr, env)?;
        value
            .as_int()
            .ok_or_else(|| RuntimeError::type_mismatch("int", value.type_name()).at(expr.span))
    }

    fn eval_args(&mut self, args: &[Spanned<Expr>], env: &EnvRef) -> InterpResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg, env)).collect()
    }

    fn eval_call(
        &mut self,
        callee: &Spanned<Expr>,
        args: &[Spanned<Expr>],
        span: Span,
        env: &EnvRef,
    ) -> InterpResult<Value> {
        // Check builtins first
        if let Expr::Var(name) = &callee.node {
            if let Some(builtin) = self.builtins.get(name).copied() {
                let args = self.eval_args(args, env)?;
                tracing::trace!(builtin = %name, args = args.len(), "builtin call");
                let mut ctx = BuiltinCtx {
                    host: &mut *self.host,
                    env,
                };
                return builtin(&mut ctx, &args).map_err(|e| e.at(span));
            }
        }

        let function = self.eval(callee, env)?;
        let args = self.eval_args(args, env)?;
        match function {
            Value::Function(closure) => self.call_closure(&closure, args, span),
            other => Err(RuntimeError::type_mismatch("function", other.type_name()).at(callee.span)),
        }
    }

    /// Call a closure with automatic stack growth
    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>, span: Span) -> InterpResult<Value> {
        let (red_zone, growth) = (self.config.stack_red_zone, self.config.stack_growth);
        stacker::maybe_grow(red_zone, growth, || self.call_closure_inner(closure, args, span))
    }

    fn call_closure_inner(
        &mut self,
        closure: &Closure,
        args: Vec<Value>,
        span: Span,
    ) -> InterpResult<Value> {
        let name = closure.name().unwrap_or("<fn>");

        // Check arity
        if closure.arity() != args.len() {
            return Err(RuntimeError::arity_mismatch(name, closure.arity(), args.len()).at(span));
        }

        // Check recursion depth
        self.recursion_depth += 1;
        if self.recursion_depth > self.config.max_call_depth {
            self.recursion_depth -= 1;
            return Err(RuntimeError::stack_overflow(self.config.max_call_depth).at(span));
        }
        tracing::trace!(function = name, depth = self.recursion_depth, "call");

        // The call frame's parent is the environment the function was defined in
        let frame = child_env(&closure.env);
        for (param, arg) in closure.lit.params.iter().zip(args) {
            frame.borrow_mut().define(param.name.node.clone(), arg);
        }

        let body = &closure.lit.body;
        let result = self.eval_sequence(&body.stmts, body.tail.as_deref(), &frame);
        self.recursion_depth -= 1;
        result
    }

    fn eval_match(
        &mut self,
        value: &Value,
        arms: &[MatchArm],
        subject_span: Span,
        env: &EnvRef,
    ) -> InterpResult<Value> {
        for arm in arms {
            if pattern_matches(&arm.pattern, value)? {
                return self.eval(&arm.body, env);
            }
        }
        Err(RuntimeError::non_exhaustive_match(&value.repr()).at(subject_span))
    }

    fn make_closure(&mut self, func: &Rc<FnLit>, env: &EnvRef) -> Value {
        self.track_captured(env);
        Value::Function(Rc::new(Closure {
            lit: Rc::clone(func),
            env: Rc::clone(env),
        }))
    }

    fn track_captured(&mut self, env: &EnvRef) {
        if self
            .captured
            .last()
            .is_some_and(|last| std::ptr::eq(last.as_ptr(), Rc::as_ptr(env)))
        {
            return;
        }
        if self.captured.len() >= self.prune_at {
            self.captured.retain(|weak| weak.strong_count() > 0);
            self.prune_at = (self.captured.len() * 2).max(MIN_PRUNE_THRESHOLD);
        }
        self.captured.push(Rc::downgrade(env));
    }
}

impl Drop for Interpreter<'_> {
    fn drop(&mut self) {
        for weak in self.captured.drain(..) {
            if let Some(env) = weak.upgrade() {
                if let Ok(mut env) = env.try_borrow_mut() {
                    env.clear();
                }
            }
        }
        if let Ok(mut env) = self.global_env.try_borrow_mut() {
            env.clear();
        }
    }
}

/// Match a literal or wildcard pattern; functions and ranges never compare
fn pattern_matches(pattern: &Spanned<Pattern>, value: &Value) -> InterpResult<bool> {
    let literal = match &pattern.node {
        Pattern::Wildcard => return Ok(true),
        Pattern::Literal(literal) => literal,
    };
    if !value.is_comparable() {
        return Err(RuntimeError::not_comparable(value.type_name()).at(pattern.span));
    }
    Ok(match (literal, value) {
        (LiteralPattern::Int(n), Value::Int(v)) => n == v,
        (LiteralPattern::Str(s), Value::Str(v)) => s.as_slice() == &**v,
        (LiteralPattern::Bool(b), Value::Bool(v)) => b == v,
        _ => false,
    })
}

fn eval_binary(op: BinOp, lhs: &Value, rhs: &Value) -> InterpResult<Value> {
    let overflow = || RuntimeError::integer_overflow(&op.to_string());
    match (op, lhs, rhs) {
        (BinOp::Add, Value::Int(a), Value::Int(b)) => {
            a.checked_add(*b).map(Value::Int).ok_or_else(overflow)
        }
        (BinOp::Add, Value::Str(a), Value::Str(b)) => {
            let mut joined = Vec::with_capacity(a.len() + b.len());
            joined.extend_from_slice(a);
            joined.extend_from_slice(b);
            Ok(Value::Str(Rc::from(joined)))
        }
        (BinOp::Sub, Value::Int(a), Value::Int(b)) => {
            a.checked_sub(*b).map(Value::Int).ok_or_else(overflow)
        }
        (BinOp::Mul, Value::Int(a), Value::Int(b)) => {
            a.checked_mul(*b).map(Value::Int).ok_or_else(overflow)
        }
        (BinOp::Div | BinOp::Mod, Value::Int(_), Value::Int(0)) => {
            Err(RuntimeError::division_by_zero())
        }
        (BinOp::Div, Value::Int(a), Value::Int(b)) => {
            a.checked_div(*b).map(Value::Int).ok_or_else(overflow)
        }
        (BinOp::Mod, Value::Int(a), Value::Int(b)) => {
            a.checked_rem(*b).map(Value::Int).ok_or_else(overflow)
        }

        (BinOp::Eq | BinOp::Ne, _, _) => match lhs.structural_eq(rhs) {
            Some(equal) => Ok(Value::Bool(equal == (op == BinOp::Eq))),
            None => {
                let offender = if lhs.is_comparable() { rhs } else { lhs };
                Err(RuntimeError::not_comparable(offender.type_name()))
            }
        },

        (BinOp::Lt, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a < b)),
        (BinOp::Gt, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a > b)),
        (BinOp::Le, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a <= b)),
        (BinOp::Ge, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a >= b)),

        _ => Err(RuntimeError::invalid_operands(
            &op.to_string(),
            lhs.type_name(),
            rhs.type_name(),
        )),
    }
}

fn eval_unary(op: UnOp, value: &Value) -> InterpResult<Value> {
    match (op, value) {
        (UnOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::integer_overflow("-")),
        (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnOp::Neg, other) => Err(RuntimeError::type_mismatch("int", other.type_name())),
        (UnOp::Not, other) => Err(RuntimeError::type_mismatch("bool", other.type_name())),
    }
}
