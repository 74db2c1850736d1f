//! Built-in words.
//!
//! Every interpreter starts with the same core vocabulary: boolean
//! literals, the two evaluators, `def`, the control words, arithmetic and
//! comparison. Each word is one method with a stack-effect comment,
//! registered by name at construction time.
//!
//! The control words deliberately shuffle the operand stack rather than
//! popping their operands into temporaries: a condition program runs with
//! its branch operands still beneath it on the stack, and programs are
//! free to observe that.

use crate::error::Error;
use crate::internals::words::{Binding, NativeFn};
use crate::runtime::Interp;
use crate::stack::{List, Value};

pub(crate) fn install(interp: &mut Interp) {
    let table: &[(&str, NativeFn)] = &[
        ("true", Interp::w_true),
        ("false", Interp::w_false),
        ("eval", Interp::w_eval),
        ("upeval", Interp::w_upeval),
        ("def", Interp::w_def),
        ("if", Interp::w_if),
        ("ifelse", Interp::w_ifelse),
        ("while", Interp::w_while),
        ("+", Interp::w_add),
        ("-", Interp::w_sub),
        ("*", Interp::w_mul),
        ("/", Interp::w_div),
        (">", Interp::w_gt),
        ("<", Interp::w_lt),
        (">=", Interp::w_ge),
        ("<=", Interp::w_le),
        ("==", Interp::w_eq),
        ("!=", Interp::w_ne),
    ];
    for &(name, func) in table {
        interp.words.install(name, func);
    }
}

#[derive(Clone, Copy)]
enum NumOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
}

fn to_float(v: Value) -> Result<f32, Error> {
    match v {
        Value::Float(f) => Ok(f),
        Value::Int(i) => Ok(i as f32),
        _ => Err(Error::NeedNumber),
    }
}

/// Structural equality: descriptors for lists, ids for wordrefs, numeric
/// equality with int-to-float promotion across the int/float divide.
fn values_equal(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => i as f32 == f,
        _ => a == b,
    }
}

impl Interp {
    /// true ( -- b )
    fn w_true(&mut self) -> Result<(), Error> {
        self.stack.push_bool(true)
    }

    /// false ( -- b )
    fn w_false(&mut self) -> Result<(), Error> {
        self.stack.push_bool(false)
    }

    /// eval ( list -- ... ) run a list in a fresh frame
    fn w_eval(&mut self) -> Result<(), Error> {
        self.stack.need(1)?;
        let v = self.stack.get(-1)?;
        self.stack.pop(1)?;
        self.push_frame()?;
        self.eval_value(v)?;
        self.pop_frame();
        Ok(())
    }

    /// upeval ( list -- ... ) run a list in the caller's frame
    fn w_upeval(&mut self) -> Result<(), Error> {
        self.stack.need(1)?;
        let v = self.stack.get(-1)?;
        self.stack.pop(1)?;
        self.eval_value(v)
    }

    /// def ( list 'word -- ) bind a word to a list
    fn w_def(&mut self) -> Result<(), Error> {
        self.stack.need(2)?;
        let id = match self.stack.get(-1)? {
            Value::WordRef(id) => id,
            _ => return Err(Error::DefNeedsWordRef),
        };
        match self.words.binding(id).ok_or(Error::InvalidChunk)? {
            Binding::Unbound => {}
            _ => return Err(Error::AlreadyDefined),
        }
        let binding = match self.stack.get(-2)? {
            Value::List(List::Static(l)) => Binding::Static(l),
            Value::List(List::Dyn(_)) => {
                // A transient list would die at the next run; move it to the
                // persistent tail first.
                let moved = self.stack.persist(-2).map_err(|_| Error::PersistFailed)?;
                Binding::Dyn(moved)
            }
            _ => return Err(Error::DefNeedsList),
        };
        self.words.bind(id, binding);
        self.stack.pop(2)
    }

    /// Evaluate a condition on top of the stack: a list runs in the
    /// caller's frame, any other value stands for itself.
    fn eval_condition(&mut self) -> Result<(), Error> {
        self.stack.need(1)?;
        let v = self.stack.get(-1)?;
        match v {
            Value::List(_) => {
                self.stack.pop(1)?;
                self.eval_value(v)
            }
            _ => Ok(()),
        }
    }

    /// if ( cond prog -- ... ) run prog when cond evaluates non-false
    fn w_if(&mut self) -> Result<(), Error> {
        self.stack.need(2)?;
        self.stack.swap()?;
        self.eval_condition()?;
        if self.stack.get(-1)? != Value::Bool(false) {
            self.stack.pop(1)?;
            self.w_upeval()
        } else {
            self.stack.pop(2)
        }
    }

    /// ifelse ( cond then else -- ... ) run one branch by cond
    fn w_ifelse(&mut self) -> Result<(), Error> {
        self.stack.need(3)?;
        self.stack.rotate(-3, -1)?;
        self.eval_condition()?;
        if self.stack.get(-1)? != Value::Bool(false) {
            self.stack.pop(2)?;
        } else {
            self.stack.copy(-2, -3)?;
            self.stack.pop(2)?;
        }
        self.w_upeval()
    }

    /// while ( cond body -- ) rerun body while cond evaluates non-false
    fn w_while(&mut self) -> Result<(), Error> {
        self.stack.need(2)?;
        loop {
            self.stack.push_value(-2)?;
            self.eval_condition()?;
            if self.stack.get(-1)? != Value::Bool(false) {
                self.stack.pop(1)?;
                self.stack.push_value(-1)?;
                self.w_upeval()?;
            } else {
                return self.stack.pop(3);
            }
        }
    }

    fn num_op(&mut self, op: NumOp) -> Result<(), Error> {
        self.stack.need(2)?;
        let lhs = self.stack.get(-2)?;
        let rhs = self.stack.get(-1)?;
        self.stack.pop(2)?;
        if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
            return match op {
                NumOp::Add => self.stack.push_int(a.wrapping_add(b)),
                NumOp::Sub => self.stack.push_int(a.wrapping_sub(b)),
                NumOp::Mul => self.stack.push_int(a.wrapping_mul(b)),
                NumOp::Div => {
                    if b == 0 {
                        Err(Error::DivideByZero)
                    } else {
                        self.stack.push_int(a.wrapping_div(b))
                    }
                }
                NumOp::Lt => self.stack.push_bool(a < b),
                NumOp::Gt => self.stack.push_bool(a > b),
                NumOp::Le => self.stack.push_bool(a <= b),
                NumOp::Ge => self.stack.push_bool(a >= b),
            };
        }
        let a = to_float(lhs)?;
        let b = to_float(rhs)?;
        match op {
            NumOp::Add => self.stack.push_float(a + b),
            NumOp::Sub => self.stack.push_float(a - b),
            NumOp::Mul => self.stack.push_float(a * b),
            NumOp::Div => {
                if b == 0.0 {
                    Err(Error::DivideByZero)
                } else {
                    self.stack.push_float(a / b)
                }
            }
            NumOp::Lt => self.stack.push_bool(a < b),
            NumOp::Gt => self.stack.push_bool(a > b),
            NumOp::Le => self.stack.push_bool(a <= b),
            NumOp::Ge => self.stack.push_bool(a >= b),
        }
    }

    /// + ( a b -- a+b )
    fn w_add(&mut self) -> Result<(), Error> {
        self.num_op(NumOp::Add)
    }

    /// - ( a b -- a-b )
    fn w_sub(&mut self) -> Result<(), Error> {
        self.num_op(NumOp::Sub)
    }

    /// * ( a b -- a*b )
    fn w_mul(&mut self) -> Result<(), Error> {
        self.num_op(NumOp::Mul)
    }

    /// / ( a b -- a/b )
    fn w_div(&mut self) -> Result<(), Error> {
        self.num_op(NumOp::Div)
    }

    /// < ( a b -- a<b )
    fn w_lt(&mut self) -> Result<(), Error> {
        self.num_op(NumOp::Lt)
    }

    /// > ( a b -- a>b )
    fn w_gt(&mut self) -> Result<(), Error> {
        self.num_op(NumOp::Gt)
    }

    /// <= ( a b -- a<=b )
    fn w_le(&mut self) -> Result<(), Error> {
        self.num_op(NumOp::Le)
    }

    /// >= ( a b -- a>=b )
    fn w_ge(&mut self) -> Result<(), Error> {
        self.num_op(NumOp::Ge)
    }

    fn compare(&mut self, invert: bool) -> Result<(), Error> {
        self.stack.need(2)?;
        let a = self.stack.get(-2)?;
        let b = self.stack.get(-1)?;
        self.stack.pop(2)?;
        self.stack.push_bool(values_equal(a, b) != invert)
    }

    /// == ( a b -- a==b )
    fn w_eq(&mut self) -> Result<(), Error> {
        self.compare(false)
    }

    /// != ( a b -- a!=b )
    fn w_ne(&mut self) -> Result<(), Error> {
        self.compare(true)
    }
}
