//! Instruction execution.
//!
//! Two instruction streams exist: static lists, walked cell by cell inside
//! a bound chunk, and dynamic lists, walked slot by slot inside the arena.
//! Both push literals and dispatch into the word table; only the static
//! stream can carry localset and local-read instructions, because only the
//! resolver emits those.

use crate::cell::Tag;
use crate::error::Error;
use crate::internals::words::Binding;
use crate::runtime::Interp;
use crate::stack::{DynList, List, StaticList, Value, WordId, LIST_SIZE};

impl Interp {
    pub(crate) fn exec_static(&mut self, prog: u16, offset: u16, len: u16) -> Result<(), Error> {
        for i in 0..len {
            self.exec_cell(prog, offset as usize + i as usize)?;
        }
        Ok(())
    }

    fn exec_cell(&mut self, prog: u16, index: usize) -> Result<(), Error> {
        let ins = self.chunk_cell(prog as usize, index)?;
        let data = self.chunk_cell(prog as usize, ins.offset() as usize)?;
        match ins.tag().ok_or(Error::InvalidChunk)? {
            Tag::Word => self.call(data.as_word()),
            Tag::LocalSet => self.set_locals(data.as_locals()),
            Tag::List => self.stack.push(Value::List(List::Static(StaticList {
                prog,
                offset: data.offset(),
                len: data.len(),
            }))),
            Tag::Int => self.stack.push(Value::Int(data.as_int())),
            Tag::Float => self.stack.push(Value::Float(data.as_float())),
            Tag::True => self.stack.push(Value::Bool(true)),
            Tag::False => self.stack.push(Value::Bool(false)),
            Tag::WordRef => self.stack.push(Value::WordRef(data.as_word())),
            Tag::Local => self.get_local(data.as_word() as u8),
            Tag::DynList => Err(Error::InvalidChunk),
        }
    }

    /// Execute a dynamic list: every slot pushes its value, except that a
    /// wordref slot degrades to `false` in this path.
    pub(crate) fn exec_dyn(&mut self, list: DynList) -> Result<(), Error> {
        let offset = list.offset as usize;
        let end = offset
            .checked_add(list.len as usize)
            .filter(|&e| e <= LIST_SIZE)
            .ok_or(Error::ListIndexOutOfRange)?;
        for i in offset..end {
            match self.stack.arena_cell(i) {
                Value::WordRef(_) => self.stack.push(Value::Bool(false))?,
                v => self.stack.push(v)?,
            }
        }
        Ok(())
    }

    /// Dispatch a word by id.
    pub(crate) fn call(&mut self, id: WordId) -> Result<(), Error> {
        match self.words.binding(id).ok_or(Error::InvalidChunk)? {
            Binding::Native(func) => func(self),
            Binding::Static(l) => self.exec_static(l.prog, l.offset, l.len),
            Binding::Dyn(l) => self.exec_dyn(l),
            Binding::Unbound => {
                Err(Error::UndefinedWord(self.words.name(id).unwrap_or_default()))
            }
        }
    }

    pub(crate) fn eval_value(&mut self, v: Value) -> Result<(), Error> {
        match v {
            Value::List(List::Static(l)) => self.exec_static(l.prog, l.offset, l.len),
            Value::List(List::Dyn(l)) => self.exec_dyn(l),
            _ => Err(Error::EvalNeedsList),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CHUNK_CELLS};

    fn run(interp: &mut Interp, prog: usize, src: &str) -> Result<(), Error> {
        let mut out = vec![Cell::default(); CHUNK_CELLS];
        let n = interp.load(src.as_bytes(), &mut out)?;
        interp.run(prog, Some(&out[..n]))
    }

    #[test]
    fn test_literals_push() {
        let mut interp = Interp::new();
        run(&mut interp, 0, "7 2.5 true false 'x").unwrap();
        let v = interp.stack().values();
        assert_eq!(v[0], Value::Int(7));
        assert_eq!(v[1], Value::Float(2.5));
        assert_eq!(v[2], Value::Bool(true));
        assert_eq!(v[3], Value::Bool(false));
        assert!(matches!(v[4], Value::WordRef(_)));
    }

    #[test]
    fn test_undefined_word_reports_name() {
        let mut interp = Interp::new();
        let r = run(&mut interp, 0, "frobnicate");
        assert_eq!(r, Err(Error::UndefinedWord("frobnicate".into())));
    }

    #[test]
    fn test_dyn_list_execution_pushes_slots() {
        let mut interp = Interp::new();
        // Hand-build a dynamic list [11 22], then execute it.
        let st = interp.stack_mut();
        st.create_list(2).unwrap();
        st.push_int(11).unwrap();
        st.set_item(1, 0).unwrap();
        st.push_int(22).unwrap();
        st.set_item(1, 1).unwrap();
        let v = st.get(-1).unwrap();
        st.pop(1).unwrap();
        interp.push_frame().unwrap();
        interp.eval_value(v).unwrap();
        assert_eq!(
            interp.stack().values(),
            &[Value::Int(11), Value::Int(22)]
        );
    }

    #[test]
    fn test_dyn_list_wordref_degrades_to_false() {
        let mut interp = Interp::new();
        let st = interp.stack_mut();
        st.create_list(1).unwrap();
        st.push_wordref(3).unwrap();
        st.set_item(1, 0).unwrap();
        let v = st.get(-1).unwrap();
        st.pop(1).unwrap();
        interp.push_frame().unwrap();
        interp.eval_value(v).unwrap();
        assert_eq!(interp.stack().values(), &[Value::Bool(false)]);
    }

    #[test]
    fn test_eval_value_rejects_non_lists() {
        let mut interp = Interp::new();
        assert_eq!(
            interp.eval_value(Value::Int(1)),
            Err(Error::EvalNeedsList)
        );
    }
}
