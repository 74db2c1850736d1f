//! The interpreter aggregate.
//!
//! An [`Interp`] owns everything one interpreter instance needs: the operand
//! stack and list arena, the stackframes that hold locals, the word and
//! local tables, and the program slots that compiled chunks are bound to.
//! Instances are independent of each other; nothing here is process-global.
//!
//! The host-facing lifecycle is load → run: [`Interp::load`] compiles one
//! source buffer into caller-owned cells and resolves every identifier,
//! [`Interp::run`] binds the chunk to a program slot (sticky on first use)
//! and executes its top-level list. Any error resets the operand stack and
//! the frame stack before it is returned; tables, program bindings and the
//! persistent list tail survive.

use crate::cell::{Cell, Tag};
use crate::error::Error;
use crate::internals::builtin;
use crate::internals::parser;
use crate::internals::words::{Locals, NativeFn, Words, INVALID_LOCAL, MAX_LOCALS};
use crate::stack::{LocalId, Stack, Value, WordId};

pub const MAX_PROGS: usize = 4096;
pub const MAX_FRAMES: usize = 32;
pub const FRAME_SLOTS: usize = 32;

const NO_SLOT: u8 = FRAME_SLOTS as u8;

/// One locals environment, opened by `run` and `eval` (not by `upeval`).
struct Frame {
    len: u8,
    /// Highest local id bound in this frame, plus one.
    maxid: u8,
    map: [u8; MAX_LOCALS],
    slots: [Value; FRAME_SLOTS],
}

impl Frame {
    fn new() -> Frame {
        Frame {
            len: 0,
            maxid: 0,
            map: [NO_SLOT; MAX_LOCALS],
            slots: [Value::Bool(false); FRAME_SLOTS],
        }
    }

    fn bind(&mut self, id: LocalId, v: Value) -> Result<(), Error> {
        if id >= self.maxid {
            self.maxid = id + 1;
        }
        let slot = match self.map[id as usize] {
            NO_SLOT => {
                if self.len as usize >= FRAME_SLOTS {
                    return Err(Error::TooManyLocals);
                }
                let slot = self.len;
                self.len += 1;
                self.map[id as usize] = slot;
                slot
            }
            slot => slot,
        };
        self.slots[slot as usize] = v;
        Ok(())
    }

    fn get(&self, id: LocalId) -> Result<Value, Error> {
        if id >= self.maxid {
            return Err(Error::NoLocal);
        }
        match self.map[id as usize] {
            NO_SLOT => Err(Error::NoLocal),
            slot => Ok(self.slots[slot as usize]),
        }
    }
}

pub struct Interp {
    pub(crate) stack: Stack,
    frames: Vec<Frame>,
    pub(crate) words: Words,
    pub(crate) locals: Locals,
    progs: Box<[Option<Box<[Cell]>>]>,
}

impl Default for Interp {
    fn default() -> Interp {
        Interp::new()
    }
}

impl Interp {
    pub fn new() -> Interp {
        let mut interp = Interp {
            stack: Stack::new(),
            frames: Vec::new(),
            words: Words::new(),
            locals: Locals::new(),
            progs: (0..MAX_PROGS).map(|_| None).collect(),
        };
        builtin::install(&mut interp);
        interp
    }

    /// Bind `name` to a native word. Rebinding any bound name is an error.
    pub fn register(&mut self, name: &str, func: NativeFn) -> Result<(), Error> {
        self.words.register(name, func).map(|_| ())
    }

    /// Compile one source buffer into `output` and resolve every word atom.
    /// Returns the number of cells written; the compiled chunk occupies
    /// `output[..n]` and can be copied anywhere before being run.
    pub fn load(&mut self, source: &[u8], output: &mut [Cell]) -> Result<usize, Error> {
        let r = self.load_inner(source, output);
        if r.is_err() {
            self.reset();
        }
        r
    }

    fn load_inner(&mut self, source: &[u8], output: &mut [Cell]) -> Result<usize, Error> {
        let cells = parser::parse(source, output)?;
        self.resolve_cell(&mut output[..cells], 0, source)?;
        Ok(cells)
    }

    /// Execute the chunk bound to program slot `prog`. The first run with a
    /// chunk binds it to the slot; later runs may pass `None` to rerun it.
    /// Rebinding a live slot with a different chunk is refused.
    pub fn run(&mut self, prog: usize, chunk: Option<&[Cell]>) -> Result<(), Error> {
        let r = self.run_inner(prog, chunk);
        if r.is_err() {
            self.reset();
        }
        r
    }

    fn run_inner(&mut self, prog: usize, chunk: Option<&[Cell]>) -> Result<(), Error> {
        if prog >= MAX_PROGS {
            return Err(Error::BadProgId(prog));
        }
        match chunk {
            Some(cells) => {
                if let Some(bound) = &self.progs[prog] {
                    if bound[..] != *cells {
                        return Err(Error::ProgMismatch);
                    }
                } else {
                    self.progs[prog] = Some(cells.to_vec().into_boxed_slice());
                }
            }
            None => {
                if self.progs[prog].is_none() {
                    return Err(Error::NoProg);
                }
            }
        }
        self.stack.reset_transient();
        self.frames.clear();
        self.push_frame()?;
        let root = self.chunk_cell(prog, 0)?;
        if root.tag() != Some(Tag::List) {
            return Err(Error::InvalidChunk);
        }
        let hdr = self.chunk_cell(prog, root.offset() as usize)?;
        self.exec_static(prog as u16, hdr.offset(), hdr.len())?;
        self.pop_frame();
        Ok(())
    }

    fn reset(&mut self) {
        self.stack.set_top(0);
        self.frames.clear();
    }

    pub(crate) fn chunk_cell(&self, prog: usize, index: usize) -> Result<Cell, Error> {
        let chunk = self
            .progs
            .get(prog)
            .and_then(|p| p.as_deref())
            .ok_or(Error::NoProg)?;
        chunk.get(index).copied().ok_or(Error::InvalidChunk)
    }

    pub(crate) fn push_frame(&mut self) -> Result<(), Error> {
        if self.frames.len() >= MAX_FRAMES {
            return Err(Error::FrameOverflow);
        }
        self.frames.push(Frame::new());
        Ok(())
    }

    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// The localset action: bind the top `k` values to `ids`, popped so the
    /// leftmost id receives the deepest of the consumed values.
    pub(crate) fn set_locals(&mut self, ids: [u8; 4]) -> Result<(), Error> {
        let k = ids.iter().position(|&id| id == INVALID_LOCAL).unwrap_or(4);
        self.stack.need(k)?;
        let mut taken = [Value::Bool(false); 4];
        for (i, slot) in taken.iter_mut().enumerate().take(k) {
            *slot = self.stack.get(i as i32 - k as i32)?;
        }
        self.stack.pop(k)?;
        let frame = self.frames.last_mut().ok_or(Error::NoFrame)?;
        for i in 0..k {
            frame.bind(ids[i], taken[i])?;
        }
        Ok(())
    }

    pub(crate) fn get_local(&mut self, id: LocalId) -> Result<(), Error> {
        let v = self.frames.last().ok_or(Error::NoFrame)?.get(id)?;
        self.stack.push(v)
    }

    fn resolve_cell(
        &mut self,
        chunk: &mut [Cell],
        index: usize,
        source: &[u8],
    ) -> Result<(), Error> {
        let cell = *chunk.get(index).ok_or(Error::InvalidChunk)?;
        let data_at = cell.offset() as usize;
        match cell.tag() {
            Some(Tag::List) => {
                let hdr = *chunk.get(data_at).ok_or(Error::InvalidChunk)?;
                let first = hdr.offset() as usize;
                for i in 0..hdr.len() as usize {
                    self.resolve_cell(chunk, first + i, source)?;
                }
                Ok(())
            }
            Some(Tag::Word) => {
                let data = *chunk.get(data_at).ok_or(Error::InvalidChunk)?;
                let start = data.offset() as usize;
                let text = source
                    .get(start..start + data.len() as usize)
                    .ok_or(Error::InvalidChunk)?;
                let (tag, payload) = self.resolve_atom(text)?;
                chunk[index] = Cell::index(tag, data_at as u16);
                chunk[data_at] = payload;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Rewrite one word atom: a `'` prefix makes a wordref, `$` a local
    /// read, `(...)` a localset tuple; anything else is a plain word. The
    /// prefixes only apply to atoms of two or more bytes, so `'` and `$`
    /// alone are ordinary words.
    fn resolve_atom(&mut self, text: &[u8]) -> Result<(Tag, Cell), Error> {
        if text.len() >= 2 {
            match text[0] {
                b'\'' => {
                    let id = self.words.intern(&text[1..])?;
                    return Ok((Tag::WordRef, Cell::word(id)));
                }
                b'$' => {
                    let id = self.locals.intern(&text[1..])?;
                    return Ok((Tag::Local, Cell::word(id as u16)));
                }
                b'(' => {
                    if text.len() == 2 {
                        return Err(Error::EmptyTuple);
                    }
                    let ids = self.locals.parse_tuple(&text[1..text.len() - 1])?;
                    return Ok((Tag::LocalSet, Cell::locals(ids)));
                }
                _ => {}
            }
        }
        let id = self.words.intern(text)?;
        Ok((Tag::Word, Cell::word(id)))
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }

    pub fn word_name(&self, id: WordId) -> Option<String> {
        self.words.name(id)
    }

    pub fn local_name(&self, id: LocalId) -> Option<String> {
        self.locals.name(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CHUNK_CELLS;
    use crate::error::ParseError;
    use crate::stack::{List, StaticList};

    fn load(interp: &mut Interp, src: &str) -> Vec<Cell> {
        let mut out = vec![Cell::default(); CHUNK_CELLS];
        let n = interp.load(src.as_bytes(), &mut out).unwrap();
        out.truncate(n);
        out
    }

    fn eval(interp: &mut Interp, prog: usize, src: &str) {
        let chunk = load(interp, src);
        interp.run(prog, Some(&chunk)).unwrap();
    }

    fn try_eval(interp: &mut Interp, prog: usize, src: &str) -> Result<(), Error> {
        let mut out = vec![Cell::default(); CHUNK_CELLS];
        let n = interp.load(src.as_bytes(), &mut out)?;
        interp.run(prog, Some(&out[..n]))
    }

    fn stack_ints(interp: &Interp) -> Vec<i32> {
        interp
            .stack()
            .values()
            .iter()
            .map(|v| match v {
                Value::Int(i) => *i,
                v => panic!("expected ints on the stack, got {v:?}"),
            })
            .collect()
    }

    #[test]
    fn test_resolution_rewrites_every_atom() {
        let mut interp = Interp::new();
        let chunk = load(&mut interp, "1 2.5 'x $y (a b) word [nested]");
        let hdr = chunk[chunk[0].offset() as usize];
        let expect = [
            Tag::Int,
            Tag::Float,
            Tag::WordRef,
            Tag::Local,
            Tag::LocalSet,
            Tag::Word,
            Tag::List,
        ];
        for (i, want) in expect.iter().enumerate() {
            let cell = chunk[hdr.offset() as usize + i];
            assert_eq!(cell.tag(), Some(*want), "child {i}");
        }
    }

    #[test]
    fn test_resolution_interns_once() {
        let mut interp = Interp::new();
        let chunk = load(&mut interp, "dup dup");
        let hdr = chunk[chunk[0].offset() as usize];
        let a = chunk[chunk[hdr.offset() as usize].offset() as usize].as_word();
        let b = chunk[chunk[hdr.offset() as usize + 1].offset() as usize].as_word();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_tuple_is_an_error() {
        let mut interp = Interp::new();
        let mut out = vec![Cell::default(); CHUNK_CELLS];
        assert_eq!(
            interp.load(b"()", &mut out),
            Err(Error::EmptyTuple)
        );
    }

    #[test]
    fn test_run_leaves_results_and_no_frames() {
        let mut interp = Interp::new();
        eval(&mut interp, 0, "1 2");
        assert_eq!(stack_ints(&interp), vec![1, 2]);
        assert!(interp.frames.is_empty());
    }

    #[test]
    fn test_run_binds_slot_sticky() {
        let mut interp = Interp::new();
        let chunk = load(&mut interp, "1");
        interp.run(0, Some(&chunk)).unwrap();
        // Rerun without a chunk uses the bound one.
        interp.run(0, None).unwrap();
        assert_eq!(stack_ints(&interp), vec![1, 1]);
        // A different chunk cannot take over the slot.
        let other = load(&mut interp, "2");
        assert_eq!(interp.run(0, Some(&other)), Err(Error::ProgMismatch));
    }

    #[test]
    fn test_run_without_binding() {
        let mut interp = Interp::new();
        assert_eq!(interp.run(7, None), Err(Error::NoProg));
        assert_eq!(
            interp.run(MAX_PROGS, None),
            Err(Error::BadProgId(MAX_PROGS))
        );
    }

    #[test]
    fn test_error_resets_stack_and_frames() {
        let mut interp = Interp::new();
        let r = try_eval(&mut interp, 0, "1 2 3 undefined-word");
        assert!(matches!(r, Err(Error::UndefinedWord(_))));
        assert!(interp.stack().is_empty());
        assert!(interp.frames.is_empty());
    }

    #[test]
    fn test_locals_bind_and_read() {
        let mut interp = Interp::new();
        eval(&mut interp, 0, "1 2 (a b) $b $a");
        assert_eq!(stack_ints(&interp), vec![2, 1]);
    }

    #[test]
    fn test_localset_rebinds_existing_slot() {
        let mut interp = Interp::new();
        eval(&mut interp, 0, "1 (a) 2 (a) $a");
        assert_eq!(stack_ints(&interp), vec![2]);
    }

    #[test]
    fn test_unbound_local_is_an_error() {
        let mut interp = Interp::new();
        // `$a` interns the local, but this frame never bound it.
        let r = try_eval(&mut interp, 0, "0 (b) $a");
        assert_eq!(r, Err(Error::NoLocal));
    }

    #[test]
    fn test_eval_scopes_locals_upeval_does_not() {
        let mut interp = Interp::new();
        // A frame opened by eval hides its bindings from the caller...
        let r = try_eval(&mut interp, 0, "[5 (x)] eval $x");
        assert_eq!(r, Err(Error::NoLocal));
        // ...while upeval binds in the caller's frame.
        let mut interp = Interp::new();
        eval(&mut interp, 0, "[5 (x)] upeval $x");
        assert_eq!(stack_ints(&interp), vec![5]);
    }

    #[test]
    fn test_frame_local_slot_cap() {
        let mut interp = Interp::new();
        let src: String = (0..FRAME_SLOTS + 1)
            .map(|i| format!("{i} (v{i}) "))
            .collect();
        let r = try_eval(&mut interp, 0, &src);
        assert_eq!(r, Err(Error::TooManyLocals));
    }

    #[test]
    fn test_frame_depth_cap() {
        let mut interp = Interp::new();
        // Each eval opens one frame on top of the frame run itself opened,
        // so 31 nested evals fit and 32 do not.
        let nest = |n: usize| {
            let mut src = String::from("1");
            for _ in 0..n {
                src = format!("[{src}] eval");
            }
            src
        };
        assert!(try_eval(&mut interp, 0, &nest(31)).is_ok());
        assert_eq!(try_eval(&mut interp, 1, &nest(32)), Err(Error::FrameOverflow));
    }

    #[test]
    fn test_static_list_value_points_into_chunk() {
        let mut interp = Interp::new();
        eval(&mut interp, 3, "[1 2]");
        match interp.stack().get(-1).unwrap() {
            Value::List(List::Static(StaticList { prog, len, .. })) => {
                assert_eq!(prog, 3);
                assert_eq!(len, 2);
            }
            v => panic!("expected a static list, got {v:?}"),
        }
    }

    #[test]
    fn test_load_error_resets_stack() {
        let mut interp = Interp::new();
        interp.stack_mut().push_int(9).unwrap();
        let mut out = vec![Cell::default(); CHUNK_CELLS];
        assert_eq!(
            interp.load(b"[", &mut out),
            Err(Error::Parse(ParseError::UnterminatedList))
        );
        assert!(interp.stack().is_empty());
    }

    #[test]
    fn test_rerun_is_pure() {
        let mut interp = Interp::new();
        eval(&mut interp, 0, "1 2 + 4 *");
        let first = stack_ints(&interp);
        interp.stack_mut().pop(first.len()).unwrap();
        interp.run(0, None).unwrap();
        assert_eq!(stack_ints(&interp), first);
    }
}
