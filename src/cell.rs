//! Compiled chunk cells.
//!
//! A compiled chunk is one flat array of fixed-size cells describing a tree
//! of lists and literals. Cell 0 is the root list reference; a list header
//! cell carries a child count and the index of its first child; every other
//! child is an index cell pointing forward at a data cell. Because every
//! cell is a 4-byte POD, a chunk can be written straight into caller-owned
//! storage and handed back for execution unchanged.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use static_assertions::{assert_eq_align, assert_eq_size};

/// Largest chunk `load` can produce, in cells (64 KiB of cell storage).
pub const CHUNK_CELLS: usize = 0x10000 / core::mem::size_of::<Cell>();

/// Tag byte of an index cell, and of values at runtime.
///
/// `DynList` and `True` never come out of the parser; they exist for values
/// that live in the list arena and on the operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    List = 0,
    Word = 1,
    Int = 2,
    Float = 3,
    False = 4,
    WordRef = 5,
    Local = 6,
    LocalSet = 7,
    DynList = 16,
    True = 20,
}

/// One chunk cell. The same 32 bits are read differently depending on the
/// cell's role: index cells keep a tag in the low half and an offset in the
/// high half, list headers and atoms keep a length/offset pair, and data
/// cells hold a whole integer, float, word id, or four local ids.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Cell(u32);

assert_eq_size!(Cell, u32);
assert_eq_align!(Cell, u32);

impl Cell {
    fn pack(lo: u16, hi: u16) -> Cell {
        Cell(lo as u32 | (hi as u32) << 16)
    }

    pub fn index(tag: Tag, offset: u16) -> Cell {
        Cell::pack(u8::from(tag) as u16, offset)
    }

    pub fn list(len: u16, offset: u16) -> Cell {
        Cell::pack(len, offset)
    }

    pub fn atom(len: u16, offset: u16) -> Cell {
        Cell::pack(len, offset)
    }

    pub fn int(v: i32) -> Cell {
        Cell(v as u32)
    }

    pub fn float(v: f32) -> Cell {
        Cell(v.to_bits())
    }

    pub fn word(id: u16) -> Cell {
        Cell(id as u32)
    }

    pub fn locals(ids: [u8; 4]) -> Cell {
        Cell(u32::from_le_bytes(ids))
    }

    /// Tag of an index cell; `None` for a byte outside the tag set.
    pub fn tag(self) -> Option<Tag> {
        Tag::try_from((self.0 & 0xff) as u8).ok()
    }

    /// Forward offset of an index, list header, or atom cell.
    pub fn offset(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Child count of a list header, or byte length of an atom.
    pub fn len(self) -> u16 {
        self.0 as u16
    }

    pub fn as_int(self) -> i32 {
        self.0 as i32
    }

    pub fn as_float(self) -> f32 {
        f32::from_bits(self.0)
    }

    pub fn as_word(self) -> u16 {
        self.0 as u16
    }

    pub fn as_locals(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        let c = Cell::index(Tag::WordRef, 1234);
        assert_eq!(c.tag(), Some(Tag::WordRef));
        assert_eq!(c.offset(), 1234);
    }

    #[test]
    fn test_list_and_atom_views() {
        let c = Cell::list(7, 42);
        assert_eq!(c.len(), 7);
        assert_eq!(c.offset(), 42);
        let a = Cell::atom(3, 100);
        assert_eq!(a.len(), 3);
        assert_eq!(a.offset(), 100);
    }

    #[test]
    fn test_payload_roundtrip() {
        assert_eq!(Cell::int(-5).as_int(), -5);
        assert_eq!(Cell::float(1.5).as_float(), 1.5);
        assert_eq!(Cell::word(4095).as_word(), 4095);
        assert_eq!(Cell::locals([1, 2, 255, 255]).as_locals(), [1, 2, 255, 255]);
    }

    #[test]
    fn test_unknown_tag_byte() {
        let c = Cell::index(Tag::List, 0);
        assert_eq!(c.tag(), Some(Tag::List));
        assert_eq!(Cell(0xff).tag(), None);
    }
}
