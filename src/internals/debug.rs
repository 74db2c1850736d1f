//! Rendering helpers for hosts: compiled-chunk trees and stack contents.

use std::fmt::Write;

use crate::cell::{Cell, Tag};
use crate::internals::words::INVALID_LOCAL;
use crate::runtime::Interp;
use crate::stack::{List, Value};

/// Render a resolved chunk as an indented tree, one entry per line, with
/// word and local ids shown by their interned names.
pub fn render_chunk(interp: &Interp, chunk: &[Cell]) -> String {
    let mut out = String::new();
    render_cell(interp, chunk, 0, 0, &mut out);
    out
}

fn render_cell(interp: &Interp, chunk: &[Cell], index: usize, depth: usize, out: &mut String) {
    let _ = write!(out, "{:1$}", "", depth * 2);
    let Some(&cell) = chunk.get(index) else {
        let _ = writeln!(out, "<truncated>");
        return;
    };
    let Some(&data) = chunk.get(cell.offset() as usize) else {
        let _ = writeln!(out, "<truncated>");
        return;
    };
    match cell.tag() {
        Some(Tag::List) => {
            let _ = writeln!(out, "LIST ({})", data.len());
            for i in 0..data.len() as usize {
                render_cell(interp, chunk, data.offset() as usize + i, depth + 1, out);
            }
        }
        Some(Tag::Word) => {
            let name = interp.word_name(data.as_word()).unwrap_or_default();
            let _ = writeln!(out, "WORD {name}");
        }
        Some(Tag::WordRef) => {
            let name = interp.word_name(data.as_word()).unwrap_or_default();
            let _ = writeln!(out, "WORDREF '{name}");
        }
        Some(Tag::Local) => {
            let name = interp.local_name(data.as_word() as u8).unwrap_or_default();
            let _ = writeln!(out, "LOCAL ${name}");
        }
        Some(Tag::LocalSet) => {
            let names: Vec<String> = data
                .as_locals()
                .iter()
                .take_while(|&&id| id != INVALID_LOCAL)
                .map(|&id| interp.local_name(id).unwrap_or_default())
                .collect();
            let _ = writeln!(out, "LOCALSET ({})", names.join(" "));
        }
        Some(Tag::Int) => {
            let _ = writeln!(out, "INT {}", data.as_int());
        }
        Some(Tag::Float) => {
            let _ = writeln!(out, "FLOAT {}", data.as_float());
        }
        Some(Tag::True) => {
            let _ = writeln!(out, "TRUE");
        }
        Some(Tag::False) => {
            let _ = writeln!(out, "FALSE");
        }
        Some(Tag::DynList) | None => {
            let _ = writeln!(out, "<unknown>");
        }
    }
}

/// Render one value the way the interactive host prints it.
pub fn render_value(interp: &Interp, v: Value) -> String {
    match v {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::WordRef(id) => format!("'{}", interp.word_name(id).unwrap_or_default()),
        Value::List(List::Static(_)) => "[list]".to_string(),
        Value::List(List::Dyn(_)) => "[dynlist]".to_string(),
    }
}

/// Render the whole operand stack on one line, bottom first.
pub fn render_stack(interp: &Interp) -> String {
    let items: Vec<String> = interp
        .stack()
        .values()
        .iter()
        .map(|&v| render_value(interp, v))
        .collect();
    format!("[{}]", items.join(" "))
}
