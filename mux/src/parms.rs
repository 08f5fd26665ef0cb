//! Valued-parameter extraction for redirection markers.
//!
//! Redirection markers travel through the parser as ordinary words; the
//! binder pulls them out of an argv just before a command runs. A marker's
//! value is either attached (`>FILE`) or the following argument
//! (`> FILE`). Longer markers win, so `>>file` is an append, not an
//! output redirection to `>file`.

use std::collections::HashMap;

/// Parameters found by [`extract`], keyed by marker.
#[derive(Debug, Default)]
pub struct Parms {
    by_name: HashMap<&'static str, String>,
}

impl Parms {
    /// The first value seen for `name`, if any.
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(|s| s.as_str())
    }
}

/// Remove every occurrence of the given markers from `args`.
///
/// Only the first value per marker is kept; repeated markers are consumed
/// from the argv regardless.
pub fn extract(args: Vec<String>, names: &[&'static str]) -> (Parms, Vec<String>) {
    let mut by_len: Vec<&'static str> = names.to_vec();
    by_len.sort_by_key(|n| std::cmp::Reverse(n.len()));

    let mut parms = Parms::default();
    let mut rest = Vec::with_capacity(args.len());
    let mut args = args.into_iter();
    'args: while let Some(arg) = args.next() {
        for &name in &by_len {
            if arg == name {
                let value = args.next().unwrap_or_default();
                parms.by_name.entry(name).or_insert(value);
                continue 'args;
            }
            if let Some(value) = arg.strip_prefix(name) {
                if !value.is_empty() {
                    parms.by_name.entry(name).or_insert_with(|| value.to_string());
                    continue 'args;
                }
            }
        }
        rest.push(arg);
    }
    (parms, rest)
}
