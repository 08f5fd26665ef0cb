use std::io::{Read, Write};

use anyhow::Result;
use argh::FromArgs;
use mux::{Command, Io, Mux};

use super::parse;

#[derive(FromArgs)]
/// translate or delete characters read from standard input.
/// sets accept ranges like `a-z`.
struct Args {
    #[argh(switch, short = 'd')]
    /// delete characters in SET1 instead of translating.
    delete: bool,

    #[argh(positional)]
    /// characters to translate from (or delete with -d).
    set1: String,

    #[argh(positional)]
    /// characters to translate to; padded with its last character.
    set2: Option<String>,
}

/// Expand `a-z` style ranges into the byte sequence they cover.
fn expand_set(set: &str) -> Vec<u8> {
    let bytes = set.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if i + 2 < bytes.len() && bytes[i + 1] == b'-' && bytes[i] <= bytes[i + 2] {
            for b in bytes[i]..=bytes[i + 2] {
                out.push(b);
            }
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    out
}

fn translate(input: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut map: [u8; 256] = std::array::from_fn(|i| i as u8);
    for (i, b) in from.iter().enumerate() {
        // a short SET2 repeats its last character
        let target = to.get(i).or(to.last());
        if let Some(t) = target {
            map[*b as usize] = *t;
        }
    }
    input.iter().map(|b| map[*b as usize]).collect()
}

fn delete(input: &[u8], set: &[u8]) -> Vec<u8> {
    let mut drop = [false; 256];
    for b in set {
        drop[*b as usize] = true;
    }
    input
        .iter()
        .filter(|b| !drop[**b as usize])
        .copied()
        .collect()
}

pub struct Tr;

impl Command for Tr {
    fn name(&self) -> &'static str {
        "tr"
    }

    fn usage(&self) -> &'static str {
        "tr [-d] SET1 [SET2]"
    }

    fn apropos(&self) -> &'static str {
        "translate or delete characters"
    }

    fn main(&self, _mux: &mut Mux, args: &[String], io: &mut Io) -> Result<()> {
        let args: Args = parse("tr", args)?;
        let set1 = expand_set(&args.set1);

        let mut input = Vec::new();
        io.stdin.read_to_end(&mut input)?;

        let output = if args.delete {
            if args.set2.is_some() {
                anyhow::bail!("tr: -d takes a single set");
            }
            delete(&input, &set1)
        } else {
            let set2 = args
                .set2
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("tr: missing SET2"))?;
            translate(&input, &set1, &expand_set(set2))
        };
        io.stdout.write_all(&output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mux::{Input, Output};

    #[test]
    fn ranges_expand_inclusively() {
        assert_eq!(expand_set("a-e"), b"abcde".to_vec());
        assert_eq!(expand_set("a-z").len(), 26);
        assert_eq!(expand_set("x-"), b"x-".to_vec());
        assert_eq!(expand_set("abc"), b"abc".to_vec());
    }

    #[test]
    fn translate_maps_byte_for_byte() {
        let got = translate(b"hello", &expand_set("a-z"), &expand_set("A-Z"));
        assert_eq!(got, b"HELLO".to_vec());
    }

    #[test]
    fn short_set2_repeats_its_last_character() {
        let got = translate(b"abc", b"abc", b"x");
        assert_eq!(got, b"xxx".to_vec());
    }

    #[test]
    fn delete_removes_set_members() {
        assert_eq!(delete(b"h1e2l3lo", &expand_set("0-9")), b"hello".to_vec());
    }

    #[test]
    fn end_to_end_over_streams() {
        let mut mux = Mux::new("test");
        let (stdout, buf) = Output::capture();
        let (stderr, _) = Output::capture();
        let mut io = Io {
            stdin: Input::bytes("hello\n"),
            stdout,
            stderr,
        };
        let args = vec!["a-z".to_string(), "A-Z".to_string()];
        Tr.main(&mut mux, &args, &mut io).unwrap();
        assert_eq!(&*buf.lock().unwrap(), b"HELLO\n");
    }
}
