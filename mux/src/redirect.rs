//! Redirection binding.
//!
//! Just before a command forks, its argv is scanned for redirection
//! markers. Each opened resource contributes exactly one entry to the
//! pipeline's closer list; the cleaned argv is what the program actually
//! sees. Binding is skipped entirely for a stream that is already
//! redirected — a mid-pipeline stage keeps its pipe, and the marker words
//! stay in the argv.
//!
//! Stdin markers in precedence order: `<FILE` opens a source, `<<LABEL`
//! and `<<-LABEL` start a here-document fed line by line from the
//! interactive source on a background thread. The `<<-` form strips
//! leading spaces and tabs from each line (including the terminating
//! label) before comparing and writing.
//!
//! Stdout markers in precedence order: `>` truncates, `>>` appends,
//! `>>>` truncates and tees to the inherited stdout, `>>>>` appends and
//! tees. Only the winning marker's target is opened.

use std::io::Write;
use std::sync::Arc;
use std::thread;

use crate::catline::CatlineRef;
use crate::parms;
use crate::stream::{Closers, FileCloser, Input, JoinCloser, Output};
use crate::url;

const STDIN_MARKERS: &[&str] = &["<", "<<", "<<-"];
const STDOUT_MARKERS: &[&str] = &[">", ">>", ">>>", ">>>>"];

/// Extract stdin redirections from `args`.
///
/// Returns the cleaned argv and the replacement input, if any marker with
/// a target was present.
pub(crate) fn bind_stdin(
    catline: &CatlineRef,
    args: Vec<String>,
    closers: &Closers,
) -> anyhow::Result<(Vec<String>, Option<Input>)> {
    let (parms, rest) = parms::extract(args, STDIN_MARKERS);

    if let Some(target) = parms.by_name("<").filter(|t| !t.is_empty()) {
        let source = Arc::new(url::open(target)?);
        closers.push(FileCloser(Some(source.clone())));
        return Ok((rest, Some(Input::File(source))));
    }

    let (label, trim) = match parms.by_name("<<").filter(|l| !l.is_empty()) {
        Some(label) => (label, false),
        None => match parms.by_name("<<-").filter(|l| !l.is_empty()) {
            Some(label) => (label, true),
            None => return Ok((rest, None)),
        },
    };

    let (reader, writer) = os_pipe::pipe()?;
    let catline = catline.clone();
    let label = label.to_string();
    let handle = thread::spawn(move || {
        let mut writer = writer;
        let prompt = format!("<<{label} ");
        loop {
            let line = match catline.lock().unwrap().read_line(&prompt) {
                Ok(Some(line)) => line,
                _ => break,
            };
            let line = if trim {
                line.trim_start_matches([' ', '\t']).to_string()
            } else {
                line
            };
            if line == label {
                break;
            }
            if writeln!(writer, "{line}").is_err() {
                break;
            }
        }
    });
    closers.push(JoinCloser(Some(handle)));
    Ok((rest, Some(Input::Pipe(reader))))
}

/// Extract stdout redirections from `args`.
pub(crate) fn bind_stdout(
    args: Vec<String>,
    closers: &Closers,
) -> anyhow::Result<(Vec<String>, Option<Output>)> {
    let (parms, rest) = parms::extract(args, STDOUT_MARKERS);

    for (marker, tee) in [(">", false), (">>", false), (">>>", true), (">>>>", true)] {
        let Some(target) = parms.by_name(marker).filter(|t| !t.is_empty()) else {
            continue;
        };
        let sink = Arc::new(if marker == ">" || marker == ">>>" {
            url::create(target)?
        } else {
            url::append(target)?
        });
        closers.push(FileCloser(Some(sink.clone())));
        let output = if tee {
            Output::Tee(sink)
        } else {
            Output::File(sink)
        };
        return Ok((rest, Some(output)));
    }
    Ok((rest, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catline::{catline, Lines, Null};
    use std::io::Read;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn stdin_file_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in");
        std::fs::write(&path, "payload").unwrap();

        let closers = Closers::new();
        let args = argv(&["cat", &format!("<{}", path.display())]);
        let (rest, input) = bind_stdin(&catline(Null), args, &closers).unwrap();
        assert_eq!(rest, argv(&["cat"]));
        assert_eq!(closers.len(), 1);

        let mut s = String::new();
        input.unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "payload");
        closers.drain();
    }

    #[test]
    fn missing_stdin_source_propagates_the_error() {
        let closers = Closers::new();
        let args = argv(&["cat", "<", "/no/such/file"]);
        assert!(bind_stdin(&catline(Null), args, &closers).is_err());
        assert!(closers.is_empty());
    }

    #[test]
    fn heredoc_stops_at_the_label() {
        let closers = Closers::new();
        let src = catline(Lines::new(["hello", "EOF", "after"]));
        let (rest, input) = bind_stdin(&src, argv(&["cat", "<<EOF"]), &closers).unwrap();
        assert_eq!(rest, argv(&["cat"]));

        let mut s = String::new();
        input.unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "hello\n");
        assert_eq!(closers.len(), 1);
        closers.drain();
    }

    #[test]
    fn heredoc_dash_trims_leading_blanks_and_tabs() {
        let closers = Closers::new();
        let src = catline(Lines::new(["\thello", "\tEND"]));
        let (_, input) = bind_stdin(&src, argv(&["cat", "<<-END"]), &closers).unwrap();

        let mut s = String::new();
        input.unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "hello\n");
        closers.drain();
    }

    #[test]
    fn heredoc_without_trim_keeps_indentation() {
        let closers = Closers::new();
        let src = catline(Lines::new(["  keep", "EOF"]));
        let (_, input) = bind_stdin(&src, argv(&["cat", "<<EOF"]), &closers).unwrap();

        let mut s = String::new();
        input.unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "  keep\n");
        closers.drain();
    }

    #[test]
    fn stdout_truncate_beats_tee_and_opens_only_one_target() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("x");
        let second = dir.path().join("y");

        let closers = Closers::new();
        let args = argv(&[
            "somecmd",
            &format!(">{}", first.display()),
            &format!(">>>{}", second.display()),
        ]);
        let (rest, output) = bind_stdout(args, &closers).unwrap();
        assert_eq!(rest, argv(&["somecmd"]));
        assert_eq!(closers.len(), 1);
        assert!(matches!(output, Some(Output::File(_))));
        assert!(first.exists());
        assert!(!second.exists());
        closers.drain();
    }

    #[test]
    fn stdout_append_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        std::fs::write(&path, "old\n").unwrap();

        let closers = Closers::new();
        let args = argv(&["cmd", ">>", path.to_str().unwrap()]);
        let (_, output) = bind_stdout(args, &closers).unwrap();
        let mut out = output.unwrap();
        out.write_all(b"new\n").unwrap();
        drop(out);
        closers.drain();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn tee_marker_selects_a_tee_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        let closers = Closers::new();
        let args = argv(&["cmd", &format!(">>>>{}", path.display())]);
        let (_, output) = bind_stdout(args, &closers).unwrap();
        assert!(matches!(output, Some(Output::Tee(_))));
        closers.drain();
    }

    #[test]
    fn no_markers_no_change() {
        let closers = Closers::new();
        let args = argv(&["echo", "a>b?no", "--", "x"]);
        // `a>b?no` is not a marker: markers match only at the start
        let (rest, output) = bind_stdout(args.clone(), &closers).unwrap();
        assert_eq!(rest, args);
        assert!(output.is_none());
        assert!(closers.is_empty());
    }
}
