use anyhow::{anyhow, Result};
use mux::{Blocker, Command, Io, Kind, List, Mux, Runner, Term};

/// `function NAME` collects the cmdlines that follow — prompting for more
/// input if the list runs out — until a line consisting of the single
/// word `end`, and stores them under NAME. Invoking NAME later runs the
/// stored body with the caller's streams.
pub struct Function;

impl Command for Function {
    fn name(&self) -> &'static str {
        "function"
    }

    fn usage(&self) -> &'static str {
        "function NAME ... end"
    }

    fn apropos(&self) -> &'static str {
        "define a named command sequence"
    }

    fn man(&self) -> &'static str {
        "Define a function:

	function greet
	echo hello
	end

Afterwards `greet` evaluates the stored body. Definitions live for the
session; a later definition with the same name replaces the earlier one."
    }

    fn kind(&self) -> Kind {
        Kind::DONT_FORK
    }

    fn main(&self, _mux: &mut Mux, _args: &[String], _io: &mut Io) -> Result<()> {
        // reached only when dispatched outside list evaluation
        Err(anyhow!("function: missing body (see `man function`)"))
    }

    fn as_blocker(&self) -> Option<&dyn Blocker> {
        Some(self)
    }
}

impl Blocker for Function {
    fn block(&self, mux: &mut Mux, mut ls: List) -> Result<(List, Term, Runner)> {
        let head = ls
            .cmds
            .pop_front()
            .ok_or_else(|| anyhow!("function: empty list"))?;
        let (_env, argv) = head.slice(&|k| mux.env.get_var(k));
        let name = argv
            .get(1)
            .cloned()
            .ok_or_else(|| anyhow!("function: missing name"))?;

        let mut body = List::default();
        let mut definition = Vec::new();
        let term;
        'collect: loop {
            while let Some(cl) = ls.cmds.pop_front() {
                if cl.words.len() == 1 && cl.words[0].to_string() == "end" {
                    term = cl.term;
                    break 'collect;
                }
                definition.push(cl.to_string());
                body.cmds.push_back(cl);
            }
            let more = mux::parse("function>>", &mux.catline.clone())?
                .ok_or_else(|| anyhow!("function {name}: missing `end`"))?;
            ls.cmds.extend(more.cmds);
        }

        mux.functions.insert(
            name.clone(),
            mux::Function {
                name,
                definition,
                body,
            },
        );
        let runner: Runner = Box::new(|mux, _io| {
            mux.status = None;
            Ok(())
        });
        Ok((ls, term, runner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmds::echo::Echo;
    use mux::catline::Lines;
    use mux::{lexer, parser, Input, Output};
    use std::sync::{Arc, Mutex};

    fn testmux() -> Mux {
        let mut mux = Mux::new("testmux");
        mux.in_test = true;
        mux.registry.register(Arc::new(Echo));
        mux.registry.register(Arc::new(Function));
        mux
    }

    fn run(mux: &mut Mux, line: &str) -> (String, Result<()>) {
        let mut ls = parser::build(lexer::scan(line).unwrap()).unwrap();
        let (stdout, buf) = Output::capture();
        let (stderr, _) = Output::capture();
        let io = Io {
            stdin: Input::bytes(""),
            stdout,
            stderr,
        };
        let mut result = Ok(());
        while !ls.cmds.is_empty() {
            let (rest, _t, mut listfun) = match mux.process_list(ls) {
                Ok(parts) => parts,
                Err(err) => return (String::new(), Err(err)),
            };
            ls = rest;
            let r = listfun(mux, io.try_clone().unwrap());
            if result.is_ok() {
                result = r;
            }
        }
        let bytes = buf.lock().unwrap().clone();
        (String::from_utf8(bytes).unwrap(), result)
    }

    #[test]
    fn one_line_definition_and_invocation() {
        let mut mux = testmux();
        let (_, result) = run(&mut mux, "function greet ; echo hello ; end");
        result.unwrap();
        assert!(mux.functions.contains_key("greet"));

        let (out, result) = run(&mut mux, "greet");
        result.unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn multi_line_definition_reads_ahead() {
        let mut mux = testmux();
        let lines = Arc::new(Mutex::new(Lines::new(["echo deep", "end"])));
        mux.catline = lines.clone();

        let (_, result) = run(&mut mux, "function deep");
        result.unwrap();
        let f = mux.functions.get("deep").unwrap();
        assert_eq!(f.definition, vec!["echo deep"]);
        let prompts = lines.lock().unwrap().prompts.clone();
        assert!(prompts.iter().all(|p| p == "function>>"));

        let (out, result) = run(&mut mux, "deep");
        result.unwrap();
        assert_eq!(out, "deep\n");
    }

    #[test]
    fn missing_end_is_an_error() {
        let mut mux = testmux();
        let (_, result) = run(&mut mux, "function broken ; echo x");
        assert!(result.unwrap_err().to_string().contains("missing `end`"));
    }

    #[test]
    fn redefinition_replaces() {
        let mut mux = testmux();
        run(&mut mux, "function f ; echo one ; end").1.unwrap();
        run(&mut mux, "function f ; echo two ; end").1.unwrap();
        let (out, _) = run(&mut mux, "f");
        assert_eq!(out, "two\n");
    }
}
