//! Stream handles threaded through command runners.
//!
//! A runner receives an [`Io`] triple. Each handle knows three things: how
//! to serve in-process reads/writes, how to turn itself into a
//! [`Stdio`] for a spawned child, and whether it counts as *redirected*
//! (anything other than the inherited standard stream). Pipeline
//! membership, redirection binding, and the cant-pipe policy all key off
//! that last bit.

use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::task::Tasks;

/// Where a command reads from.
pub enum Input {
    /// The inherited standard input.
    Stdin,
    /// A source opened by the redirection binder.
    File(Arc<File>),
    /// The read end of an OS pipe (pipeline plumbing, here-documents).
    Pipe(os_pipe::PipeReader),
    /// An in-memory source. The cursor is shared so that sequential
    /// consumers see one stream, the way two pipeline stages sharing a
    /// file descriptor would.
    Bytes(Arc<Mutex<Cursor<Vec<u8>>>>),
}

impl Input {
    /// An in-memory input, mostly for scripts and tests.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Input::Bytes(Arc::new(Mutex::new(Cursor::new(data.into()))))
    }

    pub fn is_redirected(&self) -> bool {
        !matches!(self, Input::Stdin)
    }

    pub fn try_clone(&self) -> io::Result<Input> {
        Ok(match self {
            Input::Stdin => Input::Stdin,
            Input::File(f) => Input::File(f.clone()),
            Input::Pipe(p) => Input::Pipe(p.try_clone()?),
            Input::Bytes(b) => Input::Bytes(b.clone()),
        })
    }

    /// Consume the handle into something a child process can inherit.
    ///
    /// In-memory sources have no file descriptor; a pump thread copies
    /// them through a fresh pipe, registered with the task group.
    pub fn into_stdio(self, tasks: &Tasks) -> io::Result<Stdio> {
        Ok(match self {
            Input::Stdin => Stdio::inherit(),
            Input::File(f) => Stdio::from(f.try_clone()?),
            Input::Pipe(p) => Stdio::from(p),
            Input::Bytes(b) => {
                let (reader, mut writer) = os_pipe::pipe()?;
                tasks.spawn(move || {
                    let mut cursor = b.lock().unwrap();
                    let _ = io::copy(&mut *cursor, &mut writer);
                });
                Stdio::from(reader)
            }
        })
    }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Input::Stdin => io::stdin().lock().read(buf),
            Input::File(f) => (&**f).read(buf),
            Input::Pipe(p) => p.read(buf),
            Input::Bytes(b) => b.lock().unwrap().read(buf),
        }
    }
}

/// Where a command writes to.
pub enum Output {
    /// The inherited standard output.
    Stdout,
    /// The inherited standard error.
    Stderr,
    /// A sink opened by the redirection binder.
    File(Arc<File>),
    /// A sink that also copies every write to the inherited stdout.
    Tee(Arc<File>),
    /// The write end of an OS pipe.
    Pipe(os_pipe::PipeWriter),
    /// An in-memory sink that accumulates everything written.
    Capture(Arc<Mutex<Vec<u8>>>),
}

impl Output {
    /// An in-memory sink plus the shared buffer to inspect afterwards.
    pub fn capture() -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        (Output::Capture(buf.clone()), buf)
    }

    pub fn is_redirected(&self) -> bool {
        !matches!(self, Output::Stdout | Output::Stderr)
    }

    pub fn try_clone(&self) -> io::Result<Output> {
        Ok(match self {
            Output::Stdout => Output::Stdout,
            Output::Stderr => Output::Stderr,
            Output::File(f) => Output::File(f.clone()),
            Output::Tee(f) => Output::Tee(f.clone()),
            Output::Pipe(p) => Output::Pipe(p.try_clone()?),
            Output::Capture(b) => Output::Capture(b.clone()),
        })
    }

    /// Consume the handle into something a child process can inherit.
    pub fn into_stdio(self, tasks: &Tasks) -> io::Result<Stdio> {
        Ok(match self {
            Output::Stdout | Output::Stderr => Stdio::inherit(),
            Output::File(f) => Stdio::from(f.try_clone()?),
            Output::Pipe(p) => Stdio::from(p),
            Output::Tee(f) => {
                let (mut reader, writer) = os_pipe::pipe()?;
                tasks.spawn(move || {
                    let mut chunk = [0u8; 8192];
                    loop {
                        match reader.read(&mut chunk) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                let _ = (&*f).write_all(&chunk[..n]);
                                let _ = io::stdout().write_all(&chunk[..n]);
                            }
                        }
                    }
                });
                Stdio::from(writer)
            }
            Output::Capture(b) => {
                let (mut reader, writer) = os_pipe::pipe()?;
                tasks.spawn(move || {
                    let mut chunk = [0u8; 8192];
                    loop {
                        match reader.read(&mut chunk) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => b.lock().unwrap().extend_from_slice(&chunk[..n]),
                        }
                    }
                });
                Stdio::from(writer)
            }
        })
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout => io::stdout().lock().write(buf),
            Output::Stderr => io::stderr().lock().write(buf),
            Output::File(f) => (&**f).write(buf),
            Output::Tee(f) => {
                (&**f).write_all(buf)?;
                io::stdout().lock().write_all(buf)?;
                Ok(buf.len())
            }
            Output::Pipe(p) => p.write(buf),
            Output::Capture(b) => {
                b.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout => io::stdout().lock().flush(),
            Output::Stderr => io::stderr().lock().flush(),
            Output::File(f) | Output::Tee(f) => (&**f).flush(),
            Output::Pipe(p) => p.flush(),
            Output::Capture(_) => Ok(()),
        }
    }
}

/// The stream triple handed to every runner.
pub struct Io {
    pub stdin: Input,
    pub stdout: Output,
    pub stderr: Output,
}

impl Io {
    /// The inherited standard streams.
    pub fn inherit() -> Self {
        Io {
            stdin: Input::Stdin,
            stdout: Output::Stdout,
            stderr: Output::Stderr,
        }
    }

    /// True when any of the three streams is not the inherited one.
    pub fn is_redirected(&self) -> bool {
        self.stdin.is_redirected()
            || self.stdout.is_redirected()
            || self.stderr.is_redirected()
    }

    pub fn try_clone(&self) -> io::Result<Io> {
        Ok(Io {
            stdin: self.stdin.try_clone()?,
            stdout: self.stdout.try_clone()?,
            stderr: self.stderr.try_clone()?,
        })
    }
}

/// Something the pipeline must release once its last stage has finished.
pub trait Close: Send {
    fn close(&mut self) -> io::Result<()>;
}

/// The closer list accumulated while a pipeline is constructed and run.
///
/// Exactly one closer is pushed per opened redirection resource; the list
/// drains in LIFO order after the composed pipeline returns. The handle is
/// shared between the stage runners (which push) and the composed pipeline
/// (which drains).
#[derive(Clone, Default)]
pub struct Closers {
    list: Arc<Mutex<Vec<Box<dyn Close>>>>,
}

impl Closers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, closer: impl Close + 'static) {
        self.list.lock().unwrap().push(Box::new(closer));
    }

    pub fn len(&self) -> usize {
        self.list.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close everything, most recently opened first.
    pub fn drain(&self) {
        loop {
            let closer = self.list.lock().unwrap().pop();
            match closer {
                Some(mut c) => {
                    if let Err(err) = c.close() {
                        log::warn!("close: {err}");
                    }
                }
                None => return,
            }
        }
    }
}

/// Releases the pipeline's reference to an opened file.
pub(crate) struct FileCloser(pub Option<Arc<File>>);

impl Close for FileCloser {
    fn close(&mut self) -> io::Result<()> {
        self.0.take();
        Ok(())
    }
}

/// Joins a background writer (a here-document feeder) before the pipeline
/// finishes, so a fast consumer cannot observe a half-written stream.
pub(crate) struct JoinCloser(pub Option<JoinHandle<()>>);

impl Close for JoinCloser {
    fn close(&mut self) -> io::Result<()> {
        if let Some(handle) = self.0.take() {
            handle
                .join()
                .map_err(|_| io::Error::other("writer thread panicked"))?;
        }
        Ok(())
    }
}
