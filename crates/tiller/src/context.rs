//! Per-invocation state.
//!
//! A [`CommandContext`] is created fresh for every run and owned exclusively
//! by the pipeline invocation that created it; middleware units receive it
//! by mutable reference, one at a time. There is no concurrent mutation by
//! design, so no locks are involved.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tiller_tokens::TokenCollection;

use crate::binder::InvocationPipeline;
use crate::command::CommandTree;
use crate::parser::ParseResult;
use crate::settings::AppSettings;
use crate::transform::TransformLog;

/// Advisory cancellation signal threaded through the context.
///
/// Long-running work (command actions, prompting loops) polls it at safe
/// points and returns promptly with the cancelled exit code; the pipeline
/// never preempts a running unit. Shareable across threads so a signal
/// handler can trip it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Clone)]
enum Sink {
    Stdout,
    Stderr,
    Buffer(Rc<RefCell<String>>),
}

impl Sink {
    fn write(&self, text: &str) {
        match self {
            Sink::Stdout => {
                let mut out = std::io::stdout().lock();
                let _ = out.write_all(text.as_bytes());
            }
            Sink::Stderr => {
                let mut err = std::io::stderr().lock();
                let _ = err.write_all(text.as_bytes());
            }
            Sink::Buffer(buffer) => buffer.borrow_mut().push_str(text),
        }
    }
}

/// The output surface commands and error reporting write to.
///
/// Defaults to the process's stdio; tests swap in an in-memory console and
/// read back what was written. Styling is only applied on the stdio
/// console, so captured output stays free of escape codes. Cloning an
/// in-memory console shares its buffers.
#[derive(Clone)]
pub struct Console {
    out: Sink,
    err: Sink,
    styled: bool,
}

impl Console {
    pub fn stdio() -> Self {
        Self {
            out: Sink::Stdout,
            err: Sink::Stderr,
            styled: console::colors_enabled_stderr(),
        }
    }

    /// A console writing to buffers, plus the handle to read them back.
    pub fn in_memory() -> (Self, ConsoleCapture) {
        let out = Rc::new(RefCell::new(String::new()));
        let err = Rc::new(RefCell::new(String::new()));
        let console = Self {
            out: Sink::Buffer(out.clone()),
            err: Sink::Buffer(err.clone()),
            styled: false,
        };
        (console, ConsoleCapture { out, err })
    }

    /// Whether ANSI styling should be applied to error output.
    pub fn is_styled(&self) -> bool {
        self.styled
    }

    pub fn out_str(&self, text: impl AsRef<str>) {
        self.out.write(text.as_ref());
    }

    pub fn out_line(&self, text: impl AsRef<str>) {
        self.out.write(text.as_ref());
        self.out.write("\n");
    }

    pub fn err_line(&self, text: impl AsRef<str>) {
        self.err.write(text.as_ref());
        self.err.write("\n");
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdio()
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = |s: &Sink| match s {
            Sink::Stdout => "stdout",
            Sink::Stderr => "stderr",
            Sink::Buffer(_) => "buffer",
        };
        f.debug_struct("Console")
            .field("out", &kind(&self.out))
            .field("err", &kind(&self.err))
            .finish()
    }
}

/// Read side of an in-memory console.
#[derive(Clone)]
pub struct ConsoleCapture {
    out: Rc<RefCell<String>>,
    err: Rc<RefCell<String>>,
}

impl ConsoleCapture {
    pub fn out_text(&self) -> String {
        self.out.borrow().clone()
    }

    pub fn err_text(&self) -> String {
        self.err.borrow().clone()
    }
}

/// Type-keyed state container.
///
/// Middleware units insert values that later units or command actions
/// retrieve, enabling state hand-off without threading new parameters
/// through every signature.
#[derive(Default)]
pub struct Services {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one of the same type.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map.get(&TypeId::of::<T>()).and_then(|boxed| boxed.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    pub fn get_required<T: 'static>(&self) -> Result<&T, anyhow::Error> {
        self.get::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "service missing: type {} not found in context",
                std::any::type_name::<T>()
            )
        })
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

/// Everything a middleware unit can see and fill in.
///
/// Fields are populated progressively as the stages run; each stage's
/// post-condition documents what later units may rely on (see
/// [`MiddlewareStage`](crate::MiddlewareStage)).
pub struct CommandContext {
    /// The raw argument vector, untouched.
    pub original_args: Vec<String>,
    /// Current token collection. First-pass tokens after PreTransformTokens,
    /// fully transformed after TransformTokens.
    pub tokens: Option<TokenCollection>,
    /// Before/after history of every transformation step.
    pub transform_log: TransformLog,
    pub settings: AppSettings,
    /// Set during the Build stage. Read-only; cached across runs of the
    /// same configuration.
    pub tree: Option<Rc<CommandTree>>,
    /// Set during the ParseInput stage.
    pub parse_result: Option<ParseResult>,
    /// Structure set at ParseInput, values at BindValues, dispatched at
    /// Invoke.
    pub invocations: InvocationPipeline,
    pub services: Services,
    pub console: Console,
    pub cancellation: CancellationToken,
}

impl CommandContext {
    pub fn new(original_args: Vec<String>, settings: AppSettings) -> Self {
        Self {
            original_args,
            tokens: None,
            transform_log: TransformLog::default(),
            settings,
            tree: None,
            parse_result: None,
            invocations: InvocationPipeline::default(),
            services: Services::new(),
            console: Console::stdio(),
            cancellation: CancellationToken::new(),
        }
    }

    /// The built command tree. Panics if the Build stage has not run; units
    /// in later stages may rely on the stage guarantee.
    pub fn tree(&self) -> &CommandTree {
        self.tree.as_ref().expect("Build stage has run")
    }

    /// The parse result. Panics if the ParseInput stage has not run.
    pub fn parse_result(&self) -> &ParseResult {
        self.parse_result.as_ref().expect("ParseInput stage has run")
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("original_args", &self.original_args)
            .field("tokens", &self.tokens.as_ref().map(|t| t.len()))
            .field("parsed", &self.parse_result.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_token_trips_once() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn in_memory_console_captures_streams() {
        let (console, capture) = Console::in_memory();
        console.out_line("to out");
        console.out_str("partial");
        console.err_line("to err");
        assert_eq!(capture.out_text(), "to out\npartial");
        assert_eq!(capture.err_text(), "to err\n");
        assert!(!console.is_styled());
    }

    #[test]
    fn services_insert_get_remove() {
        struct Database {
            url: String,
        }

        let mut services = Services::new();
        assert!(!services.contains::<Database>());

        services.insert(Database { url: "sqlite:".into() });
        assert_eq!(services.get::<Database>().unwrap().url, "sqlite:");

        services.get_mut::<Database>().unwrap().url.push_str("memory");
        assert_eq!(services.get_required::<Database>().unwrap().url, "sqlite:memory");

        let removed = services.remove::<Database>().unwrap();
        assert_eq!(removed.url, "sqlite:memory");
        assert!(services.is_empty());
    }

    #[test]
    fn services_get_required_names_the_missing_type() {
        #[derive(Debug)]
        struct Missing;
        let services = Services::new();
        let err = services.get_required::<Missing>().unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }
}
