//! Boundary to the compiled interpreter module.
//!
//! The interpreter is opaque: it can be initialized once and then asked to
//! execute source text. Its output does not come back as a return value but
//! through the [`OutputSink`] it was given during initialization.

use std::fmt;
use std::rc::Rc;

use zoon::futures_util::future::LocalBoxFuture;

/// An initialized interpreter module.
pub trait ModuleHandle {
    /// Execute `source_text`. Output (including interpreter errors) is emitted
    /// through the module's output sink, not returned.
    fn execute(&self, source_text: &str);
}

/// Fetches, compiles and instantiates the interpreter module.
pub trait ModuleLoader {
    fn initialize(
        &self,
        output: OutputSink,
    ) -> LocalBoxFuture<'static, Result<Rc<dyn ModuleHandle>, LoadError>>;
}

/// Callback receiving every line the module emits, in emission order.
#[derive(Clone)]
pub struct OutputSink {
    emit: Rc<dyn Fn(String)>,
}

impl OutputSink {
    pub fn new(emit: impl Fn(String) + 'static) -> Self {
        Self { emit: Rc::new(emit) }
    }

    /// Sink that throws lines away.
    pub fn discard() -> Self {
        Self::new(|_| {})
    }

    pub fn emit(&self, line: impl Into<String>) {
        (self.emit)(line.into())
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

/// Why the module could not be initialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// The module's JS glue could not be fetched or evaluated.
    Import(String),
    /// Compiling or instantiating the wasm binary failed.
    Instantiate(String),
    /// The module does not export a required function.
    MissingExport(&'static str),
    /// The load could not be scheduled.
    Spawn(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Import(reason) => write!(f, "failed to import interpreter module: {reason}"),
            LoadError::Instantiate(reason) => {
                write!(f, "failed to instantiate interpreter module: {reason}")
            }
            LoadError::MissingExport(name) => {
                write!(f, "interpreter module does not export `{name}`")
            }
            LoadError::Spawn(reason) => write!(f, "failed to schedule module load: {reason}"),
        }
    }
}

impl std::error::Error for LoadError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn sink_forwards_lines_in_order() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = OutputSink::new({
            let lines = lines.clone();
            move |line| lines.borrow_mut().push(line)
        });
        let clone = sink.clone();

        sink.emit("first");
        clone.emit(String::from("second"));

        assert_eq!(*lines.borrow(), ["first", "second"]);
    }

    #[test]
    fn load_error_messages() {
        assert_eq!(
            LoadError::MissingExport("run").to_string(),
            "interpreter module does not export `run`"
        );
        assert_eq!(
            LoadError::Import("404".to_owned()).to_string(),
            "failed to import interpreter module: 404"
        );
    }
}
