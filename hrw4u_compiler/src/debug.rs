//! Indentation-scoped `<phase>` / `</phase>` tracing to stderr

use std::cell::Cell;
use std::io::{self, Write};

const INDENT_UNIT: &str = "    ";

/// Tracer owned by a single compilation
#[derive(Debug)]
pub struct Dbg {
    enabled: bool,
    depth: Cell<usize>,
}

impl Dbg {
    /// `indent` is the depth the first trace line starts at
    pub fn new(enabled: bool, indent: usize) -> Self {
        Self {
            enabled,
            depth: Cell::new(indent),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    pub fn enter(&self, msg: &str) {
        if !self.enabled {
            return;
        }
        self.write_line(&format!("<{}>", msg));
        self.depth.set(self.depth.get() + 1);
    }

    pub fn exit(&self, msg: Option<&str>) {
        if !self.enabled {
            return;
        }
        self.depth.set(self.depth.get().saturating_sub(1));
        if let Some(msg) = msg {
            self.write_line(&format!("</{}>", msg));
        }
    }

    /// Plain message at the current depth
    pub fn trace(&self, msg: &str) {
        if self.enabled {
            self.write_line(msg);
        }
    }

    /// Enter now and exit when the guard drops
    pub fn scope<'a>(&'a self, msg: &'a str) -> DbgScope<'a> {
        self.enter(msg);
        DbgScope { dbg: self, msg }
    }

    /// Run `f` between `enter(msg)` and `exit(msg)`
    pub fn traced<R>(&self, msg: &str, f: impl FnOnce() -> R) -> R {
        let _scope = self.scope(msg);
        f()
    }

    /// Text for one trace line, without writing it
    pub fn format_line(&self, msg: &str) -> String {
        format!("{}{}", INDENT_UNIT.repeat(self.depth.get()), msg)
    }

    fn write_line(&self, msg: &str) {
        let line = self.format_line(msg);
        let _ = writeln!(io::stderr().lock(), "{}", line);
    }
}

pub struct DbgScope<'a> {
    dbg: &'a Dbg,
    msg: &'a str,
}

impl Drop for DbgScope<'_> {
    fn drop(&mut self) {
        self.dbg.exit(Some(self.msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_exit_depth() {
        let dbg = Dbg::new(true, 0);
        dbg.enter("program");
        dbg.enter("section");
        assert_eq!(dbg.depth(), 2);
        assert_eq!(dbg.format_line("<x>"), "        <x>");
        dbg.exit(Some("section"));
        dbg.exit(Some("program"));
        dbg.exit(None);
        assert_eq!(dbg.depth(), 0);
    }

    #[test]
    fn test_scope_guard_exits_on_early_return() {
        let dbg = Dbg::new(true, 0);
        let result: Result<(), &str> = dbg.traced("statement", || {
            assert_eq!(dbg.depth(), 1);
            Err("failed")
        });
        assert!(result.is_err());
        assert_eq!(dbg.depth(), 0);
    }

    #[test]
    fn test_starting_indent() {
        let dbg = Dbg::new(true, 2);
        assert_eq!(dbg.depth(), 2);
        assert_eq!(dbg.format_line("x"), "        x");
        dbg.enter("block");
        assert_eq!(dbg.format_line("y"), "            y");
        dbg.exit(Some("block"));
        assert_eq!(dbg.depth(), 2);
    }

    #[test]
    fn test_disabled_tracer_keeps_depth() {
        let dbg = Dbg::disabled();
        dbg.enter("program");
        assert_eq!(dbg.depth(), 0);
        assert!(!dbg.is_enabled());
    }
}
