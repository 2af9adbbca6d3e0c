//! Console progress reporting for long-running deployment operations.
//!
//! Deployments are strictly sequential, so progress is a simple indented
//! narrative: nesting a reporter shifts its messages one level deeper,
//! producing output like
//!
//! ```text
//! Deploying Spark version 3.0.0 to cluster of 3 machines...
//! |- Generating configuration files...
//! |  |- Generating file "spark-env.sh"...
//! ```

/// An indentation-levelled progress reporter.
///
/// Cloneable and cheap; the quiet variant swallows all output, which is the
/// only place bdp ever drops a message on purpose.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    depth: usize,
    quiet: bool,
}

impl Progress {
    /// A reporter that writes to stdout at depth zero.
    pub fn stdout() -> Self {
        Self { depth: 0, quiet: false }
    }

    /// A reporter that discards every message.
    pub fn quiet() -> Self {
        Self { depth: 0, quiet: true }
    }

    /// A reporter shifted `levels` deeper than this one.
    pub fn nested(&self, levels: usize) -> Self {
        Self { depth: self.depth + levels, quiet: self.quiet }
    }

    /// Report a message at the given level relative to this reporter.
    pub fn log(&self, level: usize, message: &str) {
        if self.quiet {
            return;
        }
        println!("{}{}", indent_prefix(self.depth + level), message);
    }
}

fn indent_prefix(mut level: usize) -> String {
    let mut prefix = String::new();
    while level > 1 {
        prefix.push_str("|  ");
        level -= 1;
    }
    if level == 1 {
        prefix.push_str("|- ");
    }
    prefix
}
