//! Database deployment stages.

use std::fmt;

/// One ordered phase of a database deployment.
///
/// The derived `Ord` is the execution order: schema setup first, then
/// tables, then procedures that reference them, then data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    Setup,
    Tables,
    Procedures,
    Data,
}

impl StageKind {
    /// All stages in execution order.
    pub const ALL: [StageKind; 4] = [
        StageKind::Setup,
        StageKind::Tables,
        StageKind::Procedures,
        StageKind::Data,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StageKind::Setup => "setup",
            StageKind::Tables => "tables",
            StageKind::Procedures => "procedures",
            StageKind::Data => "data",
        }
    }

    /// Setup creates databases and users, so it runs with no database selected.
    pub fn uses_database(self) -> bool {
        !matches!(self, StageKind::Setup)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
