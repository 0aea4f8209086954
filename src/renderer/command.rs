/// The three message kinds a renderer IPC request may carry; the wire
/// payload itself is opaque to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Noop,
    Update,
    Shutdown,
}

/// A command destined for the renderer process. Only `Update`-typed
/// commands are ever buffered in the supervisor's single pending slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererCommand {
    pub kind: CommandKind,
    pub visible: bool,
    pub has_output: bool,
}

impl RendererCommand {
    pub fn noop() -> Self {
        RendererCommand {
            kind: CommandKind::Noop,
            visible: false,
            has_output: false,
        }
    }

    pub fn shutdown() -> Self {
        RendererCommand {
            kind: CommandKind::Shutdown,
            visible: false,
            has_output: false,
        }
    }

    pub fn update(visible: bool, has_output: bool) -> Self {
        RendererCommand {
            kind: CommandKind::Update,
            visible,
            has_output,
        }
    }

    /// An `UPDATE` that hides the renderer without drawing anything; the
    /// dispatch algorithm discards these when there is no connected server
    /// rather than triggering a launch.
    pub fn is_hide_with_nothing_to_hide(&self) -> bool {
        self.kind == CommandKind::Update && !self.visible && !self.has_output
    }
}
