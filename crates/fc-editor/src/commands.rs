//! Undo/Redo history.
//!
//! Documents are immutable snapshots, so every undo step is simply the
//! document before and after the change. Pointer gestures use **batching**:
//! the document is captured when the gesture starts and compared when it
//! ends, so a drag that applied a hundred live moves undoes in one step.

use fc_core::model::DiagramDocument;

/// One undoable change.
#[derive(Debug, Clone)]
pub struct Command {
    pub before: DiagramDocument,
    pub after: DiagramDocument,
    pub description: String,
}

/// Manages undo/redo stacks with batch grouping for pointer gestures.
pub struct History {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Document captured at the start of the open batch.
    batch: Option<(DiagramDocument, String)>,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(64)),
            redo_stack: Vec::new(),
            max_depth,
            batch: None,
        }
    }

    /// Start a batch. Changes recorded until `end_batch` collapse into one step.
    /// Nested calls keep the outermost snapshot.
    pub fn begin_batch(&mut self, current: &DiagramDocument, description: &str) {
        if self.batch.is_none() {
            self.batch = Some((current.clone(), description.to_string()));
        }
    }

    /// Close the batch; pushes one step if the document actually changed.
    pub fn end_batch(&mut self, current: &DiagramDocument) {
        if let Some((before, description)) = self.batch.take()
            && before != *current
        {
            self.push(Command {
                before,
                after: current.clone(),
                description,
            });
        }
    }

    /// Record a committed change. Inside a batch this is a no-op; the batch
    /// snapshot already covers it.
    pub fn record(&mut self, before: &DiagramDocument, after: &DiagramDocument, description: &str) {
        if self.batch.is_some() {
            return;
        }
        self.push(Command {
            before: before.clone(),
            after: after.clone(),
            description: description.to_string(),
        });
    }

    /// Record a change that arrived from outside the open batch as its own
    /// step. `apply` is replayed on the batch's starting snapshot, which
    /// then becomes the batch's new starting point. Without an open batch
    /// this does nothing; `record` covers that case.
    pub fn rebase_batch(
        &mut self,
        description: &str,
        apply: impl FnOnce(&DiagramDocument) -> DiagramDocument,
    ) {
        let Some((before, batch_description)) = self.batch.take() else {
            return;
        };
        let rebased = apply(&before);
        if rebased != before {
            self.push(Command {
                before,
                after: rebased.clone(),
                description: description.to_string(),
            });
        }
        self.batch = Some((rebased, batch_description));
    }

    fn push(&mut self, cmd: Command) {
        log::debug!("history: {}", cmd.description);
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Pop the last step; returns the document to restore and its description.
    pub fn undo(&mut self) -> Option<(DiagramDocument, String)> {
        let cmd = self.undo_stack.pop()?;
        let restored = (cmd.before.clone(), cmd.description.clone());
        self.redo_stack.push(cmd);
        Some(restored)
    }

    pub fn redo(&mut self) -> Option<(DiagramDocument, String)> {
        let cmd = self.redo_stack.pop()?;
        let restored = (cmd.after.clone(), cmd.description.clone());
        self.undo_stack.push(cmd);
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Forget everything, e.g. when a different document is loaded.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch = None;
    }
}
