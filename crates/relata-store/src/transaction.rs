use relata_core::{EntityName, FieldName, Record};

use crate::store::RowId;

/// Inverse of one applied write.
#[derive(Debug, Clone)]
pub(crate) enum Undo {
    /// Row was inserted; undo removes it.
    Inserted { entity: EntityName, id: RowId },
    /// Row was replaced; undo restores `previous`.
    Updated {
        entity: EntityName,
        id: RowId,
        previous: Record,
    },
    /// Row was removed; undo puts it back.
    Deleted {
        entity: EntityName,
        id: RowId,
        record: Record,
    },
    /// Sequence advanced from `previous`.
    Sequence {
        entity: EntityName,
        field: FieldName,
        previous: Option<i64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum TransactionState {
    #[default]
    Inactive,
    Active,
}

/// Writes applied since the transaction (or the running statement) began.
#[derive(Debug, Clone, Default)]
pub(crate) struct UndoLog {
    entries: Vec<Undo>,
}

impl UndoLog {
    pub(crate) fn push(&mut self, undo: Undo) {
        self.entries.push(undo);
    }

    /// Position to roll back to.
    pub(crate) fn mark(&self) -> usize {
        self.entries.len()
    }

    /// Entries recorded after `mark`, newest first.
    pub(crate) fn drain_after(&mut self, mark: usize) -> Vec<Undo> {
        let mut entries: Vec<Undo> = self.entries.drain(mark..).collect();
        entries.reverse();
        entries
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
