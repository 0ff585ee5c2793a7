use std::fmt;

/// Counters for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub folders_scanned: usize,
    /// Folders reported absent and scheduled for removal.
    pub folders_missing: usize,
    /// Folders skipped because the mail store could not be reached.
    pub folders_skipped: usize,
    pub messages_seen: usize,
    pub translated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Messages passed over because the ledger already had them.
    pub deduplicated: usize,
    pub calendar_notices: usize,
    pub attachments: usize,
}

impl PassReport {
    /// Messages that reached a decision or failed trying.
    pub fn decided(&self) -> usize {
        self.translated + self.skipped + self.failed
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folder(s) scanned, {} missing, {} unreachable; {} message(s): {} translated, {} skipped, {} failed, {} already processed; {} calendar notice(s), {} attachment(s)",
            self.folders_scanned,
            self.folders_missing,
            self.folders_skipped,
            self.messages_seen,
            self.translated,
            self.skipped,
            self.failed,
            self.deduplicated,
            self.calendar_notices,
            self.attachments,
        )
    }
}
