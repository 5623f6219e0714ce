use askdocs_rs_protocol::{AttemptOutcome, AttemptRecord, AttemptSink, Notice, NoticeSink};
use parking_lot::Mutex;

/// Notice sink that keeps every notice.
#[derive(Default)]
pub struct RecordingNoticeSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNoticeSink {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl NoticeSink for RecordingNoticeSink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Attempt sink that keeps every record.
#[derive(Default)]
pub struct RecordingAttemptSink {
    records: Mutex<Vec<AttemptRecord>>,
}

impl RecordingAttemptSink {
    pub fn records(&self) -> Vec<AttemptRecord> {
        self.records.lock().clone()
    }

    /// Outcomes in attempt order.
    pub fn outcomes(&self) -> Vec<AttemptOutcome> {
        self.records.lock().iter().map(|record| record.outcome).collect()
    }
}

impl AttemptSink for RecordingAttemptSink {
    fn record(&self, record: AttemptRecord) {
        self.records.lock().push(record);
    }
}
