use crate::alert::AlertSink;
use crate::error::{Result, SheetSentryError};
use crate::fetcher::SheetFetcher;
use crate::rules::RuleCatalog;
use crate::workbook::{Sheet, Workbook};
use chrono::Local;
use std::time::Duration;

/// Outcome of one scan pass over one snapshot.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Display labels of the rows that matched, in sheet order.
    pub matched: Vec<String>,
    pub scanned_rows: u32,
    pub skipped_rows: u32,
}

impl ScanReport {
    pub fn should_alert(&self) -> bool {
        !self.matched.is_empty()
    }
}

/// One full pass: every row top to bottom, the skip filter first, then the
/// catalog. Emits one notice per match and the audible cue at most once.
/// Holds no state across calls.
pub fn scan_sheet(sheet: &Sheet, catalog: &RuleCatalog, sink: &mut dyn AlertSink) -> ScanReport {
    let mut report = ScanReport::default();

    for row_index in 1..=sheet.row_count() {
        let row = sheet.row(row_index);
        report.scanned_rows += 1;

        // Rows already taken by a worker never alert, even on a full match.
        if !sheet.cell(row_index, &catalog.policy.skip_column).text.is_empty() {
            report.skipped_rows += 1;
            continue;
        }

        if !catalog.matches(&row) {
            continue;
        }

        let label = sheet.cell(row_index, &catalog.policy.label_column).text;
        sink.notify(&label);
        report.matched.push(label);
    }

    if report.should_alert() {
        sink.play_alert();
    }

    report
}

/// How transient fetch failures are retried: wait `delay`, try again,
/// give up after `max_attempts` consecutive failures (unbounded when
/// `None`, matching the original behavior).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn bounded(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts),
        }
    }
}

/// The poll loop: fetch a snapshot, scan it, sleep, repeat. Runs until a
/// fatal error. Throttle/gateway errors are retried silently under the
/// retry policy.
pub struct Watcher {
    fetcher: SheetFetcher,
    catalog: RuleCatalog,
    poll_delay: Duration,
    retry: RetryPolicy,
    verbose: bool,
}

impl Watcher {
    pub fn new(
        fetcher: SheetFetcher,
        catalog: RuleCatalog,
        poll_delay: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            fetcher,
            catalog,
            poll_delay,
            retry,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub async fn run(&self, sink: &mut dyn AlertSink) -> Result<()> {
        let mut failed_attempts = 0u32;

        loop {
            match self.fetcher.fetch().await {
                Ok(bytes) => {
                    failed_attempts = 0;
                    let report = self.scan_snapshot(&bytes, sink)?;
                    println!(
                        "[{}] {} rows, {} skipped, {} matched",
                        Local::now().format("%H:%M:%S"),
                        report.scanned_rows,
                        report.skipped_rows,
                        report.matched.len()
                    );
                    tokio::time::sleep(self.poll_delay).await;
                }
                Err(e) if e.is_transient() => {
                    failed_attempts += 1;
                    if let Some(max) = self.retry.max_attempts {
                        if failed_attempts >= max {
                            return Err(SheetSentryError::Fetch(format!(
                                "{} (gave up after {} attempts)",
                                e, failed_attempts
                            )));
                        }
                    }
                    if self.verbose {
                        println!("… {} — retrying", e);
                    }
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => return Err(SheetSentryError::Fetch(e.to_string())),
            }
        }
    }

    fn scan_snapshot(&self, bytes: &[u8], sink: &mut dyn AlertSink) -> Result<ScanReport> {
        let workbook = Workbook::from_bytes(bytes)?;
        let sheet = workbook
            .sheet(&self.catalog.policy.worksheet)
            .ok_or_else(|| {
                SheetSentryError::MalformedDocument(format!(
                    "worksheet \"{}\" not found (has: {})",
                    self.catalog.policy.worksheet,
                    workbook.sheet_names().join(", ")
                ))
            })?;
        Ok(scan_sheet(sheet, &self.catalog, sink))
    }
}
