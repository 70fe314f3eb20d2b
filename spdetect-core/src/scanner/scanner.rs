use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    time::Instant,
};

use futures::{pin_mut, stream, Stream, StreamExt};
use log::info;

use crate::{
    backend::{IndexerBackend, IndexerTransaction},
    client::KeyDerivation,
    config::ScanConfig,
    error::{Error, Result},
    repository::UtxoRepository,
};

use super::{
    BlockScan, ScanDirection, ScanEvent, ScanRange, ScanReport, SkipReason, TransactionProcessor,
};

/// Walks a height range, fetching each block from the indexer and committing
/// the outputs that pay us to the repository.
///
/// One block is in flight at a time and a block is fully committed before the
/// next one is requested. The coordinator keeps no state between scans apart
/// from the scan progress, which callers persist and feed back with
/// [`ScanCoordinator::with_scan_progress`].
///
/// Timers come from `tokio::time`, scans must run inside a tokio runtime.
pub struct ScanCoordinator<B: IndexerBackend> {
    backend: B,
    processor: TransactionProcessor,
    repository: Arc<UtxoRepository>,
    config: ScanConfig,
    progress: AtomicU32,
    stop: Arc<AtomicBool>, // used to interrupt scanning
}

impl<B: IndexerBackend> ScanCoordinator<B> {
    pub fn new(
        backend: B,
        keys: &mut KeyDerivation,
        repository: Arc<UtxoRepository>,
        config: ScanConfig,
    ) -> Result<Self> {
        Ok(Self {
            backend,
            processor: TransactionProcessor::new(keys)?,
            repository,
            config,
            progress: AtomicU32::new(0),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an externally owned stop flag.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Resume from a previously persisted scan progress.
    pub fn with_scan_progress(self, height: u32) -> Self {
        self.progress.store(height, Ordering::SeqCst);
        self
    }

    pub fn scan_progress(&self) -> u32 {
        self.progress.load(Ordering::SeqCst)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn repository(&self) -> &Arc<UtxoRepository> {
        &self.repository
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Ask running scans to stop after the block in flight.
    ///
    /// The flag stays set and later scans end before their first fetch, until
    /// the owner of the shared flag (see [`ScanCoordinator::with_stop_flag`])
    /// resets it.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn should_interrupt(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Turn a direction into a concrete range, asking the indexer for its tip
    /// when the direction leaves a bound open.
    pub async fn resolve_range(&self, direction: ScanDirection) -> Result<ScanRange> {
        match direction {
            ScanDirection::Backward {
                from_height,
                max_blocks,
            } => {
                let max_blocks = max_blocks.unwrap_or(self.config.max_blocks);
                if max_blocks == 0 {
                    return Ok(ScanRange::Empty);
                }
                let from = match from_height {
                    Some(height) => height,
                    None => self.latest_height().await?,
                };

                Ok(ScanRange::Descending {
                    from,
                    to: from.saturating_sub(max_blocks - 1),
                })
            }
            ScanDirection::Forward {
                from_height,
                to_height,
            } => {
                let to = match to_height {
                    Some(height) => height,
                    None => self.latest_height().await?,
                };
                if from_height > to {
                    return Err(Error::InvalidRange(from_height, to));
                }

                Ok(ScanRange::Ascending {
                    from: from_height,
                    to,
                })
            }
        }
    }

    /// Scan lazily, yielding one event per visited height.
    ///
    /// Dropping the stream stops further requests. Every height whose event
    /// has been yielded is committed, so a new stream can pick up from the
    /// next height.
    pub async fn scan_stream(
        &self,
        direction: ScanDirection,
    ) -> Result<impl Stream<Item = ScanEvent> + Send + '_> {
        let range = self.resolve_range(direction).await?;
        Ok(self.stream_range(range))
    }

    /// Scan the whole range and summarize it.
    pub async fn scan(&self, direction: ScanDirection) -> Result<ScanReport> {
        self.scan_with(direction, |_| {}).await
    }

    /// Like [`ScanCoordinator::scan`], calling `handler` for every event as it happens.
    pub async fn scan_with<F>(&self, direction: ScanDirection, mut handler: F) -> Result<ScanReport>
    where
        F: FnMut(&ScanEvent) + Send,
    {
        let range = self.resolve_range(direction).await?;

        info!("scanning {}", range);
        let start_time = Instant::now();

        let mut report = ScanReport::new(range);
        let events = self.stream_range(range);
        pin_mut!(events);

        while let Some(event) = events.next().await {
            handler(&event);
            report.record(event);
        }

        report.scan_progress = self.scan_progress();
        report.interrupted = report.visited() < range.len();

        info!(
            "scan of {} done in {} seconds: {} new output(s), {} skipped block(s){}",
            range,
            start_time.elapsed().as_secs(),
            report.new_utxos,
            report.skipped.len(),
            if report.interrupted { ", interrupted" } else { "" }
        );

        Ok(report)
    }

    fn stream_range(&self, range: ScanRange) -> impl Stream<Item = ScanEvent> + Send + '_ {
        // the flag tells whether the previous height was fetched successfully
        stream::unfold(
            (range.heights(), false),
            move |(mut heights, pause)| async move {
                let height = heights.next()?;

                if self.should_interrupt() {
                    info!("scan interrupted before block {}", height);
                    return None;
                }

                if pause && !self.config.inter_block_delay.is_zero() {
                    tokio::time::sleep(self.config.inter_block_delay).await;
                }

                let event = self.scan_height(height).await;
                let fetched = matches!(event, ScanEvent::Block(_));

                Some((event, (heights, fetched)))
            },
        )
    }

    async fn scan_height(&self, height: u32) -> ScanEvent {
        match self.fetch_with_backoff(height).await {
            Ok(transactions) => ScanEvent::Block(self.commit_block(height, transactions)),
            Err(reason) => {
                log::warn!("skipping block {}: {}", height, reason);
                ScanEvent::Skipped { height, reason }
            }
        }
    }

    async fn fetch_with_backoff(
        &self,
        height: u32,
    ) -> std::result::Result<Vec<IndexerTransaction>, SkipReason> {
        let mut attempts = 0;

        loop {
            let fetched = tokio::time::timeout(
                self.config.fetch_timeout,
                self.backend.transactions_at_height(height),
            )
            .await;

            match fetched {
                Ok(Ok(transactions)) => return Ok(transactions),
                Ok(Err(Error::RateLimited { retry_after })) => {
                    attempts += 1;
                    if attempts > self.config.max_rate_limit_retries {
                        return Err(SkipReason::RateLimited { attempts });
                    }

                    let wait = retry_after
                        .map_or(self.config.rate_limit_backoff, |r| {
                            r.max(self.config.rate_limit_backoff)
                        });
                    log::warn!(
                        "rate limited on block {}, retrying in {:?} ({}/{})",
                        height,
                        wait,
                        attempts,
                        self.config.max_rate_limit_retries
                    );
                    tokio::time::sleep(wait).await;
                }
                Ok(Err(e)) => return Err(SkipReason::FetchFailed(e.to_string())),
                Err(_) => return Err(SkipReason::TimedOut),
            }
        }
    }

    fn commit_block(&self, height: u32, transactions: Vec<IndexerTransaction>) -> BlockScan {
        let scannable: Vec<&IndexerTransaction> =
            transactions.iter().filter(|tx| tx.is_scannable()).collect();

        let matches = self.processor.process_block(&scannable);
        let mut new_utxos = 0;
        for utxo in &matches {
            if self.repository.add(utxo.clone()) {
                new_utxos += 1;
            }
        }

        // matches are in the repository, progress may move past this block
        let scan_progress = self.progress.fetch_max(height, Ordering::SeqCst).max(height);

        if !matches.is_empty() {
            info!(
                "block {}: {} match(es), {} new",
                height,
                matches.len(),
                new_utxos
            );
        }

        BlockScan {
            height,
            transactions,
            matches,
            new_utxos,
            scan_progress,
        }
    }

    async fn latest_height(&self) -> Result<u32> {
        tokio::time::timeout(self.config.fetch_timeout, self.backend.latest_height())
            .await
            .map_err(|_| Error::Timeout(self.config.fetch_timeout))?
    }
}
