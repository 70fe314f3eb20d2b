use std::fmt;

use crate::{backend::IndexerTransaction, repository::SilentPaymentUtxo};

/// Which way a scan walks the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Catch up from `from_height` (the indexer tip if `None`) down towards genesis.
    ///
    /// `max_blocks` falls back to [`ScanConfig::max_blocks`](crate::ScanConfig).
    Backward {
        from_height: Option<u32>,
        max_blocks: Option<u32>,
    },
    /// Fill a gap from `from_height` up to `to_height` (the indexer tip if `None`).
    Forward {
        from_height: u32,
        to_height: Option<u32>,
    },
}

/// Concrete, inclusive height range of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRange {
    Descending { from: u32, to: u32 },
    Ascending { from: u32, to: u32 },
    Empty,
}

impl ScanRange {
    /// Heights in the order they are scanned.
    pub fn heights(&self) -> Box<dyn Iterator<Item = u32> + Send> {
        match *self {
            ScanRange::Descending { from, to } => Box::new((to..=from).rev()),
            ScanRange::Ascending { from, to } => Box::new(from..=to),
            ScanRange::Empty => Box::new(std::iter::empty()),
        }
    }

    pub fn len(&self) -> usize {
        match *self {
            // inverted bounds walk no heights
            ScanRange::Descending { from, to } => from.checked_sub(to).map_or(0, |d| d as usize + 1),
            ScanRange::Ascending { from, to } => to.checked_sub(from).map_or(0, |d| d as usize + 1),
            ScanRange::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ScanRange::Empty)
    }
}

impl fmt::Display for ScanRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanRange::Descending { from, to } => write!(f, "{} down to {}", from, to),
            ScanRange::Ascending { from, to } => write!(f, "{} up to {}", from, to),
            ScanRange::Empty => write!(f, "empty range"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("still rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("fetch timed out")]
    TimedOut,
}

/// Result of scanning a single block.
#[derive(Debug, Clone)]
pub struct BlockScan {
    pub height: u32,
    /// Everything the indexer returned for this block.
    pub transactions: Vec<IndexerTransaction>,
    /// Outputs found in this block, including ones already known.
    pub matches: Vec<SilentPaymentUtxo>,
    /// How many of `matches` were new to the repository.
    pub new_utxos: usize,
    pub scan_progress: u32,
}

/// Emitted once per visited height.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    Block(BlockScan),
    Skipped { height: u32, reason: SkipReason },
}

impl ScanEvent {
    pub fn height(&self) -> u32 {
        match self {
            ScanEvent::Block(block) => block.height,
            ScanEvent::Skipped { height, .. } => *height,
        }
    }
}

/// Summary of a bulk scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub range: ScanRange,
    pub blocks: Vec<BlockScan>,
    pub skipped: Vec<(u32, SkipReason)>,
    pub new_utxos: usize,
    /// Highest height whose matches were committed during this scan.
    pub highest_committed: Option<u32>,
    pub scan_progress: u32,
    /// Set when the stop flag ended the scan before the end of the range.
    pub interrupted: bool,
}

impl ScanReport {
    pub(crate) fn new(range: ScanRange) -> Self {
        Self {
            range,
            blocks: vec![],
            skipped: vec![],
            new_utxos: 0,
            highest_committed: None,
            scan_progress: 0,
            interrupted: false,
        }
    }

    pub(crate) fn record(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Block(block) => {
                self.new_utxos += block.new_utxos;
                self.highest_committed = self.highest_committed.max(Some(block.height));
                self.scan_progress = block.scan_progress;
                self.blocks.push(block);
            }
            ScanEvent::Skipped { height, reason } => self.skipped.push((height, reason)),
        }
    }

    pub fn visited(&self) -> usize {
        self.blocks.len() + self.skipped.len()
    }

    pub fn skipped_heights(&self) -> Vec<u32> {
        self.skipped.iter().map(|(height, _)| *height).collect()
    }
}
