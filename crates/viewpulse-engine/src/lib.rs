//! Time-series monitoring and milestone projection for a single video's
//! view, like and comment counters.
//!
//! Everything here is storage-agnostic: data comes in through the traits in
//! [`source`] and the optimistic list's [`optimistic::CanonicalStore`].

pub mod bucket;
pub mod chart;
pub mod clicks;
pub mod crossing;
pub mod dismissal;
pub mod driver;
pub mod error;
pub mod eta;
pub mod export;
pub mod ledger;
pub mod live;
pub mod monitor;
pub mod optimistic;
pub mod ordering;
pub mod range;
pub mod rate;
pub mod scheduler;
pub mod source;

pub use bucket::{bucket_latest, bucket_table, latest_change, BucketRow, LatestChange, TABLE_ROWS};
pub use chart::{build_chart, ChartConfig, ChartModel, Trend};
pub use clicks::{analyze, ClickAnalytics};
pub use crossing::{detect_recent_crossing, milestone_progress, Crossing, MilestoneProgress, MilestoneStatus};
pub use dismissal::{DismissalState, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use driver::{Driver, MonitorObserver};
pub use error::{KvError, SourceError};
pub use eta::{project_eta, Eta};
pub use export::{to_csv, ExportRow};
pub use ledger::{threshold_ledger, LedgerRow, LEDGER_STEP};
pub use monitor::{Monitor, MonitorSettings, MonitorView};
pub use optimistic::{CanonicalStore, Command, CommitOutcome, OptimisticList, Reorder};
pub use ordering::{OrderedItem, SortOrderUpdate};
pub use range::{RangeKey, RangeSelection, RangeWindow};
pub use rate::{estimate_rate, Metric};
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock};
pub use source::{ClickEventSource, MilestoneSource, SnapshotSource};
