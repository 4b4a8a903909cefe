//! The ingestion cycle behind the team list.
//!
//! A cycle is fetch → project → reduce → commit. Cycles may overlap (an
//! initial load racing the first poll tick); each takes a generation number
//! and only the newest one is allowed to commit to the board.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{info, warn};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::{ColumnSpecs, IngestError, TeamRecord, ingest};
use crate::sources::TableSource;

/// What the team view is currently showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum BoardStatus {
	Idle,
	Loading,
	Ready,
	Failed(String),
}

/// Render target of the ingestion cycle.
#[derive(Debug, Clone, Serialize)]
pub struct TeamBoard {
	pub status: BoardStatus,
	pub teams: Vec<TeamRecord>,
	/// Generation of the cycle that last committed.
	pub generation: u64,
	pub updated_at: Option<DateTime<Local>>,
}

impl Default for TeamBoard {
	fn default() -> Self {
		Self {
			status: BoardStatus::Idle,
			teams: Vec::new(),
			generation: 0,
			updated_at: None,
		}
	}
}

impl TeamBoard {
	/// Status line shown above the list.
	pub fn status_text(&self) -> String {
		match &self.status {
			BoardStatus::Idle => String::new(),
			BoardStatus::Loading => "Loading…".to_string(),
			BoardStatus::Ready => match self.teams.len() {
				0 => "No teams registered yet".to_string(),
				1 => "1 team registered".to_string(),
				n => format!("{} teams registered", n),
			},
			BoardStatus::Failed(msg) if msg.trim().is_empty() => {
				"Could not load teams".to_string()
			}
			BoardStatus::Failed(msg) => msg.clone(),
		}
	}
}

/// Result of one call to [`Refresher::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
	Updated { generation: u64, teams: usize },
	Failed { generation: u64, error: IngestError },
	/// A newer cycle started before this one finished; its result was dropped.
	Stale { generation: u64 },
}

/// Runs ingestion cycles against one source and publishes to a shared board.
pub struct Refresher {
	source: Box<dyn TableSource>,
	specs: ColumnSpecs,
	board: Arc<RwLock<TeamBoard>>,
	latest: AtomicU64,
}

impl Refresher {
	pub fn new(source: Box<dyn TableSource>, specs: ColumnSpecs) -> Self {
		Self {
			source,
			specs,
			board: Arc::new(RwLock::new(TeamBoard::default())),
			latest: AtomicU64::new(0),
		}
	}

	pub fn board(&self) -> Arc<RwLock<TeamBoard>> {
		self.board.clone()
	}

	pub async fn snapshot(&self) -> TeamBoard {
		self.board.read().await.clone()
	}

	/// Run one cycle. Errors never escape: they land on the board.
	pub async fn refresh(&self) -> CycleOutcome {
		let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
		{
			let mut board = self.board.write().await;
			board.status = BoardStatus::Loading;
		}

		let result = match self.source.fetch_table().await {
			Ok(table) => ingest(&table, &self.specs),
			Err(e) => Err(e),
		};

		let mut board = self.board.write().await;
		if self.latest.load(Ordering::SeqCst) != generation {
			info!(
				"discarding stale {} result (cycle {})",
				self.source.name(),
				generation
			);
			return CycleOutcome::Stale { generation };
		}

		board.generation = generation;
		board.updated_at = Some(Local::now());
		match result {
			Ok(teams) => {
				let count = teams.len();
				info!("{} teams loaded from {}", count, self.source.name());
				board.teams = teams;
				board.status = BoardStatus::Ready;
				CycleOutcome::Updated {
					generation,
					teams: count,
				}
			}
			Err(error) => {
				warn!(
					"team refresh from {} failed ({}): {}",
					self.source.name(),
					error.kind(),
					error
				);
				board.teams.clear();
				board.status = BoardStatus::Failed(error.to_string());
				CycleOutcome::Failed { generation, error }
			}
		}
	}

	/// Refresh every `interval_ms` on a background task. `0` disables polling.
	///
	/// The first tick fires immediately, which doubles as the initial load.
	pub fn spawn_polling(self: &Arc<Self>, interval_ms: u64) -> Option<JoinHandle<()>> {
		if interval_ms == 0 {
			return None;
		}

		let this = Arc::clone(self);
		Some(tokio::spawn(async move {
			let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
			ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
			loop {
				ticker.tick().await;
				this.refresh().await;
			}
		}))
	}
}

#[cfg(test)]
#[cfg(feature = "unit-tests")]
mod tests {
	use std::collections::VecDeque;
	use std::sync::Mutex;

	use async_trait::async_trait;
	use tokio::sync::Notify;

	use super::*;
	use crate::config::ColumnSettings;
	use crate::ingest::RawTable;

	/// Hands out scripted results in order; the last one repeats.
	struct Scripted {
		results: Mutex<VecDeque<Result<RawTable, IngestError>>>,
	}

	impl Scripted {
		fn new(results: Vec<Result<RawTable, IngestError>>) -> Self {
			Self {
				results: Mutex::new(results.into()),
			}
		}
	}

	#[async_trait]
	impl TableSource for Scripted {
		fn name(&self) -> &'static str {
			"scripted"
		}

		async fn fetch_table(&self) -> Result<RawTable, IngestError> {
			let mut q = self.results.lock().unwrap();
			if q.len() > 1 {
				q.pop_front().unwrap()
			} else {
				q.front().cloned().unwrap()
			}
		}
	}

	fn table(rows: &[[&str; 2]]) -> RawTable {
		RawTable::new(
			vec!["Team".to_string(), "Country".to_string()],
			rows.iter()
				.map(|r| r.iter().map(|c| c.to_string()).collect())
				.collect(),
		)
	}

	fn refresher(source: impl TableSource + 'static) -> Refresher {
		Refresher::new(Box::new(source), ColumnSettings::default().compile().unwrap())
	}

	#[tokio::test]
	async fn success_then_failure_clears_teams() {
		let r = refresher(Scripted::new(vec![
			Ok(table(&[["Falcons", "Sweden"], ["auks", "Iceland"], ["falcons", "Norway"]])),
			Err(IngestError::Fetch("Registrations API HTTP 502".to_string())),
		]));

		let first = r.refresh().await;
		assert_eq!(first, CycleOutcome::Updated { generation: 1, teams: 2 });
		let board = r.snapshot().await;
		assert_eq!(board.status, BoardStatus::Ready);
		assert_eq!(board.status_text(), "2 teams registered");
		assert_eq!(board.teams[0].team, "auks");
		assert_eq!(board.teams[1].country, "Sweden");

		let second = r.refresh().await;
		assert!(matches!(second, CycleOutcome::Failed { generation: 2, .. }));
		let board = r.snapshot().await;
		assert!(board.teams.is_empty());
		assert_eq!(board.status_text(), "Registrations API HTTP 502");
	}

	#[tokio::test]
	async fn missing_team_column_surfaces_as_status() {
		let r = refresher(Scripted::new(vec![Ok(RawTable::new(
			vec!["Email".to_string()],
			vec![vec!["a@b.se".to_string()]],
		))]));
		r.refresh().await;
		assert_eq!(r.snapshot().await.status_text(), "missing Team column");
	}

	#[test]
	fn status_text_fallbacks() {
		let mut board = TeamBoard::default();
		assert_eq!(board.status_text(), "");
		board.status = BoardStatus::Failed(String::new());
		assert_eq!(board.status_text(), "Could not load teams");
		board.status = BoardStatus::Ready;
		assert_eq!(board.status_text(), "No teams registered yet");
	}

	/// First fetch blocks until released; later fetches return at once.
	struct Gated {
		gate: Arc<Notify>,
		calls: Arc<AtomicU64>,
	}

	#[async_trait]
	impl TableSource for Gated {
		fn name(&self) -> &'static str {
			"gated"
		}

		async fn fetch_table(&self) -> Result<RawTable, IngestError> {
			if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
				self.gate.notified().await;
				Ok(table(&[["Old", ""]]))
			} else {
				Ok(table(&[["New", ""]]))
			}
		}
	}

	#[tokio::test]
	async fn slower_older_cycle_does_not_overwrite_newer() {
		let gate = Arc::new(Notify::new());
		let calls = Arc::new(AtomicU64::new(0));
		let r = Arc::new(refresher(Gated {
			gate: gate.clone(),
			calls: calls.clone(),
		}));

		let slow = tokio::spawn({
			let r = r.clone();
			async move { r.refresh().await }
		});
		// Let the slow cycle reach its fetch before starting the fast one.
		while calls.load(Ordering::SeqCst) == 0 {
			tokio::task::yield_now().await;
		}

		let fast = r.refresh().await;
		assert_eq!(fast, CycleOutcome::Updated { generation: 2, teams: 1 });

		gate.notify_one();
		let slow = slow.await.unwrap();
		assert_eq!(slow, CycleOutcome::Stale { generation: 1 });

		let board = r.snapshot().await;
		assert_eq!(board.generation, 2);
		assert_eq!(board.status, BoardStatus::Ready);
		assert_eq!(board.teams[0].team, "New");
	}

	#[tokio::test]
	async fn zero_interval_disables_polling() {
		let r = Arc::new(refresher(Scripted::new(vec![Ok(table(&[]))])));
		assert!(r.spawn_polling(0).is_none());
	}

	#[tokio::test]
	async fn polling_runs_cycles() {
		let r = Arc::new(refresher(Scripted::new(vec![Ok(table(&[["Falcons", ""]]))])));
		let handle = r.spawn_polling(10).expect("polling enabled");
		tokio::time::sleep(Duration::from_millis(60)).await;
		handle.abort();
		let board = r.snapshot().await;
		assert!(board.generation >= 2);
		assert_eq!(board.teams.len(), 1);
	}
}
