//! Text renderings of the team board for the CLI.

use clap::ValueEnum;

use crate::ingest::TeamRecord;
use crate::refresh::TeamBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
	#[default]
	Text,
	Csv,
	Json,
}

pub fn render(board: &TeamBoard, format: OutputFormat) -> anyhow::Result<String> {
	match format {
		OutputFormat::Text => Ok(render_text(board)),
		OutputFormat::Csv => render_csv(&board.teams),
		OutputFormat::Json => Ok(serde_json::to_string_pretty(board)?),
	}
}

/// Status line followed by aligned `team  country  level` columns.
pub fn render_text(board: &TeamBoard) -> String {
	let mut out = board.status_text();
	if board.teams.is_empty() {
		return out;
	}

	let team_w = column_width(board.teams.iter().map(|t| t.team.as_str()), "Team");
	let country_w = column_width(board.teams.iter().map(|t| t.country.as_str()), "Country");

	out.push('\n');
	out.push_str(&row("Team", "Country", "Level", team_w, country_w));
	for t in &board.teams {
		out.push('\n');
		out.push_str(&row(&t.team, &t.country, &t.level, team_w, country_w));
	}
	out
}

fn column_width<'a>(cells: impl Iterator<Item = &'a str>, title: &str) -> usize {
	cells
		.map(|c| c.chars().count())
		.fold(title.chars().count(), usize::max)
}

fn row(team: &str, country: &str, level: &str, team_w: usize, country_w: usize) -> String {
	format!("{:team_w$}  {:country_w$}  {}", team, country, level)
		.trim_end()
		.to_string()
}

pub fn render_csv(teams: &[TeamRecord]) -> anyhow::Result<String> {
	let mut wtr = csv::Writer::from_writer(Vec::new());
	wtr.write_record(["team", "country", "level"])?;
	for t in teams {
		wtr.write_record([&t.team, &t.country, &t.level])?;
	}
	let bytes = wtr.into_inner().map_err(|e| anyhow::anyhow!("csv flush failed: {}", e))?;
	Ok(String::from_utf8(bytes)?)
}
