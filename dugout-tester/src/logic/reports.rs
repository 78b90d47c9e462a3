use anyhow::Result;
use colored::Colorize;
use dugout_game::{CareerStats, Side, TeamRecords};
use std::io::Write;

use super::BatchResult;

/// Standings and career leaders read back from the store after a batch.
pub struct LeagueView<'a> {
    pub records: &'a TeamRecords,
    pub career: &'a CareerStats,
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    result: &BatchResult,
    league: &LeagueView<'_>,
) -> Result<()> {
    let totals = &result.totals;
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Batch Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "========================".cyan())?;
    writeln!(
        writer,
        "{} at {} | master seed {}",
        result.away.bold(),
        result.home.bold(),
        result.master_seed
    )?;
    writeln!(writer, "Games played: {}", totals.games)?;
    writeln!(
        writer,
        "Away wins: {}  Home wins: {}",
        totals.away_wins.to_string().green(),
        totals.home_wins.to_string().green()
    )?;
    writeln!(writer, "Home win rate: {:.1}%", totals.home_win_pct() * 100.0)?;
    writeln!(writer, "Runs per game: {:.2}", totals.runs_per_game())?;
    writeln!(writer, "Average innings: {:.2}", totals.average_innings())?;
    writeln!(writer, "Extra-inning games: {}", totals.extra_inning_games)?;
    if result.failures.is_empty() {
        writeln!(writer, "Failed games: {}", "0".green())?;
    } else {
        writeln!(
            writer,
            "Failed games: {}",
            result.failures.len().to_string().red()
        )?;
        for failure in &result.failures {
            writeln!(
                writer,
                "   • game {} (seed {}): {}",
                failure.index + 1,
                failure.seed,
                failure.error.red()
            )?;
        }
    }
    writeln!(writer, "Average time per game: {:?}", result.average_duration())?;
    writeln!(writer)?;

    if let Some(last) = result.games.last() {
        writeln!(writer, "{}", "🧾 Last Box Score".bright_yellow().bold())?;
        writeln!(writer, "{}", last.played.box_score)?;
    }

    writeln!(writer, "{}", "🏆 Standings".bright_yellow().bold())?;
    writeln!(writer, "{}", "===========".yellow())?;
    for (id, record) in league.records {
        writeln!(
            writer,
            "{id:<5}{:<14}{:>4}-{:<4} {:.3}  next starter #{}",
            record.name,
            record.wins,
            record.losses,
            record.win_pct(),
            record.starter_index + 1
        )?;
    }
    writeln!(writer)?;

    writeln!(writer, "{}", "⚾ Career Leaders (hits)".bright_yellow().bold())?;
    for (team, players) in league.career {
        let mut batters: Vec<_> = players.iter().filter(|(_, l)| l.at_bats > 0).collect();
        batters.sort_by(|a, b| b.1.hits.cmp(&a.1.hits).then_with(|| a.0.cmp(b.0)));
        for (name, line) in batters.into_iter().take(3) {
            writeln!(
                writer,
                "{team:<5}{name:<22}{:>4} H {:>4} AB {:>3} HR  .{:03.0}",
                line.hits,
                line.at_bats,
                line.home_runs,
                line.average() * 1000.0
            )?;
        }
    }
    Ok(())
}

pub fn generate_json_report(writer: &mut dyn Write, result: &BatchResult) -> Result<()> {
    let json_output = serde_json::to_string_pretty(result)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(
    writer: &mut dyn Write,
    result: &BatchResult,
    league: &LeagueView<'_>,
) -> Result<()> {
    let totals = &result.totals;
    writeln!(writer, "# Dugout Batch Results\n")?;
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Matchup**: {} at {}", result.away, result.home)?;
    writeln!(writer, "- **Master seed**: {}", result.master_seed)?;
    writeln!(writer, "- **Games**: {}", totals.games)?;
    writeln!(writer, "- **Failed games**: {}", result.failures.len())?;
    writeln!(writer, "- **Runs per game**: {:.2}", totals.runs_per_game())?;
    writeln!(writer, "- **Average innings**: {:.2}", totals.average_innings())?;
    writeln!(
        writer,
        "- **Home win rate**: {:.1}%\n",
        totals.home_win_pct() * 100.0
    )?;

    writeln!(writer, "## Games\n")?;
    if result.games.is_empty() {
        writeln!(writer, "_No games completed._\n")?;
    } else {
        writeln!(writer, "| # | Seed | Away | Home | Innings | Winner |")?;
        writeln!(writer, "|---|------|------|------|---------|--------|")?;
        for game in &result.games {
            let summary = &game.played.summary;
            writeln!(
                writer,
                "| {} | {} | {} {} | {} {} | {} | {} |",
                game.index + 1,
                game.played.seed,
                summary.away,
                summary.away_runs,
                summary.home,
                summary.home_runs,
                summary.innings,
                summary.winner_id().unwrap_or("-")
            )?;
        }
        writeln!(writer)?;
    }

    if !result.failures.is_empty() {
        writeln!(writer, "## Failures\n")?;
        for failure in &result.failures {
            writeln!(
                writer,
                "- Game {} (seed {}): {}",
                failure.index + 1,
                failure.seed,
                failure.error
            )?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "## Standings\n")?;
    for (id, record) in league.records {
        writeln!(
            writer,
            "- **{id}** {}: {}-{} ({:.3})",
            record.name,
            record.wins,
            record.losses,
            record.win_pct()
        )?;
    }
    Ok(())
}

pub fn generate_csv_report(writer: &mut dyn Write, result: &BatchResult) -> Result<()> {
    writeln!(
        writer,
        "game,seed,away,home,away_runs,home_runs,innings,winner,winning_pitcher,losing_pitcher,persisted,duration_ms"
    )?;
    for game in &result.games {
        let summary = &game.played.summary;
        let winner = match summary.winner {
            Some(Side::Away) => "away",
            Some(Side::Home) => "home",
            None => "tie",
        };
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            game.index + 1,
            game.played.seed,
            csv_field(&summary.away),
            csv_field(&summary.home),
            summary.away_runs,
            summary.home_runs,
            summary.innings,
            winner,
            csv_field(summary.winning_pitcher.as_deref().unwrap_or("")),
            csv_field(summary.losing_pitcher.as_deref().unwrap_or("")),
            game.played.persisted,
            game.duration.as_millis()
        )?;
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{BatchPlan, BatchRunner};
    use dugout_game::{GameEngine, MemoryStore, RosterBook, SimConfig};

    fn sample() -> (BatchResult, TeamRecords, CareerStats) {
        let mut engine = GameEngine::new(
            RosterBook::builtin(),
            MemoryStore::new(),
            SimConfig::default_config().clone(),
        );
        let plan = BatchPlan {
            away: "NYY".to_string(),
            home: "LAD".to_string(),
            games: 2,
            master_seed: 9,
        };
        let result = BatchRunner::new(false, false).run(&mut engine, &plan);
        (result, engine.team_records(), engine.career_stats())
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_report_lists_standings() {
        let (result, records, career) = sample();
        let league = LeagueView {
            records: &records,
            career: &career,
        };
        let text = render(|w| generate_console_report(w, &result, &league));
        assert!(text.contains("Batch Results Summary"));
        assert!(text.contains("Yankees"));
        assert!(text.contains("Career Leaders"));
    }

    #[test]
    fn markdown_report_has_a_row_per_game() {
        let (result, records, career) = sample();
        let league = LeagueView {
            records: &records,
            career: &career,
        };
        let text = render(|w| generate_markdown_report(w, &result, &league));
        assert!(text.starts_with("# Dugout Batch Results"));
        assert_eq!(text.lines().filter(|l| l.starts_with("| ") && !l.starts_with("| #")).count(), 2);
    }

    #[test]
    fn csv_report_has_header_and_rows() {
        let (result, _, _) = sample();
        let text = render(|w| generate_csv_report(w, &result));
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("game,seed,away,home"));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn json_report_round_trips() {
        let (result, _, _) = sample();
        let text = render(|w| generate_json_report(w, &result));
        let parsed: BatchResult = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.games.len(), 2);
        assert_eq!(parsed.master_seed, 9);
    }

    #[test]
    fn csv_fields_with_commas_are_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("Smith, Jr."), "\"Smith, Jr.\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
