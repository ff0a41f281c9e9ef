//! Replay job manifest: one JSON object per line

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::replay::Team;

/// A decoded replay to sample, plus which team its first car plays for
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayJob {
    pub path: PathBuf,
    pub player1_team: Team,
}

#[derive(Debug, Deserialize)]
struct JobLine {
    path: PathBuf,
    player_team: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest line {line}: {source}")]
    Line {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Manifest line {line}: player_team must be 0 or 1, got {value}")]
    InvalidTeam { line: usize, value: u8 },
}

/// Parse manifest text. Blank lines and lines starting with `#` are skipped.
pub fn parse_manifest(text: &str) -> Result<Vec<ReplayJob>, ManifestError> {
    let mut jobs = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let job: JobLine =
            serde_json::from_str(raw).map_err(|source| ManifestError::Line { line, source })?;
        let player1_team = Team::try_from(job.player_team)
            .map_err(|value| ManifestError::InvalidTeam { line, value })?;

        jobs.push(ReplayJob {
            path: job.path,
            player1_team,
        });
    }

    Ok(jobs)
}

pub async fn load_manifest(path: &Path) -> Result<Vec<ReplayJob>, ManifestError> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_manifest(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_jobs_and_skips_comments() {
        let text = r#"
# decoded 1v1 replays
{"path": "replays/a.json", "player_team": 0}

{"path": "replays/b.json", "player_team": 1, "url": "ignored"}
"#;
        let jobs = parse_manifest(text).unwrap();
        assert_eq!(
            jobs,
            vec![
                ReplayJob {
                    path: PathBuf::from("replays/a.json"),
                    player1_team: Team::Blue,
                },
                ReplayJob {
                    path: PathBuf::from("replays/b.json"),
                    player1_team: Team::Orange,
                },
            ]
        );
    }

    #[test]
    fn reports_line_of_bad_team() {
        let err = parse_manifest("{\"path\": \"a.json\", \"player_team\": 0}\n{\"path\": \"b.json\", \"player_team\": 2}")
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidTeam { line: 2, value: 2 }));
    }

    #[test]
    fn reports_line_of_bad_json() {
        let err = parse_manifest("{\"path\": \"a.json\"}").unwrap_err();
        assert!(matches!(err, ManifestError::Line { line: 1, .. }));
    }
}
