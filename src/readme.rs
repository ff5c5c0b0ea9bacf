//! Rewrites the marker-delimited statistics region of the profile README.
//!
//! The text strictly between the start and end markers belongs to this
//! program and is replaced wholesale on every run; everything outside the
//! region is preserved byte for byte.

use std::fs;

use anyhow::{Context, Result, bail};

use crate::stats::Stats;

pub const START_MARKER: &str = "<!--STATS_START-->";
pub const END_MARKER: &str = "<!--STATS_END-->";

const BADGE_URL: &str =
    "https://github-readme-stats.vercel.app/api?username=phoneminthu&show_icons=true";

/// Render the managed block placed between the markers.
fn format_stats_block(stats: &Stats) -> String {
    format!(
        "\n![GitHub Stats]({BADGE_URL})\n\
         🏆 **Contributions:** {}\n\
         📦 **Total commits:** {}\n\
         ✨ **Stars received:** {}\n\
         🔀 **PRs merged:** {}\n",
        stats.contributions, stats.commits, stats.stars, stats.merged_prs
    )
}

/// Replace the region strictly between the first start marker and the first
/// end marker with a freshly formatted block. Both markers are preserved, so
/// repeated application with the same snapshot is idempotent.
///
/// A missing marker, or an end marker that precedes the start marker, is an
/// error; no replacement text is produced.
pub fn apply_stats(document: &str, stats: &Stats) -> Result<String> {
    let Some(start) = document.find(START_MARKER) else {
        bail!("start marker {START_MARKER} not found in README");
    };
    let Some(end) = document.find(END_MARKER) else {
        bail!("end marker {END_MARKER} not found in README");
    };
    if end < start {
        bail!("end marker {END_MARKER} appears before start marker {START_MARKER}");
    }

    let head = &document[..start + START_MARKER.len()];
    let tail = &document[end..];

    Ok(format!("{head}{}{tail}", format_stats_block(stats)))
}

/// Read the README at `path`, patch the stats region, and write the full
/// text back. The write is not atomic; a crash mid-write can truncate the
/// file.
pub fn update_file(path: &str, stats: &Stats) -> Result<()> {
    let contents = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let updated = apply_stats(&contents, stats)?;
    fs::write(path, updated).with_context(|| format!("Failed to write {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn snapshot() -> Stats {
        Stats {
            contributions: 42,
            commits: 7,
            stars: 3,
            merged_prs: 1,
        }
    }

    #[test]
    fn replaces_only_the_marker_region() {
        let doc = format!("A{START_MARKER}old{END_MARKER}B");
        let updated = apply_stats(&doc, &snapshot()).unwrap();

        assert!(updated.starts_with(&format!("A{START_MARKER}")));
        assert!(updated.ends_with(&format!("{END_MARKER}B")));
        assert!(!updated.contains("old"));

        let start = updated.find(START_MARKER).unwrap() + START_MARKER.len();
        let end = updated.find(END_MARKER).unwrap();
        let block = &updated[start..end];

        assert!(block.contains("![GitHub Stats]("));
        assert_eq!(block.matches("42").count(), 1);
        assert_eq!(block.matches('7').count(), 1);
        assert_eq!(block.matches('3').count(), 1);
        assert_eq!(block.matches('1').count(), 1);
        assert_eq!(block.lines().filter(|l| l.contains("**")).count(), 4);
    }

    #[test]
    fn applying_twice_with_the_same_snapshot_is_idempotent() {
        let doc = format!("intro\n{START_MARKER}\nstale\n{END_MARKER}\noutro\n");
        let once = apply_stats(&doc, &snapshot()).unwrap();
        let twice = apply_stats(&once, &snapshot()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn missing_start_marker_is_an_error() {
        let err = apply_stats(&format!("no markers here {END_MARKER}"), &snapshot()).unwrap_err();
        assert!(err.to_string().contains("start marker"));
    }

    #[test]
    fn missing_end_marker_is_an_error() {
        let err = apply_stats(&format!("{START_MARKER} and nothing else"), &snapshot()).unwrap_err();
        assert!(err.to_string().contains("end marker"));
    }

    #[test]
    fn end_marker_before_start_marker_is_an_error() {
        let doc = format!("A{END_MARKER}middle{START_MARKER}B");
        let err = apply_stats(&doc, &snapshot()).unwrap_err();
        assert!(err.to_string().contains("appears before"));
    }

    #[test]
    fn update_file_round_trips_through_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "# Profile\n{START_MARKER}\nstale\n{END_MARKER}\nfooter\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        update_file(&path, &snapshot()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# Profile\n"));
        assert!(contents.ends_with("footer\n"));
        assert!(contents.contains("**Stars received:** 3"));
    }

    #[test]
    fn update_file_reports_a_missing_file() {
        let err = update_file("does-not-exist/README.md", &snapshot()).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
