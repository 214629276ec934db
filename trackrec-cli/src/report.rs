use std::io::Write;

use anyhow::Result;
use trackrec::RecommendationSet;

const RULE_WIDTH: usize = 50;

/// Write a human-readable report for one query.
pub fn write_text(out: &mut impl Write, set: &RecommendationSet) -> Result<()> {
    let rule = "-".repeat(RULE_WIDTH);
    writeln!(out)?;
    if set.is_not_found() {
        writeln!(out, "Track '{}' not found in the catalog.", set.query)?;
        writeln!(out, "No recommendations found.")?;
        return Ok(());
    }

    writeln!(out, "Recommendations for: **{}**", set.query)?;
    writeln!(out, "{rule}")?;
    for (rank, item) in set.items.iter().enumerate() {
        writeln!(out, "{}. Track: {}", rank + 1, item.track_name)?;
        writeln!(out, "   Artist: {}", item.artist_name)?;
        writeln!(out, "   Album: {}", item.album_name)?;
        writeln!(out, "   Score: {:.4}", item.score)?;
        writeln!(out, "{rule}")?;
    }
    Ok(())
}

/// Write one query's results as a single JSON line.
pub fn write_json(out: &mut impl Write, set: &RecommendationSet) -> Result<()> {
    serde_json::to_writer(&mut *out, set)?;
    writeln!(out)?;
    Ok(())
}
