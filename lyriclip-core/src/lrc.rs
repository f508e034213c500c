use crate::error::ParseError;
use std::str::FromStr;
use std::time::Duration;

/// A single line of lyrics with its start time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    pub timestamp: Duration,
    pub text: String,
}

/// Parsed LRC document: lines sorted ascending by timestamp.
///
/// A timeline always holds at least one line and is never modified after
/// parsing, so it can be shared freely behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricTimeline {
    lines: Vec<LyricLine>,
}

impl LyricTimeline {
    /// Parse an LRC string into a timeline.
    ///
    /// Every `[mm:ss]`, `[mm:ss.xx]` or `[mm:ss:xx]` token on a line produces
    /// one entry carrying the line's remaining text. Lines without a
    /// timestamp, or whose text is empty once timestamps are stripped, are
    /// skipped. Lines sharing a timestamp keep their document order.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyResult`] if no timed line with text survives.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut lines = Vec::new();

        for raw in input.lines() {
            let (timestamps, text) = split_timestamps(raw);
            if timestamps.is_empty() || text.is_empty() {
                continue;
            }

            lines.extend(timestamps.into_iter().map(|timestamp| LyricLine {
                timestamp,
                text: text.clone(),
            }));
        }

        if lines.is_empty() {
            return Err(ParseError::EmptyResult);
        }

        // Stable: equal timestamps retain source order
        lines.sort_by_key(|line| line.timestamp);

        Ok(Self { lines })
    }

    /// Find the line active at `position`: the last line starting at or before it.
    #[must_use]
    pub fn line_at(&self, position: Duration) -> Option<&LyricLine> {
        self.line_index_at(position).and_then(|idx| self.lines.get(idx))
    }

    /// Index of the line active at `position`
    #[must_use]
    pub fn line_index_at(&self, position: Duration) -> Option<usize> {
        self.lines
            .partition_point(|line| line.timestamp <= position)
            .checked_sub(1)
    }

    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always `false` for a parsed timeline; paired with `len` for clippy's `len_without_is_empty`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl FromStr for LyricTimeline {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Pull every timestamp token out of a line, returning the timestamps in
/// order of appearance and the trimmed text that remains.
fn split_timestamps(line: &str) -> (Vec<Duration>, String) {
    let mut timestamps = Vec::new();
    let mut text = String::with_capacity(line.len());
    let mut remaining = line;

    while let Some(open) = remaining.find('[') {
        let after_open = &remaining[open + 1..];
        let Some(close) = after_open.find(']') else {
            break;
        };

        if let Some(time) = parse_timestamp(&after_open[..close]) {
            timestamps.push(time);
            text.push_str(&remaining[..open]);
            remaining = &after_open[close + 1..];
        } else {
            // Not a timestamp ([ar:..], [Chorus]); keep the bracket as text
            text.push_str(&remaining[..=open]);
            remaining = after_open;
        }
    }
    text.push_str(remaining);

    (timestamps, text.trim().to_string())
}

/// Parse a timestamp body like "01:23", "01:23.45" or "01:23:45".
///
/// Digit groups that overflow count as zero rather than rejecting the token.
fn parse_timestamp(s: &str) -> Option<Duration> {
    let (minutes, rest) = s.split_once(':')?;
    let (seconds, fraction) = match rest.find(|c: char| c == '.' || c == ':') {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };

    if !is_digits(minutes) || !is_digits(seconds) {
        return None;
    }
    if let Some(fraction) = fraction {
        if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    let minutes: u64 = minutes.parse().unwrap_or(0);
    let seconds: u64 = seconds.parse().unwrap_or(0);
    let millis = fraction.map_or(0, fraction_millis);

    Some(
        Duration::from_secs(minutes.saturating_mul(60).saturating_add(seconds))
            + Duration::from_millis(millis),
    )
}

/// Scale a 1-3 digit fraction to milliseconds ("5" = 500, "50" = 500, "050" = 50)
fn fraction_millis(fraction: &str) -> u64 {
    let value: u64 = fraction.parse().unwrap_or(0);
    match fraction.len() {
        1 => value * 100,
        2 => value * 10,
        _ => value,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts_at(timeline: &LyricTimeline) -> Vec<(u128, &str)> {
        timeline
            .lines()
            .iter()
            .map(|l| (l.timestamp.as_millis(), l.text.as_str()))
            .collect()
    }

    #[test]
    fn test_parse_simple_lrc() {
        let result = LyricTimeline::parse("[00:12.34]Hello world").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.lines()[0].timestamp, Duration::from_millis(12340));
        assert_eq!(result.lines()[0].text, "Hello world");
    }

    #[test]
    fn test_parse_without_fraction() {
        let result = LyricTimeline::parse("[01:05]No fraction").unwrap();
        assert_eq!(result.lines()[0].timestamp, Duration::from_secs(65));
    }

    #[test]
    fn test_parse_duplicate_timestamps_keep_source_order() {
        let input = "[00:01.00]Hello\n[00:03.50]World\n[00:03.50]World (dup)\n";
        let timeline = LyricTimeline::parse(input).unwrap();

        assert_eq!(
            texts_at(&timeline),
            vec![(1000, "Hello"), (3500, "World"), (3500, "World (dup)")]
        );
        assert_eq!(
            timeline.line_at(Duration::from_millis(3500)).unwrap().text,
            "World (dup)"
        );
    }

    #[test]
    fn test_parse_sorts_out_of_order_lines() {
        let input = r"
[00:15.00]Third
[00:05.00]First
[00:10.00]Second
[00:05.00]First again
";
        let timeline = LyricTimeline::parse(input).unwrap();
        assert_eq!(
            texts_at(&timeline),
            vec![
                (5000, "First"),
                (5000, "First again"),
                (10000, "Second"),
                (15000, "Third"),
            ]
        );
    }

    #[test]
    fn test_parse_multi_timestamp_line() {
        let timeline = LyricTimeline::parse("[00:05.00][00:15.00]Repeated lyric").unwrap();
        assert_eq!(
            texts_at(&timeline),
            vec![(5000, "Repeated lyric"), (15000, "Repeated lyric")]
        );
    }

    #[test]
    fn test_timestamps_anywhere_on_line_are_stripped() {
        let timeline = LyricTimeline::parse("  Oh [00:07.00] oh [00:09.00]  ").unwrap();
        assert_eq!(texts_at(&timeline), vec![(7000, "Oh  oh"), (9000, "Oh  oh")]);
    }

    #[test]
    fn test_metadata_lines_ignored() {
        let input = r"
[ti:Song Title]
[ar:Artist Name]
[al:Album Name]
[length: 03:20]
[00:05.00]Lyrics here
";
        let timeline = LyricTimeline::parse(input).unwrap();
        assert_eq!(texts_at(&timeline), vec![(5000, "Lyrics here")]);
    }

    #[test]
    fn test_non_timestamp_brackets_stay_in_text() {
        let timeline = LyricTimeline::parse("[00:05.00][Chorus] La la").unwrap();
        assert_eq!(timeline.lines()[0].text, "[Chorus] La la");
    }

    #[test]
    fn test_timing_markers_without_text_ignored() {
        let input = "[00:01.00]\n[00:02.00]   \n[00:03.00]Sung";
        let timeline = LyricTimeline::parse(input).unwrap();
        assert_eq!(texts_at(&timeline), vec![(3000, "Sung")]);
    }

    #[test]
    fn test_empty_result_for_untimed_text() {
        assert_eq!(
            LyricTimeline::parse("Just some\nplain lyrics"),
            Err(ParseError::EmptyResult)
        );
    }

    #[test]
    fn test_empty_result_for_metadata_only() {
        assert_eq!(
            LyricTimeline::parse("[ar:Someone]\n[ti:Something]\n[00:10.00]"),
            Err(ParseError::EmptyResult)
        );
        assert_eq!(LyricTimeline::parse(""), Err(ParseError::EmptyResult));
    }

    #[test]
    fn test_fraction_precision() {
        let timeline =
            LyricTimeline::parse("[00:01.5]Tenths\n[00:02.50]Hundredths\n[00:03.500]Millis")
                .unwrap();
        assert_eq!(
            texts_at(&timeline),
            vec![(1500, "Tenths"), (2500, "Hundredths"), (3500, "Millis")]
        );
    }

    #[test]
    fn test_alternative_timestamp_format() {
        // Some LRC files use mm:ss:xx format (colon instead of dot for hundredths)
        let timeline = LyricTimeline::parse("[00:12:34]Hello world").unwrap();
        assert_eq!(timeline.lines()[0].timestamp, Duration::from_millis(12340));
    }

    #[test]
    fn test_overflowing_component_counts_as_zero() {
        let timeline =
            LyricTimeline::parse("[99999999999999999999999:05.00]Huge minutes\n[00:10.00]Fine")
                .unwrap();
        assert_eq!(texts_at(&timeline), vec![(5000, "Huge minutes"), (10000, "Fine")]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let timeline = LyricTimeline::parse("[00:01.00]One\r\n[00:02.00]Two\r\n").unwrap();
        assert_eq!(texts_at(&timeline), vec![(1000, "One"), (2000, "Two")]);
    }

    #[test]
    fn test_parse_cjk_lyrics() {
        let timeline = LyricTimeline::parse("[00:05.00]你好世界").unwrap();
        assert_eq!(timeline.lines()[0].text, "你好世界");
    }

    #[test]
    fn test_line_at_boundaries() {
        let timeline = LyricTimeline::parse("[00:05.00]First\n[00:10.00]Second\n[00:15.00]Third")
            .unwrap();

        assert!(timeline.line_at(Duration::ZERO).is_none());
        assert!(timeline.line_at(Duration::from_millis(4999)).is_none());
        assert_eq!(timeline.line_at(Duration::from_secs(5)).unwrap().text, "First");
        assert_eq!(timeline.line_at(Duration::from_secs(7)).unwrap().text, "First");
        assert_eq!(timeline.line_at(Duration::from_secs(10)).unwrap().text, "Second");
        assert_eq!(timeline.line_at(Duration::from_secs(12)).unwrap().text, "Second");
        assert_eq!(timeline.line_at(Duration::from_secs(600)).unwrap().text, "Third");
    }

    #[test]
    fn test_line_index_at() {
        let timeline = LyricTimeline::parse("[00:05.00]First\n[00:10.00]Second").unwrap();
        assert_eq!(timeline.line_index_at(Duration::from_secs(1)), None);
        assert_eq!(timeline.line_index_at(Duration::from_secs(6)), Some(0));
        assert_eq!(timeline.line_index_at(Duration::from_secs(11)), Some(1));
    }

    #[test]
    fn test_from_str() {
        let timeline: LyricTimeline = "[00:02.00]Parsed".parse().unwrap();
        assert_eq!(timeline.lines()[0].timestamp, Duration::from_secs(2));
        assert_eq!(timeline.len(), 1);
        assert!(!timeline.is_empty());
    }
}
