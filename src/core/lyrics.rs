use crate::domain::model::LyricsPage;

/// Splits lyric text into verses. A verse is a maximal run of non-blank lines;
/// blank or whitespace-only lines separate verses. Each verse is a slice of
/// the original text, so line endings inside a verse are kept as stored.
pub fn split_verses(text: &str) -> Vec<String> {
    let mut verses = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let content = match line.strip_suffix('\n') {
            Some(body) => body.strip_suffix('\r').unwrap_or(body),
            None => line,
        };

        if content.trim().is_empty() {
            if let Some((from, to)) = current.take() {
                verses.push(text[from..to].to_string());
            }
        } else {
            let end = start + content.len();
            current = Some(match current {
                Some((from, _)) => (from, end),
                None => (start, end),
            });
        }
    }

    if let Some((from, to)) = current {
        verses.push(text[from..to].to_string());
    }

    verses
}

/// Returns the verses on `page` (1-based). Zero `page` or `page_size` is
/// raised to 1. A page past the end is empty but still reports the total.
pub fn paginate_verses(verses: Vec<String>, page: u32, page_size: u32) -> LyricsPage {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = verses.len();

    let start = (u64::from(page) - 1).saturating_mul(u64::from(page_size));
    let end = start.saturating_add(u64::from(page_size)).min(total as u64);

    let verses = if start >= total as u64 {
        Vec::new()
    } else {
        verses
            .into_iter()
            .skip(start as usize)
            .take((end - start) as usize)
            .collect()
    };

    LyricsPage {
        verses,
        total,
        page,
        page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_VERSES: &str = "verse one\n\nverse two\n\nverse three";

    #[test]
    fn test_split_on_blank_lines() {
        assert_eq!(
            split_verses(THREE_VERSES),
            vec!["verse one", "verse two", "verse three"]
        );
    }

    #[test]
    fn test_split_keeps_multiline_verses_together() {
        let text = "line a\nline b\n\n\n\nline c\r\n   \r\nline d\n";
        assert_eq!(
            split_verses(text),
            vec!["line a\nline b", "line c", "line d"]
        );
    }

    #[test]
    fn test_split_keeps_crlf_inside_a_verse() {
        let text = "first line\r\nsecond line\r\n\r\nlast verse\r\n";
        assert_eq!(
            split_verses(text),
            vec!["first line\r\nsecond line", "last verse"]
        );
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_verses("").is_empty());
        assert!(split_verses("\n\n  \n").is_empty());
    }

    #[test]
    fn test_first_page() {
        let page = paginate_verses(split_verses(THREE_VERSES), 1, 1);
        assert_eq!(page.verses, vec!["verse one"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_partial_last_page() {
        let page = paginate_verses(split_verses(THREE_VERSES), 2, 2);
        assert_eq!(page.verses, vec!["verse three"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let page = paginate_verses(split_verses(THREE_VERSES), 10, 1);
        assert!(page.verses.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_zero_inputs_are_clamped() {
        let page = paginate_verses(split_verses(THREE_VERSES), 0, 0);
        assert_eq!(page.verses, vec!["verse one"]);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let page = paginate_verses(split_verses(THREE_VERSES), u32::MAX, u32::MAX);
        assert!(page.verses.is_empty());
        assert_eq!(page.total, 3);
    }
}
