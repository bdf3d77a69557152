use thiserror::Error;

use crate::model::{Profile, ProfileBuilder};

#[derive(Debug, Error)]
pub enum CollapsedParseError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("no valid stack lines found")]
    Empty,
}

/// Parse Brendan Gregg's collapsed/folded stack format.
///
/// Each line has the format: `stack_frame;stack_frame;... count`
/// where frames are separated by `;` (root first) and the count is the last
/// whitespace-separated token. Every line becomes one sample weighted by its
/// count, in file order.
///
/// Used by: `perf script | stackcollapse-perf.pl`, dtrace, FlameGraph tools.
pub fn parse_collapsed(data: &[u8]) -> Result<Profile, CollapsedParseError> {
    let text = std::str::from_utf8(data)?;
    let mut builder = ProfileBuilder::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // "a;b;c 42"
        let Some(pos) = line.rfind(|c: char| c.is_whitespace()) else {
            continue;
        };
        let count: f64 = match line[pos + 1..].parse::<f64>() {
            Ok(count) if count.is_finite() && count >= 0.0 => count,
            _ => {
                tracing::trace!(line, "collapsed line without a usable count, weighting as 1");
                1.0
            }
        };

        let stack: Vec<_> = line[..pos]
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| builder.frame(name, None))
            .collect();
        if stack.is_empty() {
            continue;
        }
        builder.push_sample(stack, count);
    }

    if builder.sample_count() == 0 {
        return Err(CollapsedParseError::Empty);
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_names(profile: &Profile, i: usize) -> Vec<String> {
        profile.samples()[i]
            .stack
            .iter()
            .map(|f| f.name.to_string())
            .collect()
    }

    #[test]
    fn parse_basic_collapsed() {
        let input = b"main;foo;bar 10\nmain;foo;baz 20\nmain;qux 5\n";
        let profile = parse_collapsed(input).unwrap();

        assert_eq!(profile.samples().len(), 3);
        assert_eq!(profile.total_weight(), 35.0);
        // main, foo, bar, baz, qux
        assert_eq!(profile.frames().len(), 5);
        assert_eq!(stack_names(&profile, 0), vec!["main", "foo", "bar"]);
        assert_eq!(profile.samples()[2].weight, 5.0);

        // The same name on different lines is the same frame.
        assert_eq!(profile.samples()[0].stack[0], profile.samples()[2].stack[0]);
    }

    #[test]
    fn skips_comments_and_empty_lines() {
        let input = b"# comment\n\nmain;foo 5\n";
        let profile = parse_collapsed(input).unwrap();
        assert_eq!(profile.samples().len(), 1);
        assert_eq!(profile.frames().len(), 2);
    }

    #[test]
    fn names_with_spaces_and_tab_separated_counts() {
        let input = b"main;operator new(unsigned long)\t7\n";
        let profile = parse_collapsed(input).unwrap();
        assert_eq!(stack_names(&profile, 0), vec!["main", "operator new(unsigned long)"]);
        assert_eq!(profile.samples()[0].weight, 7.0);
    }

    #[test]
    fn non_finite_and_negative_counts_weigh_one() {
        let input = b"main;a inf\nmain;b -3\nmain;c NaN\nmain;d 4\n";
        let profile = parse_collapsed(input).unwrap();
        let weights: Vec<f64> = profile.samples().iter().map(|s| s.weight).collect();
        assert_eq!(weights, vec![1.0, 1.0, 1.0, 4.0]);
        assert_eq!(profile.total_weight(), 7.0);
    }

    #[test]
    fn empty_input_errors() {
        assert!(matches!(
            parse_collapsed(b""),
            Err(CollapsedParseError::Empty)
        ));
        assert!(matches!(
            parse_collapsed(b"# only a comment\n"),
            Err(CollapsedParseError::Empty)
        ));
    }
}
