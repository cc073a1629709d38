// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The subset of the lm-sensors configuration language used for labelling.
//!
//! # Grammar
//! ```text
//! # comment
//! chip "coretemp-*" "k10temp-*"
//!     label temp1 "Package"
//!     ignore temp3
//!     compute in0 @*2, @/2      # accepted, not evaluated
//!     set in0_min 1.0           # accepted, not evaluated
//! bus "i2c-0" "SMBus I801"      # accepted, not evaluated
//! ```
//!
//! Only `label` and `ignore` influence a scan. Chip patterns may contain
//! `*` wildcards and are matched against both the full chip id
//! (`coretemp-hwmon1`) and the bare chip name (`coretemp`). When several
//! blocks match, later blocks take precedence for labels.

use crate::DriverError;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// A parsed configuration source.
#[derive(Debug, Clone, Default)]
pub struct SensorsConfig {
    blocks: Vec<ChipBlock>,
}

/// One `chip` block and the statements that followed it.
#[derive(Debug, Clone, Default)]
struct ChipBlock {
    patterns: Vec<String>,
    labels: HashMap<String, String>,
    ignored: HashSet<String>,
}

impl ChipBlock {
    fn matches(&self, chip_id: &str, chip_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| glob_match(p, chip_id) || glob_match(p, chip_name))
    }
}

impl SensorsConfig {
    /// Reads and parses a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, DriverError> {
        let content = std::fs::read_to_string(path).map_err(|e| DriverError::Config {
            path: path.display().to_string(),
            detail: format!("cannot read: {e}"),
        })?;
        Self::parse(&content, path)
    }

    /// Parses configuration text. `origin` is only used in error messages.
    ///
    /// A line ending in an unquoted `\` continues on the next line. Errors
    /// in a continued statement report the line the statement starts on.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, DriverError> {
        let mut blocks: Vec<ChipBlock> = Vec::new();
        let mut statement: Vec<String> = Vec::new();
        let mut statement_line: Option<usize> = None;

        for (idx, raw) in text.lines().enumerate() {
            let lineno = idx + 1;
            let (tokens, continued) =
                tokenize(raw).map_err(|detail| config_error(origin, lineno, detail))?;

            let start = *statement_line.get_or_insert(lineno);
            statement.extend(tokens);
            if continued {
                continue;
            }

            apply_statement(&mut blocks, &statement, start, origin)?;
            statement.clear();
            statement_line = None;
        }

        if let Some(start) = statement_line {
            apply_statement(&mut blocks, &statement, start, origin)?;
        }

        Ok(Self { blocks })
    }

    /// Returns the configured label for a feature, if any block sets one.
    pub fn label_for(&self, chip_id: &str, chip_name: &str, feature: &str) -> Option<&str> {
        self.blocks
            .iter()
            .rev()
            .filter(|b| b.matches(chip_id, chip_name))
            .find_map(|b| b.labels.get(feature))
            .map(String::as_str)
    }

    /// Returns `true` if a matching block ignores the feature.
    pub fn is_ignored(&self, chip_id: &str, chip_name: &str, feature: &str) -> bool {
        self.blocks
            .iter()
            .filter(|b| b.matches(chip_id, chip_name))
            .any(|b| b.ignored.contains(feature))
    }

    /// Number of `chip` blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }
}

fn config_error(origin: &Path, lineno: usize, detail: String) -> DriverError {
    DriverError::Config {
        path: origin.display().to_string(),
        detail: format!("line {lineno}: {detail}"),
    }
}

/// Applies one complete statement to the block list.
fn apply_statement(
    blocks: &mut Vec<ChipBlock>,
    tokens: &[String],
    lineno: usize,
    origin: &Path,
) -> Result<(), DriverError> {
    let err = |detail: String| config_error(origin, lineno, detail);
    let Some((keyword, args)) = tokens.split_first() else {
        return Ok(());
    };

    match keyword.as_str() {
        "chip" => {
            if args.is_empty() {
                return Err(err("chip statement needs at least one pattern".into()));
            }
            blocks.push(ChipBlock {
                patterns: args.to_vec(),
                ..Default::default()
            });
        }
        "label" => {
            let block = blocks
                .last_mut()
                .ok_or_else(|| err("label outside of a chip block".into()))?;
            match args {
                [feature, text] => {
                    block.labels.insert(feature.clone(), text.clone());
                }
                _ => return Err(err("expected: label <feature> \"<text>\"".into())),
            }
        }
        "ignore" => {
            let block = blocks
                .last_mut()
                .ok_or_else(|| err("ignore outside of a chip block".into()))?;
            match args {
                [feature] => {
                    block.ignored.insert(feature.clone());
                }
                _ => return Err(err("expected: ignore <feature>".into())),
            }
        }
        "bus" | "set" | "compute" => {
            tracing::trace!("sensors config line {lineno}: '{keyword}' not evaluated");
        }
        other => return Err(err(format!("unknown statement '{other}'"))),
    }

    Ok(())
}

/// Splits a line into whitespace-separated words and double-quoted strings,
/// dropping anything after an unquoted `#`.
///
/// The flag is `true` when the line ends in an unquoted `\`; the
/// statement continues on the next line.
fn tokenize(line: &str) -> Result<(Vec<String>, bool), String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '#' {
            break;
        } else if c == '\\' && chars.clone().skip(1).all(char::is_whitespace) {
            return Ok((tokens, true));
        } else if c == '"' {
            chars.next();
            let mut quoted = String::new();
            let mut closed = false;
            while let Some(q) = chars.next() {
                match q {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            quoted.push(escaped);
                        }
                    }
                    _ => quoted.push(q),
                }
            }
            if !closed {
                return Err("unterminated string".into());
            }
            tokens.push(quoted);
        } else {
            let mut word = String::new();
            while let Some(&w) = chars.peek() {
                if w.is_whitespace() || w == '#' || w == '"' {
                    break;
                }
                word.push(w);
                chars.next();
            }
            tokens.push(word);
        }
    }

    Ok((tokens, false))
}

/// Matches `text` against a pattern where `*` matches any run of characters.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Intel CPUs
chip "coretemp-*"
    label temp1 "Package id 0"
    label temp2 "Core 0"
    ignore temp9

chip "nct6775-*"
    label in0 "Vcore"
    compute in0 @*2, @/2
    set in0_min 0.8
    ignore fan2

bus "i2c-0" "SMBus I801 adapter"
"#;

    fn parse(text: &str) -> Result<SensorsConfig, DriverError> {
        SensorsConfig::parse(text, Path::new("test.conf"))
    }

    #[test]
    fn test_parse_sample() {
        let c = parse(SAMPLE).unwrap();
        assert_eq!(c.num_blocks(), 2);
        assert_eq!(
            c.label_for("coretemp-hwmon1", "coretemp", "temp2"),
            Some("Core 0")
        );
        assert_eq!(c.label_for("nct6775-hwmon2", "nct6775", "in0"), Some("Vcore"));
        assert_eq!(c.label_for("nct6775-hwmon2", "nct6775", "temp2"), None);
        assert!(c.is_ignored("coretemp-hwmon1", "coretemp", "temp9"));
        assert!(!c.is_ignored("nct6775-hwmon2", "nct6775", "temp9"));
    }

    #[test]
    fn test_bare_name_pattern() {
        let c = parse("chip \"acpitz\"\n label temp1 \"Board\"\n").unwrap();
        assert_eq!(c.label_for("acpitz-hwmon0", "acpitz", "temp1"), Some("Board"));
    }

    #[test]
    fn test_later_block_wins() {
        let text = "chip \"*\"\n label temp1 \"generic\"\nchip \"k10temp-*\"\n label temp1 \"Tctl\"\n";
        let c = parse(text).unwrap();
        assert_eq!(c.label_for("k10temp-hwmon3", "k10temp", "temp1"), Some("Tctl"));
        assert_eq!(c.label_for("other-hwmon0", "other", "temp1"), Some("generic"));
    }

    #[test]
    fn test_empty_config() {
        let c = parse("# nothing here\n\n").unwrap();
        assert_eq!(c.num_blocks(), 0);
        assert_eq!(c.label_for("a", "a", "temp1"), None);
    }

    #[test]
    fn test_label_outside_block() {
        let err = parse("label temp1 \"x\"\n").unwrap_err();
        assert!(matches!(err, DriverError::Config { .. }));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_unknown_statement() {
        let err = parse("chip \"a\"\nfrobnicate temp1\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(parse("chip \"coretemp-*\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = SensorsConfig::from_file(Path::new("/nonexistent/sensors3.conf"));
        assert!(matches!(result, Err(DriverError::Config { .. })));
    }

    #[test]
    fn test_tokenize_comment_and_escape() {
        let (t, continued) = tokenize(r#"label temp1 "Core \"A\"" # trailing"#).unwrap();
        assert_eq!(t, vec!["label", "temp1", "Core \"A\""]);
        assert!(!continued);
    }

    #[test]
    fn test_tokenize_continuation() {
        let (t, continued) = tokenize(r#"chip "lm85-*" \  "#).unwrap();
        assert_eq!(t, vec!["chip", "lm85-*"]);
        assert!(continued);

        // A backslash inside a quoted string or a word is not a continuation.
        let (t, continued) = tokenize(r#"label in0 "a\\""#).unwrap();
        assert_eq!(t, vec!["label", "in0", "a\\"]);
        assert!(!continued);
        assert!(!tokenize(r"set in0_min a\b").unwrap().1);
    }

    #[test]
    fn test_continued_chip_statement() {
        let text = "chip \"lm85-*\" \\\n    \"emc6d100-*\"\n    label in0 \"V1.5\"\n";
        let c = parse(text).unwrap();
        assert_eq!(c.num_blocks(), 1);
        assert_eq!(c.label_for("lm85-hwmon0", "lm85", "in0"), Some("V1.5"));
        assert_eq!(c.label_for("emc6d100-hwmon1", "emc6d100", "in0"), Some("V1.5"));
    }

    #[test]
    fn test_error_line_after_continuation() {
        let text = "chip \"a\" \\\n  \"b\"\nlabel in0 \"x\"\nbogus\n";
        let err = parse(text).unwrap_err();
        assert!(err.to_string().contains("line 4"), "{err}");

        let err = parse("chip \\\n\n").unwrap_err();
        assert!(err.to_string().contains("line 1"), "{err}");
    }

    #[test]
    fn test_continuation_at_end_of_file() {
        let c = parse("chip \"a-*\" \\\n").unwrap();
        assert_eq!(c.num_blocks(), 1);
    }

    /// Excerpt of the `sensors3.conf` shipped with lm-sensors.
    const STOCK_EXCERPT: &str = r#"
# libsensors configuration file
# -----------------------------
#
# This default configuration file only includes statements which do not
# differ from one mainboard to the next. Only label, compute and set
# statements for internal voltage and temperature sensors are included.

chip "lm78-*" "lm79-*" "lm80-*" "lm96080-*"

    label temp1 "M/B Temp"


chip "lm85-*" "lm85b-*" "lm85c-*" "adm1027-*" "adt7463-*" "adt7468-*" \
     "emc6d100-*" "emc6d102-*" "emc6d103-*" "emc6d103s-*" 

    label in1 "Vcore"
    label in2 "+3.3V"
    label in3 "+5V"
    label in4 "+12V"

    set in2_min  3.3 * 0.90
    set in2_max  3.3 * 1.10

# Depending on the hardware setup, the ADT7468 may report incorrect
# voltage values. In that case, adjust the compute lines.
    label temp2 "M/B Temp"


chip "w83627ehf-*" "w83627dhg-*" "w83667hg-*" "nct6775-*" "nct6776-*" \
     "nct6779-*" "nct6791-*" "nct6795-*" "nct6796-*"

    label in0 "Vcore"
    label in2 "AVCC"
    label in3 "+3.3V"
    label in7 "3VSB"
    label in8 "Vbat"

    set in2_min  3.3 * 0.90
    set in2_max  3.3 * 1.10

chip "f71808e-*" "f71808a-*" "f71862fg-*" "f71869-*" "f71869a-*" "f71882fg-*" \
     "f71889fg-*" "f71889ed-*" "f71889a-*"

    label in0 "+3.3V"
    label in7 "3VSB"
    label in8 "Vbat"

    compute in0  @*2, @/2
    compute in7  @*2, @/2
    compute in8  @*2, @/2

chip "it8720-*"
    compute in3  @ * (1 + 34/51), @ / (1 + 34/51)
"#;

    #[test]
    fn test_parse_stock_excerpt() {
        let c = parse(STOCK_EXCERPT).unwrap();
        assert_eq!(c.num_blocks(), 5);
        assert_eq!(c.label_for("lm80-i2c-0-2d", "lm80", "temp1"), Some("M/B Temp"));
        assert_eq!(
            c.label_for("emc6d103s-i2c-1-2e", "emc6d103s", "temp2"),
            Some("M/B Temp")
        );
        assert_eq!(c.label_for("nct6796-isa-0290", "nct6796", "in0"), Some("Vcore"));
        assert_eq!(c.label_for("f71889a-isa-0480", "f71889a", "in8"), Some("Vbat"));
        assert_eq!(c.label_for("coretemp-isa-0000", "coretemp", "temp1"), None);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("coretemp-*", "coretemp-hwmon1"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("*-isa-*", "it8712-isa-0290"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("coretemp-*", "k10temp-hwmon1"));
        assert!(!glob_match("exact", "exactly"));
    }
}
