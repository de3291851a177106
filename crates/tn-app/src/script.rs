//! Line based navigation scripts
//!
//! One command per line, `#` starts a comment:
//!
//! ```text
//! push details          # onto the active tab
//! push query search     # onto the search tab
//! pop {"picked": 3}
//! tap home
//! reset home --root
//! ```

use anyhow::{anyhow, bail, Context, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Push { screen: String, tab: Option<String> },
    Pop { result: Option<serde_json::Value> },
    /// Tab selector tap
    Tap { tab: String },
    Switch { tab: String },
    Reset { tab: String, new_root: bool },
    Root { tab: String, screen: String },
    Clear,
    State,
    /// Simulate process death and restore
    Recreate,
}

/// Parse one line. Blank lines and comments give `None`.
pub fn parse_line(line: &str) -> Result<Option<ScriptCommand>> {
    let line = match line.split_once('#') {
        Some((code, _)) => code,
        None => line,
    }
    .trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match word {
        "push" => match args.as_slice() {
            [screen] => ScriptCommand::Push { screen: screen.to_string(), tab: None },
            [screen, tab] => ScriptCommand::Push {
                screen: screen.to_string(),
                tab: Some(tab.to_string()),
            },
            _ => bail!("usage: push <screen> [tab]"),
        },
        "pop" => {
            let result = if rest.is_empty() {
                None
            } else {
                Some(serde_json::from_str(rest).context("pop result must be JSON")?)
            };
            ScriptCommand::Pop { result }
        }
        "tap" | "select" => ScriptCommand::Tap { tab: single(&args, word)? },
        "switch" => ScriptCommand::Switch { tab: single(&args, word)? },
        "reset" => match args.as_slice() {
            [tab] => ScriptCommand::Reset { tab: tab.to_string(), new_root: false },
            [tab, "--root"] => ScriptCommand::Reset { tab: tab.to_string(), new_root: true },
            _ => bail!("usage: reset <tab> [--root]"),
        },
        "root" => match args.as_slice() {
            [tab, screen] => ScriptCommand::Root {
                tab: tab.to_string(),
                screen: screen.to_string(),
            },
            _ => bail!("usage: root <tab> <screen>"),
        },
        "clear" => ScriptCommand::Clear,
        "state" => ScriptCommand::State,
        "recreate" => ScriptCommand::Recreate,
        other => return Err(anyhow!("Unknown command '{}'", other)),
    };

    Ok(Some(command))
}

fn single(args: &[&str], word: &str) -> Result<String> {
    match args {
        [tab] => Ok(tab.to_string()),
        _ => bail!("usage: {} <tab>", word),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push() {
        assert_eq!(
            parse_line("push details").unwrap(),
            Some(ScriptCommand::Push { screen: "details".into(), tab: None })
        );
        assert_eq!(
            parse_line("  push query search  # comment").unwrap(),
            Some(ScriptCommand::Push { screen: "query".into(), tab: Some("search".into()) })
        );
        assert!(parse_line("push").is_err());
    }

    #[test]
    fn test_parse_pop_result() {
        assert_eq!(parse_line("pop").unwrap(), Some(ScriptCommand::Pop { result: None }));

        let parsed = parse_line(r#"pop {"picked": 3}"#).unwrap();
        match parsed {
            Some(ScriptCommand::Pop { result: Some(result) }) => assert_eq!(result["picked"], 3),
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_line("pop {oops").is_err());
    }

    #[test]
    fn test_parse_tab_commands() {
        assert_eq!(
            parse_line("select home").unwrap(),
            Some(ScriptCommand::Tap { tab: "home".into() })
        );
        assert_eq!(
            parse_line("reset library --root").unwrap(),
            Some(ScriptCommand::Reset { tab: "library".into(), new_root: true })
        );
        assert_eq!(
            parse_line("root home welcome").unwrap(),
            Some(ScriptCommand::Root { tab: "home".into(), screen: "welcome".into() })
        );
        assert!(parse_line("switch").is_err());
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   # nothing").unwrap(), None);
        assert!(parse_line("fly away").is_err());
    }
}
