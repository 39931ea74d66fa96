// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The hidden `__complete` command driven by the shell completion scripts.
//!
//! Invoked as `lake __complete fs <command> <args...> <partial>`, it prints
//! one candidate per line and then `:<directive>`.

use crate::common::Backends;
use crate::completer::{Completer, Completion, Directive};

/// How an `fs` command's positional arguments complete
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathArgs {
    pub count: usize,
    pub only_dirs: bool,
}

/// Path arguments of each `fs` command
#[must_use]
pub fn path_args(command: &str) -> Option<PathArgs> {
    let (count, only_dirs) = match command {
        "cp" => (2, false),
        "ls" | "mkdir" => (1, true),
        "rm" | "cat" => (1, false),
        _ => return None,
    };
    Some(PathArgs { count, only_dirs })
}

/// Global options whose value is the following word
const VALUE_OPTIONS: &[&str] = &["-o", "--output", "--config"];

/// Count the words that are arguments rather than options or option values
fn count_positional(words: &[String]) -> usize {
    let mut count = 0;
    let mut skip_value = false;
    for word in words {
        if skip_value {
            skip_value = false;
        } else if word.starts_with('-') {
            skip_value = VALUE_OPTIONS.contains(&word.as_str());
        } else {
            count += 1;
        }
    }
    count
}

/// Drop global options given ahead of the command, along with their values
fn skip_leading_options(words: &[String]) -> &[String] {
    let mut rest = words;
    while let Some((first, tail)) = rest.split_first() {
        if !first.starts_with('-') || tail.is_empty() {
            break;
        }
        rest = if VALUE_OPTIONS.contains(&first.as_str()) && tail.len() > 1 {
            &tail[1..]
        } else {
            tail
        };
    }
    rest
}

fn nothing() -> Completion {
    Completion {
        candidates: Vec::new(),
        directive: Directive::NO_FILE_COMP,
    }
}

/// Complete the last word of `words`, the command line after `__complete`
pub async fn complete(backends: &Backends, words: &[String]) -> Completion {
    let words = skip_leading_options(words);
    let words = match words.first().map(String::as_str) {
        Some("fs") => &words[1..],
        _ => words,
    };
    let Some((command, rest)) = words.split_first() else {
        return nothing();
    };
    let Some((partial, before)) = rest.split_last() else {
        return nothing();
    };
    let Some(args) = path_args(command) else {
        return nothing();
    };

    let positional = count_positional(before);
    if positional >= args.count {
        return nothing();
    }
    Completer::new(backends, args.only_dirs).complete(partial).await
}

/// Complete and hand each output line to `handler`
pub async fn complete_command<F>(backends: &Backends, words: &[String], mut handler: F)
where
    F: FnMut(&str),
{
    let completion = complete(backends, words).await;
    for candidate in &completion.candidates {
        handler(candidate);
    }
    handler(&format!(":{}", completion.directive.bits()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_args() {
        assert_eq!(path_args("cp").unwrap().count, 2);
        assert!(path_args("ls").unwrap().only_dirs);
        assert!(path_args("mkdir").unwrap().only_dirs);
        assert!(!path_args("rm").unwrap().only_dirs);
        assert!(!path_args("cat").unwrap().only_dirs);
        assert!(path_args("bogus").is_none());
    }

    #[test]
    fn test_count_positional_skips_option_values() {
        let words = |ws: &[&str]| ws.iter().map(|w| w.to_string()).collect::<Vec<_>>();
        assert_eq!(count_positional(&words(&["-o", "json"])), 0);
        assert_eq!(count_positional(&words(&["--config", "x.yaml", "-r", "dbfs:/a"])), 1);
        assert_eq!(count_positional(&words(&["--output=json", "dbfs:/a"])), 1);
        assert_eq!(count_positional(&words(&["-l", "dbfs:/a"])), 1);
    }
}
