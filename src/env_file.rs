//! `.env` support for the binary: `--env-file PATH`, otherwise `./.env` if present.
//! Values already in the process environment are never overwritten.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct LoadedEnvFile {
    pub path: PathBuf,
    /// Named on the command line rather than found in the working directory.
    pub explicit: bool,
    pub applied: usize,
}

/// Parsed command line of the binary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub env_file: Option<PathBuf>,
}

pub fn parse_args<I>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args = args.into_iter();
    let mut cli = CliArgs::default();
    while let Some(arg) = args.next() {
        let value = match arg.to_str() {
            Some("--env-file") => Some(
                args.next()
                    .map(PathBuf::from)
                    .ok_or_else(|| "`--env-file` requires a path argument".to_string())?,
            ),
            Some(s) if s.starts_with("--env-file=") => {
                let path = &s["--env-file=".len()..];
                if path.is_empty() {
                    return Err("`--env-file` requires a path argument".to_string());
                }
                Some(PathBuf::from(path))
            }
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        };
        if value.is_some() && cli.env_file.is_some() {
            return Err("`--env-file` provided more than once".to_string());
        }
        cli.env_file = value;
    }
    Ok(cli)
}

/// Load the file named by `cli`, or `.env` in `cwd` when none was given.
pub fn load(cli: &CliArgs, cwd: &Path) -> Result<Option<LoadedEnvFile>, String> {
    let (path, explicit) = match &cli.env_file {
        Some(path) if path.is_file() => (path.clone(), true),
        Some(path) => return Err(format!("env file not found: {}", path.display())),
        None => {
            let path = cwd.join(".env");
            if !path.is_file() {
                return Ok(None);
            }
            (path, false)
        }
    };
    let contents = fs::read_to_string(&path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let vars = parse(&contents).map_err(|e| format!("{}:{}", path.display(), e))?;

    let mut applied = 0;
    for (key, value) in vars {
        if std::env::var_os(&key).is_none() {
            // Only called from main before any other thread exists.
            unsafe {
                std::env::set_var(&key, value);
            }
            applied += 1;
        }
    }
    Ok(Some(LoadedEnvFile { path, explicit, applied }))
}

/// All assignments of a file, in order. Errors are prefixed with the line number.
pub fn parse(contents: &str) -> Result<Vec<(String, String)>, String> {
    let mut vars = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if let Some(pair) = parse_line(line).map_err(|e| format!("{}: {}", index + 1, e))? {
            vars.push(pair);
        }
    }
    Ok(vars)
}

fn parse_line(line: &str) -> Result<Option<(String, String)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let assignment = trimmed.strip_prefix("export ").map(str::trim_start).unwrap_or(trimmed);
    let (key, raw) = assignment
        .split_once('=')
        .ok_or_else(|| "missing '=' in assignment".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("environment variable name cannot be empty".to_string());
    }
    if key.chars().any(char::is_whitespace) {
        return Err(format!("environment variable name contains whitespace: {}", key));
    }
    Ok(Some((key.to_string(), parse_value(raw)?)))
}

fn parse_value(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix('"') {
        quoted(rest, '"', true)
    } else if let Some(rest) = raw.strip_prefix('\'') {
        quoted(rest, '\'', false)
    } else {
        Ok(raw.split('#').next().unwrap_or_default().trim_end().to_string())
    }
}

/// Body of a quoted value up to the closing `quote`; only a trailing comment may follow.
fn quoted(input: &str, quote: char, escapes: bool) -> Result<String, String> {
    let mut value = String::new();
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if escapes => match chars.next() {
                Some('n') => value.push('\n'),
                Some('r') => value.push('\r'),
                Some('t') => value.push('\t'),
                Some(other) => value.push(other),
                None => return Err("unterminated escape sequence in double-quoted value".to_string()),
            },
            c if c == quote => {
                let rest = chars.as_str().trim();
                return if rest.is_empty() || rest.starts_with('#') {
                    Ok(value)
                } else {
                    Err("unexpected characters after closing quote".to_string())
                };
            }
            other => value.push(other),
        }
    }
    Err("unterminated quoted value".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn parses_env_file_flag_forms() {
        assert_eq!(parse_args(args(&[])).unwrap(), CliArgs::default());
        assert_eq!(
            parse_args(args(&["--env-file", "prod.env"])).unwrap().env_file,
            Some(PathBuf::from("prod.env"))
        );
        assert_eq!(
            parse_args(args(&["--env-file=dev.env"])).unwrap().env_file,
            Some(PathBuf::from("dev.env"))
        );
        assert!(parse_args(args(&["--env-file"])).is_err());
        assert!(parse_args(args(&["--env-file=a", "--env-file=b"])).is_err());
        assert!(parse_args(args(&["--verbose"])).is_err());
    }

    #[test]
    fn parses_assignments() {
        let vars = parse(
            "# journal\n\
             DATABASE_URL=journal.db # local file\n\
             export SEED_DEMO_DATA = true\n\
             GREETING=\"good\\tmorning\" # comment\n\
             RAW='a # b'\n\
             EMPTY=\n",
        )
        .unwrap();
        assert_eq!(
            vars,
            vec![
                ("DATABASE_URL".to_string(), "journal.db".to_string()),
                ("SEED_DEMO_DATA".to_string(), "true".to_string()),
                ("GREETING".to_string(), "good\tmorning".to_string()),
                ("RAW".to_string(), "a # b".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn reports_line_of_bad_assignment() {
        let err = parse("A=1\nNOT AN ASSIGNMENT\n").unwrap_err();
        assert!(err.starts_with("2:"), "{}", err);
        assert!(parse("A=\"open").is_err());
        assert!(parse("A='x' trailing").is_err());
        assert!(parse("BAD KEY=1").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let cli = CliArgs {
            env_file: Some(PathBuf::from("/definitely/not/here.env")),
        };
        assert!(load(&cli, Path::new("/")).is_err());
    }
}
