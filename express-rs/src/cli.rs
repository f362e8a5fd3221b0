//! Command-line argument parsing.
//!
//! Usage:
//!   express [-d] [-r] [-f <file>] [-D <name>=<value>]... <expression>

use std::path::PathBuf;

use crate::config::{self, Config};
use crate::var::VarStore;

pub const USAGE: &str = "Usage: express [-d] [-r] [-f <file>] [-D <name>=<value>]... <expression>";

/// Environment variable naming a definitions file when `-f` is absent.
pub const VARS_ENV: &str = "EXPRESS_VARS";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Print the compiled RPN listing (`-r`).
    pub show_rpn: bool,
    /// Definitions file (`-f <file>`).
    pub defs_file: Option<PathBuf>,
    /// `name=value` definitions from `-D`, in order.
    pub defines: Vec<String>,
    /// The expression to evaluate.
    pub expression: String,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
///
/// Flags may be combined (`-dr`) and value flags may be attached (`-Dx=1`)
/// or separated (`-D x=1`). An argument such as `-3` that starts like a
/// number is the expression, not a flag.
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        if !arg.starts_with('-') || arg == "-" || looks_numeric(&arg[1..]) {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,
                'r' => args.show_rpn = true,

                // -f<file> / -f <file>, -D<def> / -D <def>
                flag @ ('f' | 'D') => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err(format!("-{flag} requires an argument"));
                    };
                    if flag == 'f' {
                        args.defs_file = Some(PathBuf::from(value));
                    } else {
                        args.defines.push(value);
                    }
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => Err("missing expression".to_owned()),
        1 => {
            args.expression = positional.remove(0);
            Ok(args)
        }
        n => Err(format!("too many arguments ({n}); quote the expression")),
    }
}

fn looks_numeric(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}

// ── Variables ─────────────────────────────────────────────────────────────────

/// Definitions file to load: `-f <file>`, else `$EXPRESS_VARS`, else none.
pub fn resolve_defs_file(cli_override: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(f) = cli_override {
        return Some(f.clone());
    }
    std::env::var_os(VARS_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Build the variable store from the definitions file and `-D` options.
///
/// Returns `Ok(None)` when nothing was defined, so evaluation runs without
/// a lookup. Bad lines in the file are returned as warnings; a bad `-D` or
/// an unreadable file is an error.
pub fn load_vars(args: &CliArgs) -> Result<(Option<VarStore>, Vec<String>), String> {
    let mut warnings = Vec::new();
    let mut vars = None;

    if let Some(path) = resolve_defs_file(args.defs_file.as_ref()) {
        let (cfg, errors) = Config::load_file(&path)
            .map_err(|e| format!("can't read {}: {e}", path.display()))?;
        warnings.extend(errors.iter().map(|e| format!("{}: {e}", path.display())));
        vars = Some(cfg.vars);
    }

    if !args.defines.is_empty() {
        let mut defined = VarStore::new();
        for def in &args.defines {
            let (name, value) = config::parse_definition(def).map_err(|e| format!("-D {e}"))?;
            defined.set(name, value);
        }
        vars.get_or_insert_with(VarStore::new).merge(defined);
    }

    Ok((vars, warnings))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::var::VarValue;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn expression_only() {
        let a = parse_argv(&argv(&["2 + 3"])).unwrap();
        assert_eq!(a.expression, "2 + 3");
        assert!(!a.debug && !a.show_rpn);
        assert!(a.defs_file.is_none());
        assert!(a.defines.is_empty());
    }

    #[test]
    fn missing_expression() {
        assert!(parse_argv(&argv(&[])).is_err());
        assert!(parse_argv(&argv(&["-d"])).is_err());
    }

    #[test]
    fn too_many_positional() {
        assert!(parse_argv(&argv(&["2", "+", "3"])).is_err());
    }

    #[test]
    fn bool_flags() {
        let a = parse_argv(&argv(&["-d", "-r", "x"])).unwrap();
        assert!(a.debug);
        assert!(a.show_rpn);
    }

    #[test]
    fn combined_bool_flags() {
        let a = parse_argv(&argv(&["-rd", "x"])).unwrap();
        assert!(a.debug && a.show_rpn);
    }

    #[test]
    fn defs_file_embedded_and_separate() {
        let a = parse_argv(&argv(&["-fvars.txt", "x"])).unwrap();
        assert_eq!(a.defs_file, Some(PathBuf::from("vars.txt")));
        let a = parse_argv(&argv(&["-f", "vars.txt", "x"])).unwrap();
        assert_eq!(a.defs_file, Some(PathBuf::from("vars.txt")));
    }

    #[test]
    fn defines_accumulate() {
        let a = parse_argv(&argv(&["-Dn=1", "-D", "s='a b'", "-rDm=2", "n + m"])).unwrap();
        assert_eq!(a.defines, ["n=1", "s='a b'", "m=2"]);
        assert!(a.show_rpn);
        assert_eq!(a.expression, "n + m");
    }

    #[test]
    fn value_flag_without_value() {
        assert!(parse_argv(&argv(&["x", "-D"])).is_err());
        assert!(parse_argv(&argv(&["x", "-f"])).is_err());
    }

    #[test]
    fn negative_number_is_the_expression() {
        let a = parse_argv(&argv(&["-3 * -2"])).unwrap();
        assert_eq!(a.expression, "-3 * -2");
        let a = parse_argv(&argv(&["-d", "-.5"])).unwrap();
        assert_eq!(a.expression, "-.5");
    }

    #[test]
    fn double_dash() {
        let a = parse_argv(&argv(&["-r", "--", "-x"])).unwrap();
        assert_eq!(a.expression, "-x");
    }

    #[test]
    fn unknown_flag() {
        assert!(parse_argv(&argv(&["-z", "x"])).is_err());
    }

    #[test]
    fn explicit_defs_file_wins() {
        let p = PathBuf::from("given.vars");
        assert_eq!(resolve_defs_file(Some(&p)), Some(p));
    }

    #[test]
    fn no_definitions_means_no_lookup() {
        let a = parse_argv(&argv(&["x"])).unwrap();
        if std::env::var_os(VARS_ENV).is_none() {
            let (vars, warnings) = load_vars(&a).unwrap();
            assert!(vars.is_none());
            assert!(warnings.is_empty());
        }
    }

    #[test]
    fn defines_build_a_store() {
        let a = parse_argv(&argv(&["-f", "/definitely/not/here", "x"])).unwrap();
        assert!(load_vars(&a).is_err());

        let mut a = parse_argv(&argv(&["-Dn=4", "-Dn=5", "-Dname=bob", "x"])).unwrap();
        a.defs_file = None;
        if std::env::var_os(VARS_ENV).is_none() {
            let (vars, _) = load_vars(&a).unwrap();
            let vars = vars.unwrap();
            assert_eq!(vars.get("n"), Some(&VarValue::Num(5.0)));
            assert_eq!(vars.get("name"), Some(&VarValue::Str("bob".into())));
        }
    }

    #[test]
    fn bad_define_is_an_error() {
        let a = parse_argv(&argv(&["-D", "9x=1", "x"])).unwrap();
        if std::env::var_os(VARS_ENV).is_none() {
            assert!(load_vars(&a).unwrap_err().starts_with("-D "));
        }
    }
}
