use std::collections::HashMap;
use std::{env, fs, process};

use anyhow::{Context, Result};
use mantran_config::Config;
use mantran_engine::{ExtractCatalog, MapCatalog, ParseError, Parser};
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} extract <manpage>", args[0]);
        eprintln!("       {} inject <manpage> <translations>", args[0]);
        eprintln!();
        eprintln!("extract prints the translatable units of a man page;");
        eprintln!("inject rebuilds the page using a tab-separated");
        eprintln!("msgid/msgstr file ('\\n' encodes a newline).");
        process::exit(1);
    }

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: failed to load config file: {e}");
            process::exit(1);
        }
    };

    // RUST_LOG wins over the config's debug streams.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.tracing_directives()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mode = args[1].as_str();
    let result = match mode {
        "extract" => run_extract(&config, &args[2]),
        "inject" => {
            if args.len() < 4 {
                eprintln!("Error: inject needs a translations file");
                process::exit(1);
            }
            run_inject(&config, &args[2], &args[3])
        }
        _ => {
            eprintln!("Error: unknown mode {mode:?}");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        let code = e
            .downcast_ref::<ParseError>()
            .map(ParseError::exit_code)
            .unwrap_or(1);
        process::exit(code);
    }
}

fn run_extract(config: &Config, path: &str) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let mut catalog = ExtractCatalog::new();
    let mut parser = Parser::new(config.to_options()?);
    parser.process_str(path, &text, &mut catalog)?;

    for unit in &catalog.units {
        println!("#: {}", unit.reference);
        if !unit.kind.is_empty() {
            println!("#. type: {}", unit.kind);
        }
        if let Some(comment) = &unit.comment {
            for line in comment.lines() {
                println!("# {line}");
            }
        }
        if !unit.wrap {
            println!("#, no-wrap");
        }
        println!("msgid \"{}\"", po_escape(&unit.msgid));
        println!("msgstr \"\"");
        println!();
    }
    Ok(())
}

fn run_inject(config: &Config, path: &str, translations: &str) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let entries =
        load_translations(translations).with_context(|| format!("reading {translations}"))?;
    let mut catalog = MapCatalog::new(entries);
    let mut parser = Parser::new(config.to_options()?);
    parser.process_str(path, &text, &mut catalog)?;
    print!("{}", catalog.output);
    Ok(())
}

/// One `msgid<TAB>msgstr` pair per line; `\n` and `\t` are escaped,
/// blank lines and `#` comments skipped.
fn load_translations(path: &str) -> Result<HashMap<String, String>> {
    let text = fs::read_to_string(path)?;
    let mut entries = HashMap::new();
    for line in text.lines() {
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((msgid, msgstr)) = line.split_once('\t') else {
            continue;
        };
        entries.insert(po_unescape(msgid), po_unescape(msgstr));
    }
    Ok(entries)
}

fn po_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

fn po_unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn po_escape_round_trips() {
        let original = "a \"quoted\"\nline\twith \\escapes";
        assert_eq!(po_unescape(&po_escape(original)), original);
    }

    #[test]
    fn translations_file_parses_pairs_and_skips_noise() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fr.tsv");
        std::fs::write(
            &path,
            "# a comment\nB<hello>\tB<bonjour>\n\nbroken line without tab\nmulti\\nline\tligne\\nmulti\n",
        )
        .unwrap();

        let entries = load_translations(path.to_str().unwrap()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["B<hello>"], "B<bonjour>");
        assert_eq!(entries["multi\nline"], "ligne\nmulti");
    }
}
