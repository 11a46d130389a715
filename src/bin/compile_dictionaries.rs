//! Compile `<lang>_words.txt` word lists into binary trie dictionaries

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use app_core::dictionary::{compile_language, discover_languages};
use keyboard_companion::telemetry;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "compile-dictionaries", version, about = "Compile word lists into binary dictionaries")]
struct Args {
    /// Directory holding `<lang>_words.txt` files
    #[arg(long, default_value = "assets/dictionaries")]
    assets: PathBuf,
    /// Output directory, defaults to the assets directory
    #[arg(long)]
    out: Option<PathBuf>,
    /// Languages to compile; every word list found is compiled when omitted
    #[arg(long, num_args = 0..)]
    languages: Vec<String>,
}

fn main() -> Result<()> {
    telemetry::init("info");
    let args = Args::parse();

    let assets = args.assets;
    let out = args.out.unwrap_or_else(|| assets.clone());
    if !assets.is_dir() {
        bail!("Assets directory not found: {}", assets.display());
    }

    let languages = if args.languages.is_empty() {
        discover_languages(&assets)?
    } else {
        args.languages
    };
    if languages.is_empty() {
        bail!("No *_words.txt files found in {}", assets.display());
    }

    println!("Compiling languages: {}", languages.join(", "));
    for lang in &languages {
        let path = compile_language(lang, &assets, &out)
            .with_context(|| format!("failed to compile {lang}"))?;
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        println!("  {lang}.bin -> {} ({:.1} KB)", path.display(), size as f64 / 1024.0);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn args(raw: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("compile-dictionaries").chain(raw.iter().copied()))
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_languages_until_next_flag() {
        let parsed = args(&["--languages", "en", "hi", "--out", "build"]).unwrap();
        assert_eq!(parsed.languages, vec!["en", "hi"]);
        assert_eq!(parsed.out, Some(PathBuf::from("build")));
        assert_eq!(parsed.assets, PathBuf::from("assets/dictionaries"));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(args(&["--verbose"]).is_err());
        assert!(args(&["--assets"]).is_err());
    }
}
