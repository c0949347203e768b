//! Text forms of a [`Compilation`] and their persistence.

use std::{
    collections::BTreeMap,
    fmt::{Display, Write as _},
    fs,
    path::{Path, PathBuf},
};

use log::info;

use crate::Compilation;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("cannot create output directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn render_by_line<T: Display>(entries: &BTreeMap<usize, Vec<T>>) -> String {
    let mut out = String::new();
    for (line, items) in entries {
        let items: Vec<String> = items.iter().map(ToString::to_string).collect();
        // writing into a String cannot fail
        let _ = writeln!(out, "{line}.\t{}", items.join(" "));
    }
    out
}

pub fn render_tokens(compilation: &Compilation) -> String {
    render_by_line(&compilation.tokens)
}

pub fn render_lexical_errors(compilation: &Compilation) -> String {
    if compilation.lexical_errors.is_empty() {
        return "There is no lexical error.\n".to_string();
    }
    render_by_line(&compilation.lexical_errors)
}

pub fn render_lexemes(compilation: &Compilation) -> String {
    compilation
        .lexemes
        .iter()
        .enumerate()
        .map(|(i, lexeme)| format!("{}.\t{lexeme}\n", i + 1))
        .collect()
}

/// File name and contents of every report, in a fixed order.
pub fn render_all(compilation: &Compilation) -> Vec<(&'static str, String)> {
    vec![
        ("tokens.txt", render_tokens(compilation)),
        ("lexical_errors.txt", render_lexical_errors(compilation)),
        ("lexemes.txt", render_lexemes(compilation)),
        ("syntax_errors.txt", compilation.syntax_errors.to_string()),
        ("parse_tree.txt", compilation.parse_tree.to_string()),
        ("symbol_table.txt", compilation.symbol_table.to_string()),
        ("semantic_errors.txt", compilation.semantic_errors.to_string()),
        ("output.txt", compilation.program_text()),
    ]
}

/// Writes every report into `dir`, creating it when needed. Returns the written paths.
pub fn write_all(compilation: &Compilation, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = vec![];
    for (name, contents) in render_all(compilation) {
        let path = dir.join(name);
        fs::write(&path, contents).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;
        info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    #[test]
    fn tokens_are_grouped_by_line() {
        let compilation = compile("def main():\n  x = 1;\n;");
        assert_eq!(
            render_tokens(&compilation),
            "1.\t(KEYWORD, def) (ID, main) (SYMBOL, () (SYMBOL, )) (SYMBOL, :)\n\
             2.\t(ID, x) (SYMBOL, =) (NUM, 1) (SYMBOL, ;)\n\
             3.\t(SYMBOL, ;)\n"
        );
        assert_eq!(render_lexical_errors(&compilation), "There is no lexical error.\n");
    }

    #[test]
    fn lexemes_start_with_keywords() {
        let compilation = compile("def main():\n  x = 1;\n;");
        let lexemes = render_lexemes(&compilation);
        assert!(lexemes.starts_with("1.\tbreak\n"));
        assert!(lexemes.ends_with("9.\tmain\n10.\tx\n"));
    }

    #[test]
    fn write_all_creates_every_file() {
        let dir = std::env::temp_dir().join(format!("quadc-report-{}", std::process::id()));
        let compilation = compile("def main():\n  x = 1;\n;");
        let written = write_all(&compilation, &dir).unwrap();
        assert_eq!(written.len(), 8);
        let output = fs::read_to_string(dir.join("output.txt")).unwrap();
        assert!(output.starts_with("0\t(ASSIGN, #1, 1500, )\n"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
