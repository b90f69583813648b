use std::{fs, io, path::Path};

use miette::NamedSource;
use tracing::debug;

use crate::error::{Error, Result};

/// Ordered instruction words, ready to be placed in memory from address 0.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Program {
    words: Vec<u8>,
}

impl Program {
    pub fn words(&self) -> &[u8] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl From<Vec<u8>> for Program {
    fn from(words: Vec<u8>) -> Self {
        Program { words }
    }
}

/// Reads the textual program format: one base-2 word per line, anything after
/// `#` is a comment, blank lines are skipped.
pub struct ProgramLoader;

impl ProgramLoader {
    pub fn from_path(path: &Path) -> Result<Program> {
        let src = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => Error::ProgramNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::ProgramRead {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let program = Self::parse(&path.display().to_string(), &src)?;
        debug!(path = %path.display(), words = program.len(), "read program");
        Ok(program)
    }

    /// Parse program text. `name` is only used to label diagnostics.
    pub fn parse(name: &str, src: &str) -> Result<Program> {
        let mut words = Vec::new();
        let mut offs = 0;
        for (idx, line) in src.split_inclusive('\n').enumerate() {
            let line_start = offs;
            offs += line.len();

            let code = line.split('#').next().unwrap_or_default();
            let word = code.trim();
            if word.is_empty() {
                continue;
            }
            let digits = word
                .strip_prefix("0b")
                .or_else(|| word.strip_prefix("0B"))
                .unwrap_or(word);
            match u8::from_str_radix(digits, 2) {
                Ok(val) => words.push(val),
                Err(_) => {
                    let start = line_start + (code.len() - code.trim_start().len());
                    return Err(Error::InvalidWord {
                        line: idx + 1,
                        src: NamedSource::new(name, src.to_string()),
                        span: (start, word.len()).into(),
                    });
                }
            }
        }
        Ok(Program { words })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let src = "\
# print8.ls8: Print the number 8 on the screen

10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";
        let program = ProgramLoader::parse("print8.ls8", src).unwrap();
        assert_eq!(
            program.words(),
            &[0b1000_0010, 0, 8, 0b0100_0111, 0, 0b0000_0001]
        );
    }

    #[test]
    fn accepts_prefixed_literals_and_crlf() {
        let program = ProgramLoader::parse("p", "0b101\r\n  0B11   #x\r\n#\r\n").unwrap();
        assert_eq!(program.words(), &[5, 3]);
    }

    #[test]
    fn empty_source_is_empty_program() {
        let program = ProgramLoader::parse("p", "# nothing here\n\n").unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn rejects_non_binary_word() {
        let src = "00000001\n  10000012 # typo\n";
        let err = ProgramLoader::parse("p", src).unwrap_err();
        let Error::InvalidWord { line, span, .. } = err else {
            panic!("expected invalid word, got {err:?}");
        };
        assert_eq!(line, 2);
        assert_eq!(span.offset(), 11);
        assert_eq!(span.len(), 8);
        assert_eq!(&src[11..19], "10000012");
    }

    #[test]
    fn rejects_word_wider_than_a_byte() {
        let err = ProgramLoader::parse("p", "100000000\n").unwrap_err();
        assert!(matches!(err, Error::InvalidWord { line: 1, .. }));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.ls8");
        let err = ProgramLoader::from_path(&path).unwrap_err();
        assert!(matches!(err, Error::ProgramNotFound { path: p } if p == path));
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("halt.ls8");
        fs::write(&path, "00000001 # HLT\n").unwrap();
        let program = ProgramLoader::from_path(&path).unwrap();
        assert_eq!(program, Program::from(vec![1]));
    }
}
