//! Reading pre-tagged documents from [CoNLL-U](https://universaldependencies.org/format.html) files.
//!
//! Each sentence becomes one [Doc]. Only the FORM, LEMMA and UPOS columns are used. Multiword token ranges
//! (`1-2`) and empty nodes (`1.1`) are skipped, `_` in LEMMA or UPOS leaves the property unset.

use fs_err::File;
use log::warn;
use std::{
    io::{self, BufRead, BufReader, Lines},
    path::Path,
};
use thiserror::Error;

use crate::types::{Doc, Token, UPos};

#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

const UNSET: &str = "_";

/// An iterator over the sentences of a CoNLL-U stream.
pub struct DocIter<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> DocIter<R> {
    pub fn new(reader: R) -> Self {
        DocIter {
            lines: reader.lines(),
            line: 0,
        }
    }
}

fn parse_token(line: &str, line_no: usize) -> Result<Option<Token>, Error> {
    let columns: Vec<_> = line.split('\t').collect();
    if columns.len() < 4 {
        return Err(Error::Malformed {
            line: line_no,
            reason: format!("expected at least 4 tab-separated columns, got {}", columns.len()),
        });
    }

    let id = columns[0];
    if id.contains('-') || id.contains('.') {
        return Ok(None);
    }
    if id.parse::<usize>().is_err() {
        return Err(Error::Malformed {
            line: line_no,
            reason: format!("invalid token id '{}'", id),
        });
    }

    let (form, lemma, upos) = (columns[1], columns[2], columns[3]);
    let mut token = Token::new(form);

    // a literal underscore token has an underscore lemma
    if lemma != UNSET || form == UNSET {
        token.set_lemma(lemma);
    }
    if upos != UNSET {
        match upos.parse::<UPos>() {
            Ok(pos) => token.set_pos(pos),
            Err(err) => {
                return Err(Error::Malformed {
                    line: line_no,
                    reason: err.to_string(),
                })
            }
        }
    }

    Ok(Some(token))
}

impl<R: BufRead> Iterator for DocIter<R> {
    type Item = Result<Doc, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut tokens = Vec::new();

        for line in &mut self.lines {
            self.line += 1;

            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            let line = line.trim_end_matches(&['\r', '\n'][..]);

            if line.trim().is_empty() {
                if tokens.is_empty() {
                    continue;
                }
                return Some(Ok(Doc::new(tokens)));
            }
            if line.starts_with('#') {
                continue;
            }

            match parse_token(line, self.line) {
                Ok(Some(token)) => tokens.push(token),
                Ok(None) => warn!("Skipping multiword token or empty node on line {}.", self.line),
                Err(err) => return Some(Err(err)),
            }
        }

        if tokens.is_empty() {
            None
        } else {
            Some(Ok(Doc::new(tokens)))
        }
    }
}

/// Iterates over the sentences of the CoNLL-U file at `path`.
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DocIter<BufReader<File>>, crate::Error> {
    Ok(DocIter::new(BufReader::new(File::open(path.as_ref())?)))
}

/// Reads all sentences from a CoNLL-U stream.
pub fn read_docs<R: BufRead>(reader: R) -> Result<Vec<Doc>, Error> {
    DocIter::new(reader).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# sent_id = 1
# text = The dogs were running.
1\tThe\tthe\tDET\tDT\t_\t2\tdet\t_\t_
2\tdogs\tdog\tNOUN\tNNS\t_\t4\tnsubj\t_\t_
3\twere\tbe\tAUX\tVBD\t_\t4\taux\t_\t_
4\trunning\trun\tVERB\tVBG\t_\t0\troot\t_\t_
5\t.\t.\tPUNCT\t.\t_\t4\tpunct\t_\t_

# sent_id = 2
1-2\tdon't\t_\t_\t_\t_\t_\t_\t_\t_
1\tdo\tdo\tAUX\t_\t_\t_\t_\t_\t_
2\tn't\tnot\tPART\t_\t_\t_\t_\t_\t_
2.1\tgo\tgo\tVERB\t_\t_\t_\t_\t_\t_
3\trun\t_\t_\t_\t_\t_\t_\t_\t_
";

    #[test]
    fn can_read_sentences() {
        let docs = read_docs(SAMPLE.as_bytes()).unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text(), "The dogs were running .");
        assert_eq!(docs[0][3].lemma(), Some("run"));
        assert_eq!(docs[0][3].pos(), Some(UPos::Verb));
    }

    #[test]
    fn skips_ranges_and_empty_nodes() {
        let docs = read_docs(SAMPLE.as_bytes()).unwrap();

        assert_eq!(docs[1].text(), "do n't run");
        assert_eq!(docs[1][2].lemma(), None);
        assert_eq!(docs[1][2].pos(), None);
    }

    #[test]
    fn reports_malformed_lines() {
        let result = read_docs("1\tdogs\tdog\tNNS\n".as_bytes());
        assert!(matches!(result, Err(Error::Malformed { line: 1, .. })));

        let result = read_docs("# comment\n1\tdogs\n".as_bytes());
        assert!(matches!(result, Err(Error::Malformed { line: 2, .. })));
    }
}
