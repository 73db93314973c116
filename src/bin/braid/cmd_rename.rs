use std::{convert::TryFrom, fs};

use prettytable::{cell, row, Table};

use braidstore::{
    err_at,
    graph::rename::{guess_renames, Candidate, MissingFile},
    Error, Result,
};

#[derive(Clone)]
pub struct Opt {
    basis: String,
    working: String,
}

impl TryFrom<crate::SubCommand> for Opt {
    type Error = Error;

    fn try_from(subcmd: crate::SubCommand) -> Result<Opt> {
        match subcmd {
            crate::SubCommand::RenameGuess { basis, working } => Ok(Opt { basis, working }),
            _ => unreachable!(),
        }
    }
}

/// One `file-id<TAB>path` entry from the basis manifest: `path` names a
/// file on disk holding that missing file's basis content.
fn read_basis_manifest(path: &str) -> Result<Vec<(String, Vec<u8>)>> {
    let text = err_at!(IoError, fs::read_to_string(path))?;
    let mut out = vec![];
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (file_id, content_path) = match line.split_once('\t') {
            Some(pair) => pair,
            None => return err_at!(MalformedFormat, msg: "bad basis manifest line: {:?}", line),
        };
        let content = err_at!(IoError, fs::read(content_path))?;
        out.push((file_id.to_string(), content));
    }
    Ok(out)
}

fn lines_of(content: &[u8]) -> Vec<Vec<u8>> {
    content.split(|&b| b == b'\n').map(|l| l.to_vec()).collect()
}

pub fn handle(opts: Opt) -> Result<()> {
    let basis_entries = read_basis_manifest(&opts.basis)?;
    let basis_lines: Vec<Vec<Vec<u8>>> = basis_entries.iter().map(|(_, c)| lines_of(c)).collect();
    let missing_files: Vec<MissingFile> = basis_entries
        .iter()
        .zip(basis_lines.iter())
        .map(|((file_id, _), lines)| MissingFile { file_id: file_id.as_bytes().to_vec(), basis_lines: lines })
        .collect();

    let working_text = err_at!(IoError, fs::read_to_string(&opts.working))?;
    let candidate_paths: Vec<&str> = working_text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let candidate_contents: Vec<Vec<u8>> = candidate_paths
        .iter()
        .map(|p| err_at!(IoError, fs::read(p)))
        .collect::<Result<Vec<_>>>()?;
    let candidate_lines: Vec<Vec<Vec<u8>>> = candidate_contents.iter().map(|c| lines_of(c)).collect();
    let candidates: Vec<Candidate> = candidate_paths
        .iter()
        .zip(candidate_lines.iter())
        .map(|(path, lines)| Candidate { path: path.to_string(), lines })
        .collect();

    let plan = guess_renames(
        braidstore::config::DEFAULT_RENAME_HASH_MODULUS,
        &missing_files,
        &candidates,
        &[],
        |_| None,
    );

    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_CLEAN);
    table.set_titles(row![Fy => "File-id", "Matched path"]);
    for m in &plan.file_matches {
        table.add_row(row![String::from_utf8_lossy(&m.file_id), m.path]);
    }
    table.printstd();

    Ok(())
}
