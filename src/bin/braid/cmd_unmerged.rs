use std::convert::TryFrom;

use prettytable::{cell, row, Table};

use braidstore::{
    graph::{unmerged, RevId},
    Error, Result,
};

use crate::graphfile;

#[derive(Clone)]
pub struct Opt {
    graph: String,
    local: String,
    remote: String,
    include_merges: bool,
}

impl TryFrom<crate::SubCommand> for Opt {
    type Error = Error;

    fn try_from(subcmd: crate::SubCommand) -> Result<Opt> {
        match subcmd {
            crate::SubCommand::Unmerged { graph, local, remote, include_merges } => {
                Ok(Opt { graph, local, remote, include_merges })
            }
            _ => unreachable!(),
        }
    }
}

pub fn handle(opts: Opt) -> Result<()> {
    let graph = graphfile::load(&opts.graph)?;
    let local_tip = RevId::from(opts.local.as_str());
    let remote_tip = RevId::from(opts.remote.as_str());

    let (local_extra, remote_extra) = unmerged::find_unmerged(
        &graph,
        unmerged::FindUnmergedArgs {
            local_tip: &local_tip,
            remote_tip: &remote_tip,
            include_merges: opts.include_merges,
            backward: false,
            local_range: None,
            remote_range: None,
        },
    )?;

    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_CLEAN);
    table.set_titles(row![Fy => "Side", "Revno", "Rev"]);
    for u in &local_extra {
        table.add_row(row!["local", revno_str(&u.revno), u.rev.to_string()]);
    }
    for u in &remote_extra {
        table.add_row(row!["remote", revno_str(&u.revno), u.rev.to_string()]);
    }
    table.printstd();

    Ok(())
}

fn revno_str(revno: &unmerged::Revno) -> String {
    match revno {
        unmerged::Revno::Mainline(i) => i.to_string(),
        unmerged::Revno::Merged(parts) => {
            parts.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
        }
    }
}
