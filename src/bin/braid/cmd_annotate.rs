use std::convert::TryFrom;

use prettytable::{cell, row, Table};

use braidstore::{graph::RevId, weave, Error, Result};

use crate::graphfile;

#[derive(Clone)]
pub struct Opt {
    weave: String,
    rev: String,
}

impl TryFrom<crate::SubCommand> for Opt {
    type Error = Error;

    fn try_from(subcmd: crate::SubCommand) -> Result<Opt> {
        match subcmd {
            crate::SubCommand::Annotate { weave, rev } => Ok(Opt { weave, rev }),
            _ => unreachable!(),
        }
    }
}

pub fn handle(opts: Opt) -> Result<()> {
    let (transport, name) = graphfile::transport_for(&opts.weave);
    let w = weave::format::read_from(&transport, &name)?;
    let annotated = w.annotate(&RevId::from(opts.rev.as_str()))?;

    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_CLEAN);
    table.set_titles(row![Fy => "Rev", "Line"]);
    for (rev_id, line) in &annotated {
        table.add_row(row![rev_id.to_string(), String::from_utf8_lossy(line)]);
    }
    table.printstd();

    Ok(())
}
