use std::convert::TryFrom;

use braidstore::{err_at, knit, weave, Error, Result};

use crate::graphfile;

#[derive(Clone)]
pub struct Opt {
    weave: Option<String>,
    knit: Option<String>,
    graph: Option<String>,
}

impl TryFrom<crate::SubCommand> for Opt {
    type Error = Error;

    fn try_from(subcmd: crate::SubCommand) -> Result<Opt> {
        match subcmd {
            crate::SubCommand::Check { weave, knit, graph } => Ok(Opt { weave, knit, graph }),
            _ => unreachable!(),
        }
    }
}

pub fn handle(opts: Opt) -> Result<()> {
    match (opts.weave, opts.knit) {
        (Some(path), None) => {
            let (transport, name) = graphfile::transport_for(&path);
            let w = weave::format::read_from(&transport, &name)?;
            let report = w.check();
            print_defects(&report.defects);
        }
        (None, Some(path)) => {
            let graph_path = match opts.graph {
                Some(p) => p,
                None => return err_at!(Fatal, msg: "--graph is required with --knit"),
            };
            let graph = graphfile::load(&graph_path)?;
            let (transport, name) = graphfile::transport_for(&path);
            let k = knit::format::read_from(&transport, &name)?;
            let report = k.check_file_version_parents(&graph);
            print_defects(&report.defects);
        }
        _ => return err_at!(Fatal, msg: "exactly one of --weave or --knit is required"),
    }
    Ok(())
}

fn print_defects(defects: &[String]) {
    if defects.is_empty() {
        println!("ok: no defects found");
        return;
    }
    for d in defects {
        println!("defect: {}", d);
    }
    println!("{} defect(s) found", defects.len());
}
