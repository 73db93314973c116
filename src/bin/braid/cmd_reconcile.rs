use std::convert::TryFrom;

use braidstore::{config::Config, err_at, knit, lock::LockTable, reconcile::Reconciler, weave, Error, Result};

use crate::graphfile;

#[derive(Clone)]
pub struct Opt {
    weave: Option<String>,
    knit: Option<String>,
    graph: String,
    thorough: bool,
}

impl TryFrom<crate::SubCommand> for Opt {
    type Error = Error;

    fn try_from(subcmd: crate::SubCommand) -> Result<Opt> {
        match subcmd {
            crate::SubCommand::Reconcile { weave, knit, graph, thorough } => {
                Ok(Opt { weave, knit, graph, thorough })
            }
            _ => unreachable!(),
        }
    }
}

pub fn handle(opts: Opt) -> Result<()> {
    let graph = graphfile::load(&opts.graph)?;
    let reconciler = Reconciler::new(opts.thorough);
    let locks = LockTable::new();

    match (opts.weave, opts.knit) {
        (Some(path), None) => {
            let (transport, name) = graphfile::transport_for(&path);
            let w = weave::format::read_from(&transport, &name)?;
            let lock_path: std::ffi::OsString = path.clone().into();
            let (rebuilt, report) = reconciler.reconcile_weave(&locks, &lock_path, &w, &graph)?;
            weave::format::write_to(&transport, &name, &rebuilt)?;
            print_report(&report);
        }
        (None, Some(path)) => {
            let (transport, name) = graphfile::transport_for(&path);
            let k = knit::format::read_from(&transport, &name)?;
            let lock_path: std::ffi::OsString = path.clone().into();
            let dir = std::path::Path::new(&path).parent().unwrap_or_else(|| std::path::Path::new("."));
            let cfg = Config::load(dir)?;
            let (rebuilt, report) = reconciler.reconcile_knit(&locks, &lock_path, &k, &graph, &cfg)?;
            knit::format::write_to(&transport, &name, &rebuilt)?;
            print_report(&report);
        }
        _ => return err_at!(Fatal, msg: "exactly one of --weave or --knit is required"),
    }
    Ok(())
}

fn print_report(report: &braidstore::reconcile::ReconcileReport) {
    if report.aborted {
        println!("aborted: revision graph is inconsistent, nothing repaired");
        return;
    }
    println!("inconsistent parents fixed: {}", report.inconsistent_parents);
    println!("garbage versions: {}", report.garbage_versions);
}
