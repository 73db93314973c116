use structopt::StructOpt;

use std::convert::TryFrom;

use braidstore::Result;

mod cmd_annotate;
mod cmd_check;
mod cmd_reconcile;
mod cmd_rename;
mod cmd_unmerged;
mod graphfile;

#[derive(Clone, StructOpt)]
#[structopt(name = "braid", about = "inspect and repair weave/knit version storage")]
pub struct Opt {
    #[structopt(subcommand)]
    subcmd: SubCommand,
}

#[derive(Clone, StructOpt)]
pub enum SubCommand {
    /// Check a stored weave, or a knit checked against a revision graph,
    /// for defects without repairing anything.
    Check {
        #[structopt(long = "weave", help = "path to a weave file")]
        weave: Option<String>,

        #[structopt(long = "knit", help = "path to a knit file")]
        knit: Option<String>,

        #[structopt(long = "graph", help = "revision-graph text file, required with --knit")]
        graph: Option<String>,
    },
    /// Repair a weave or knit's recorded parentage against a revision
    /// graph, writing the result back in place.
    Reconcile {
        #[structopt(long = "weave", help = "path to a weave file")]
        weave: Option<String>,

        #[structopt(long = "knit", help = "path to a knit file")]
        knit: Option<String>,

        #[structopt(long = "graph", help = "revision-graph text file")]
        graph: String,

        #[structopt(long = "thorough", help = "also check the mainline parent, not just ghosts")]
        thorough: bool,
    },
    /// Print per-line authorship for one version of a weave.
    Annotate {
        #[structopt(long = "weave", help = "path to a weave file")]
        weave: String,

        #[structopt(long = "rev", help = "version to annotate")]
        rev: String,
    },
    /// List revisions on each side's mainline that are absent from the
    /// other, given a revision-graph text file.
    Unmerged {
        #[structopt(long = "graph", help = "revision-graph text file")]
        graph: String,

        #[structopt(long = "local", help = "local branch tip")]
        local: String,

        #[structopt(long = "remote", help = "remote branch tip")]
        remote: String,

        #[structopt(long = "include-merges", help = "also list merged-in, non-mainline revisions")]
        include_merges: bool,
    },
    /// Guess renames between a basis manifest and a working-tree manifest.
    RenameGuess {
        #[structopt(long = "basis", help = "manifest of missing files: file-id<TAB>path")]
        basis: String,

        #[structopt(long = "working", help = "manifest of candidate paths: path (one per line)")]
        working: String,
    },
}

fn main() {
    let opts = Opt::from_iter(std::env::args_os());

    let res = handle_subcmd(opts);
    res.map_err(|e| println!("Error: {}", e)).ok();
}

fn handle_subcmd(opts: Opt) -> Result<()> {
    match opts.subcmd {
        c @ SubCommand::Check { .. } => cmd_check::handle(cmd_check::Opt::try_from(c)?),
        c @ SubCommand::Reconcile { .. } => cmd_reconcile::handle(cmd_reconcile::Opt::try_from(c)?),
        c @ SubCommand::Annotate { .. } => cmd_annotate::handle(cmd_annotate::Opt::try_from(c)?),
        c @ SubCommand::Unmerged { .. } => cmd_unmerged::handle(cmd_unmerged::Opt::try_from(c)?),
        c @ SubCommand::RenameGuess { .. } => cmd_rename::handle(cmd_rename::Opt::try_from(c)?),
    }
}
