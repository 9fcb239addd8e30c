mod cli;

use anyhow::Context;
use yach_core::config::{load_from_file, merge_args, render_leaf};
use yach_core::{ConfigNode, Entry};

fn main() {
    if let Err(error) = run() {
        eprintln!("yach failed: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse_args();
    yach_core::logging::init_tracing(&args.log_level);

    let mut tree = match &args.seed {
        Some(path) => load_from_file(path)?,
        None => ConfigNode::new(),
    };

    let command = args.command.unwrap_or_default();
    merge_args(&mut tree, command.overrides()).context("failed to apply overrides")?;
    tracing::debug!(keys = tree.len(), "configuration ready");

    match command {
        cli::Command::Dump { json: true, .. } => {
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        cli::Command::Dump { json: false, .. } => {
            print!("{}", tree.pprint(Some(args.skip_prefix.as_str())));
        }
        cli::Command::Get { path, .. } => match tree.get(&path)? {
            Entry::Node(node) => print!("{}", node.pprint(Some(args.skip_prefix.as_str()))),
            Entry::Value(value) => println!("{}", render_leaf(value)),
        },
        cli::Command::Has { path, .. } => {
            println!("{}", tree.has(&path));
        }
    }

    Ok(())
}
