//! Runs named SQL queries from a markfile and graphs the results.
//!
//! This is a rust rewrite of [mark], a little command-line query-and-graph
//! tool I kept reaching for. Keep a markfile next to your project, then:
//!
//! ```text
//!     mark errors:7
//!     mark errors:days=30
//!     mark -l
//! ```
//!
//! [mark]: https://github.com/dustinlacewell/mark
mod args;

use args::Args;
use clap::Parser;
use colored::Colorize;
use rusty_mark::db::DbConnection;
use rusty_mark::markfile::Markfile;
use rusty_mark::{compile, query_listing, ArgumentCall, Graph};

fn main() {
    env_logger::init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => {}
        Err(error) => {
            eprintln!(" {} {}", "✗".red(), error);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<(), rusty_mark::Error> {
    let path = Markfile::find(&args.markfile)?;
    let markfile = Markfile::load(&path)?;

    if args.list_queries {
        println!(
            "{}",
            format!("Available queries in `{}`", path.display()).bold()
        );
        print!("{}", query_listing(&markfile)?);
        return Ok(());
    }

    let raw = args
        .query
        .expect("clap requires the query unless --list-queries is set");
    let call = ArgumentCall::parse(&raw);

    let spec = markfile.spec(&call.query_name)?;
    let compiled = compile(&call.query_name, spec, &call)?;
    let graph = Graph::from_config(&call.query_name, spec.graph.as_ref(), &compiled.columns)?;

    let password = match &markfile.config.pass {
        Some(password) => password.clone(),
        None => dialoguer::Password::new()
            .with_prompt(format!(
                "Password for {}@{}",
                markfile.config.user, markfile.config.host
            ))
            .interact()?,
    };

    let db = DbConnection::connect(&markfile.config, &password)?;
    let rows = db.execute(&compiled.sql)?;

    if rows.is_empty() {
        println!(
            "{}",
            format!("Query `{}` returned no results.", call.query_name).yellow()
        );
    } else {
        println!("{}", call.query_name.bold().white());
        println!("{}", graph.render(&rows)?);
    }

    Ok(())
}
