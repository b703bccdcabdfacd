//! Trust-weighted XML merge CLI
//!
//! Reconciles several source documents into one trusted document according
//! to a rule definition file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xml_trust_merge::{
    load_rules_file, parse_file, MergeOptions, RuleTree, Rules, SourceDocuments, XmlDocumentMerger,
    XmlPrinter, XmlPrinterOptions, MAX_RULE_DEPTH,
};

/// Trust-weighted XML document merge tool
#[derive(Parser)]
#[command(name = "tm")]
#[command(version)]
#[command(about = "Trust-weighted XML document merge tool", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge source documents into a trusted document
    #[command(visible_alias = "m")]
    Merge {
        /// Rule definition file (.xml or .json)
        #[arg(short, long)]
        rules: PathBuf,

        /// Source document as NAME=PATH (repeatable)
        #[arg(short, long = "source", value_name = "NAME=PATH", required = true)]
        sources: Vec<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Indent the output
        #[arg(long)]
        pretty: bool,

        /// Stamp source="trusted" on the result root
        #[arg(long)]
        mark_trusted: bool,

        /// Fail on malformed path expressions instead of skipping the rule
        #[arg(long)]
        strict: bool,

        /// Maximum rule nesting depth
        #[arg(long, default_value_t = MAX_RULE_DEPTH)]
        max_depth: usize,

        /// Write the merge log as XML to this file
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Validate a rule definition file and print it as JSON
    #[command(visible_alias = "c")]
    CheckRules {
        /// Rule definition file (.xml or .json)
        rules: PathBuf,

        /// Maximum rule nesting depth
        #[arg(long, default_value_t = MAX_RULE_DEPTH)]
        max_depth: usize,
    },
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Merge {
            rules,
            sources,
            output,
            pretty,
            mark_trusted,
            strict,
            max_depth,
            log,
        } => {
            let options = MergeOptions {
                mark_trusted,
                strict_queries: strict,
                max_rule_depth: max_depth,
            };
            run_merge(&rules, &sources, output, pretty, options, log)
        }
        Commands::CheckRules { rules, max_depth } => run_check_rules(&rules, max_depth),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

/// Splits a `NAME=PATH` argument.
fn parse_source_arg(arg: &str) -> anyhow::Result<(String, PathBuf)> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("source '{}' is not in NAME=PATH form", arg))?;
    if name.is_empty() || path.is_empty() {
        bail!("source '{}' is not in NAME=PATH form", arg);
    }
    Ok((name.to_string(), PathBuf::from(path)))
}

fn load_rules(path: &Path) -> anyhow::Result<Rules> {
    load_rules_file(path).with_context(|| format!("failed to load rules from {}", path.display()))
}

/// Runs the merge.
fn run_merge(
    rules_path: &Path,
    source_args: &[String],
    output_path: Option<PathBuf>,
    pretty: bool,
    options: MergeOptions,
    log_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let rules = load_rules(rules_path)?;

    let mut sources = SourceDocuments::new();
    for arg in source_args {
        let (name, path) = parse_source_arg(arg)?;
        tracing::info!(source = name.as_str(), path = %path.display(), "parsing source");
        let document =
            parse_file(&path).with_context(|| format!("failed to parse {}", path.display()))?;
        if sources.insert(name.clone(), document).is_some() {
            bail!("source '{}' given more than once", name);
        }
    }

    let mut merger = XmlDocumentMerger::with_options(options);
    let trusted = merger.merge(&rules, &sources)?;

    if let Some(path) = &log_path {
        let mut writer = BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        );
        merger.log().write_xml(&mut writer)?;
        writer.flush()?;
    }

    let warnings = merger.log().warnings().len();
    if warnings > 0 {
        eprintln!("Merge produced {} warnings.", warnings);
    }

    let Some(trusted) = trusted else {
        bail!("merge produced no document: no trusted source supplied a root element");
    };

    let output: Box<dyn Write> = match &output_path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    };
    let printer_options = XmlPrinterOptions {
        pretty_print: pretty,
        ..Default::default()
    };
    XmlPrinter::with_options(output, printer_options).print(&trusted)?;

    tracing::info!("merge complete");
    Ok(())
}

/// Compiles every path expression a merge would compile for each rule.
fn check_queries(tree: &RuleTree) -> anyhow::Result<()> {
    for id in tree.ids() {
        for path in tree.query_paths(id) {
            xml_trust_merge::PathExpr::compile(&path)
                .with_context(|| format!("rule at {}", tree.get(id).path()))?;
        }
    }
    Ok(())
}

/// Loads and compiles a rule file, then prints it as JSON.
fn run_check_rules(rules_path: &Path, max_depth: usize) -> anyhow::Result<()> {
    let rules = load_rules(rules_path)?;
    let Some(docroot) = &rules.rule else {
        bail!("{} has no docroot rule", rules_path.display());
    };
    let tree = RuleTree::build(docroot, max_depth)?;
    check_queries(&tree)?;
    for id in tree.ids() {
        let rule = tree.get(id);
        if rule.field().stop && rule.has_children() {
            eprintln!("warning: stop rule at {} has children that will be ignored", rule.path());
        }
    }

    println!("{}", xml_trust_merge::rules::rules_to_json(&rules)?);
    eprintln!("{} rules OK.", tree.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_arg() {
        let (name, path) = parse_source_arg("fdb=data/fdb.xml").unwrap();
        assert_eq!(name, "fdb");
        assert_eq!(path, PathBuf::from("data/fdb.xml"));

        // Only the first '=' separates
        let (name, path) = parse_source_arg("a=b=c.xml").unwrap();
        assert_eq!(name, "a");
        assert_eq!(path, PathBuf::from("b=c.xml"));

        assert!(parse_source_arg("fdb").is_err());
        assert!(parse_source_arg("=x.xml").is_err());
        assert!(parse_source_arg("fdb=").is_err());
    }

    #[test]
    fn test_check_queries_covers_unfiltered_path() {
        use xml_trust_merge::Rule;

        let valid = Rule::new("test").with_rule(Rule::new("item").with_filter("[1]"));
        assert!(check_queries(&RuleTree::build(&valid, MAX_RULE_DEPTH).unwrap()).is_ok());

        // "/test/item[1]" compiles on its own, the fallback "/test/item[1" does not
        let split = Rule::new("test").with_rule(Rule::new("item[1").with_filter("]"));
        let tree = RuleTree::build(&split, MAX_RULE_DEPTH).unwrap();
        let item = tree.get(tree.root()).children()[0];
        assert!(xml_trust_merge::PathExpr::compile(tree.get(item).path()).is_ok());
        assert!(check_queries(&tree).is_err());
    }

    #[test]
    fn test_cli_parses_merge() {
        let cli = Cli::try_parse_from([
            "tm", "-vv", "merge", "--rules", "r.xml", "-s", "a=a.xml", "-s", "b=b.xml",
            "--pretty",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Merge { sources, pretty, .. } => {
                assert_eq!(sources.len(), 2);
                assert!(pretty);
            }
            _ => panic!("expected merge"),
        }
    }
}
