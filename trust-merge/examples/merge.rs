//! Example: reconcile two source documents with a rule file
//!
//! Usage: cargo run --example merge <rules.xml> <name=source.xml>...
//!
//! With no arguments, a built-in pair of documents is merged.

use std::env;
use std::io;

use xml_trust_merge::{
    load_rules_file, parse_file, parse_rules_str, parse_str, MergeOptions, Rules,
    SourceDocuments, XmlDocumentMerger, XmlPrinter, XmlPrinterOptions,
};

const RULES: &str = r#"<tm:rules tm:context="/" xmlns:tm="http://accuity.com/apo/trust-matrix">
  <tm:rule tm:context="bank">
    <tm:weightings>
      <tm:source tm:name="registry" tm:trust="1.0"/>
      <tm:source tm:name="feed" tm:trust="0.5"/>
    </tm:weightings>
    <tm:rule tm:context="names/name">
      <tm:field tm:coalesce="true"><tm:id tm:path="@type"/></tm:field>
    </tm:rule>
    <tm:rule tm:context="address">
      <tm:field tm:stop="true"/>
      <tm:weightings>
        <tm:source tm:name="feed" tm:trust="1.0"/>
        <tm:source tm:name="registry" tm:trust="0.2"/>
      </tm:weightings>
    </tm:rule>
  </tm:rule>
</tm:rules>"#;

const REGISTRY: &str = r#"<bank>
  <names><name type="legal">First Example Bank</name></names>
  <address><city>Springfield</city></address>
  <founded>1901</founded>
</bank>"#;

const FEED: &str = r#"<bank>
  <names><name type="short">FEB</name></names>
  <address><city>Springfield</city><street>1 Main St</street></address>
  <swift>FEBKUS33</swift>
</bank>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let (rules, sources): (Rules, SourceDocuments) = if args.len() > 1 {
        let rules = load_rules_file(&args[1])?;
        let mut sources = SourceDocuments::new();
        for arg in &args[2..] {
            let (name, path) = arg
                .split_once('=')
                .ok_or_else(|| format!("expected name=path, got {}", arg))?;
            eprintln!("Parsing {}: {}", name, path);
            sources.insert(name.to_string(), parse_file(path)?);
        }
        (rules, sources)
    } else {
        let mut sources = SourceDocuments::new();
        sources.insert("registry".to_string(), parse_str(REGISTRY)?);
        sources.insert("feed".to_string(), parse_str(FEED)?);
        (parse_rules_str(RULES)?, sources)
    };

    let mut merger = XmlDocumentMerger::with_options(MergeOptions {
        mark_trusted: true,
        ..MergeOptions::default()
    });

    match merger.merge(&rules, &sources)? {
        Some(trusted) => {
            let options = XmlPrinterOptions {
                pretty_print: true,
                ..Default::default()
            };
            XmlPrinter::with_options(io::stdout(), options).print(&trusted)?;
        }
        None => eprintln!("No trusted document was produced."),
    }

    if !merger.log().is_empty() {
        eprintln!("\nMerge log:");
        merger.log().write_xml(&mut io::stderr())?;
    }

    Ok(())
}
