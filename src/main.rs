//! css-scan - Extract minimal CSS rules from HTML pages

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use css_scan::{
    ApplyMode, Document, Error, ExportFile, PlaygroundPayload, ScanConfig, StyleApplicator,
    StyleExtractor, html_mockup, time_now_secs,
};

#[derive(Parser)]
#[command(name = "css-scan")]
#[command(version, about = "Extract minimal CSS rules from HTML pages", long_about = None)]
#[command(after_help = "EXAMPLES:
    css-scan page.html -s '.card'                 Print the rule for the first .card
    css-scan page.html -s h1 -s 'nav a'           Labeled rules for several elements
    css-scan page.html -s '#cta' --export out/    Also write css-scan-cta-<date>.css
    css-scan page.html -s p --apply 'p { color: red }'")]
struct Cli {
    /// HTML page to inspect
    #[arg(value_name = "PAGE")]
    page: PathBuf,

    /// Selector of an element to extract (repeat for several)
    #[arg(short, long = "selector", value_name = "SELECTOR", required = true)]
    selectors: Vec<String>,

    /// Extra stylesheet applied after the page's own (repeatable)
    #[arg(long, value_name = "FILE")]
    css: Vec<PathBuf>,

    /// Page URL recorded in export headers
    #[arg(long)]
    url: Option<String>,

    /// Apply rule text permanently and print the resulting inline style
    #[arg(long, value_name = "CSS")]
    apply: Option<String>,

    /// Write the extracted rule to an export file in this directory
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Print a code-playground JSON payload for the first element
    #[arg(long)]
    playground: bool,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> css_scan::Result<()> {
    let config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };

    let mut doc = Document::load(&cli.page)?;
    if let Some(url) = &cli.url {
        doc.set_url(url);
    }
    for path in &cli.css {
        let css = std::fs::read_to_string(path)?;
        doc.add_stylesheet(&css);
    }

    let mut targets = Vec::with_capacity(cli.selectors.len());
    for selector in &cli.selectors {
        match doc.query_selector(selector)? {
            Some(node) => targets.push(node),
            None => {
                return Err(Error::InvalidSelector(format!(
                    "{selector} (no matching element)"
                )));
            }
        }
    }

    let extractor = StyleExtractor::with_config(config.clone());
    let css = match targets.as_slice() {
        [single] => extractor.extract(&doc, *single),
        many => extractor.extract_multi(&doc, many),
    };
    println!("{css}");

    if let Some(dir) = &cli.export {
        let selector = match targets.as_slice() {
            [single] => extractor.selector(&doc, *single),
            _ => "selection".to_string(),
        };
        let file = ExportFile::new(&selector, &css, doc.url(), time_now_secs(), &config);
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&file.name);
        std::fs::write(&path, &file.contents)?;
        if !cli.quiet {
            eprintln!("Wrote {}", path.display());
        }
    }

    if cli.playground {
        let first = targets[0];
        let payload = PlaygroundPayload::new(
            &extractor.selector(&doc, first),
            html_mockup(&doc, first, &config),
            extractor.extract(&doc, first),
        );
        println!("{}", payload.to_json()?);
    }

    if let Some(text) = &cli.apply {
        let mut applicator = StyleApplicator::new();
        for &target in &targets {
            applicator.apply(&mut doc, text, target, ApplyMode::Permanent)?;
            println!(
                "{} style=\"{}\"",
                extractor.selector(&doc, target),
                doc.dom().get_attr(target, "style").unwrap_or_default()
            );
        }
    }

    Ok(())
}
