use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::path::PathBuf;
use tracing::{info, warn};

use course_scaffolder::{
    Config, CourseManager, MemoryRecordStore, Payload, PlaceholderGenerator, TemplateManager,
    WalkOptions,
};

fn main() -> Result<()> {
    let matches = Command::new("Course Scaffolder")
        .version("0.1.0")
        .author("suhail")
        .about("Template-driven course folder hierarchy generator")
        .arg(
            Arg::new("payload")
                .value_name("FILE")
                .help("JSON payload describing courses, chapters, and lessons")
                .required(true)
        )
        .arg(
            Arg::new("templates-dir")
                .short('t')
                .long("templates-dir")
                .value_name("DIR")
                .help("Directory containing templates.json and the .j2 templates")
        )
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("PATH")
                .help("Course root folder (may contain $VAR tokens); overrides config")
        )
        .arg(
            Arg::new("video")
                .long("video")
                .help("Also build the Jellyfin-style video hierarchy")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Resolve paths only; create nothing on disk")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the enriched payload JSON here (default: stdout)")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    tracing_subscriber::fmt()
        .with_env_filter(if verbose {
            "course_scaffolder=debug,info"
        } else {
            "course_scaffolder=info,warn"
        })
        .init();

    let payload_file = PathBuf::from(matches.get_one::<String>("payload").unwrap());

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default().with_env_overrides()
    });
    if let Some(dir) = matches.get_one::<String>("templates-dir") {
        config.templates.dir = PathBuf::from(dir);
    }
    if let Some(root) = matches.get_one::<String>("root") {
        config.folders.course_root = Some(root.clone());
    }

    let options = WalkOptions {
        create_folders: !matches.get_flag("dry-run"),
        include_video: matches.get_flag("video"),
        keep_symbolic: true,
    };

    info!("🚀 Course Scaffolder starting...");
    info!("📄 Payload: {}", payload_file.display());
    info!("📁 Templates: {}", config.templates.dir.display());
    if !options.create_folders {
        info!("🧪 Dry run: no folders will be created");
    }

    let raw = std::fs::read_to_string(&payload_file)
        .with_context(|| format!("reading payload {}", payload_file.display()))?;
    let mut payload = Payload::from_json(&raw)
        .with_context(|| format!("parsing payload {}", payload_file.display()))?;

    let templates = TemplateManager::new(&config.templates.dir)?;
    let images = PlaceholderGenerator;
    let store = MemoryRecordStore::new();
    let manager = CourseManager::new(&config, &templates, &images, &store);

    manager.process(&mut payload, &options)?;

    let enriched = serde_json::to_string_pretty(&payload)?;
    match matches.get_one::<String>("output") {
        Some(path) => {
            std::fs::write(path, &enriched).with_context(|| format!("writing {path}"))?;
            info!("💾 Enriched payload written to {path}");
        }
        None => println!("{enriched}"),
    }

    info!("🎉 Done: {} course(s) processed", payload.courses.len());
    Ok(())
}
