use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::boundary::logger::{Logger, TracingLogger};
use crate::cli::config::AppConfig;
use crate::controller::controller::AutoFillController;
use crate::controller::page::Page;
use crate::controller::scenario::{Scenario, ScenarioRunner};
use crate::dom::snapshot::PageSnapshot;
use crate::filler::filler::AutoFiller;
use crate::filler::outcome::FillOutcome;
use crate::mapping::profile::UserProfile;
use crate::messaging::handler::MessageHandler;
use crate::messaging::protocol::Response;
use crate::report::console::{format_fill_report, format_scenario_report};
use crate::storage::cloud::CloudProfileClient;
use crate::storage::store::JsonFileStore;
use crate::trace::logger::TraceLogger;

fn logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}

pub fn load_page(path: &str) -> Result<Page, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let snapshot = PageSnapshot::from_json(&content)?;
    Ok(Page::from_snapshot(&snapshot))
}

pub fn load_profile(path: &str) -> Result<UserProfile, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    Ok(UserProfile::from_json(&value)?)
}

fn write_page(page: &Page, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = PageSnapshot {
        url: page.url.clone(),
        title: page.title.clone(),
        body: page.document.to_snapshot(page.document.body()),
    };
    std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
    Ok(())
}

// ============================================================================
// detect subcommand
// ============================================================================

pub fn cmd_detect(page_path: &str, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let page = load_page(page_path)?;
    let filler = AutoFiller::new(&config.filler, logger())?;
    let detector = filler.detector();
    let containers = detector.find_question_containers(&page.document);

    println!(
        "{:?} page, {} questions ({})",
        page.page_type(),
        containers.len(),
        page.url
    );
    for (i, container) in containers.iter().enumerate() {
        let label = container
            .label
            .clone()
            .unwrap_or_else(|| format!("Question {}", i + 1));
        match detector.find_input_field(&page.document, container.node) {
            Some(field) => println!(
                "  [{}] {} ({:?}, {})",
                i + 1,
                label,
                field.widget,
                field.category.as_str()
            ),
            None => println!("  [{}] {} (no input)", i + 1, label),
        }
    }
    Ok(())
}

// ============================================================================
// fill / highlight subcommands
// ============================================================================

/// Fill a snapshot; returns whether the pass succeeded.
pub fn cmd_fill(
    page_path: &str,
    profile: UserProfile,
    output: Option<&str>,
    json: bool,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut page = load_page(page_path)?;
    let mut filler = AutoFiller::new(&config.filler, logger())?;
    filler.update_user_profile(profile);

    let outcome = filler.fill_form(&mut page.document);
    print_outcome(&outcome, &filler, json)?;

    if let Some(path) = output {
        write_page(&page, path)?;
    }
    Ok(outcome.success)
}

fn print_outcome(
    outcome: &FillOutcome,
    filler: &AutoFiller,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        print!(
            "{}",
            format_fill_report(outcome, &filler.statistics().detection_results)
        );
    }
    Ok(())
}

pub fn cmd_highlight(
    page_path: &str,
    profile_path: &str,
    output: Option<&str>,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut page = load_page(page_path)?;
    let mut filler = AutoFiller::new(&config.filler, logger())?;
    filler.update_user_profile(load_profile(profile_path)?);

    let outcome = filler.fill_form(&mut page.document);
    print_outcome(&outcome, &filler, false)?;

    let result = filler.highlight_unfilled_fields(&mut page.document);
    println!("Highlighted {} questions needing attention", result.highlighted_count);

    if let Some(path) = output {
        write_page(&page, path)?;
    }
    Ok(())
}

// ============================================================================
// mappings subcommand
// ============================================================================

pub fn cmd_mappings(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filler = AutoFiller::new(&config.filler, logger())?;
    println!("{}", serde_json::to_string_pretty(filler.get_field_mappings())?);
    Ok(())
}

// ============================================================================
// replay subcommand
// ============================================================================

/// Replay scenarios and return whether all passed.
pub fn cmd_replay(
    scenario_path: &str,
    config: &AppConfig,
    trace: Option<&str>,
    verbose: u8,
) -> Result<bool, Box<dyn std::error::Error>> {
    let scenarios = load_scenarios(scenario_path)?;
    if scenarios.is_empty() {
        eprintln!("No scenarios found at: {}", scenario_path);
        return Ok(true);
    }

    let mut runner = ScenarioRunner::new(config.filler.clone(), config.controller.clone());
    runner.trace_path = trace.map(str::to_string);

    let mut results = Vec::new();
    for scenario in &scenarios {
        if verbose > 0 {
            eprintln!("  Replaying: {}", scenario.name);
        }
        results.push(runner.run(scenario));
    }

    print!("{}", format_scenario_report(&results));
    Ok(results.iter().all(|r| r.passed))
}

/// Load scenarios from a single YAML file or a directory of YAML files.
pub fn load_scenarios(path: &str) -> Result<Vec<Scenario>, Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(path)?;
    if metadata.is_dir() {
        let mut scenarios = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let p = entry?.path();
            if p.extension().is_some_and(|e| e == "yaml" || e == "yml") {
                scenarios.push(Scenario::from_yaml(&std::fs::read_to_string(&p)?)?);
            }
        }
        scenarios.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scenarios)
    } else {
        Ok(vec![Scenario::from_yaml(&std::fs::read_to_string(path)?)?])
    }
}

// ============================================================================
// serve subcommand
// ============================================================================

/// Load the page, run its load lifecycle, then answer one JSON message
/// per input line with one JSON response line.
pub fn cmd_serve(
    page_path: &str,
    store_path: &str,
    config: &AppConfig,
    trace: Option<&str>,
    input: impl BufRead,
    mut output: impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let page = load_page(page_path)?;
    let store = JsonFileStore::open(store_path)?;
    let mut controller = AutoFillController::new(
        page,
        &config.filler,
        config.controller.clone(),
        Box::new(store),
        None,
    );
    if let Some(path) = trace {
        controller = controller.with_tracer(TraceLogger::new(path));
    }

    controller.dom_content_loaded();
    controller.window_load();

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str(&line) {
            Ok(raw) => MessageHandler::handle_value(&mut controller, raw),
            Err(e) => Response::error(format!("Invalid JSON message: {}", e)),
        };
        writeln!(output, "{}", serde_json::to_string(&response)?)?;
        output.flush()?;
    }
    Ok(())
}

// ============================================================================
// sync-profiles subcommand
// ============================================================================

pub fn cmd_sync_profiles(
    endpoint: &str,
    store_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = JsonFileStore::open(store_path)?;
    let client = CloudProfileClient::new(endpoint)?;
    let count = client.sync_into(&mut store)?;
    println!("Cached {} profiles in {}", count, store.path().display());
    Ok(())
}
