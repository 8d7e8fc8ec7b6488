//! Command execution.

use crate::config::Config;
use crate::{Commands, EnumerationArgs};
use colored::Colorize;
use statepath_core::FlatGraph;
use statepath_paths::{EnumeratorConfig, PathEnumerator, TestCase};
use statepath_sync::{Manifest, SyncAction, SyncEngine, SyncPlan, SyncStatus};
use std::path::Path;

/// Executes a command and returns the formatted output.
pub fn execute(cmd: Commands, mut config: Config) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Show { graph } => {
            let graph = load_graph(&graph)?;
            Ok(format_graph(&graph))
        }

        Commands::Enumerate {
            graph,
            limits,
            json,
        } => {
            let graph = load_graph(&graph)?;
            let cases = enumerate(&graph, &limits.apply(config.enumeration))?;

            if json {
                return Ok(serde_json::to_string_pretty(&cases)?);
            }
            if cases.is_empty() {
                return Ok("No paths found".yellow().to_string());
            }
            Ok(format_cases(&cases))
        }

        Commands::Sync {
            graph,
            limits,
            manifest,
            dry_run,
        } => {
            if let Some(path) = manifest {
                config.sync.manifest_path = path;
            }
            config.sync.dry_run |= dry_run;

            let graph = load_graph(&graph)?;
            let cases = enumerate(&graph, &limits.apply(config.enumeration))?;
            let mut manifest = Manifest::load_or_default(&config.sync.manifest_path)?;
            let plan = SyncEngine::new().plan(&cases, &manifest);

            let mut output = format_plan(&plan);
            if config.sync.dry_run {
                output.push_str(&format!("\n{}", "Dry run: manifest not written".dimmed()));
            } else if plan.is_noop() {
                output.push_str(&format!("\n{}", "Manifest up to date".green()));
            } else {
                let changed = manifest.apply(&plan.actions);
                manifest.save(&config.sync.manifest_path)?;
                output.push_str(&format!(
                    "\n{} {} ({} change(s))",
                    "Saved".green(),
                    config.sync.manifest_path.display(),
                    changed
                ));
            }
            Ok(output)
        }

        Commands::Init { path } => {
            config.save(&path)?;
            Ok(format!("{} {}", "Wrote".green(), path.display()))
        }
    }
}

impl EnumerationArgs {
    /// Overlays command-line limits on the configured ones.
    fn apply(&self, mut config: EnumeratorConfig) -> EnumeratorConfig {
        if let Some(n) = self.max_visits {
            config.max_visits_per_state = n;
        }
        if let Some(n) = self.max_depth {
            config.max_path_depth = Some(n);
        }
        if let Some(hash) = self.hash {
            config.hash_algorithm = hash;
        }
        config
    }
}

/// Reads a graph file, choosing YAML or JSON by extension.
fn load_graph(path: &Path) -> Result<FlatGraph, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read graph '{}': {}", path.display(), e))?;
    let graph = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => FlatGraph::from_yaml(&content)?,
        _ => FlatGraph::from_json(&content)?,
    };
    graph.validate()?;
    tracing::info!(
        "Loaded graph {} ({} states, {} edges)",
        path.display(),
        graph.states.len(),
        graph.edge_count()
    );
    Ok(graph)
}

fn enumerate(
    graph: &FlatGraph,
    config: &EnumeratorConfig,
) -> Result<Vec<TestCase>, Box<dyn std::error::Error>> {
    Ok(PathEnumerator::new(*config)?.test_cases(graph))
}

fn format_graph(graph: &FlatGraph) -> String {
    let mut output = format!("{} {}\n", "Initial:".bold(), graph.initial.cyan());
    for (state, edges) in &graph.states {
        output.push_str(&format!("{}\n", state.cyan()));
        if edges.is_empty() {
            output.push_str(&format!("  {}\n", "(no transitions)".dimmed()));
        }
        for edge in edges {
            output.push_str(&format!("  {} -> {}", edge.event, edge.target.cyan()));
            if let Some(guard) = &edge.guard {
                output.push_str(&format!(" [{}]", guard.yellow()));
            }
            if !edge.emitted.is_empty() {
                let emitted: Vec<String> = edge.emitted.iter().map(|e| e.descriptor()).collect();
                output.push_str(&format!(" emits {}", emitted.join(", ")));
            }
            output.push('\n');
        }
    }
    output.trim_end().to_string()
}

fn format_cases(cases: &[TestCase]) -> String {
    let mut output = String::new();
    for case in cases {
        output.push_str(&format!("{}\n", case.name.bold()));
        for transition in &case.expected_transitions {
            output.push_str(&format!("  {}\n", transition));
        }
    }
    output.push_str(&format!("{} test case(s)", cases.len()));
    output
}

fn format_status(status: SyncStatus) -> String {
    let label = format!("{:<9}", status.to_string());
    match status {
        SyncStatus::New => label.green().to_string(),
        SyncStatus::Unchanged => label.dimmed().to_string(),
        SyncStatus::Modified => label.yellow().to_string(),
        SyncStatus::Obsolete => label.red().to_string(),
    }
}

fn format_plan(plan: &SyncPlan) -> String {
    let mut output = String::new();
    for action in &plan.actions {
        let line = match action {
            SyncAction::Append(case) => {
                format!("{} {}", format_status(SyncStatus::New), case.name)
            }
            SyncAction::ReplaceExpected {
                hash,
                previous,
                current,
            } => format!(
                "{} {}: {} -> {} transition(s)",
                format_status(SyncStatus::Modified),
                hash,
                previous.len(),
                current.len()
            ),
            SyncAction::MarkObsolete { hash, reason, .. } => {
                format!("{} {}: {}", format_status(SyncStatus::Obsolete), hash, reason)
            }
            SyncAction::Restore { hash } => {
                format!("{} {}: path exists again", "RESTORE  ".cyan(), hash)
            }
        };
        output.push_str(&line);
        output.push('\n');
    }

    let report = &plan.report;
    output.push_str(&format!(
        "{} new, {} unchanged, {} modified, {} obsolete",
        report.count(SyncStatus::New),
        report.count(SyncStatus::Unchanged),
        report.count(SyncStatus::Modified),
        report.count(SyncStatus::Obsolete)
    ));
    output
}
