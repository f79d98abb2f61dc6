// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::environment::{Environment, TeardownReport};
use crate::plan::{ImageSource, Plan, ResourceSpec};
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => emit(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print a resolved plan.
    pub fn plan(&self, plan: &Plan) {
        match self.mode {
            OutputMode::Normal => {
                println!("Environment: {}", plan.environment());
                for resource in plan.resources() {
                    println!("  {}", describe_resource(&resource));
                }
            }
            OutputMode::Quiet => {
                for resource in plan.resources() {
                    println!("{}", resource.slot());
                }
            }
            OutputMode::Json => emit(&DataEvent {
                event: "plan",
                data: plan,
            }),
        }
    }

    /// Print the access points of a ready environment.
    pub fn environment(&self, environment: &Environment) {
        match self.mode {
            OutputMode::Normal => {
                println!(
                    "Environment {} is ready (network {})",
                    environment.name(),
                    environment.network().name()
                );
                for container in environment.containers() {
                    println!(
                        "  {} [{}] {}",
                        container.slot(),
                        container.status(),
                        container.name()
                    );
                    for point in container.access_points() {
                        println!("    {:<6} {}  (local {})", point.scheme, point.public, point.local);
                    }
                }
            }
            OutputMode::Quiet => {
                for container in environment.containers() {
                    for point in container.access_points() {
                        println!("{} {}", container.slot(), point.public);
                    }
                }
            }
            OutputMode::Json => emit(&DataEvent {
                event: "ready",
                data: environment,
            }),
        }
    }

    /// Print what a teardown removed.
    pub fn teardown(&self, report: &TeardownReport) {
        match self.mode {
            OutputMode::Normal => {
                for name in &report.removed {
                    println!("  removed {name}");
                }
                for failure in &report.failures {
                    println!("  could not remove {}: {}", failure.resource, failure.reason);
                }
            }
            OutputMode::Quiet => {}
            OutputMode::Json => emit(&DataEvent {
                event: "teardown",
                data: report,
            }),
        }
    }
}

fn describe_resource(resource: &ResourceSpec<'_>) -> String {
    match resource {
        ResourceSpec::Network(spec) => {
            let origin = if spec.implicit { " (implicit)" } else { "" };
            format!("network   {:<12} {}{}", spec.slot, spec.identity, origin)
        }
        ResourceSpec::Container(spec) => {
            let source = match &spec.source {
                ImageSource::Image(image) => image.to_string(),
                ImageSource::Build { context, .. } => format!("build {}", context.display()),
            };
            let ports: Vec<String> = spec
                .ports
                .iter()
                .map(|p| format!("{}/{}", p.container_port, p.scheme))
                .collect();
            let mut line = format!(
                "{:<9} {:<12} {} [{}]",
                spec.capability.as_str(),
                spec.slot,
                spec.identity,
                source
            );
            if !ports.is_empty() {
                line.push_str(&format!(" ports {}", ports.join(",")));
            }
            if spec.network.is_none() {
                line.push_str(" (isolated)");
            }
            line
        }
    }
}

fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct DataEvent<'a, T: Serialize> {
    event: &'a str,
    data: &'a T,
}
