/*!
 * Resource Simulator - Main Entry Point
 *
 * Runs the scheduling and paging engines through a short scenario each:
 * - Round-robin over a fixed burst set
 * - Preemptive priority with a late urgent arrival
 * - FIFO vs LRU on the same reference string
 */

use anyhow::Context;
use resource_sim::{
    init_tracing, CpuScheduler, MemoryConfig, MemoryManager, PageKey, ReplacementAlgorithm,
    RunMode, SchedulerConfig, SchedulerMetrics, WallClock,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Demo knobs read from the environment
#[derive(Debug, Clone, Copy)]
struct DemoSettings {
    /// Wall seconds per simulated second (SIM_TIME_SCALE)
    time_scale: f64,
    /// Print metrics as JSON instead of tables (SIM_REPORT_JSON)
    report_json: bool,
}

impl DemoSettings {
    fn from_env() -> Self {
        let time_scale = std::env::var("SIM_TIME_SCALE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.05);
        let report_json = std::env::var("SIM_REPORT_JSON")
            .map(|v| v == "1" || v == "true")
            .unwrap_or(false);
        Self {
            time_scale,
            report_json,
        }
    }

    fn clock(&self) -> Arc<WallClock> {
        Arc::new(WallClock::scaled(self.time_scale))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = DemoSettings::from_env();
    info!(?settings, "Resource simulator starting");

    round_robin_demo(&settings).await?;
    priority_demo(&settings).await?;
    paging_demo(&settings)?;

    info!("Simulation complete");
    Ok(())
}

async fn round_robin_demo(settings: &DemoSettings) -> anyhow::Result<()> {
    let engine = CpuScheduler::with_clock(
        SchedulerConfig::round_robin(Duration::from_millis(500)),
        settings.clock(),
    )?;

    for (name, burst) in [("A", 2.0), ("B", 1.5), ("C", 1.0), ("D", 2.5)] {
        engine.submit(name, Duration::from_secs_f64(burst), 0)?;
    }

    let metrics = engine.run(RunMode::Background)?.wait_async().await?;
    report(settings, &metrics)
}

async fn priority_demo(settings: &DemoSettings) -> anyhow::Result<()> {
    let engine = CpuScheduler::with_clock(SchedulerConfig::priority(true), settings.clock())?;

    engine.submit("Background Job", Duration::from_secs(2), 5)?;
    engine.submit("Batch Report", Duration::from_secs(1), 3)?;

    let outcome = engine.run(RunMode::Background)?;

    // An urgent unit arrives while the low-priority work is running
    tokio::time::sleep(Duration::from_secs_f64(0.5 * settings.time_scale)).await;
    engine.submit("Interactive", Duration::from_millis(500), 1)?;

    let metrics = outcome.wait_async().await?;
    report(settings, &metrics)
}

fn paging_demo(settings: &DemoSettings) -> anyhow::Result<()> {
    let refs: Vec<PageKey> = [1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5]
        .into_iter()
        .map(|page| PageKey::new(1, page))
        .collect();

    for frames in [3, 4] {
        let comparison = MemoryManager::compare_algorithms(frames, &refs)
            .context("comparing replacement algorithms")?;
        if settings.report_json {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        } else {
            println!("Reference string with {} frames:\n{}", frames, comparison);
        }
    }

    let memory = MemoryManager::new(MemoryConfig::new(4, ReplacementAlgorithm::Lru))?;
    for (owner, page) in [(1, 0), (1, 1), (2, 0), (1, 0), (2, 1), (3, 0), (1, 1)] {
        memory.reference(owner, page);
    }
    memory
        .release_owner(2)
        .context("releasing process 2 pages")?;

    if settings.report_json {
        println!("{}", serde_json::to_string_pretty(&memory.stats())?);
    } else {
        println!("{}\n{}", memory.frames(), memory.stats());
    }
    Ok(())
}

fn report(settings: &DemoSettings, metrics: &SchedulerMetrics) -> anyhow::Result<()> {
    if settings.report_json {
        println!("{}", serde_json::to_string_pretty(metrics)?);
    } else {
        println!("{}", metrics);
    }
    Ok(())
}
