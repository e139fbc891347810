//! evring Demo Driver
//!
//! Simulasi producer non-real-time dan callback real-time:
//! - Thread "cycle" memanggil `on_cycle` setiap `--cycle-us` (seperti blok audio)
//! - Main thread meng-enqueue event dengan jeda `--interval-us`
//!
//! Pola event: i % 100 == 0 → EventOne, i % 5 == 0 → EventTwo, selain itu EventAck.
//!
//! Usage:
//!   cargo run --release --bin evring_demo [OPTIONS]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use evring::protocol::Event;
use evring::transport::{create_transport, EventHandler, TransportConfig};
use evring::TransportError;

/// Demo configuration
struct DemoConfig {
    capacity: usize,
    events: u64,
    interval_us: u64,
    cycle_us: u64,
    max_per_cycle: usize,
    lock_memory: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            capacity: 1600,
            events: 8_999, // i = 1..9000
            interval_us: 20_000,
            cycle_us: 5_333, // 256 frames @ 48kHz
            max_per_cycle: 32,
            lock_memory: false,
        }
    }
}

/// Counter per jenis event; ditulis dari thread real-time (atomic saja)
#[derive(Default)]
struct EventCounts {
    one: AtomicU64,
    two: AtomicU64,
    ack: AtomicU64,
    waste_sum: AtomicU64,
}

struct CountingHandler {
    counts: Arc<EventCounts>,
}

impl EventHandler for CountingHandler {
    fn on_event_one(&mut self, _track_num: i32, _slot_num: i32, _reserved: u64) {
        self.counts.one.fetch_add(1, Ordering::Relaxed);
    }

    fn on_event_two(&mut self) {
        self.counts.two.fetch_add(1, Ordering::Relaxed);
    }

    fn on_event_ack(&mut self, waste: i32) {
        self.counts.ack.fetch_add(1, Ordering::Relaxed);
        self.counts
            .waste_sum
            .fetch_add(waste as u64, Ordering::Relaxed);
    }
}

fn event_for(i: u64) -> Event {
    if i % 100 == 0 && i > 0 {
        Event::default()
    } else if i % 5 == 0 {
        Event::Two
    } else {
        Event::ack((i % 1000) as i32)
    }
}

fn run_demo(config: DemoConfig) -> Result<(), Box<dyn std::error::Error>> {
    let counts = Arc::new(EventCounts::default());
    let transport_config = TransportConfig::with_capacity(config.capacity)
        .max_records_per_cycle(config.max_per_cycle)
        .lock_memory(config.lock_memory);

    let (mut producer, mut consumer) = create_transport(
        transport_config,
        CountingHandler {
            counts: Arc::clone(&counts),
        },
    )?;

    let running = Arc::new(AtomicBool::new(true));
    let cycle_running = Arc::clone(&running);
    let cycle_period = Duration::from_micros(config.cycle_us);

    // Scheduler eksternal: memanggil on_cycle secara periodik, tidak pernah reentrant
    let cycle_thread = thread::Builder::new()
        .name("evring-cycle".to_string())
        .spawn(move || -> Result<u64, TransportError> {
            let mut cycles = 0u64;
            while cycle_running.load(Ordering::Acquire) {
                consumer.on_cycle()?;
                cycles += 1;
                thread::sleep(cycle_period);
            }
            // Final drain setelah producer berhenti
            while consumer.on_cycle()? > 0 {
                cycles += 1;
            }
            Ok(cycles)
        })?;

    let start = Instant::now();
    let interval = Duration::from_micros(config.interval_us);
    let mut dropped = 0u64;

    for i in 1..=config.events {
        match producer.enqueue(&event_for(i)) {
            Ok(()) => {}
            Err(TransportError::InsufficientSpace { .. }) => dropped += 1,
            Err(e) => {
                error!(error = %e, "producer stopped");
                break;
            }
        }
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    running.store(false, Ordering::Release);
    let cycles = match cycle_thread.join() {
        Ok(result) => result?,
        Err(_) => {
            error!("cycle thread panicked");
            0
        }
    };

    if dropped > 0 {
        warn!(dropped, "events dropped because the ring was full");
    }

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        cycles,
        enqueued = producer.enqueued(),
        rejected = producer.rejected(),
        event_one = counts.one.load(Ordering::Relaxed),
        event_two = counts.two.load(Ordering::Relaxed),
        event_ack = counts.ack.load(Ordering::Relaxed),
        waste_sum = counts.waste_sum.load(Ordering::Relaxed),
        "demo finished"
    );

    Ok(())
}

fn parse_args() -> DemoConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = DemoConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--capacity" | "-c" => {
                if i + 1 < args.len() {
                    config.capacity = args[i + 1].parse().unwrap_or(config.capacity);
                    i += 1;
                }
            }
            "--events" | "-n" => {
                if i + 1 < args.len() {
                    config.events = args[i + 1].parse().unwrap_or(config.events);
                    i += 1;
                }
            }
            "--interval-us" => {
                if i + 1 < args.len() {
                    config.interval_us = args[i + 1].parse().unwrap_or(config.interval_us);
                    i += 1;
                }
            }
            "--cycle-us" => {
                if i + 1 < args.len() {
                    config.cycle_us = args[i + 1].parse().unwrap_or(config.cycle_us);
                    i += 1;
                }
            }
            "--max-per-cycle" | "-k" => {
                if i + 1 < args.len() {
                    config.max_per_cycle = args[i + 1].parse().unwrap_or(config.max_per_cycle);
                    i += 1;
                }
            }
            "--lock-memory" | "-l" => {
                config.lock_memory = true;
            }
            "--help" | "-h" => {
                println!("evring demo driver");
                println!();
                println!("Usage: evring_demo [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --capacity <BYTES>     Ring capacity in bytes (default: 1600)");
                println!("  -n, --events <N>           Number of events to enqueue (default: 8999)");
                println!("      --interval-us <US>     Pause between events (default: 20000)");
                println!("      --cycle-us <US>        Real-time cycle period (default: 5333)");
                println!("  -k, --max-per-cycle <N>    Records processed per cycle (default: 32)");
                println!("  -l, --lock-memory          mlock the ring storage before use");
                println!("  -h, --help                 Show this help");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {}", other);
            }
        }
        i += 1;
    }

    config
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("evring=info,evring_demo=info")))
        .init();

    let config = parse_args();
    info!(
        capacity = config.capacity,
        events = config.events,
        interval_us = config.interval_us,
        cycle_us = config.cycle_us,
        "starting evring demo"
    );

    if let Err(e) = run_demo(config) {
        error!(error = %e, "demo failed");
        std::process::exit(1);
    }
}
